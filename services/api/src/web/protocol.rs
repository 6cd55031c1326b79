//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the live session timer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Pauses the timer if it is running, resumes it otherwise.
    ToggleTimer,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once per second while connected, and right after a toggle.
    Tick {
        session_id: Uuid,
        elapsed_seconds: i64,
        running: bool,
    },

    /// There is nothing to time. The client should show the dashboard.
    NoActiveSession,

    /// A client message could not be understood or applied.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"toggle_timer"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ToggleTimer);
    }

    #[test]
    fn tick_carries_timer_fields() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ServerMessage::Tick {
            session_id: id,
            elapsed_seconds: 75,
            running: true,
        })
        .unwrap();
        assert_eq!(json["type"], "tick");
        assert_eq!(json["elapsed_seconds"], 75);
        assert_eq!(json["running"], true);
    }
}
