//! services/api/src/adapters/repository.rs
//!
//! Implementations of the `WorkoutRepository` port: a memory-resident one and one that
//! keeps the whole snapshot in a single JSON file.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};
use workout_tracker_core::{
    domain::WorkoutSnapshot,
    ports::{PortError, PortResult, WorkoutRepository},
};

//=========================================================================================
// In-Memory Repository
//=========================================================================================

/// Keeps the last saved snapshot in memory. State is lost when the process exits.
#[derive(Default)]
pub struct MemoryRepository {
    snapshot: Mutex<WorkoutSnapshot>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: WorkoutSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

#[async_trait]
impl WorkoutRepository for MemoryRepository {
    async fn load(&self) -> PortResult<WorkoutSnapshot> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &WorkoutSnapshot) -> PortResult<()> {
        *self.snapshot.lock().await = snapshot.clone();
        Ok(())
    }
}

//=========================================================================================
// JSON File Repository
//=========================================================================================

/// Stores the snapshot as pretty JSON at `path`.
///
/// Writes go to a sibling temp file that is then renamed over the target, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "workouts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl WorkoutRepository for JsonFileRepository {
    async fn load(&self) -> PortResult<WorkoutSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No data file at {}, starting empty.", self.path.display());
                return Ok(WorkoutSnapshot::default());
            }
            Err(e) => {
                return Err(PortError::Unexpected(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            PortError::Unexpected(format!("Corrupt data file {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, snapshot: &WorkoutSnapshot) -> PortResult<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", temp.display(), e)))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(
            sessions = snapshot.history.len(),
            routines = snapshot.routines.len(),
            "Snapshot saved to {}",
            self.path.display()
        );
        Ok(())
    }
}
