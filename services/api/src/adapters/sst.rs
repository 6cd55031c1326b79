//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for OpenAI's Speech-to-Text (Whisper) service,
//! used when the browser posts recorded command audio instead of its own transcript.
//! It implements the `SpeechToTextService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use workout_tracker_core::ports::{PortError, PortResult, SpeechToTextService};

/// Sample rate of the PCM16 mono stream the browser recorder produces.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// An adapter that implements the `SpeechToTextService` port using the OpenAI Whisper API.
#[derive(Clone)]
pub struct OpenAiSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    sample_rate: u32,
}

impl OpenAiSstAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client,
            model,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Wraps little-endian PCM16 mono samples in a WAV container. A trailing odd byte is dropped.
    pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = std::io::Cursor::new(Vec::with_capacity(pcm_data.len() + 44));
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in pcm_data.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl SpeechToTextService for OpenAiSstAdapter {
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String> {
        if audio_data.len() < 2 {
            return Err(PortError::Unexpected("No audio was recorded.".to_string()));
        }
        let wav_data = Self::pcm16_to_wav(audio_data, self.sample_rate)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode WAV: {}", e)))?;

        let request = CreateTranscriptionRequest {
            file: AudioInput::from_vec_u8("command.wav".into(), wav_data),
            model: self.model.clone(),
            language: Some("en".to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_pcm_in_a_wav_header() {
        let pcm: Vec<u8> = [0i16, 1000, -1000, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let wav = OpenAiSstAdapter::pcm16_to_wav(&pcm, DEFAULT_SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + pcm.len());

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, DEFAULT_SAMPLE_RATE);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, i16::MAX]);
    }
}
