//! Audio subsystem for queue announcements
//!
//! Chimes and speech are produced by an external synthesis backend behind the
//! `SpeechSink` trait. The engine only ever sends `AudioEvent`s down a
//! channel; completion timing is unspecified.

mod events;
mod service;

pub use events::{AudioEvent, Tone, Utterance};
pub use service::{AudioSender, AudioService, create_audio_channel};

use thiserror::Error;

/// Errors reported by a speech backend
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("speech synthesis failed: {reason}")]
    Synthesis { reason: String },

    #[error("failed to launch speech process")]
    Spawn(#[source] std::io::Error),
}

/// Text-to-speech and tone generation backend
pub trait SpeechSink: Send {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError>;

    fn speak(&mut self, utterance: &Utterance) -> Result<(), AudioError>;
}

/// Sink that only logs, for displays without an audio device
#[derive(Debug, Default)]
pub struct LogSink;

impl SpeechSink for LogSink {
    fn play_tone(&mut self, tone: &Tone) -> Result<(), AudioError> {
        tracing::info!(
            frequency_hz = tone.frequency_hz,
            duration_ms = tone.duration.as_millis() as u64,
            "Tone"
        );
        Ok(())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), AudioError> {
        tracing::info!(text = %utterance.text, "Speech");
        Ok(())
    }
}
