//! Audio event types for the announcement pipeline

use std::time::Duration;

/// A generated sine tone (chime or audio-unlock blip)
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    /// Gain 0.0-1.0
    pub volume: f32,
}

/// Text to synthesize with voice parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    /// Gain 0.0-1.0
    pub volume: f32,
    /// Platform voice name, default voice when None
    pub voice: Option<String>,
}

/// Events that can trigger audio playback
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Chime played ahead of an announcement
    Chime(Tone),

    /// Spoken announcement
    Speak(Utterance),
}
