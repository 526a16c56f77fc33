//! Audio playback service
//!
//! Runs in a background task, receiving AudioEvents via channel and handing
//! them to the platform speech sink. Playback failures are logged and
//! dropped; an announcement is never retried from here.

use tokio::sync::mpsc;

use super::SpeechSink;
use super::events::AudioEvent;

/// Audio service that owns the speech sink
pub struct AudioService {
    /// Channel to receive audio events
    event_rx: mpsc::Receiver<AudioEvent>,

    sink: Box<dyn SpeechSink>,
}

impl AudioService {
    pub fn new(event_rx: mpsc::Receiver<AudioEvent>, sink: Box<dyn SpeechSink>) -> Self {
        Self { event_rx, sink }
    }

    /// Run until every sender is dropped
    pub async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            self.play(&event);
        }
        tracing::debug!("Audio service stopped");
    }

    fn play(&mut self, event: &AudioEvent) {
        let result = match event {
            AudioEvent::Chime(tone) => self.sink.play_tone(tone),
            AudioEvent::Speak(utterance) => {
                tracing::info!(text = %utterance.text, "Announcing");
                self.sink.speak(utterance)
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, ?event, "Audio playback failed");
        }
    }
}

/// Sender handle for sending audio events
pub type AudioSender = mpsc::Sender<AudioEvent>;

/// Create a new audio channel
pub fn create_audio_channel() -> (AudioSender, mpsc::Receiver<AudioEvent>) {
    // A display announces at most a handful of tokens per minute
    mpsc::channel(16)
}
