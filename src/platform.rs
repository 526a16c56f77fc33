//! Console stand-in for a kiosk host window.

use queue_display_core::audio::{SpeechSink, Tone};
use queue_display_core::kiosk::{KioskError, PlatformControls};

use crate::speech::HostSpeech;

/// Fullscreen is simulated; the audio unlock plays its tone for real.
pub struct ConsolePlatform {
    fullscreen: bool,
    allow_fullscreen: bool,
    speech: HostSpeech,
}

impl ConsolePlatform {
    pub fn new(allow_fullscreen: bool) -> Self {
        Self {
            fullscreen: false,
            allow_fullscreen,
            speech: HostSpeech::new(),
        }
    }
}

impl PlatformControls for ConsolePlatform {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) -> Result<(), KioskError> {
        if !self.allow_fullscreen {
            return Err(KioskError::Unsupported);
        }
        self.fullscreen = true;
        tracing::info!("Entered fullscreen");
        Ok(())
    }

    fn unlock_audio(&mut self, tone: &Tone) -> Result<(), KioskError> {
        self.speech
            .play_tone(tone)
            .map_err(|e| KioskError::AudioBlocked {
                reason: e.to_string(),
            })
    }
}
