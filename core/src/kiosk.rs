//! Kiosk activation
//!
//! Unattended displays want fullscreen and audio without anyone touching
//! them, but the platform only grants both in response to a user gesture.
//! `KioskController` tracks what has been unlocked and performs the unlock
//! steps when the gesture arrives.
//!
//! # Phases
//!
//! - `Idle`: no auto-fullscreen / auto-audio configured
//! - `AwaitingGesture`: something is configured and still locked
//! - `Activated`: a gesture has been handled (possibly with partial success)

use std::time::Duration;

use queue_display_types::KioskSettings;
use thiserror::Error;

use crate::audio::Tone;

const UNLOCK_TONE_HZ: f32 = 440.0;
const UNLOCK_TONE_MS: u64 = 50;

/// Platform refusals during activation
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("fullscreen request denied: {reason}")]
    FullscreenDenied { reason: String },

    #[error("audio output blocked: {reason}")]
    AudioBlocked { reason: String },

    #[error("not supported on this platform")]
    Unsupported,
}

/// Fullscreen and audio-unlock capabilities of the host platform
pub trait PlatformControls: Send {
    fn is_fullscreen(&self) -> bool;

    /// Ask to enter fullscreen. Success may still be reported later via
    /// `PlatformEvent::FullscreenChanged`.
    fn request_fullscreen(&mut self) -> Result<(), KioskError>;

    /// Play a near-silent tone to unlock audio output.
    fn unlock_audio(&mut self, tone: &Tone) -> Result<(), KioskError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskPhase {
    Idle,
    AwaitingGesture,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KioskState {
    pub fullscreen_active: bool,
    pub audio_unlocked: bool,
    /// A gesture is needed to unlock something configured but still locked
    pub needs_user_gesture: bool,
    /// A user gesture has been handled this session
    pub activated: bool,
}

/// Result of one activation sub-step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Unlocked,
    AlreadyActive,
    NotRequested,
    Denied(String),
}

impl StepOutcome {
    pub fn is_denied(&self) -> bool {
        matches!(self, StepOutcome::Denied(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub fullscreen: StepOutcome,
    pub audio: StepOutcome,
    pub state: KioskState,
}

impl ActivationReport {
    /// At least one requested step was refused by the platform
    pub fn is_partial(&self) -> bool {
        self.fullscreen.is_denied() || self.audio.is_denied()
    }
}

#[derive(Debug, Clone)]
pub struct KioskController {
    settings: KioskSettings,
    state: KioskState,
}

impl KioskController {
    pub fn new(settings: &KioskSettings) -> Self {
        let mut controller = Self {
            settings: settings.clone(),
            state: KioskState::default(),
        };
        controller.refresh_gesture_need();
        controller
    }

    pub fn state(&self) -> KioskState {
        self.state
    }

    pub fn phase(&self) -> KioskPhase {
        if self.state.activated {
            KioskPhase::Activated
        } else if self.state.needs_user_gesture {
            KioskPhase::AwaitingGesture
        } else {
            KioskPhase::Idle
        }
    }

    fn refresh_gesture_need(&mut self) {
        self.state.needs_user_gesture = (self.settings.auto_fullscreen
            && !self.state.fullscreen_active)
            || (self.settings.auto_audio && !self.state.audio_unlocked);
    }

    pub fn update_settings(&mut self, settings: &KioskSettings) {
        self.settings = settings.clone();
        self.refresh_gesture_need();
    }

    /// Handle a user gesture. Safe to call repeatedly: unlocked subsystems
    /// stay unlocked and are not requested again.
    pub fn activate(&mut self, platform: &mut dyn PlatformControls) -> ActivationReport {
        let fullscreen = self.activate_fullscreen(platform);
        let audio = self.activate_audio(platform);

        self.state.activated = true;
        self.refresh_gesture_need();

        let report = ActivationReport {
            fullscreen,
            audio,
            state: self.state,
        };
        if report.is_partial() {
            tracing::warn!(?report, "Kiosk activation partially blocked");
        } else {
            tracing::info!(state = ?report.state, "Kiosk activated");
        }
        report
    }

    fn activate_fullscreen(&mut self, platform: &mut dyn PlatformControls) -> StepOutcome {
        if !self.settings.auto_fullscreen {
            return StepOutcome::NotRequested;
        }
        if self.state.fullscreen_active || platform.is_fullscreen() {
            self.state.fullscreen_active = true;
            return StepOutcome::AlreadyActive;
        }
        match platform.request_fullscreen() {
            Ok(()) => {
                self.state.fullscreen_active = true;
                StepOutcome::Unlocked
            }
            Err(e) => StepOutcome::Denied(e.to_string()),
        }
    }

    fn activate_audio(&mut self, platform: &mut dyn PlatformControls) -> StepOutcome {
        if !self.settings.auto_audio {
            return StepOutcome::NotRequested;
        }
        if self.state.audio_unlocked {
            return StepOutcome::AlreadyActive;
        }
        let tone = Tone {
            frequency_hz: UNLOCK_TONE_HZ,
            duration: Duration::from_millis(UNLOCK_TONE_MS),
            volume: self.settings.unlock_tone_volume.clamp(0.0, 1.0),
        };
        match platform.unlock_audio(&tone) {
            Ok(()) => {
                self.state.audio_unlocked = true;
                StepOutcome::Unlocked
            }
            Err(e) => StepOutcome::Denied(e.to_string()),
        }
    }

    /// Platform notification that fullscreen was entered or left.
    pub fn on_fullscreen_changed(&mut self, active: bool) {
        self.state.fullscreen_active = active;
        self.refresh_gesture_need();
    }

    /// Platform notification that audio output is allowed without a gesture.
    pub fn on_audio_allowed(&mut self) {
        self.state.audio_unlocked = true;
        self.refresh_gesture_need();
    }

    /// Whether announcements may play.
    ///
    /// With auto-audio configured the unlock tone must have succeeded.
    /// Otherwise any handled gesture, or a platform that never blocked audio,
    /// is enough.
    pub fn audio_permitted(&self, platform_allows_audio: bool) -> bool {
        if self.state.audio_unlocked {
            return true;
        }
        if self.settings.auto_audio {
            return false;
        }
        self.state.activated || platform_allows_audio
    }
}
