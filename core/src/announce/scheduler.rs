use std::fmt;
use std::time::Duration;

use queue_display_types::{DisplaySettings, QueueStatus};

use super::record::AnnouncementRecord;
use super::template::{TemplateVars, expand_template};
use crate::audio::{Tone, Utterance};
use crate::reducer::DerivedQueueView;

/// Why an announcement was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Display audio toggle is off
    AudioDisabled,
    /// Voice announcements are off in settings
    VoiceDisabled,
    NothingServing,
    /// Current entry is Served, not Called
    NotCalled,
    AlreadyAnnounced,
    /// Same token is waiting on its chime delay
    InFlight,
    /// Audio is still locked behind a user gesture
    AwaitingGesture,
    /// View comes from the offline snapshot
    CachedData,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SuppressReason::AudioDisabled => "audio disabled",
            SuppressReason::VoiceDisabled => "voice announcements disabled",
            SuppressReason::NothingServing => "nothing being served",
            SuppressReason::NotCalled => "current entry not in Called state",
            SuppressReason::AlreadyAnnounced => "token already announced",
            SuppressReason::InFlight => "announcement already pending",
            SuppressReason::AwaitingGesture => "waiting for user gesture",
            SuppressReason::CachedData => "showing cached data",
        };
        f.write_str(text)
    }
}

/// A chime+speech sequence ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub scope_key: String,
    pub token: String,
    /// Played first when chimes are enabled
    pub chime: Option<Tone>,
    /// Wait between the chime and the speech (zero without a chime)
    pub chime_delay: Duration,
    pub speech: Utterance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnounceDecision {
    Dispatched(Announcement),
    Suppressed(SuppressReason),
}

impl AnnounceDecision {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, AnnounceDecision::Dispatched(_))
    }
}

/// Decides when the current token is spoken, at most once per token.
#[derive(Debug, Clone)]
pub struct AnnouncementScheduler {
    record: AnnouncementRecord,
    audio_enabled: bool,
}

impl Default for AnnouncementScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnouncementScheduler {
    pub fn new() -> Self {
        Self {
            record: AnnouncementRecord::new(),
            audio_enabled: true,
        }
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn record(&self) -> &AnnouncementRecord {
        &self.record
    }

    /// Dispatch an announcement for the current entry if every condition holds.
    ///
    /// `audio_permitted` is true once the kiosk gesture has unlocked audio, or
    /// when the platform never blocked it.
    pub fn maybe_announce(
        &mut self,
        view: &DerivedQueueView,
        scope_key: &str,
        settings: &DisplaySettings,
        audio_permitted: bool,
    ) -> AnnounceDecision {
        match self.check(view, scope_key, settings, audio_permitted) {
            Err(reason) => AnnounceDecision::Suppressed(reason),
            Ok(()) => {
                // check() guarantees an entry is present
                let Some(entry) = view.current_serving.as_ref() else {
                    return AnnounceDecision::Suppressed(SuppressReason::NothingServing);
                };
                let announcement = build_announcement(scope_key, entry, settings);
                self.record.mark_in_flight(scope_key, &entry.token);
                tracing::debug!(scope = scope_key, token = %entry.token, "Dispatching announcement");
                AnnounceDecision::Dispatched(announcement)
            }
        }
    }

    fn check(
        &self,
        view: &DerivedQueueView,
        scope_key: &str,
        settings: &DisplaySettings,
        audio_permitted: bool,
    ) -> Result<(), SuppressReason> {
        if !self.audio_enabled {
            return Err(SuppressReason::AudioDisabled);
        }
        if !settings.audio.voice_enabled {
            return Err(SuppressReason::VoiceDisabled);
        }
        let entry = view
            .current_serving
            .as_ref()
            .ok_or(SuppressReason::NothingServing)?;
        if entry.status != QueueStatus::Called {
            return Err(SuppressReason::NotCalled);
        }
        if self.record.last_announced(scope_key) == Some(entry.token.as_str()) {
            return Err(SuppressReason::AlreadyAnnounced);
        }
        if self.record.is_in_flight(scope_key, &entry.token) {
            return Err(SuppressReason::InFlight);
        }
        if !audio_permitted {
            return Err(SuppressReason::AwaitingGesture);
        }
        Ok(())
    }

    /// The speech call for `token` has been issued; commit it.
    pub fn confirm_issued(&mut self, scope_key: &str, token: &str) {
        self.record.commit(scope_key, token);
    }

    /// A dispatched announcement was cancelled before its speech call.
    pub fn abandon(&mut self, scope_key: &str, token: &str) {
        if self.record.abandon(scope_key, token) {
            tracing::debug!(scope = scope_key, token, "Abandoned pending announcement");
        }
    }

    /// Every pending announcement for `scope_key` was cancelled. Returns the
    /// abandoned tokens, oldest dispatch first.
    pub fn abandon_all(&mut self, scope_key: &str) -> Vec<String> {
        let tokens = self.record.abandon_all(scope_key);
        if !tokens.is_empty() {
            tracing::debug!(scope = scope_key, ?tokens, "Abandoned pending announcements");
        }
        tokens
    }
}

fn build_announcement(
    scope_key: &str,
    entry: &queue_display_types::QueueEntry,
    settings: &DisplaySettings,
) -> Announcement {
    let audio = &settings.audio;
    let volume = f32::from(audio.volume.min(100)) / 100.0;

    let message = expand_template(
        &settings.announcement_template,
        &TemplateVars {
            number: &entry.token,
            department: &entry.department,
            hospital_name: &settings.hospital_name,
            room: &settings.room,
        },
    );

    let (chime, chime_delay) = if audio.chime_enabled {
        let tone = Tone {
            frequency_hz: audio.chime_frequency_hz,
            duration: Duration::from_millis(audio.chime_duration_ms),
            volume,
        };
        (Some(tone), Duration::from_millis(audio.chime_delay_ms))
    } else {
        (None, Duration::ZERO)
    };

    Announcement {
        scope_key: scope_key.to_string(),
        token: entry.token.clone(),
        chime,
        chime_delay,
        speech: Utterance {
            text: message,
            rate: audio.voice_rate,
            pitch: audio.voice_pitch,
            volume,
            voice: audio.voice_name.clone(),
        },
    }
}
