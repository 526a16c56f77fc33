//! Shared queue and settings types for the queue display engine
//!
//! This crate contains the serializable records exchanged with the live feed,
//! the settings feed and the offline cache. It is shared between the engine
//! (queue-display-core) and the operator console.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Queue Records
// ─────────────────────────────────────────────────────────────────────────────

/// Ticket priority as set by the issuing desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    #[serde(alias = "normal")]
    Normal,
    #[serde(alias = "emergency")]
    Emergency,
}

/// Lifecycle of a queue entry in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueueStatus {
    #[default]
    #[serde(alias = "waiting")]
    Waiting,
    #[serde(alias = "called")]
    Called,
    #[serde(alias = "served")]
    Served,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "skipped")]
    Skipped,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        QueueStatus::Waiting,
        QueueStatus::Called,
        QueueStatus::Served,
        QueueStatus::Completed,
        QueueStatus::Skipped,
    ];

    /// Called or Served: the entry occupies a service point.
    pub fn is_serving(&self) -> bool {
        matches!(self, QueueStatus::Called | QueueStatus::Served)
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "Waiting",
            QueueStatus::Called => "Called",
            QueueStatus::Served => "Served",
            QueueStatus::Completed => "Completed",
            QueueStatus::Skipped => "Skipped",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One ticket as delivered by the live feed.
///
/// Owned by the remote store; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    #[serde(default)]
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, alias = "dept")]
    pub department: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: QueueStatus,
    /// Ticket creation time (epoch milliseconds)
    #[serde(default)]
    pub created_at: i64,
}

impl QueueEntry {
    pub fn is_emergency(&self) -> bool {
        self.priority == Priority::Emergency
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Scope
// ─────────────────────────────────────────────────────────────────────────────

/// The department (or all departments) a display instance is filtered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,
    Department(String),
}

impl Scope {
    /// Parse a display route parameter. `"all"` (any case) or blank means every department.
    pub fn parse(param: &str) -> Self {
        let trimmed = param.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Scope::All
        } else {
            Scope::Department(trimmed.to_string())
        }
    }

    pub fn matches(&self, entry: &QueueEntry) -> bool {
        match self {
            Scope::All => true,
            Scope::Department(name) => entry.department == *name,
        }
    }

    /// Storage key for this scope's cache snapshot and announcement record.
    pub fn cache_key(&self) -> String {
        match self {
            Scope::All => "all".to_string(),
            Scope::Department(name) => format!("dept:{}", name),
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Department(name) => Some(name),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Department(name) => f.write_str(name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Settings
// ─────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_template() -> String {
    "Token {number}, please proceed to {department}".to_string()
}

fn default_upcoming_limit() -> usize {
    5
}

fn default_chime_delay_ms() -> u64 {
    1500
}

fn default_chime_frequency() -> f32 {
    880.0
}

fn default_chime_duration_ms() -> u64 {
    600
}

fn default_volume() -> u8 {
    80
}

fn default_voice_factor() -> f32 {
    1.0
}

fn default_unlock_tone_volume() -> f32 {
    0.01
}

/// Voice and chime parameters for announcements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    /// Speak the announcement template when a token is called
    #[serde(default = "default_true")]
    pub voice_enabled: bool,

    /// Play a chime before speaking
    #[serde(default = "default_true")]
    pub chime_enabled: bool,

    /// Gap between the chime starting and speech starting
    #[serde(default = "default_chime_delay_ms")]
    pub chime_delay_ms: u64,

    #[serde(default = "default_chime_frequency")]
    pub chime_frequency_hz: f32,

    #[serde(default = "default_chime_duration_ms")]
    pub chime_duration_ms: u64,

    /// Volume level (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,

    #[serde(default = "default_voice_factor")]
    pub voice_rate: f32,

    #[serde(default = "default_voice_factor")]
    pub voice_pitch: f32,

    /// Preferred synthesis voice, platform default when absent
    #[serde(default)]
    pub voice_name: Option<String>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice_enabled: true,
            chime_enabled: true,
            chime_delay_ms: default_chime_delay_ms(),
            chime_frequency_hz: default_chime_frequency(),
            chime_duration_ms: default_chime_duration_ms(),
            volume: default_volume(),
            voice_rate: 1.0,
            voice_pitch: 1.0,
            voice_name: None,
        }
    }
}

/// Unattended-display behaviour that browsers gate behind a user gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskSettings {
    #[serde(default)]
    pub auto_fullscreen: bool,
    #[serde(default)]
    pub auto_audio: bool,
    /// Gain of the tone used to unlock audio output (0.0-1.0)
    #[serde(default = "default_unlock_tone_volume")]
    pub unlock_tone_volume: f32,
}

impl Default for KioskSettings {
    fn default() -> Self {
        Self {
            auto_fullscreen: false,
            auto_audio: false,
            unlock_tone_volume: default_unlock_tone_volume(),
        }
    }
}

impl KioskSettings {
    pub fn requires_gesture(&self) -> bool {
        self.auto_fullscreen || self.auto_audio
    }
}

/// Configuration map pushed by the settings feed.
///
/// Every field has a default so partial maps deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    #[serde(default)]
    pub hospital_name: String,

    /// Room or counter label spoken in announcements
    #[serde(default)]
    pub room: String,

    #[serde(default = "default_template")]
    pub announcement_template: String,

    /// Maximum number of upcoming tokens shown
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: usize,

    #[serde(default)]
    pub audio: AudioSettings,

    #[serde(default)]
    pub kiosk: KioskSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            hospital_name: String::new(),
            room: String::new(),
            announcement_template: default_template(),
            upcoming_limit: default_upcoming_limit(),
            audio: AudioSettings::default(),
            kiosk: KioskSettings::default(),
        }
    }
}
