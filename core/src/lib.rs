pub mod announce;
pub mod audio;
pub mod cache;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod events;
pub mod kiosk;
pub mod reducer;
pub mod service;

// Re-exports for convenience
pub use announce::{AnnounceDecision, Announcement, AnnouncementScheduler, SuppressReason};
pub use audio::{AudioEvent, AudioService, SpeechSink, create_audio_channel};
pub use cache::{CACHE_TTL_MS, CacheSnapshot, CacheStore, FileCacheStore, OfflineCache};
pub use clock::{Clock, SystemClock};
pub use config::{ConfigProvider, EngineConfig, EngineConfigExt, StaticConfigProvider};
pub use connectivity::{ConnectionStatus, ConnectivityProbe, ConnectivityState, PlatformFlag};
pub use engine::{Banner, DisplayEngine, DisplayState, EngineEffect, EngineError, ViewSource};
pub use events::PlatformEvent;
pub use kiosk::{ActivationReport, KioskController, KioskPhase, PlatformControls};
pub use reducer::{DerivedQueueView, StatusCounts, reduce};
pub use service::{DisplayService, ServiceHandle};

pub use queue_display_types as types;
