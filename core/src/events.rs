//! Normalized platform events
//!
//! Host-specific notifications (network status, fullscreen changes, autoplay
//! policy) are translated into this enum before they reach the engine.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// Network reported reachable
    Online,
    /// Network reported unreachable
    Offline,
    /// Fullscreen entered (`true`) or left (`false`)
    FullscreenChanged(bool),
    /// Audio output may start without a user gesture
    AudioAllowed,
}
