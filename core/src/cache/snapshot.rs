use queue_display_types::{DisplaySettings, QueueEntry};
use serde::{Deserialize, Serialize};

/// Maximum age at which a cached snapshot may be shown (10 minutes).
pub const CACHE_TTL_MS: i64 = 600_000;

/// Last known good feed state for one display scope.
///
/// Snapshots are replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub entries: Vec<QueueEntry>,
    pub settings: DisplaySettings,
    /// Capture time (epoch milliseconds)
    pub timestamp: i64,
}

impl CacheSnapshot {
    pub fn new(entries: Vec<QueueEntry>, settings: DisplaySettings, timestamp: i64) -> Self {
        Self {
            entries,
            settings,
            timestamp,
        }
    }

    /// Saturates on timestamps far outside the clock's range.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    /// A snapshot is usable strictly before it reaches the TTL. Snapshots
    /// stamped in the future are never usable.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        (0..CACHE_TTL_MS).contains(&self.age_ms(now_ms))
    }
}
