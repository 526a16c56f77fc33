//! Offline snapshot cache
//!
//! Keeps the last known good feed state per display scope so a display can
//! keep showing something sensible while the network is down. The cache is
//! best effort: every storage failure is logged and treated as a miss.

mod error;
mod snapshot;
mod store;

pub use error::CacheError;
pub use snapshot::{CACHE_TTL_MS, CacheSnapshot};
pub use store::{CacheStore, FileCacheStore, MemoryCacheStore};

use std::sync::Arc;

use queue_display_types::{DisplaySettings, QueueEntry};

use crate::clock::Clock;

const KEY_PREFIX: &str = "queue-display-cache";

/// TTL-bounded snapshot cache over an injected store
#[derive(Clone)]
pub struct OfflineCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl OfflineCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn store_key(scope_key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, scope_key)
    }

    /// Replace the snapshot for `scope_key`. Returns whether it was written.
    pub fn save(&self, scope_key: &str, entries: &[QueueEntry], settings: &DisplaySettings) -> bool {
        let snapshot = CacheSnapshot::new(entries.to_vec(), settings.clone(), self.clock.now_ms());
        match self.write_snapshot(scope_key, &snapshot) {
            Ok(()) => {
                tracing::debug!(
                    scope = scope_key,
                    entries = snapshot.entries.len(),
                    "Saved offline snapshot"
                );
                true
            }
            Err(e) => {
                tracing::warn!(scope = scope_key, error = %e, "Failed to save offline snapshot");
                false
            }
        }
    }

    fn write_snapshot(&self, scope_key: &str, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let key = Self::store_key(scope_key);
        let json = serde_json::to_string(snapshot).map_err(|source| CacheError::Encode {
            key: key.clone(),
            source,
        })?;
        self.store.write(&key, &json)
    }

    /// Snapshot for `scope_key` if one exists and is younger than the TTL.
    ///
    /// Stale snapshots are left in place; the next save overwrites them.
    pub fn load(&self, scope_key: &str) -> Option<CacheSnapshot> {
        let snapshot = match self.read_snapshot(scope_key) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(scope = scope_key, error = %e, "Offline snapshot unavailable");
                return None;
            }
        };

        let now = self.clock.now_ms();
        if snapshot.is_valid_at(now) {
            Some(snapshot)
        } else {
            tracing::debug!(
                scope = scope_key,
                age_ms = snapshot.age_ms(now),
                "Ignoring expired offline snapshot"
            );
            None
        }
    }

    fn read_snapshot(&self, scope_key: &str) -> Result<Option<CacheSnapshot>, CacheError> {
        let key = Self::store_key(scope_key);
        let Some(raw) = self.store.read(&key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { key, source })
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

impl std::fmt::Debug for OfflineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use queue_display_types::QueueStatus;

    fn entry(token: &str) -> QueueEntry {
        QueueEntry {
            id: token.to_string(),
            token: token.to_string(),
            full_name: String::new(),
            department: "Lab".to_string(),
            priority: Default::default(),
            status: QueueStatus::Called,
            created_at: 0,
        }
    }

    fn cache_at(start: i64) -> (OfflineCache, MemoryCacheStore, ManualClock) {
        let store = MemoryCacheStore::new();
        let clock = ManualClock::new(start);
        let cache = OfflineCache::new(Arc::new(store.clone()), Arc::new(clock.clone()));
        (cache, store, clock)
    }

    #[test]
    fn load_respects_ttl_boundary() {
        let (cache, _, clock) = cache_at(10_000);
        assert!(cache.save("lab", &[entry("A0")], &DisplaySettings::default()));

        clock.set(10_000 + 599_999);
        assert_eq!(cache.load("lab").unwrap().entries[0].token, "A0");

        clock.set(10_000 + 600_001);
        assert!(cache.load("lab").is_none());
    }

    #[test]
    fn stale_snapshot_is_kept_until_overwritten() {
        let (cache, store, clock) = cache_at(0);
        cache.save("lab", &[entry("A0")], &DisplaySettings::default());
        clock.set(CACHE_TTL_MS + 1);
        assert!(cache.load("lab").is_none());
        assert_eq!(store.len(), 1);

        cache.save("lab", &[entry("A1")], &DisplaySettings::default());
        assert_eq!(cache.load("lab").unwrap().entries[0].token, "A1");
    }

    #[test]
    fn scopes_do_not_share_snapshots() {
        let (cache, _, _) = cache_at(0);
        cache.save("dept:Lab", &[entry("L1")], &DisplaySettings::default());
        assert!(cache.load("dept:Pharmacy").is_none());
        assert_eq!(cache.load("dept:Lab").unwrap().entries[0].token, "L1");
    }

    #[test]
    fn corrupt_json_is_a_miss() {
        let (cache, store, _) = cache_at(0);
        store
            .write(&OfflineCache::store_key("lab"), "{not json")
            .unwrap();
        assert!(cache.load("lab").is_none());
    }

    #[test]
    fn tampered_timestamp_is_a_miss() {
        let (cache, store, _) = cache_at(1_000);
        let key = OfflineCache::store_key("lab");
        store
            .write(&key, r#"{"entries":[],"settings":{},"timestamp":-9223372036854775808}"#)
            .unwrap();
        assert!(cache.load("lab").is_none());

        store
            .write(&key, r#"{"entries":[],"settings":{},"timestamp":9223372036854775807}"#)
            .unwrap();
        assert!(cache.load("lab").is_none());
    }

    #[test]
    fn quota_errors_are_swallowed() {
        let store = MemoryCacheStore::with_quota(16);
        let cache = OfflineCache::new(Arc::new(store.clone()), Arc::new(ManualClock::new(0)));
        assert!(!cache.save("lab", &[entry("A0")], &DisplaySettings::default()));
        assert!(cache.load("lab").is_none());
        assert!(store.is_empty());
    }
}
