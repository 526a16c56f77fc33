//! Backing storage for offline snapshots
//!
//! A store holds one serialized snapshot per key. Stores are shared between
//! display instances; each display writes under its own scope key.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use super::error::CacheError;

/// Key-value storage for serialized snapshots
pub trait CacheStore: Send + Sync {
    /// Read the raw value for `key`. A missing key is `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Replace the value for `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store
// ─────────────────────────────────────────────────────────────────────────────

/// One JSON file per key inside a cache directory
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.cache/queue-display` on Linux, platform equivalent elsewhere
    pub fn default_location() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join("queue-display")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("snapshot-{}.json", encode_key(key)))
    }
}

/// Map a key to a file-name-safe string. Distinct keys stay distinct.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

impl CacheStore for FileCacheStore {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        // Write beside the target and rename so readers never see a partial file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| CacheError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| CacheError::Write { path, source })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store
// ─────────────────────────────────────────────────────────────────────────────

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    /// Total bytes allowed across all values (None = unlimited)
    quota: Option<usize>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `quota` bytes are in use
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                values: HashMap::new(),
                quota: Some(quota),
            })),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, CacheError> {
        self.inner.lock().map_err(|_| CacheError::Unavailable {
            reason: "memory store lock poisoned".to_string(),
        })
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut inner = self.lock()?;
        if let Some(quota) = inner.quota {
            let used: usize = inner
                .values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(CacheError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path().join("cache"));

        assert!(store.read("dept:Lab").unwrap().is_none());
        store.write("dept:Lab", "{\"a\":1}").unwrap();
        store.write("dept:Lab", "{\"a\":2}").unwrap();
        assert_eq!(store.read("dept:Lab").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(store.read("all").unwrap().is_none());
    }

    #[test]
    fn encoded_keys_do_not_collide() {
        assert_ne!(encode_key("dept:Lab"), encode_key("dept_Lab"));
        assert_ne!(encode_key("a/b"), encode_key("a_b"));
        assert_eq!(encode_key("all"), "all");
    }

    #[test]
    fn memory_store_enforces_quota() {
        let store = MemoryCacheStore::with_quota(8);
        store.write("a", "1234").unwrap();
        // Overwriting the same key reuses its space
        store.write("a", "12345678").unwrap();
        let err = store.write("b", "1").unwrap_err();
        assert!(matches!(err, CacheError::QuotaExceeded { .. }));
        assert_eq!(store.len(), 1);
    }
}
