//! Network connectivity tracking and bounded reconnect
//!
//! - **Monitor**: explicit state machine over platform online/offline events
//! - **Backoff**: retry delay policy (doubling, capped, ten attempts)
//! - **Probe**: what the reconnect timer consults when it fires

mod backoff;
mod monitor;

pub use backoff::{MAX_RECONNECT_ATTEMPTS, backoff_delay};
pub use monitor::{ConnectionStatus, ConnectivityAction, ConnectivityMonitor, ConnectivityState};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers "is the network reachable right now?" when a retry timer fires.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Probe that reflects the last connectivity the platform reported.
#[derive(Debug, Clone)]
pub struct PlatformFlag {
    online: Arc<AtomicBool>,
}

impl PlatformFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityProbe for PlatformFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
