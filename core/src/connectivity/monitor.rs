//! Connectivity state machine
//!
//! Online → Reconnecting (retry timer armed) → Online, or → Failed once the
//! retry budget is spent. Failed is left only when the platform itself
//! reports that the network is back.

use std::time::Duration;

use super::backoff::{MAX_RECONNECT_ATTEMPTS, backoff_delay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Online,
    /// Offline at startup, before the reconnect loop has started
    Offline,
    Reconnecting,
    /// Retry budget exhausted
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectivityState {
    pub status: ConnectionStatus,
    /// Retries scheduled since the connection was lost
    pub attempt: u32,
}

impl ConnectivityState {
    pub const MAX_ATTEMPTS: u32 = MAX_RECONNECT_ATTEMPTS;

    pub fn is_online(&self) -> bool {
        self.status == ConnectionStatus::Online
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityAction {
    /// Switch the display to the offline snapshot
    EnterCachedMode,
    /// Arm the retry timer; deliver `retry_due(attempt)` after `delay`
    ScheduleRetry { attempt: u32, delay: Duration },
    /// Disarm any pending retry timer
    CancelRetry,
    /// Back online: leave cached mode and push a fresh snapshot
    Resync,
    /// Stop retrying until the platform reports online
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    state: ConnectivityState,
    /// Attempt number of the armed retry timer
    pending: Option<u32>,
}

impl ConnectivityMonitor {
    /// Initial status mirrors what the platform reports at startup.
    pub fn new(platform_online: bool) -> Self {
        let status = if platform_online {
            ConnectionStatus::Online
        } else {
            ConnectionStatus::Offline
        };
        Self {
            state: ConnectivityState { status, attempt: 0 },
            pending: None,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Begin reconnecting if the display started offline.
    pub fn start(&mut self) -> Vec<ConnectivityAction> {
        if self.state.status == ConnectionStatus::Offline {
            self.begin_reconnect()
        } else {
            Vec::new()
        }
    }

    pub fn platform_offline(&mut self) -> Vec<ConnectivityAction> {
        match self.state.status {
            ConnectionStatus::Online | ConnectionStatus::Offline => self.begin_reconnect(),
            ConnectionStatus::Reconnecting | ConnectionStatus::Failed => Vec::new(),
        }
    }

    pub fn platform_online(&mut self) -> Vec<ConnectivityAction> {
        if self.state.status == ConnectionStatus::Online {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(2);
        if self.pending.take().is_some() {
            actions.push(ConnectivityAction::CancelRetry);
        }
        tracing::info!(after_attempts = self.state.attempt, "Connection restored");
        self.state = ConnectivityState {
            status: ConnectionStatus::Online,
            attempt: 0,
        };
        actions.push(ConnectivityAction::Resync);
        actions
    }

    /// The retry timer for `attempt` fired; `probe_online` is the platform's current view.
    pub fn retry_due(&mut self, attempt: u32, probe_online: bool) -> Vec<ConnectivityAction> {
        if self.state.status != ConnectionStatus::Reconnecting || self.pending != Some(attempt) {
            tracing::debug!(attempt, "Ignoring stale reconnect timer");
            return Vec::new();
        }
        self.pending = None;

        if probe_online {
            return self.platform_online();
        }

        if self.state.attempt >= MAX_RECONNECT_ATTEMPTS {
            tracing::warn!(attempts = self.state.attempt, "Reconnection failed, giving up");
            self.state.status = ConnectionStatus::Failed;
            return vec![ConnectivityAction::GiveUp];
        }

        vec![self.schedule_next()]
    }

    fn begin_reconnect(&mut self) -> Vec<ConnectivityAction> {
        tracing::warn!("Connection lost, entering cached mode");
        self.state = ConnectivityState {
            status: ConnectionStatus::Reconnecting,
            attempt: 0,
        };
        vec![ConnectivityAction::EnterCachedMode, self.schedule_next()]
    }

    fn schedule_next(&mut self) -> ConnectivityAction {
        let attempt = self.state.attempt;
        let delay = backoff_delay(attempt);
        self.state.attempt += 1;
        self.pending = Some(attempt);
        tracing::info!(
            attempt = attempt + 1,
            max = MAX_RECONNECT_ATTEMPTS,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        ConnectivityAction::ScheduleRetry { attempt, delay }
    }
}
