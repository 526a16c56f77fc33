use std::time::Duration;

use queue_display_types::Scope;

use crate::announce::{Announcement, SuppressReason};
use crate::connectivity::{ConnectionStatus, ConnectivityState};
use crate::kiosk::{KioskPhase, KioskState};
use crate::reducer::DerivedQueueView;

/// Work the host must carry out after an engine call
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEffect {
    /// Deliver `DisplayEngine::on_retry_due(attempt, ..)` after `delay`
    ScheduleRetry { attempt: u32, delay: Duration },
    CancelRetry,
    /// Play the chime, wait `chime_delay`, then speak and report back with
    /// `DisplayEngine::on_announcement_issued`
    Announce(Announcement),
    /// Drop any announcement still waiting on its chime delay
    CancelAnnouncement,
}

/// Where the rendered queue comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewSource {
    /// Online, no feed delivery yet
    #[default]
    Waiting,
    Live(DerivedQueueView),
    /// Offline, showing the last valid snapshot
    Cached {
        view: DerivedQueueView,
        captured_at: i64,
    },
    /// Offline with no valid snapshot
    NoData,
}

impl ViewSource {
    pub fn view(&self) -> Option<&DerivedQueueView> {
        match self {
            ViewSource::Live(view) | ViewSource::Cached { view, .. } => Some(view),
            ViewSource::Waiting | ViewSource::NoData => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ViewSource::Cached { .. })
    }
}

/// Connection banner shown over the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Banner {
    #[default]
    None,
    Offline,
    /// "Reconnecting (attempt 3/10)"
    Reconnecting { attempt: u32, max: u32 },
    ReconnectFailed,
}

impl Banner {
    pub fn for_connectivity(state: ConnectivityState) -> Self {
        match state.status {
            ConnectionStatus::Online => Banner::None,
            ConnectionStatus::Offline => Banner::Offline,
            ConnectionStatus::Reconnecting => Banner::Reconnecting {
                attempt: state.attempt,
                max: ConnectivityState::MAX_ATTEMPTS,
            },
            ConnectionStatus::Failed => Banner::ReconnectFailed,
        }
    }
}

/// Everything a display renders
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub scope: Scope,
    pub view: ViewSource,
    pub connectivity: ConnectivityState,
    pub kiosk: KioskState,
    pub kiosk_phase: KioskPhase,
    pub banner: Banner,
    pub audio_enabled: bool,
    /// Why the last announcement check did not dispatch
    pub suppressed: Option<SuppressReason>,
    /// Last token whose speech call was issued for this scope
    pub announced_token: Option<String>,
}

impl DisplayState {
    pub fn current_token(&self) -> Option<&str> {
        self.view.view().and_then(DerivedQueueView::current_token)
    }
}
