//! Display engine
//!
//! Single-threaded core of one queue display. Every input (feed delivery,
//! settings update, platform event, timer expiry, user gesture) is a method
//! call that updates `DisplayState` and returns the `EngineEffect`s the host
//! must perform. The engine owns no timers or tasks itself; see
//! `crate::service` for the tokio host.

mod error;
mod state;

#[cfg(test)]
mod engine_tests;

pub use error::EngineError;
pub use state::{Banner, DisplayState, EngineEffect, ViewSource};

use queue_display_types::{DisplaySettings, QueueEntry, Scope};

use crate::announce::{AnnounceDecision, AnnouncementScheduler, SuppressReason};
use crate::cache::{CacheSnapshot, OfflineCache};
use crate::config::ConfigProvider;
use crate::connectivity::{ConnectivityAction, ConnectivityMonitor};
use crate::events::PlatformEvent;
use crate::kiosk::{ActivationReport, KioskController, PlatformControls};
use crate::reducer::reduce;

pub struct DisplayEngine {
    scope: Scope,
    scope_key: String,

    settings: DisplaySettings,
    /// Settings have arrived from the feed this session
    settings_from_feed: bool,
    /// Last complete feed delivery, unfiltered
    live_entries: Option<Vec<QueueEntry>>,

    cache: OfflineCache,
    /// Snapshot loaded when the connection dropped
    cached: Option<CacheSnapshot>,
    cached_mode: bool,

    connectivity: ConnectivityMonitor,
    kiosk: KioskController,
    scheduler: AnnouncementScheduler,
    platform_allows_audio: bool,

    state: DisplayState,
    disposed: bool,
}

impl DisplayEngine {
    pub fn new(
        scope: Scope,
        config: &dyn ConfigProvider,
        cache: OfflineCache,
        platform_online: bool,
        platform_allows_audio: bool,
    ) -> Result<Self, EngineError> {
        if let Scope::Department(name) = &scope
            && name.trim().is_empty()
        {
            return Err(EngineError::MissingScopeKey);
        }

        let settings = config.settings();
        let kiosk = KioskController::new(&settings.kiosk);
        let connectivity = ConnectivityMonitor::new(platform_online);
        let scheduler = AnnouncementScheduler::new();

        let state = DisplayState {
            scope: scope.clone(),
            view: ViewSource::Waiting,
            connectivity: connectivity.state(),
            kiosk: kiosk.state(),
            kiosk_phase: kiosk.phase(),
            banner: Banner::for_connectivity(connectivity.state()),
            audio_enabled: scheduler.audio_enabled(),
            suppressed: None,
            announced_token: None,
        };

        Ok(Self {
            scope_key: scope.cache_key(),
            scope,
            settings,
            settings_from_feed: false,
            live_entries: None,
            cache,
            cached: None,
            cached_mode: false,
            connectivity,
            kiosk,
            scheduler,
            platform_allows_audio,
            state,
            disposed: false,
        })
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    /// Settings in effect for live rendering and announcements
    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Start the display. A display that starts offline goes straight to
    /// cached mode and begins reconnecting.
    pub fn init(&mut self) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        tracing::info!(scope = %self.scope, online = self.connectivity.state().is_online(), "Display starting");
        let actions = self.connectivity.start();
        let mut effects = self.apply_connectivity(actions);
        effects.extend(self.refresh());
        effects
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Feed Inputs
    // ─────────────────────────────────────────────────────────────────────────

    /// A complete delivery from the queue feed.
    pub fn on_entries(&mut self, entries: Vec<QueueEntry>) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        tracing::trace!(count = entries.len(), "Feed delivery");
        self.live_entries = Some(entries);
        self.refresh()
    }

    /// A complete settings map from the settings feed.
    pub fn on_settings(&mut self, settings: DisplaySettings) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        self.kiosk.update_settings(&settings.kiosk);
        self.settings = settings;
        self.settings_from_feed = true;
        self.refresh()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Platform and Timer Inputs
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_platform(&mut self, event: PlatformEvent) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        let mut effects = match event {
            PlatformEvent::Online => {
                let actions = self.connectivity.platform_online();
                self.apply_connectivity(actions)
            }
            PlatformEvent::Offline => {
                let actions = self.connectivity.platform_offline();
                self.apply_connectivity(actions)
            }
            PlatformEvent::FullscreenChanged(active) => {
                self.kiosk.on_fullscreen_changed(active);
                Vec::new()
            }
            PlatformEvent::AudioAllowed => {
                self.platform_allows_audio = true;
                self.kiosk.on_audio_allowed();
                Vec::new()
            }
        };
        effects.extend(self.refresh());
        effects
    }

    /// The retry timer scheduled for `attempt` fired.
    pub fn on_retry_due(&mut self, attempt: u32, probe_online: bool) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        let actions = self.connectivity.retry_due(attempt, probe_online);
        let mut effects = self.apply_connectivity(actions);
        effects.extend(self.refresh());
        effects
    }

    /// Periodic snapshot maintenance.
    ///
    /// Online with live data the snapshot is re-saved so a quiet feed does not
    /// let it expire. In cached mode the loaded snapshot is re-validated and
    /// dropped once it passes the TTL.
    pub fn on_cache_tick(&mut self) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        if self.cached_mode {
            let now = self.cache.now_ms();
            if let Some(snapshot) = &self.cached
                && !snapshot.is_valid_at(now)
            {
                tracing::info!(
                    scope = %self.scope,
                    age_ms = snapshot.age_ms(now),
                    "Offline snapshot expired"
                );
                self.cached = None;
            }
        } else if self.connectivity.state().is_online() {
            self.save_snapshot();
        }
        self.refresh()
    }

    fn save_snapshot(&self) {
        let Some(entries) = &self.live_entries else {
            return;
        };
        let scoped: Vec<QueueEntry> = entries
            .iter()
            .filter(|e| self.scope.matches(e))
            .cloned()
            .collect();
        self.cache.save(&self.scope_key, &scoped, &self.settings);
    }

    fn apply_connectivity(&mut self, actions: Vec<ConnectivityAction>) -> Vec<EngineEffect> {
        let mut effects = Vec::new();
        for action in actions {
            match action {
                ConnectivityAction::EnterCachedMode => {
                    self.cached_mode = true;
                    self.cached = self.cache.load(&self.scope_key);
                    match &self.cached {
                        Some(snapshot) => tracing::info!(
                            scope = %self.scope,
                            entries = snapshot.entries.len(),
                            captured_at = snapshot.timestamp,
                            "Showing cached queue"
                        ),
                        None => tracing::warn!(scope = %self.scope, "No offline snapshot available"),
                    }
                }
                ConnectivityAction::ScheduleRetry { attempt, delay } => {
                    effects.push(EngineEffect::ScheduleRetry { attempt, delay });
                }
                ConnectivityAction::CancelRetry => effects.push(EngineEffect::CancelRetry),
                ConnectivityAction::Resync => {
                    self.cached_mode = false;
                    self.cached = None;
                    self.save_snapshot();
                }
                ConnectivityAction::GiveUp => {}
            }
        }
        effects
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Announcements and Kiosk
    // ─────────────────────────────────────────────────────────────────────────

    /// The speech call for `token` was issued by the host.
    pub fn on_announcement_issued(&mut self, scope_key: &str, token: &str) -> Vec<EngineEffect> {
        self.scheduler.confirm_issued(scope_key, token);
        if self.disposed {
            return Vec::new();
        }
        self.refresh()
    }

    /// A dispatched announcement never reached its speech call.
    pub fn on_announcement_cancelled(
        &mut self,
        scope_key: &str,
        token: &str,
    ) -> Vec<EngineEffect> {
        self.scheduler.abandon(scope_key, token);
        if self.disposed {
            return Vec::new();
        }
        self.refresh()
    }

    /// Handle a user gesture on a kiosk display.
    pub fn activate_kiosk(
        &mut self,
        platform: &mut dyn PlatformControls,
    ) -> (ActivationReport, Vec<EngineEffect>) {
        let report = self.kiosk.activate(platform);
        let effects = if self.disposed {
            Vec::new()
        } else {
            self.refresh()
        };
        (report, effects)
    }

    /// Display audio toggle. Muting cancels every pending announcement.
    pub fn set_audio_enabled(&mut self, enabled: bool) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        self.scheduler.set_audio_enabled(enabled);
        let mut effects = Vec::new();
        if !enabled && !self.scheduler.abandon_all(&self.scope_key).is_empty() {
            effects.push(EngineEffect::CancelAnnouncement);
        }
        effects.extend(self.refresh());
        effects
    }

    /// Tear the display down. Pending timers and announcements must be
    /// cancelled by the host; later inputs are ignored.
    pub fn dispose(&mut self) -> Vec<EngineEffect> {
        if self.disposed {
            return Vec::new();
        }
        self.disposed = true;
        self.scheduler.abandon_all(&self.scope_key);
        tracing::info!(scope = %self.scope, "Display disposed");
        vec![EngineEffect::CancelRetry, EngineEffect::CancelAnnouncement]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn render_view(&self) -> ViewSource {
        if self.cached_mode {
            let Some(snapshot) = &self.cached else {
                return ViewSource::NoData;
            };
            let settings = if self.settings_from_feed {
                &self.settings
            } else {
                &snapshot.settings
            };
            return ViewSource::Cached {
                view: reduce(&snapshot.entries, &self.scope, settings.upcoming_limit),
                captured_at: snapshot.timestamp,
            };
        }
        match &self.live_entries {
            Some(entries) => {
                ViewSource::Live(reduce(entries, &self.scope, self.settings.upcoming_limit))
            }
            None => ViewSource::Waiting,
        }
    }

    /// Recompute the display state and evaluate the announcement rule.
    fn refresh(&mut self) -> Vec<EngineEffect> {
        let view = self.render_view();
        let mut effects = Vec::new();

        let suppressed = match &view {
            ViewSource::Live(live) => {
                let permitted = self.kiosk.audio_permitted(self.platform_allows_audio);
                match self
                    .scheduler
                    .maybe_announce(live, &self.scope_key, &self.settings, permitted)
                {
                    AnnounceDecision::Dispatched(announcement) => {
                        effects.push(EngineEffect::Announce(announcement));
                        None
                    }
                    AnnounceDecision::Suppressed(reason) => Some(reason),
                }
            }
            ViewSource::Cached { .. } => Some(SuppressReason::CachedData),
            ViewSource::Waiting | ViewSource::NoData => Some(SuppressReason::NothingServing),
        };

        let connectivity = self.connectivity.state();
        self.state = DisplayState {
            scope: self.scope.clone(),
            view,
            connectivity,
            kiosk: self.kiosk.state(),
            kiosk_phase: self.kiosk.phase(),
            banner: Banner::for_connectivity(connectivity),
            audio_enabled: self.scheduler.audio_enabled(),
            suppressed,
            announced_token: self
                .scheduler
                .record()
                .last_announced(&self.scope_key)
                .map(str::to_string),
        };
        effects
    }
}

impl std::fmt::Debug for DisplayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayEngine")
            .field("scope", &self.scope)
            .field("cached_mode", &self.cached_mode)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
