//! Engine scenario tests
//!
//! Drive a `DisplayEngine` through feed, platform and timer inputs with an
//! in-memory cache and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use queue_display_types::{DisplaySettings, KioskSettings, Priority, QueueEntry, QueueStatus, Scope};

use crate::announce::SuppressReason;
use crate::cache::{CACHE_TTL_MS, MemoryCacheStore, OfflineCache};
use crate::clock::ManualClock;
use crate::config::StaticConfigProvider;
use crate::connectivity::ConnectionStatus;
use crate::events::PlatformEvent;
use crate::kiosk::{KioskError, PlatformControls};

use super::{Banner, DisplayEngine, EngineError, EngineEffect, ViewSource};

const NOW: i64 = 1_700_000_000_000;

fn entry(token: &str, status: QueueStatus, dept: &str, created_at: i64) -> QueueEntry {
    QueueEntry {
        id: format!("id-{token}"),
        token: token.to_string(),
        full_name: String::new(),
        department: dept.to_string(),
        priority: Priority::Normal,
        status,
        created_at,
    }
}

fn called(token: &str) -> QueueEntry {
    entry(token, QueueStatus::Called, "Lab", 0)
}

struct Harness {
    engine: DisplayEngine,
    cache: OfflineCache,
    store: MemoryCacheStore,
    clock: ManualClock,
}

fn harness_with(settings: DisplaySettings, online: bool) -> Harness {
    let store = MemoryCacheStore::new();
    let clock = ManualClock::new(NOW);
    let cache = OfflineCache::new(Arc::new(store.clone()), Arc::new(clock.clone()));
    let engine = DisplayEngine::new(
        Scope::Department("Lab".to_string()),
        &StaticConfigProvider::new(settings),
        cache.clone(),
        online,
        true,
    )
    .expect("valid scope");
    Harness {
        engine,
        cache,
        store,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(DisplaySettings::default(), true)
}

fn announced_tokens(effects: &[EngineEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            EngineEffect::Announce(a) => Some(a.token.clone()),
            _ => None,
        })
        .collect()
}

/// Stand-in for the host: report every dispatched announcement as issued
fn issue_all(engine: &mut DisplayEngine, effects: &[EngineEffect]) {
    for effect in effects {
        if let EngineEffect::Announce(a) = effect {
            engine.on_announcement_issued(&a.scope_key, &a.token);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn empty_department_is_rejected() {
    let cache = OfflineCache::new(
        Arc::new(MemoryCacheStore::new()),
        Arc::new(ManualClock::new(NOW)),
    );
    let result = DisplayEngine::new(
        Scope::Department("  ".to_string()),
        &StaticConfigProvider::default(),
        cache,
        true,
        true,
    );
    assert!(matches!(result, Err(EngineError::MissingScopeKey)));
}

#[test]
fn online_display_waits_for_first_delivery() {
    let mut h = harness();
    assert!(h.engine.init().is_empty());
    assert_eq!(h.engine.state().view, ViewSource::Waiting);
    assert_eq!(h.engine.state().banner, Banner::None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline Fallback
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn offline_fallback_shows_snapshot_not_latest_feed() {
    let mut h = harness();

    // Snapshot written two minutes ago by an earlier session
    h.clock.set(NOW - 120_000);
    h.cache
        .save("dept:Lab", &[called("A0")], &DisplaySettings::default());
    h.clock.set(NOW);

    h.engine.init();
    let effects = h.engine.on_entries(vec![called("A1")]);
    assert_eq!(announced_tokens(&effects), vec!["A1"]);
    assert_eq!(h.engine.state().current_token(), Some("A1"));

    let effects = h.engine.on_platform(PlatformEvent::Offline);
    assert!(effects.contains(&EngineEffect::ScheduleRetry {
        attempt: 0,
        delay: Duration::from_secs(1),
    }));

    let state = h.engine.state();
    assert!(state.view.is_cached());
    assert_eq!(state.current_token(), Some("A0"));
    assert_eq!(state.suppressed, Some(SuppressReason::CachedData));
    assert_eq!(state.banner, Banner::Reconnecting { attempt: 1, max: 10 });
    match &state.view {
        ViewSource::Cached { captured_at, .. } => assert_eq!(*captured_at, NOW - 120_000),
        other => panic!("expected cached view, got {other:?}"),
    }
}

#[test]
fn offline_without_snapshot_renders_no_data() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_entries(vec![called("A1")]);
    h.engine.on_platform(PlatformEvent::Offline);

    assert_eq!(h.engine.state().view, ViewSource::NoData);
    assert_eq!(h.engine.state().current_token(), None);
}

#[test]
fn expired_snapshot_is_never_shown() {
    let mut h = harness();
    h.clock.set(NOW - CACHE_TTL_MS);
    h.cache
        .save("dept:Lab", &[called("A0")], &DisplaySettings::default());
    h.clock.set(NOW);

    h.engine.init();
    h.engine.on_platform(PlatformEvent::Offline);
    assert_eq!(h.engine.state().view, ViewSource::NoData);
}

#[test]
fn snapshot_expiring_while_offline_drops_to_no_data() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_entries(vec![called("A1")]);
    h.engine.on_cache_tick();
    assert_eq!(h.store.len(), 1);

    h.engine.on_platform(PlatformEvent::Offline);
    assert_eq!(h.engine.state().current_token(), Some("A1"));

    h.clock.advance(CACHE_TTL_MS - 1);
    h.engine.on_cache_tick();
    assert!(h.engine.state().view.is_cached());

    h.clock.advance(1);
    h.engine.on_cache_tick();
    assert_eq!(h.engine.state().view, ViewSource::NoData);
}

#[test]
fn starting_offline_enters_cached_mode_immediately() {
    let mut h = harness_with(DisplaySettings::default(), false);
    h.cache
        .save("dept:Lab", &[called("A7")], &DisplaySettings::default());

    let effects = h.engine.init();
    assert!(matches!(
        effects.as_slice(),
        [EngineEffect::ScheduleRetry { attempt: 0, .. }]
    ));
    assert_eq!(h.engine.state().current_token(), Some("A7"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconnect
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn coming_back_online_resumes_live_view_and_saves() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_entries(vec![called("A1")]);
    h.engine.on_platform(PlatformEvent::Offline);
    assert!(h.store.is_empty());

    let effects = h.engine.on_platform(PlatformEvent::Online);
    assert!(effects.contains(&EngineEffect::CancelRetry));

    let state = h.engine.state();
    assert_eq!(state.connectivity.status, ConnectionStatus::Online);
    assert_eq!(state.connectivity.attempt, 0);
    assert_eq!(state.banner, Banner::None);
    assert!(matches!(state.view, ViewSource::Live(_)));
    assert_eq!(h.cache.load("dept:Lab").unwrap().entries[0].token, "A1");
}

#[test]
fn retry_budget_exhaustion_shows_failed_banner() {
    let mut h = harness();
    h.engine.init();
    let mut effects = h.engine.on_platform(PlatformEvent::Offline);

    while let Some(attempt) = effects.iter().find_map(|e| match e {
        EngineEffect::ScheduleRetry { attempt, .. } => Some(*attempt),
        _ => None,
    }) {
        effects = h.engine.on_retry_due(attempt, false);
    }

    assert_eq!(h.engine.state().connectivity.status, ConnectionStatus::Failed);
    assert_eq!(h.engine.state().banner, Banner::ReconnectFailed);

    h.engine.on_platform(PlatformEvent::Online);
    assert_eq!(h.engine.state().banner, Banner::None);
}

#[test]
fn cache_tick_only_saves_scoped_live_data() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_cache_tick();
    assert!(h.store.is_empty());

    h.engine.on_entries(vec![
        called("A1"),
        entry("P1", QueueStatus::Waiting, "Pharmacy", 1),
    ]);
    h.engine.on_cache_tick();
    let snapshot = h.cache.load("dept:Lab").unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].token, "A1");
}

// ─────────────────────────────────────────────────────────────────────────────
// Announcements
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn repeated_deliveries_announce_once() {
    let mut h = harness();
    h.engine.init();

    let mut tokens = Vec::new();
    for _ in 0..4 {
        let effects = h.engine.on_entries(vec![called("A1")]);
        tokens.extend(announced_tokens(&effects));
        issue_all(&mut h.engine, &effects);
    }
    assert_eq!(tokens, vec!["A1"]);
    assert_eq!(h.engine.state().announced_token.as_deref(), Some("A1"));
    assert_eq!(
        h.engine.state().suppressed,
        Some(SuppressReason::AlreadyAnnounced)
    );

    let effects = h.engine.on_entries(vec![called("A2")]);
    assert_eq!(announced_tokens(&effects), vec!["A2"]);
}

#[test]
fn muted_display_announces_after_unmute() {
    let mut h = harness();
    h.engine.init();
    h.engine.set_audio_enabled(false);
    assert!(h.engine.on_entries(vec![called("A1")]).is_empty());
    assert_eq!(h.engine.state().suppressed, Some(SuppressReason::AudioDisabled));

    let effects = h.engine.set_audio_enabled(true);
    assert_eq!(announced_tokens(&effects), vec!["A1"]);
}

#[test]
fn muting_cancels_pending_announcement() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_entries(vec![called("A1")]);

    let effects = h.engine.set_audio_enabled(false);
    assert_eq!(effects, vec![EngineEffect::CancelAnnouncement]);
    assert_eq!(h.engine.state().announced_token, None);
}

#[test]
fn superseded_pending_token_is_not_dispatched_twice() {
    let mut h = harness();
    h.engine.init();

    let skipped_a2 = entry("A2", QueueStatus::Skipped, "Lab", 0);
    let deliveries = [
        vec![called("A1")],
        vec![called("A1"), called("A2")],
        vec![called("A1"), skipped_a2.clone()],
        vec![called("A1"), skipped_a2],
    ];
    let mut tokens = Vec::new();
    for delivery in deliveries {
        tokens.extend(announced_tokens(&h.engine.on_entries(delivery)));
    }
    assert_eq!(tokens, vec!["A1", "A2"]);
    assert_eq!(h.engine.state().suppressed, Some(SuppressReason::InFlight));
    assert_eq!(
        h.engine.scheduler.record().in_flight(h.engine.scope_key()),
        ["A1", "A2"]
    );

    // A1 speaks first; A2 stays pending behind it
    let effects = h.engine.on_announcement_issued("dept:Lab", "A1");
    assert!(announced_tokens(&effects).is_empty());
    assert_eq!(h.engine.state().announced_token.as_deref(), Some("A1"));
    assert_eq!(
        h.engine.scheduler.record().in_flight(h.engine.scope_key()),
        ["A2"]
    );

    let effects = h.engine.on_announcement_cancelled("dept:Lab", "A2");
    assert!(announced_tokens(&effects).is_empty());
    assert!(
        h.engine
            .scheduler
            .record()
            .in_flight(h.engine.scope_key())
            .is_empty()
    );
}

#[test]
fn muting_cancels_every_overlapping_announcement() {
    let mut h = harness();
    h.engine.init();
    let first = h.engine.on_entries(vec![called("A1")]);
    let second = h.engine.on_entries(vec![called("A1"), called("A2")]);
    assert_eq!(announced_tokens(&first), vec!["A1"]);
    assert_eq!(announced_tokens(&second), vec!["A2"]);

    let effects = h.engine.set_audio_enabled(false);
    assert_eq!(effects, vec![EngineEffect::CancelAnnouncement]);
    assert!(
        h.engine
            .scheduler
            .record()
            .in_flight(h.engine.scope_key())
            .is_empty()
    );

    // Nothing was spoken, so the current token is dispatched again
    let effects = h.engine.set_audio_enabled(true);
    assert_eq!(announced_tokens(&effects), vec!["A2"]);
}

struct GrantingPlatform;

impl PlatformControls for GrantingPlatform {
    fn is_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&mut self) -> Result<(), KioskError> {
        Ok(())
    }

    fn unlock_audio(&mut self, _tone: &crate::audio::Tone) -> Result<(), KioskError> {
        Ok(())
    }
}

#[test]
fn kiosk_gesture_releases_held_announcement() {
    let settings = DisplaySettings {
        kiosk: KioskSettings {
            auto_audio: true,
            ..KioskSettings::default()
        },
        ..DisplaySettings::default()
    };
    let mut h = harness_with(settings, true);
    h.engine.init();

    assert!(h.engine.on_entries(vec![called("A1")]).is_empty());
    assert_eq!(
        h.engine.state().suppressed,
        Some(SuppressReason::AwaitingGesture)
    );

    let (report, effects) = h.engine.activate_kiosk(&mut GrantingPlatform);
    assert!(!report.is_partial());
    assert_eq!(announced_tokens(&effects), vec!["A1"]);
    assert!(h.engine.state().kiosk.audio_unlocked);
}

#[test]
fn cached_mode_uses_snapshot_settings_until_feed_settings_arrive() {
    let mut h = harness();
    let snapshot_settings = DisplaySettings {
        upcoming_limit: 1,
        ..DisplaySettings::default()
    };
    let waiting: Vec<QueueEntry> = (0..3)
        .map(|i| entry(&format!("W{i}"), QueueStatus::Waiting, "Lab", i))
        .collect();
    h.cache.save("dept:Lab", &waiting, &snapshot_settings);

    h.engine.init();
    h.engine.on_platform(PlatformEvent::Offline);
    assert_eq!(h.engine.state().view.view().unwrap().upcoming.len(), 1);

    h.engine.on_settings(DisplaySettings::default());
    assert_eq!(h.engine.state().view.view().unwrap().upcoming.len(), 3);
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispose
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn dispose_cancels_pending_work_and_ignores_inputs() {
    let mut h = harness();
    h.engine.init();
    h.engine.on_entries(vec![called("A1")]);

    let effects = h.engine.dispose();
    assert_eq!(
        effects,
        vec![EngineEffect::CancelRetry, EngineEffect::CancelAnnouncement]
    );
    assert!(h.engine.is_disposed());
    assert!(h.engine.dispose().is_empty());
    assert!(h.engine.on_entries(vec![called("A2")]).is_empty());
    assert!(h.engine.on_platform(PlatformEvent::Offline).is_empty());
}
