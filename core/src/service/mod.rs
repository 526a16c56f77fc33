//! Tokio host for a `DisplayEngine`
//!
//! `DisplayService` owns the engine and performs its effects: the reconnect
//! timer, the cache refresh interval and the chime/speech tasks. Callers talk
//! to it through a cloneable `ServiceHandle` and watch `DisplayState` updates.

mod handler;


pub use handler::{ServiceError, ServiceHandle};

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use queue_display_types::{DisplaySettings, QueueEntry};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};

use crate::announce::Announcement;
use crate::audio::{AudioEvent, AudioSender};
use crate::connectivity::ConnectivityProbe;
use crate::engine::{DisplayEngine, DisplayState, EngineEffect};
use crate::events::PlatformEvent;
use crate::kiosk::{ActivationReport, PlatformControls};

/// Commands sent to the display service
#[derive(Debug)]
pub enum ServiceCommand {
    Entries(Vec<QueueEntry>),
    Settings(DisplaySettings),
    Platform(PlatformEvent),
    /// User gesture; the report is sent back once activation finishes
    ActivateKiosk(oneshot::Sender<ActivationReport>),
    SetAudioEnabled(bool),
    /// Sent by an announcement task once its speech event is queued
    AnnouncementIssued { scope_key: String, token: String },
    Shutdown,
}

struct PendingRetry {
    attempt: u32,
    sleep: Pin<Box<Sleep>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Display Service
// ─────────────────────────────────────────────────────────────────────────────

pub struct DisplayService {
    engine: DisplayEngine,
    cmd_rx: mpsc::Receiver<ServiceCommand>,
    /// Weak so the loop ends once every handle is dropped
    cmd_tx: mpsc::WeakSender<ServiceCommand>,
    state_tx: watch::Sender<DisplayState>,
    audio_tx: AudioSender,
    platform: Box<dyn PlatformControls>,
    probe: Arc<dyn ConnectivityProbe>,
    retry: Option<PendingRetry>,
    announcements: Vec<JoinHandle<()>>,
    /// Held for a whole chime+speech sequence so announcements never overlap
    speaker: Arc<Mutex<()>>,
    cache_refresh: Duration,
}

impl DisplayService {
    /// Create a new display service and return a handle to communicate with it
    pub fn new(
        engine: DisplayEngine,
        audio_tx: AudioSender,
        platform: Box<dyn PlatformControls>,
        probe: Arc<dyn ConnectivityProbe>,
        cache_refresh: Duration,
    ) -> (Self, ServiceHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(engine.state().clone());

        let service = Self {
            engine,
            cmd_rx,
            cmd_tx: cmd_tx.downgrade(),
            state_tx,
            audio_tx,
            platform,
            probe,
            retry: None,
            announcements: Vec::new(),
            speaker: Arc::new(Mutex::new(())),
            cache_refresh,
        };

        (service, ServiceHandle::new(cmd_tx, state_rx))
    }

    /// Run the service event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        let effects = self.engine.init();
        self.apply(effects);

        // interval_at panics on a zero period
        let period = self.cache_refresh.max(Duration::from_secs(1));
        let mut refresh = tokio::time::interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(ServiceCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }
                attempt = retry_due(&mut self.retry) => {
                    self.retry = None;
                    let online = self.probe.is_online();
                    let effects = self.engine.on_retry_due(attempt, online);
                    self.apply(effects);
                }
                _ = refresh.tick() => {
                    let effects = self.engine.on_cache_tick();
                    self.apply(effects);
                }
            }
        }

        let effects = self.engine.dispose();
        self.apply(effects);
        tracing::debug!("Display service stopped");
    }

    fn handle_command(&mut self, cmd: ServiceCommand) {
        let effects = match cmd {
            ServiceCommand::Entries(entries) => self.engine.on_entries(entries),
            ServiceCommand::Settings(settings) => self.engine.on_settings(settings),
            ServiceCommand::Platform(event) => self.engine.on_platform(event),
            ServiceCommand::ActivateKiosk(reply) => {
                let (report, effects) = self.engine.activate_kiosk(self.platform.as_mut());
                let _ = reply.send(report);
                effects
            }
            ServiceCommand::SetAudioEnabled(enabled) => self.engine.set_audio_enabled(enabled),
            ServiceCommand::AnnouncementIssued { scope_key, token } => {
                self.engine.on_announcement_issued(&scope_key, &token)
            }
            // Handled by the run loop
            ServiceCommand::Shutdown => Vec::new(),
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<EngineEffect>) {
        for effect in effects {
            match effect {
                EngineEffect::ScheduleRetry { attempt, delay } => {
                    self.retry = Some(PendingRetry {
                        attempt,
                        sleep: Box::pin(tokio::time::sleep(delay)),
                    });
                }
                EngineEffect::CancelRetry => self.retry = None,
                EngineEffect::Announce(announcement) => self.spawn_announcement(announcement),
                EngineEffect::CancelAnnouncement => self.cancel_announcements(),
            }
        }
        self.state_tx.send_replace(self.engine.state().clone());
    }

    fn spawn_announcement(&mut self, announcement: Announcement) {
        self.announcements.retain(|handle| !handle.is_finished());
        let task = play_announcement(
            announcement,
            self.audio_tx.clone(),
            self.cmd_tx.clone(),
            self.speaker.clone(),
        );
        self.announcements.push(tokio::spawn(task));
    }

    fn cancel_announcements(&mut self) {
        for handle in self.announcements.drain(..) {
            handle.abort();
        }
    }
}

/// Resolves with the attempt number once the armed retry timer fires.
async fn retry_due(retry: &mut Option<PendingRetry>) -> u32 {
    match retry {
        Some(pending) => {
            pending.sleep.as_mut().await;
            pending.attempt
        }
        None => std::future::pending::<u32>().await,
    }
}

/// Chime, wait, speak, then report the speech call back to the service.
async fn play_announcement(
    announcement: Announcement,
    audio_tx: AudioSender,
    cmd_tx: mpsc::WeakSender<ServiceCommand>,
    speaker: Arc<Mutex<()>>,
) {
    let _turn = speaker.lock().await;

    if let Some(tone) = announcement.chime
        && audio_tx.send(AudioEvent::Chime(tone)).await.is_err()
    {
        tracing::warn!(token = %announcement.token, "Audio service gone, chime dropped");
    }

    tokio::time::sleep(announcement.chime_delay).await;

    if audio_tx
        .send(AudioEvent::Speak(announcement.speech))
        .await
        .is_err()
    {
        tracing::warn!(token = %announcement.token, "Audio service gone, speech dropped");
    }

    // Issued even when the audio service is gone: a token is never retried
    if let Some(cmd_tx) = cmd_tx.upgrade() {
        let _ = cmd_tx
            .send(ServiceCommand::AnnouncementIssued {
                scope_key: announcement.scope_key,
                token: announcement.token,
            })
            .await;
    }
}
