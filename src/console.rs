//! Operator console commands
//!
//! Each input line is split with shlex and parsed by clap, so quoting works
//! the way it does in a shell.

use std::fmt::Write as _;
use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};
use queue_display_core::connectivity::PlatformFlag;
use queue_display_core::engine::{Banner, DisplayState, ViewSource};
use queue_display_core::events::PlatformEvent;
use queue_display_core::reducer::DerivedQueueView;
use queue_display_core::service::ServiceHandle;
use queue_display_types::{DisplaySettings, QueueEntry};

#[derive(Parser)]
#[command(about = "queue display console", no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deliver a queue snapshot from a JSON file
    Feed { path: String },
    /// Deliver a settings map from a JSON file
    Settings { path: String },
    /// Simulate the network dropping
    Offline,
    /// Simulate the network coming back
    Online,
    /// Simulate the user gesture that unlocks fullscreen and audio
    Activate,
    /// Toggle announcements for this display
    Audio { state: Toggle },
    /// Show what the display is rendering
    Status,
    Exit,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

/// Shared context for console commands
pub struct Console {
    handle: ServiceHandle,
    network: PlatformFlag,
}

impl Console {
    pub fn new(handle: ServiceHandle, network: PlatformFlag) -> Self {
        Self { handle, network }
    }

    /// Run one input line. Returns `Ok(true)` when the console should quit.
    pub async fn respond(&self, line: &str) -> Result<bool, String> {
        let args = shlex::split(line).ok_or("error: Invalid quoting")?;
        let parsed = Line::try_parse_from(args).map_err(|e| e.to_string())?;

        match parsed.command {
            Command::Feed { path } => {
                let entries: Vec<QueueEntry> = read_json(Path::new(&path))?;
                println!("delivered {} entries", entries.len());
                self.handle
                    .push_entries(entries)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Command::Settings { path } => {
                let settings: DisplaySettings = read_json(Path::new(&path))?;
                self.handle
                    .push_settings(settings)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Command::Offline => {
                self.network.set(false);
                self.platform(PlatformEvent::Offline).await?;
            }
            Command::Online => {
                self.network.set(true);
                self.platform(PlatformEvent::Online).await?;
            }
            Command::Activate => {
                let report = self
                    .handle
                    .activate_kiosk()
                    .await
                    .map_err(|e| e.to_string())?;
                println!("fullscreen: {:?}", report.fullscreen);
                println!("audio: {:?}", report.audio);
            }
            Command::Audio { state } => {
                self.handle
                    .set_audio_enabled(matches!(state, Toggle::On))
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Command::Status => print!("{}", render(&self.handle.state())),
            Command::Exit => {
                self.handle.shutdown().await.map_err(|e| e.to_string())?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn platform(&self, event: PlatformEvent) -> Result<(), String> {
        self.handle.platform(event).await.map_err(|e| e.to_string())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {}", path.display(), e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Text rendering of a display state
pub fn render(state: &DisplayState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "scope: {}", state.scope);

    match state.banner {
        Banner::None => {}
        Banner::Offline => {
            let _ = writeln!(out, "[offline]");
        }
        Banner::Reconnecting { attempt, max } => {
            let _ = writeln!(out, "[reconnecting, attempt {attempt}/{max}]");
        }
        Banner::ReconnectFailed => {
            let _ = writeln!(out, "[reconnect failed]");
        }
    }

    match &state.view {
        ViewSource::Waiting => {
            let _ = writeln!(out, "waiting for queue data");
        }
        ViewSource::NoData => {
            let _ = writeln!(out, "no data available offline");
        }
        ViewSource::Live(view) => render_view(&mut out, view),
        ViewSource::Cached { view, captured_at } => {
            let captured = chrono::DateTime::from_timestamp_millis(*captured_at)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| captured_at.to_string());
            let _ = writeln!(out, "cached data from {captured}");
            render_view(&mut out, view);
        }
    }

    let _ = writeln!(
        out,
        "audio: {}  kiosk: {:?}",
        if state.audio_enabled { "on" } else { "off" },
        state.kiosk_phase
    );
    if let Some(reason) = state.suppressed {
        let _ = writeln!(out, "announcement: {reason}");
    }
    out
}

fn render_view(out: &mut String, view: &DerivedQueueView) {
    let _ = writeln!(out, "now serving: {}", view.current_token().unwrap_or("-"));
    let upcoming = view.upcoming_tokens();
    if upcoming.is_empty() {
        let _ = writeln!(out, "next: -");
    } else {
        let _ = writeln!(out, "next: {}", upcoming.join(", "));
    }
    if view.has_emergency_waiting() {
        let _ = writeln!(out, "emergency patient waiting");
    }
    let c = view.counts;
    let _ = writeln!(
        out,
        "waiting {}  called {}  served {}  completed {}  skipped {}",
        c.waiting, c.called, c.served, c.completed, c.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use queue_display_core::connectivity::{ConnectionStatus, ConnectivityState};
    use queue_display_core::kiosk::{KioskPhase, KioskState};
    use queue_display_core::reducer::reduce;
    use queue_display_types::{Priority, QueueStatus, Scope};

    fn entry(token: &str, status: QueueStatus, priority: Priority) -> QueueEntry {
        QueueEntry {
            id: token.to_string(),
            token: token.to_string(),
            full_name: String::new(),
            department: "Lab".to_string(),
            priority,
            status,
            created_at: 0,
        }
    }

    #[test]
    fn renders_cached_view_with_reconnect_banner() {
        let entries = vec![
            entry("A0", QueueStatus::Called, Priority::Normal),
            entry("A1", QueueStatus::Waiting, Priority::Emergency),
        ];
        let state = DisplayState {
            scope: Scope::Department("Lab".to_string()),
            view: ViewSource::Cached {
                view: reduce(&entries, &Scope::All, 5),
                captured_at: 0,
            },
            connectivity: ConnectivityState {
                status: ConnectionStatus::Reconnecting,
                attempt: 3,
            },
            kiosk: KioskState::default(),
            kiosk_phase: KioskPhase::Idle,
            banner: Banner::Reconnecting { attempt: 3, max: 10 },
            audio_enabled: true,
            suppressed: None,
            announced_token: None,
        };

        let text = render(&state);
        assert!(text.contains("[reconnecting, attempt 3/10]"));
        assert!(text.contains("cached data from 00:00:00"));
        assert!(text.contains("now serving: A0"));
        assert!(text.contains("next: A1"));
        assert!(text.contains("emergency patient waiting"));
    }

    #[test]
    fn console_lines_parse_like_a_shell() {
        let args = shlex::split("feed \"my queue.json\"").unwrap();
        let parsed = Line::try_parse_from(args).unwrap();
        assert!(matches!(parsed.command, Command::Feed { path } if path == "my queue.json"));
        assert!(Line::try_parse_from(["audio", "loud"]).is_err());
    }
}
