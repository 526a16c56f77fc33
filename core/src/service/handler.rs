use queue_display_types::{DisplaySettings, QueueEntry};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use super::ServiceCommand;
use crate::engine::DisplayState;
use crate::events::PlatformEvent;
use crate::kiosk::ActivationReport;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("display service is not running")]
    Closed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to communicate with the display service and read its state
#[derive(Clone)]
pub struct ServiceHandle {
    cmd_tx: mpsc::Sender<ServiceCommand>,
    state_rx: watch::Receiver<DisplayState>,
}

impl ServiceHandle {
    pub(super) fn new(
        cmd_tx: mpsc::Sender<ServiceCommand>,
        state_rx: watch::Receiver<DisplayState>,
    ) -> Self {
        Self { cmd_tx, state_rx }
    }

    async fn send(&self, cmd: ServiceCommand) -> Result<(), ServiceError> {
        self.cmd_tx.send(cmd).await.map_err(|_| ServiceError::Closed)
    }

    /// Deliver a complete queue feed snapshot
    pub async fn push_entries(&self, entries: Vec<QueueEntry>) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Entries(entries)).await
    }

    /// Deliver a complete settings map
    pub async fn push_settings(&self, settings: DisplaySettings) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Settings(settings)).await
    }

    pub async fn platform(&self, event: PlatformEvent) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Platform(event)).await
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<(), ServiceError> {
        self.send(ServiceCommand::SetAudioEnabled(enabled)).await
    }

    /// Forward a user gesture and wait for the activation report
    pub async fn activate_kiosk(&self) -> Result<ActivationReport, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ServiceCommand::ActivateKiosk(reply_tx)).await?;
        reply_rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.send(ServiceCommand::Shutdown).await
    }

    /// Latest published display state
    pub fn state(&self) -> DisplayState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state_rx.clone()
    }
}
