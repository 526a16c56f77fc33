//! Error types for engine setup

use thiserror::Error;

/// Setup errors. Runtime failures never surface here; they become display state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("display scope requires a department name")]
    MissingScopeKey,

    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },
}
