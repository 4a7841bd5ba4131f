//! Lifecycle error types

use thiserror::Error;

use crate::state::ControllerState;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `start` called while not Closed
    #[error("controller is {state}, stop it before starting again")]
    AlreadyRunning { state: ControllerState },

    /// Device could not be opened; the controller is back to Closed
    #[error("failed to start acquisition: {0}")]
    DeviceOpen(#[source] ingestion::IngestionError),

    /// The sink was lost by an earlier failed shutdown
    #[error("sink is no longer available")]
    SinkUnavailable,

    /// A background task panicked or was cancelled
    #[error("{task} task did not finish: {message}")]
    Join { task: &'static str, message: String },

    /// Sink worker failure
    #[error(transparent)]
    Persistence(#[from] persistence::PersistenceError),
}
