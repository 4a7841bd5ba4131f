//! Persistence error types

use thiserror::Error;

/// Persistence-specific errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Worker task panicked or was cancelled
    #[error("sink worker for '{name}' did not finish: {message}")]
    WorkerAborted { name: String, message: String },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersistenceError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
