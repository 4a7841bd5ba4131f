//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Why a chunk produced no reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Nothing left after trimming whitespace
    #[error("received empty data")]
    Empty,

    /// No digits or decimal point in the chunk
    #[error("malformed data, unable to parse temperature: {raw:?}")]
    Malformed {
        /// Trimmed chunk text
        raw: String,
    },

    /// Cleaned content is not a finite number (e.g. "12.3.4")
    #[error("failed to parse temperature {cleaned:?} from {raw:?}")]
    InvalidNumber {
        /// Trimmed chunk text
        raw: String,
        /// Text after stripping non-numeric characters
        cleaned: String,
    },
}

impl FrameError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed { .. } => "malformed",
            Self::InvalidNumber { .. } => "invalid_number",
        }
    }
}

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Chunk rejected by the frame parser
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Device could not be acquired
    #[error(transparent)]
    Device(#[from] ContractError),

    /// Reader used before `open`
    #[error("device {port} is not open")]
    NotOpen {
        /// Configured port
        port: String,
    },

    /// Queue closed while pushing
    #[error("ingestion queue closed")]
    QueueClosed,
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
