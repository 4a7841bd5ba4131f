//! ReadingSink trait - persistence collaborator interface
//!
//! Defines the abstract interface for sinks.

use crate::{ContractError, TemperatureReading};

/// Persistence trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(ReadingSink: Send)]
pub trait LocalReadingSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist a single reading
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn save(&mut self, reading: &TemperatureReading) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
