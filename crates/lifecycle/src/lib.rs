//! # Lifecycle
//!
//! Owns one acquisition run end to end.
//!
//! `LifecycleController` opens the device, spawns the blocking reader and the
//! sink worker, and on `stop` tears them down in order: reader first, then
//! device, then queue, then worker. The controller is restartable.
//!
//! ```text
//! Closed --start--> Opening --ok--> Running --stop--> Closing --> Closed
//!                      |
//!                      +--device error--> Closed
//! ```

mod controller;
mod error;
mod state;
mod stats;

pub use controller::LifecycleController;
pub use error::LifecycleError;
pub use ingestion::ReaderExit;
pub use state::ControllerState;
pub use stats::RunStats;
