//! # Contracts
//!
//! Interface contracts shared by every crate in the workspace: the reading
//! data model, the device and sink traits, configuration types and the
//! unified error. Business crates depend on this crate, never the reverse.
//!
//! ## Time Model
//! - A reading is stamped with the UTC wall clock at parse time
//! - `sequence` is the arrival order of the chunk it was parsed from

mod config;
mod device;
mod error;
mod reading;
mod sink;

pub use config::*;
pub use device::*;
pub use error::*;
pub use reading::*;
pub use sink::*;
