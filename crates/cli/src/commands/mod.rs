//! Command implementations.

mod ports;
mod run;
mod validate;

pub use ports::run_ports;
pub use run::run_ingest;
pub use validate::run_validate;
