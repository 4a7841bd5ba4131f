//! Controller state machine

use std::fmt;

/// Lifecycle state of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No device held, no tasks running
    #[default]
    Closed,
    /// Acquiring the device
    Opening,
    /// Reader and sink worker running
    Running,
    /// Tearing down
    Closing,
}

impl ControllerState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Running => "running",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}
