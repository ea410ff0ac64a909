//! Active source lifecycle state

use std::fmt;

/// Lifecycle of an active source; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, producer not started yet
    New,
    /// Producer task spawned
    Running,
    /// Producer task joined and channel closed
    Stopped,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == RunState::Running
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::New => write!(f, "new"),
            RunState::Running => write!(f, "running"),
            RunState::Stopped => write!(f, "stopped"),
        }
    }
}
