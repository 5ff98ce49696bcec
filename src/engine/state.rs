//! # Engine state snapshot.
//!
//! [`EngineState`] is what the publisher reports and what observers see.
//! [`DEFAULT_STATE`] stands in whenever no engine is installed.

use std::fmt;

/// Snapshot of an engine's running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Constructed, `start` not yet called.
    Created,
    /// `start` in progress.
    Starting,
    /// Fully operational.
    Started,
    /// Running with reduced functionality.
    Degraded,
    /// `stop` in progress.
    Stopping,
    /// Not running.
    Stopped,
    /// Failed to start or crashed.
    Failed,
}

/// State reported while no engine handle is installed.
pub const DEFAULT_STATE: EngineState = EngineState::Stopped;

impl EngineState {
    /// Returns the upper-case wire name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Created => "CREATED",
            EngineState::Starting => "STARTING",
            EngineState::Started => "STARTED",
            EngineState::Degraded => "DEGRADED",
            EngineState::Stopping => "STOPPING",
            EngineState::Stopped => "STOPPED",
            EngineState::Failed => "FAILED",
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        DEFAULT_STATE
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
