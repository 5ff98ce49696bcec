//! Error types used by the enginevisor runtime and its collaborators.
//!
//! This module defines four enums:
//!
//! - [`BuildError`] - assembly failed; no orchestrator was produced.
//! - [`RuntimeError`] - a lifecycle call was made in the wrong phase or order.
//! - [`EngineError`] - returned by [`Engine`](crate::Engine) implementations.
//! - [`SinkError`] - returned by [`ReportSink`](crate::ReportSink) implementations.
//!
//! Engine and sink errors never reach orchestrator callers: the supervisor and the
//! publisher log them and carry on. All types provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::core::Phase;

/// # Errors produced while assembling an orchestrator.
///
/// Returned by [`OrchestratorBuilder::build`](crate::OrchestratorBuilder::build)
/// before any orchestrator instance exists.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// No engine factory was supplied.
    #[error("engine factory is required")]
    MissingEngine,

    /// No reporting configuration was supplied.
    #[error("reporting configuration is required")]
    MissingReporting,

    /// Reporting is enabled but the update interval is zero.
    #[error("update interval must be greater than zero")]
    InvalidInterval,

    /// The bounded stop wait is zero.
    #[error("stop timeout must be greater than zero, got {timeout:?}")]
    InvalidStopTimeout {
        /// The rejected value.
        timeout: Duration,
    },
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use enginevisor::BuildError;
    ///
    /// assert_eq!(BuildError::MissingEngine.as_label(), "build_missing_engine");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::MissingEngine => "build_missing_engine",
            BuildError::MissingReporting => "build_missing_reporting",
            BuildError::InvalidInterval => "build_invalid_interval",
            BuildError::InvalidStopTimeout { .. } => "build_invalid_stop_timeout",
        }
    }
}

/// # Errors produced by the orchestration runtime.
///
/// These are caller errors (wrong phase, unpaired register/unregister) or a failure
/// to install OS signal handlers. None of them is raised by the engine itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The operation is not allowed in the current lifecycle phase.
    #[error("operation requires phase {expected:?}, orchestrator is {actual:?}")]
    InvalidPhase {
        /// Phase the operation requires.
        expected: Phase,
        /// Phase observed when the call was made.
        actual: Phase,
    },

    /// Event sources are already registered.
    #[error("event sources already registered")]
    AlreadyRegistered,

    /// Event sources were never registered (or were already unregistered).
    #[error("event sources not registered")]
    NotRegistered,

    /// The state publisher is already running.
    #[error("state publisher already running")]
    PublisherRunning,

    /// Installing the OS signal listeners failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidPhase { .. } => "runtime_invalid_phase",
            RuntimeError::AlreadyRegistered => "runtime_already_registered",
            RuntimeError::NotRegistered => "runtime_not_registered",
            RuntimeError::PublisherRunning => "runtime_publisher_running",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

/// # Errors reported by an engine implementation.
///
/// Logged and published as events; never propagated to orchestrator callers.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The engine failed to start or stop.
    #[error("engine failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl EngineError {
    /// Convenience constructor for [`EngineError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        EngineError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Failed { .. } => "engine_failed",
        }
    }
}

/// # Errors reported by a reporting sink.
///
/// The publisher swallows these and keeps its cadence.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// The sink could not be reached (transient).
    #[error("sink unreachable: {error}")]
    Unreachable {
        /// The underlying error message.
        error: String,
    },

    /// The sink refused the report.
    #[error("report rejected: {error}")]
    Rejected {
        /// The underlying error message.
        error: String,
    },
}

impl SinkError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use enginevisor::SinkError;
    ///
    /// let err = SinkError::Unreachable { error: "closed".into() };
    /// assert_eq!(err.as_label(), "sink_unreachable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Unreachable { .. } => "sink_unreachable",
            SinkError::Rejected { .. } => "sink_rejected",
        }
    }
}
