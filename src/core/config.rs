//! # Orchestrator configuration.
//!
//! Provides [`Config`] (runtime knobs) and [`ReportingConfig`] (state publisher
//! cadence). Both are assembled once by the
//! [`OrchestratorBuilder`](crate::OrchestratorBuilder) and never mutated
//! afterwards; build a new orchestrator to change them.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `ReportingConfig::disabled = true` → the publisher never runs and
//!   `update_interval` is not validated

use std::time::Duration;

/// Runtime configuration for the orchestrator.
///
/// ## Field semantics
/// - `stop_timeout`: bounded wait for the engine's `stop` (best effort, not a cancel)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `watch_connectivity`: subscribe to connectivity transitions
/// - `exit_code`: code passed to [`Host::terminate`](crate::Host::terminate) on shutdown
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time a caller of `stop` waits for the engine to stop.
    ///
    /// When it elapses the stop worker keeps running detached and the caller
    /// proceeds as if the stop had completed.
    pub stop_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Whether to subscribe to connectivity transitions.
    pub watch_connectivity: bool,

    /// Process exit code used by `shutdown`.
    pub exit_code: i32,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `stop_timeout = 10s` (engines typically stop in about 5s)
    /// - `bus_capacity = 1024`
    /// - `watch_connectivity = true`
    /// - `exit_code = 0`
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_millis(10_000),
            bus_capacity: 1024,
            watch_connectivity: true,
            exit_code: 0,
        }
    }
}

/// Cadence of state reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingConfig {
    /// Delay between the end of one publisher cycle and the start of the next.
    pub update_interval: Duration,
    /// Suppress the publisher entirely.
    pub disabled: bool,
}

impl ReportingConfig {
    /// Reports every `update_interval`.
    pub fn every(update_interval: Duration) -> Self {
        Self {
            update_interval,
            disabled: false,
        }
    }

    /// No periodic reports.
    pub fn disabled() -> Self {
        Self {
            update_interval: Duration::ZERO,
            disabled: true,
        }
    }

    /// Returns `true` when the publisher should run.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}
