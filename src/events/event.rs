//! # Lifecycle events emitted by the orchestrator and its components.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Session events**: session marker registered/unregistered, shutdown flow
//! - **Engine events**: handle installed, start/stop worker outcomes, stop timeout
//! - **Reporting events**: one per publisher cycle (published or failed)
//! - **External events**: connectivity and notification actions seen by the router
//!
//! The [`Event`] struct carries additional metadata such as timestamps, engine
//! generation, state snapshot and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use enginevisor::{EngineState, Event, EventKind};
//!
//! let ev = Event::new(EventKind::StatePublished)
//!     .with_update(3)
//!     .with_state(EngineState::Started);
//!
//! assert_eq!(ev.kind, EventKind::StatePublished);
//! assert_eq!(ev.update, Some(3));
//! assert_eq!(ev.state, Some(EngineState::Started));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::engine::EngineState;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Session events ===
    /// Session marker registered with the host, engine launched.
    SessionStarted,

    /// Session marker unregistered, engine stop finished or abandoned.
    SessionStopped,

    /// Shutdown began.
    ///
    /// Sets:
    /// - `reason`: "non_destructive" or "destructive"
    ShutdownRequested,

    /// Shutdown sequence finished; process termination follows.
    ///
    /// Sets:
    /// - `reason`: "non_destructive" or "destructive"
    ShutdownCompleted,

    // === Engine events ===
    /// A new engine handle was installed and its start worker launched.
    ///
    /// Sets:
    /// - `source`: engine name
    /// - `generation`: handle generation
    EngineStarting,

    /// The engine's `start` returned successfully.
    ///
    /// Sets:
    /// - `source`, `generation`
    EngineStarted,

    /// The engine's `start` returned an error (or its worker could not run).
    ///
    /// Sets:
    /// - `source`, `generation`
    /// - `reason`: error message
    EngineStartFailed,

    /// The engine handle was taken out of the slot; stop worker launched.
    ///
    /// Sets:
    /// - `source`, `generation`
    EngineStopping,

    /// The engine's `stop` returned within the bounded wait.
    ///
    /// Sets:
    /// - `source`, `generation`
    EngineStopped,

    /// The engine's `stop` returned an error (or its worker could not run).
    ///
    /// Sets:
    /// - `source`, `generation`
    /// - `reason`: error message
    EngineStopFailed,

    /// The bounded stop wait elapsed; the stop worker keeps running detached.
    ///
    /// Sets:
    /// - `source`, `generation`
    /// - `timeout_ms`: configured stop timeout
    StopTimeoutHit,

    // === Reporting events ===
    /// One publisher cycle delivered its report.
    ///
    /// Sets:
    /// - `update`: update identifier
    /// - `state`: reported state
    StatePublished,

    /// One publisher cycle failed to deliver its report (the cadence continues).
    ///
    /// Sets:
    /// - `update`, `state`
    /// - `reason`: sink error or panic info
    PublishFailed,

    // === External events ===
    /// Connectivity status changed.
    ///
    /// Sets:
    /// - `connected`: new status
    ConnectivityChanged,

    /// The user acted on the status surface.
    NotificationAction,

    /// The user confirmed an irreversible action.
    ConfirmAction,

    /// A caller-supplied override handled an external event instead of the default.
    ///
    /// Sets:
    /// - `source`: "notification" or "confirm"
    OverrideInvoked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Component or engine name, if applicable.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, shutdown mode).
    pub reason: Option<Arc<str>>,
    /// Engine handle generation (starting from 1).
    pub generation: Option<u64>,
    /// Publisher update identifier (starting from 1).
    pub update: Option<u64>,
    /// Engine state snapshot.
    pub state: Option<EngineState>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Connectivity status.
    pub connected: Option<bool>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            generation: None,
            update: None,
            state: None,
            timeout_ms: None,
            connected: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a component or engine name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches an engine handle generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a publisher update identifier.
    #[inline]
    pub fn with_update(mut self, update: u64) -> Self {
        self.update = Some(update);
        self
    }

    /// Attaches an engine state snapshot.
    #[inline]
    pub fn with_state(mut self, state: EngineState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a connectivity status.
    #[inline]
    pub fn with_connected(mut self, connected: bool) -> Self {
        self.connected = Some(connected);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}
