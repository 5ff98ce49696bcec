//! # OrchestratorBuilder: validated assembly.
//!
//! Collects the engine factory and reporting cadence (required) plus optional
//! knobs, then wires the bus, subscribers, supervisor, publisher and router.
//!
//! ## Validation order
//! ```text
//! engine missing         → BuildError::MissingEngine
//! reporting missing      → BuildError::MissingReporting
//! enabled && interval 0  → BuildError::InvalidInterval
//! stop_timeout 0         → BuildError::InvalidStopTimeout
//! ```
//! Nothing is spawned until every check has passed.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    core::{
        Config, ReportingConfig,
        orchestrator::Orchestrator,
        publisher::StatePublisher,
        router::{ActionHook, EventRouter, Hooks},
        supervisor::EngineSupervisor,
    },
    engine::EngineFactoryRef,
    error::BuildError,
    events::Bus,
    host::HostRef,
    reporting::{ReportSinkRef, TracingSink},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Orchestrator`].
///
/// An engine factory and a reporting configuration are required; everything
/// else has a default (see [`Config::default`]).
pub struct OrchestratorBuilder {
    cfg: Config,
    engine: Option<EngineFactoryRef>,
    reporting: Option<ReportingConfig>,
    sink: Option<ReportSinkRef>,
    hooks: Hooks,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    /// Creates a builder with [`Config::default`].
    pub fn new() -> Self {
        Self {
            cfg: Config::default(),
            engine: None,
            reporting: None,
            sink: None,
            hooks: Hooks::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole runtime configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the factory that creates a fresh engine for every session.
    pub fn with_engine(mut self, factory: EngineFactoryRef) -> Self {
        self.engine = Some(factory);
        self
    }

    /// Sets the reporting cadence.
    pub fn with_reporting(mut self, reporting: ReportingConfig) -> Self {
        self.reporting = Some(reporting);
        self
    }

    /// Sets where state reports go. Defaults to [`TracingSink`].
    pub fn with_sink(mut self, sink: ReportSinkRef) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Enables or disables connectivity watching.
    pub fn watch_connectivity(mut self, enabled: bool) -> Self {
        self.cfg.watch_connectivity = enabled;
        self
    }

    /// Bounds how long `stop` waits for the engine.
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.stop_timeout = timeout;
        self
    }

    /// Replaces the default reaction to a notification tap (non-destructive shutdown).
    pub fn on_notification_action(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.on_notification = Some(Arc::new(f) as ActionHook);
        self
    }

    /// Replaces the default reaction to a confirm tap (destructive shutdown).
    pub fn on_confirm_action(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.on_confirm = Some(Arc::new(f) as ActionHook);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the options and assembles the orchestrator.
    ///
    /// Nothing is started: the orchestrator is returned in
    /// [`Phase::Stopped`](crate::Phase::Stopped). Must be called from within a
    /// tokio runtime (subscriber workers are spawned here).
    pub fn build(self, host: HostRef) -> Result<Arc<Orchestrator>, BuildError> {
        let factory = self.engine.ok_or(BuildError::MissingEngine)?;
        let reporting = self.reporting.ok_or(BuildError::MissingReporting)?;
        if reporting.is_enabled() && reporting.update_interval.is_zero() {
            return Err(BuildError::InvalidInterval);
        }
        if self.cfg.stop_timeout.is_zero() {
            return Err(BuildError::InvalidStopTimeout {
                timeout: self.cfg.stop_timeout,
            });
        }

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let engine = Arc::new(EngineSupervisor::new(
            factory,
            self.cfg.stop_timeout,
            bus.clone(),
        ));

        let publisher = reporting.is_enabled().then(|| {
            let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
            StatePublisher::new(Arc::clone(&engine), sink, reporting.clone(), bus.clone())
        });
        let router = EventRouter::new(
            Arc::clone(&host),
            self.hooks,
            self.cfg.watch_connectivity,
            bus.clone(),
        );

        let orch = Arc::new(Orchestrator::new_internal(
            self.cfg, reporting, host, bus, engine, publisher, router, subs,
        ));
        orch.subscriber_listener();
        Ok(orch)
    }
}
