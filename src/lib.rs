//! # enginevisor
//!
//! **Enginevisor** supervises one long-running, opaque engine inside a hosting
//! process.
//!
//! It decides *when* the engine runs, keeps an observer informed of the
//! engine's state through a self-rescheduling publisher, and turns external
//! events (connectivity changes, taps on a status surface) into lifecycle
//! actions. What the engine does is not its concern.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Host (app / daemon)                        ReportSink
//!   ├─ session marker                              ▲
//!   ├─ event sources ──► ExternalEvent             │ publish(update, cfg, state)
//!   ├─ move_to_background                          │
//!   ├─ clear_user_data                             │
//!   └─ terminate(code)                             │
//!            ▲       │                             │
//!            │       ▼                             │
//! ┌──────────┴─────────────────────────────────────┴──────────────────┐
//! │  Orchestrator                                                     │
//! │  - phase (Stopped → Starting → Running → Stopping* → Terminated)  │
//! │  - session lock (start / stop / restart are serialized)           │
//! │                                                                   │
//! │  EventRouter ──────► hooks or lifecycle (shutdown / restart)      │
//! │  StatePublisher ───► every update_interval: current_state()       │
//! │  EngineSupervisor ─► slot: ArcSwapOption<engine handle>           │
//! └──────┬─────────────────────────────┬──────────────────────────────┘
//!        │                             │
//!        ▼                             ▼
//!  thread "enginevisor-start"    thread "enginevisor-stop"
//!    engine.start()                engine.stop()  (joined with stop_timeout)
//!
//!  every component ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                     ┌──────┼──────┐
//!                                                                     ▼      ▼      ▼
//!                                                                  sub1   sub2   subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! startup():   Stopped ─► Starting
//!              ├─► router.register       (connectivity if watched, notification always)
//!              ├─► publisher.start       (one cycle inline, then rescheduled; unless disabled)
//!              └─► start()               (install handle, launch start worker, session marker)
//!              ─► Running
//!
//! shutdown(clear): Running ─► Stopping{NonDestructive|Destructive}
//!              ├─► host.move_to_background
//!              ├─► publisher.stop        (no further reschedule)
//!              ├─► router.unregister
//!              ├─► stop()                (clear slot, launch stop worker, wait ≤ stop_timeout)
//!              ├─► host.clear_user_data  (only when clear)
//!              └─► host.terminate(exit_code)
//!              ─► Terminated
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Orchestration** | Session lifecycle, phases, bounded shutdown.                 | [`Orchestrator`], [`Phase`]                 |
//! | **Engine**        | Opaque engine boundary, one fresh engine per session.        | [`Engine`], [`EngineFn`], [`EngineState`]   |
//! | **Reporting**     | Periodic state reports that survive sink failures.           | [`ReportSink`], [`ReportingConfig`]         |
//! | **Host**          | Session marker, event sources, data clearing, termination.   | [`Host`], [`ProcessHost`], [`ExternalEvent`]|
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, dashboards).   | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors for assembly and lifecycle misuse.              | [`BuildError`], [`RuntimeError`]            |
//! | **Configuration** | Runtime knobs with defaults.                                 | [`Config`], [`OrchestratorBuilder`]         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use enginevisor::{
//!     Engine, EngineError, EngineRef, EngineState, EngineFn, Orchestrator, ProcessHost,
//!     ReportingConfig,
//! };
//!
//! struct Proxy(Mutex<EngineState>);
//!
//! impl Engine for Proxy {
//!     fn start(&self) -> Result<(), EngineError> {
//!         *self.0.lock().unwrap() = EngineState::Started;
//!         Ok(())
//!     }
//!     fn stop(&self) -> Result<(), EngineError> {
//!         *self.0.lock().unwrap() = EngineState::Stopped;
//!         Ok(())
//!     }
//!     fn state(&self) -> EngineState {
//!         *self.0.lock().unwrap()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder()
//!         .with_engine(EngineFn::arc("proxy", || {
//!             Arc::new(Proxy(Mutex::new(EngineState::Created))) as EngineRef
//!         }))
//!         .with_reporting(ReportingConfig::every(Duration::from_secs(1)))
//!         .build(Arc::new(ProcessHost::new()))?;
//!
//!     // Runs until SIGINT/SIGTERM/SIGQUIT, then shuts down and exits the process.
//!     orch.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod engine;
mod error;
mod events;
mod host;
mod reporting;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use crate::core::{
    ActionHook, Config, EngineSupervisor, EventRouter, Hooks, Orchestrator, OrchestratorBuilder,
    Phase, ReportingConfig, StatePublisher, StopOutcome,
};
pub use engine::{
    DEFAULT_STATE, Engine, EngineFactory, EngineFactoryRef, EngineFn, EngineRef, EngineState,
};
pub use error::{BuildError, EngineError, RuntimeError, SinkError};
pub use events::{Bus, Event, EventKind};
pub use host::{
    CONNECTIVITY_ACTION, EventSender, ExternalEvent, Host, HostRef, NOTIFICATION_ACTION,
    ProcessHost,
};
pub use reporting::{ReportSink, ReportSinkRef, TracingSink};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
