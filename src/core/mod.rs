//! Runtime core: orchestration and lifecycle.
//!
//! The public entry point is [`Orchestrator`], assembled by
//! [`OrchestratorBuilder`].
//!
//! Internal modules:
//! - [`supervisor`]: owns the single engine handle, bounded start/stop workers;
//! - [`publisher`]: self-rescheduling state reports;
//! - [`router`]: maps host events to hooks or lifecycle calls;
//! - [`orchestrator`]: phases, session lock, startup/shutdown sequences;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod config;
mod orchestrator;
mod publisher;
mod router;
mod shutdown;
mod supervisor;

pub use builder::OrchestratorBuilder;
pub use config::{Config, ReportingConfig};
pub use orchestrator::{Orchestrator, Phase};
pub use publisher::StatePublisher;
pub use router::{ActionHook, EventRouter, Hooks};
pub use supervisor::{EngineSupervisor, StopOutcome};
