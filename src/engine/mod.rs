//! # Engine boundary.
//!
//! The supervised engine is opaque to the orchestrator. This module defines what
//! the orchestrator needs from it:
//! - [`Engine`] - synchronous start/stop plus a non-blocking state read
//! - [`EngineState`] - state snapshot reported to observers
//! - [`EngineFactory`] / [`EngineFn`] - builds a fresh engine per session start
//! - [`EngineRef`] / [`EngineFactoryRef`] - shared handles used by the runtime

mod engine;
mod engine_fn;
mod state;

pub use engine::{Engine, EngineRef};
pub use engine_fn::{EngineFactory, EngineFactoryRef, EngineFn};
pub use state::{DEFAULT_STATE, EngineState};
