//! # Engine factories.
//!
//! The orchestrator builds a **new** engine every time the session starts, so it
//! holds a factory rather than an engine. The engine's own configuration is
//! opaque here: a factory captures it and passes it through on each `create`.
//!
//! [`EngineFn`] wraps a closure `F: Fn() -> EngineRef`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use enginevisor::{Engine, EngineError, EngineFactoryRef, EngineFn, EngineRef, EngineState};
//!
//! struct Noop;
//! impl Engine for Noop {
//!     fn start(&self) -> Result<(), EngineError> { Ok(()) }
//!     fn stop(&self) -> Result<(), EngineError> { Ok(()) }
//!     fn state(&self) -> EngineState { EngineState::Started }
//! }
//!
//! let factory: EngineFactoryRef = EngineFn::arc("noop", || Arc::new(Noop) as EngineRef);
//! assert_eq!(factory.name(), "noop");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::engine::EngineRef;

/// Builds engine instances from a captured configuration.
pub trait EngineFactory: Send + Sync + 'static {
    /// Stable, human-readable engine name (for logs/events).
    fn name(&self) -> &str;

    /// Creates a fresh, not-yet-started engine.
    fn create(&self) -> EngineRef;
}

/// Shared reference to an engine factory.
pub type EngineFactoryRef = Arc<dyn EngineFactory>;

/// Closure-backed engine factory.
pub struct EngineFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> EngineFn<F> {
    /// Creates a new closure-backed factory.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the factory and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> EngineFactory for EngineFn<F>
where
    F: Fn() -> EngineRef + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> EngineRef {
        (self.f)()
    }
}
