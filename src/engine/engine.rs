//! # Engine abstraction.
//!
//! An [`Engine`] runs its own work internally; the orchestrator only tells it
//! **when** to run. Both [`start`](Engine::start) and [`stop`](Engine::stop) are
//! invoked on dedicated worker threads, so they may block.
//! [`state`](Engine::state) is called from the publisher and from arbitrary
//! callers and must return immediately.

use std::sync::Arc;

use crate::engine::EngineState;
use crate::error::EngineError;

/// # Long-running engine supervised by the orchestrator.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use enginevisor::{Engine, EngineError, EngineState};
///
/// #[derive(Default)]
/// struct Proxy { up: AtomicBool }
///
/// impl Engine for Proxy {
///     fn start(&self) -> Result<(), EngineError> {
///         self.up.store(true, Ordering::SeqCst);
///         Ok(())
///     }
///     fn stop(&self) -> Result<(), EngineError> {
///         self.up.store(false, Ordering::SeqCst);
///         Ok(())
///     }
///     fn state(&self) -> EngineState {
///         if self.up.load(Ordering::SeqCst) { EngineState::Started } else { EngineState::Stopped }
///     }
/// }
/// ```
pub trait Engine: Send + Sync + 'static {
    /// Starts the engine. Runs on a worker thread; completion may be asynchronous.
    fn start(&self) -> Result<(), EngineError>;

    /// Stops the engine. Runs on a worker thread; the caller waits a bounded time.
    fn stop(&self) -> Result<(), EngineError>;

    /// Returns the current state. Must not block and must stay valid after `stop`.
    fn state(&self) -> EngineState;
}

/// Shared reference to an engine.
pub type EngineRef = Arc<dyn Engine>;
