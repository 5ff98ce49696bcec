//! # EngineSupervisor: owns the engine handle slot.
//!
//! The slot holds at most one engine handle. It is written only by
//! [`start_engine`](EngineSupervisor::start_engine) (compare-and-swap from
//! empty) and [`stop_engine`](EngineSupervisor::stop_engine) (swap to empty),
//! and read lock-free by [`current_state`](EngineSupervisor::current_state).
//!
//! ## Flow
//! ```text
//! start_engine():
//!   factory.create() ─► slot CAS(None → handle) ─► publish EngineStarting
//!                                                └► thread "enginevisor-start": engine.start()
//!                                                       ├─ Ok  ─► EngineStarted
//!                                                       └─ Err ─► EngineStartFailed
//!
//! stop_engine():
//!   slot.swap(None) ─► publish EngineStopping
//!          │           └► thread "enginevisor-stop": engine.stop() ──► oneshot
//!          ▼
//!   timeout(stop_timeout, oneshot)
//!          ├─ Ok(Ok)    ─► EngineStopped      → StopOutcome::Stopped
//!          ├─ Ok(Err)   ─► EngineStopFailed   → StopOutcome::Failed
//!          └─ Elapsed   ─► StopTimeoutHit     → StopOutcome::TimedOut (worker detached)
//! ```
//!
//! ## Rules
//! - The slot is cleared **before** the stop worker is spawned, so readers never
//!   observe a handle that is being torn down.
//! - Engine errors and panics are logged and published, never returned.
//! - `stop_engine` is the only method that waits, and never longer than
//!   `stop_timeout` (plus scheduling slack).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::{sync::oneshot, time};

use crate::{
    engine::{DEFAULT_STATE, EngineFactoryRef, EngineRef, EngineState},
    error::EngineError,
    events::{Bus, Event, EventKind},
};

/// Installed engine plus the generation it was created in.
struct Handle {
    engine: EngineRef,
    generation: u64,
}

/// Result of a bounded stop.
///
/// None of these is an error for the caller: the orchestrator proceeds the same
/// way in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No engine was installed; nothing to do.
    Idle,
    /// The engine's `stop` returned `Ok` within the timeout.
    Stopped,
    /// The engine's `stop` returned an error or panicked within the timeout.
    Failed,
    /// The timeout elapsed first; the stop keeps running detached.
    TimedOut,
}

/// Supervises one engine at a time on dedicated worker threads.
pub struct EngineSupervisor {
    factory: EngineFactoryRef,
    slot: ArcSwapOption<Handle>,
    generation: AtomicU64,
    stop_timeout: Duration,
    bus: Bus,
}

impl EngineSupervisor {
    /// Creates a supervisor with an empty slot.
    pub fn new(factory: EngineFactoryRef, stop_timeout: Duration, bus: Bus) -> Self {
        Self {
            factory,
            slot: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            stop_timeout,
            bus,
        }
    }

    /// Installs a fresh engine and launches its start worker.
    ///
    /// Returns immediately without waiting for the engine to become ready.
    /// Returns `false` if an engine is already installed; a caller that loses
    /// a concurrent install drops its engine unstarted.
    pub fn start_engine(&self) -> bool {
        if self.slot.load().is_some() {
            tracing::debug!(engine = self.factory.name(), "engine already installed");
            return false;
        }

        let generation = self.generation.load(Ordering::Acquire) + 1;
        let handle = Arc::new(Handle {
            engine: self.factory.create(),
            generation,
        });
        let prev = self
            .slot
            .compare_and_swap(&None::<Arc<Handle>>, Some(Arc::clone(&handle)));
        if prev.is_some() {
            tracing::debug!(engine = self.factory.name(), "lost install race; engine discarded");
            return false;
        }
        self.generation.fetch_max(generation, Ordering::AcqRel);
        self.publish(EventKind::EngineStarting, generation);

        let bus = self.bus.clone();
        let name: Arc<str> = self.factory.name().into();
        let spawned = thread::Builder::new()
            .name("enginevisor-start".into())
            .spawn({
                let name = Arc::clone(&name);
                move || match guarded(|| handle.engine.start()) {
                    Ok(()) => bus.publish(
                        Event::new(EventKind::EngineStarted)
                            .with_source(name)
                            .with_generation(generation),
                    ),
                    Err(err) => {
                        tracing::warn!(engine = %name, generation, %err, "engine start failed");
                        bus.publish(
                            Event::new(EventKind::EngineStartFailed)
                                .with_source(name)
                                .with_generation(generation)
                                .with_reason(err.to_string()),
                        );
                    }
                }
            });

        if let Err(err) = spawned {
            tracing::warn!(engine = %name, generation, %err, "failed to spawn start worker");
            self.bus.publish(
                Event::new(EventKind::EngineStartFailed)
                    .with_source(name)
                    .with_generation(generation)
                    .with_reason(err.to_string()),
            );
        }
        true
    }

    /// Takes the installed engine out of the slot and stops it, waiting at most
    /// the configured stop timeout.
    ///
    /// After the first poll the slot is empty, whatever the outcome.
    pub async fn stop_engine(&self) -> StopOutcome {
        let Some(handle) = self.slot.swap(None) else {
            return StopOutcome::Idle;
        };
        let generation = handle.generation;
        self.publish(EventKind::EngineStopping, generation);

        let (tx, rx) = oneshot::channel();
        let spawned = thread::Builder::new()
            .name("enginevisor-stop".into())
            .spawn(move || {
                let _ = tx.send(guarded(|| handle.engine.stop()));
            });
        if let Err(err) = spawned {
            tracing::warn!(engine = self.factory.name(), generation, %err, "failed to spawn stop worker");
            self.publish_stop_failed(generation, err.to_string());
            return StopOutcome::Failed;
        }

        match time::timeout(self.stop_timeout, rx).await {
            Ok(Ok(Ok(()))) => {
                self.publish(EventKind::EngineStopped, generation);
                StopOutcome::Stopped
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!(engine = self.factory.name(), generation, %err, "engine stop failed");
                self.publish_stop_failed(generation, err.to_string());
                StopOutcome::Failed
            }
            Ok(Err(_closed)) => {
                self.publish_stop_failed(generation, "stop worker exited without result".into());
                StopOutcome::Failed
            }
            Err(_elapsed) => {
                tracing::warn!(
                    engine = self.factory.name(),
                    generation,
                    timeout = ?self.stop_timeout,
                    "engine stop still running after timeout; proceeding"
                );
                self.bus.publish(
                    Event::new(EventKind::StopTimeoutHit)
                        .with_source(self.factory.name())
                        .with_generation(generation)
                        .with_timeout(self.stop_timeout),
                );
                StopOutcome::TimedOut
            }
        }
    }

    /// Returns the installed engine's state, or [`DEFAULT_STATE`] when none is.
    ///
    /// Never blocks.
    pub fn current_state(&self) -> EngineState {
        match self.slot.load_full() {
            Some(handle) => handle.engine.state(),
            None => DEFAULT_STATE,
        }
    }

    /// True while an engine is installed.
    pub fn is_running(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Generation of the most recently created engine (0 before the first start).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    fn publish(&self, kind: EventKind, generation: u64) {
        self.bus.publish(
            Event::new(kind)
                .with_source(self.factory.name())
                .with_generation(generation),
        );
    }

    fn publish_stop_failed(&self, generation: u64, reason: String) {
        self.bus.publish(
            Event::new(EventKind::EngineStopFailed)
                .with_source(self.factory.name())
                .with_generation(generation)
                .with_reason(reason),
        );
    }
}

/// Runs an engine call, turning a panic into [`EngineError`].
fn guarded(f: impl FnOnce() -> Result<(), EngineError>) -> Result<(), EngineError> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|_| Err(EngineError::failed("engine call panicked")))
}
