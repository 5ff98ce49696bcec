//! # StatePublisher: self-rescheduling state reports.
//!
//! Each **cycle** reads the engine state, hands a report to the
//! [`ReportSink`](crate::ReportSink), then schedules the next cycle
//! `update_interval` later, whatever the sink did.
//!
//! ## Flow
//! ```text
//! start_publishing():
//!   token = new ─► cycle() (inline, awaited) ─► spawn run(token)
//!
//! run(token):
//! loop {
//!   ├─► select (biased):
//!   │     ├─ token.cancelled()      → exit (no reschedule)
//!   │     └─ sleep(update_interval) → continue
//!   └─► cycle():
//!         ├─ state  = supervisor.current_state()
//!         ├─ update = next update id
//!         └─ timeout(update_interval, sink.publish(update, cfg, state))
//!               ├─ Ok      → StatePublished
//!               ├─ Err     → PublishFailed (warn)
//!               ├─ panic   → PublishFailed (warn)
//!               └─ elapsed → PublishFailed (warn)
//! }
//!
//! stop_publishing():
//!   token.cancel()  (an in-flight cycle finishes, nothing is rescheduled)
//! ```
//!
//! ## Rules
//! - The cadence survives any number of failed, panicking or hanging emissions;
//!   one emission is given at most `update_interval`.
//! - Cancellation is observed at the rescheduling step, never mid-emission.
//! - A cycle never waits on the engine: `current_state` is a lock-free read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{ReportingConfig, supervisor::EngineSupervisor},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    reporting::ReportSinkRef,
};

/// Everything a cycle needs; shared with the spawned rescheduling loop.
struct Cycle {
    engine: Arc<EngineSupervisor>,
    sink: ReportSinkRef,
    cfg: ReportingConfig,
    bus: Bus,
    update: AtomicU64,
}

impl Cycle {
    async fn run_once(&self) {
        let state = self.engine.current_state();
        let update = self.update.fetch_add(1, Ordering::Relaxed) + 1;

        let emission =
            std::panic::AssertUnwindSafe(self.sink.publish(update, &self.cfg, state)).catch_unwind();
        let failure = match time::timeout(self.cfg.update_interval, emission).await {
            Ok(Ok(Ok(()))) => None,
            Ok(Ok(Err(err))) => Some(err.to_string()),
            Ok(Err(_panic)) => Some("sink panicked".to_string()),
            Err(_elapsed) => Some("sink timed out".to_string()),
        };

        let ev = match failure {
            None => Event::new(EventKind::StatePublished),
            Some(reason) => {
                tracing::warn!(update, %state, %reason, "state report failed; rescheduling");
                Event::new(EventKind::PublishFailed).with_reason(reason)
            }
        };
        self.bus.publish(ev.with_update(update).with_state(state));
    }

    async fn run(self: Arc<Self>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = time::sleep(self.cfg.update_interval) => {}
            }
            self.run_once().await;
        }
        tracing::debug!("state publisher stopped");
    }
}

/// Periodically reports the supervised engine's state.
pub struct StatePublisher {
    cycle: Arc<Cycle>,
    running: Mutex<Option<CancellationToken>>,
}

impl StatePublisher {
    /// Creates an idle publisher.
    pub fn new(
        engine: Arc<EngineSupervisor>,
        sink: ReportSinkRef,
        cfg: ReportingConfig,
        bus: Bus,
    ) -> Self {
        Self {
            cycle: Arc::new(Cycle {
                engine,
                sink,
                cfg,
                bus,
                update: AtomicU64::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    /// Runs one cycle immediately, then keeps rescheduling until stopped.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start_publishing(&self) -> Result<(), RuntimeError> {
        let token = {
            let mut running = self.running.lock();
            if running.is_some() {
                return Err(RuntimeError::PublisherRunning);
            }
            let token = CancellationToken::new();
            *running = Some(token.clone());
            token
        };

        self.cycle.run_once().await;
        tokio::spawn(Arc::clone(&self.cycle).run(token));
        Ok(())
    }

    /// Cancels future cycles. Returns `false` if the publisher was not running.
    pub fn stop_publishing(&self) -> bool {
        match self.running.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// True between `start_publishing` and `stop_publishing`.
    pub fn is_publishing(&self) -> bool {
        self.running.lock().is_some()
    }
}

impl Drop for StatePublisher {
    fn drop(&mut self) {
        if let Some(token) = self.running.get_mut().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::{DEFAULT_STATE, EngineState};
    use crate::testing::{CountingSink, Probe, SinkMode, eventually, mock_factory};

    const INTERVAL: Duration = Duration::from_millis(20);

    fn publisher(sink: Arc<CountingSink>) -> (StatePublisher, Arc<EngineSupervisor>) {
        let probe = Probe::new();
        let bus = Bus::new(256);
        let engine = Arc::new(EngineSupervisor::new(
            mock_factory(&probe, Duration::ZERO),
            Duration::from_secs(1),
            bus.clone(),
        ));
        let publisher = StatePublisher::new(
            Arc::clone(&engine),
            sink,
            ReportingConfig::every(INTERVAL),
            bus,
        );
        (publisher, engine)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn first_cycle_runs_before_start_returns() {
        let sink = CountingSink::new(SinkMode::Ok);
        let (publisher, _engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        assert_eq!(sink.updates()[0], (1, DEFAULT_STATE));
        assert!(publisher.is_publishing());
        assert!(matches!(
            publisher.start_publishing().await,
            Err(RuntimeError::PublisherRunning)
        ));
        assert!(publisher.stop_publishing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_sink_does_not_break_the_cadence() {
        let sink = CountingSink::new(SinkMode::Fail);
        let (publisher, _engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        assert!(eventually(|| sink.attempts() >= 5).await);
        publisher.stop_publishing();

        let ids: Vec<u64> = sink.updates().iter().map(|(id, _)| *id).collect();
        let expected: Vec<u64> = (1..=ids.len() as u64).collect();
        assert_eq!(ids, expected);
    }

    /// Lets the publisher task run after the paused clock moved.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_sink_keeps_the_configured_interval() {
        let sink = CountingSink::new(SinkMode::Fail);
        let (publisher, _engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        settle().await;
        assert_eq!(sink.attempts(), 1);

        time::advance(INTERVAL - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(sink.attempts(), 1, "no cycle before a full interval");

        time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(sink.attempts(), 2);

        const FAILURES: usize = 5;
        for n in 3..=FAILURES + 1 {
            time::advance(INTERVAL).await;
            settle().await;
            assert_eq!(sink.attempts(), n);
        }
        publisher.stop_publishing();
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_sink_is_cut_off_after_one_interval() {
        let sink = CountingSink::new(SinkMode::Hang);
        let (publisher, _engine) = publisher(sink.clone());
        let mut rx = publisher.cycle.bus.subscribe();

        time::timeout(INTERVAL * 2, publisher.start_publishing())
            .await
            .expect("first cycle must not block start")
            .unwrap();
        assert_eq!(sink.attempts(), 1);

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::PublishFailed);
        assert_eq!(ev.update, Some(1));

        // first cycle ends at 1x, the second starts at 2x
        time::sleep(INTERVAL + Duration::from_millis(1)).await;
        assert_eq!(sink.attempts(), 2);
        publisher.stop_publishing();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_sink_does_not_break_the_cadence() {
        let sink = CountingSink::new(SinkMode::Panic);
        let (publisher, _engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        assert!(eventually(|| sink.attempts() >= 3).await);
        publisher.stop_publishing();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn no_cycles_after_stop() {
        let sink = CountingSink::new(SinkMode::Ok);
        let (publisher, _engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        assert!(eventually(|| sink.attempts() >= 2).await);
        assert!(publisher.stop_publishing());
        assert!(!publisher.stop_publishing());

        time::sleep(Duration::from_millis(5)).await;
        let settled = sink.attempts();
        time::sleep(INTERVAL * 3).await;
        assert_eq!(sink.attempts(), settled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reports_follow_the_engine_state() {
        let sink = CountingSink::new(SinkMode::Ok);
        let (publisher, engine) = publisher(sink.clone());

        publisher.start_publishing().await.unwrap();
        engine.start_engine();
        assert!(
            eventually(|| sink
                .updates()
                .iter()
                .any(|(_, state)| *state == EngineState::Started))
            .await
        );
        publisher.stop_publishing();
        engine.stop_engine().await;
    }
}
