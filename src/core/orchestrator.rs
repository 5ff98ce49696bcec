//! # Orchestrator: session lifecycle, reporting and external events.
//!
//! The [`Orchestrator`] owns the [`EngineSupervisor`], the [`StatePublisher`]
//! and the [`EventRouter`], and sequences them.
//!
//! ## State machine
//! ```text
//!            startup()                          shutdown(false)
//! Stopped ─────────────► Starting ─► Running ─────────────────► StoppingNonDestructive ─┐
//!                                       │                                                ├─► Terminated
//!                                       └────── shutdown(true) ─► StoppingDestructive ──┘   (host.terminate)
//! ```
//!
//! ## Sequences
//! ```text
//! startup():   router.register ─► publisher.start_publishing (if enabled) ─► start()
//! shutdown():  host.move_to_background ─► publisher.stop_publishing (if enabled)
//!              ─► router.unregister ─► stop() ─► host.clear_user_data (if clear)
//!              ─► host.terminate(exit_code)
//! start():     [session lock] supervisor.start_engine ─► host.register_session
//! stop():      [session lock] host.unregister_session ─► supervisor.stop_engine (bounded)
//! restart():   [session lock] stop ─► start   (only while Running)
//! ```
//!
//! ## Rules
//! - `start`, `stop` and `restart` are serialized by one session lock; handle
//!   installation and teardown never interleave.
//! - `shutdown` is terminal: there is no way back to `Stopped` in this process.
//! - `current_state` never blocks, even while a stop is in progress.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        Config, ReportingConfig,
        publisher::StatePublisher,
        router::{EventRouter, Lifecycle},
        shutdown,
        supervisor::{EngineSupervisor, StopOutcome},
    },
    engine::EngineState,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    host::HostRef,
    subscribers::SubscriberSet,
};

use super::builder::OrchestratorBuilder;

/// Lifecycle phase of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, `startup` not called yet.
    Stopped,
    /// `startup` in progress.
    Starting,
    /// Session running.
    Running,
    /// `shutdown(false)` in progress.
    StoppingNonDestructive,
    /// `shutdown(true)` in progress.
    StoppingDestructive,
    /// Shutdown finished; the host was asked to terminate.
    Terminated,
}

/// Supervises one engine session for a hosting process.
pub struct Orchestrator {
    cfg: Config,
    reporting: ReportingConfig,
    host: HostRef,
    bus: Bus,
    engine: Arc<EngineSupervisor>,
    publisher: Option<StatePublisher>,
    router: EventRouter,
    session: tokio::sync::Mutex<()>,
    phase: Mutex<Phase>,
    terminated: CancellationToken,
    subs: Arc<SubscriberSet>,
}

impl Orchestrator {
    /// Returns a builder; see [`OrchestratorBuilder`].
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: Config,
        reporting: ReportingConfig,
        host: HostRef,
        bus: Bus,
        engine: Arc<EngineSupervisor>,
        publisher: Option<StatePublisher>,
        router: EventRouter,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        Self {
            cfg,
            reporting,
            host,
            bus,
            engine,
            publisher,
            router,
            session: tokio::sync::Mutex::new(()),
            phase: Mutex::new(Phase::Stopped),
            terminated: CancellationToken::new(),
            subs,
        }
    }

    /// Registers event sources, starts the publisher (unless reporting is
    /// disabled) and starts the session.
    ///
    /// Only valid in [`Phase::Stopped`]. On error the orchestrator is left in
    /// `Stopped` with nothing registered.
    pub async fn startup(self: &Arc<Self>) -> Result<(), RuntimeError> {
        self.transition(Phase::Stopped, Phase::Starting)?;

        let lifecycle: Weak<Self> = Arc::downgrade(self);
        if let Err(err) = self.router.register(lifecycle) {
            self.set_phase(Phase::Stopped);
            return Err(err);
        }
        if let Some(publisher) = &self.publisher {
            if let Err(err) = publisher.start_publishing().await {
                let _ = self.router.unregister();
                self.set_phase(Phase::Stopped);
                return Err(err);
            }
        }
        self.start().await;

        self.set_phase(Phase::Running);
        tracing::debug!("orchestrator running");
        Ok(())
    }

    /// Tears the session down and asks the host to terminate the process.
    ///
    /// With `clear = true` all persisted application state is cleared first.
    /// Only valid in [`Phase::Running`]; the engine stop is bounded by
    /// [`Config::stop_timeout`].
    pub async fn shutdown(&self, clear: bool) -> Result<(), RuntimeError> {
        let (next, mode) = if clear {
            (Phase::StoppingDestructive, "destructive")
        } else {
            (Phase::StoppingNonDestructive, "non_destructive")
        };
        self.transition(Phase::Running, next)?;
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(mode));

        self.host.move_to_background();
        if let Some(publisher) = &self.publisher {
            publisher.stop_publishing();
        }
        if let Err(err) = self.router.unregister() {
            tracing::warn!(%err, "event sources were not registered");
        }
        self.stop().await;
        if clear {
            self.host.clear_user_data();
        }

        self.bus
            .publish(Event::new(EventKind::ShutdownCompleted).with_reason(mode));
        self.set_phase(Phase::Terminated);
        self.terminated.cancel();
        tracing::debug!(mode, code = self.cfg.exit_code, "terminating host process");
        self.host.terminate(self.cfg.exit_code);
        Ok(())
    }

    /// Starts a session: installs a new engine and marks the session active.
    ///
    /// Returns without waiting for the engine to become ready. Does nothing if
    /// an engine is already installed or once `shutdown` has begun.
    pub async fn start(&self) {
        let _session = self.session.lock().await;
        self.start_locked();
    }

    /// Ends the session: clears the session marker and stops the engine,
    /// waiting at most [`Config::stop_timeout`].
    pub async fn stop(&self) -> StopOutcome {
        let _session = self.session.lock().await;
        self.stop_locked().await
    }

    /// Stops then starts the session in one critical section.
    ///
    /// Does nothing unless the orchestrator is [`Phase::Running`].
    pub async fn restart(&self) {
        let _session = self.session.lock().await;
        if self.phase() != Phase::Running {
            tracing::debug!(phase = ?self.phase(), "restart skipped");
            return;
        }
        self.stop_locked().await;
        self.start_locked();
    }

    /// Runs `startup`, then waits for an OS termination signal and runs
    /// `shutdown(false)`.
    ///
    /// Returns early if another path (e.g. a notification action) shut the
    /// orchestrator down first.
    pub async fn run_until_signal(self: &Arc<Self>) -> Result<(), RuntimeError> {
        self.startup().await?;
        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                res?;
                match self.shutdown(false).await {
                    Err(RuntimeError::InvalidPhase { .. }) if self.terminated.is_cancelled() => Ok(()),
                    other => other,
                }
            }
            _ = self.terminated.cancelled() => Ok(()),
        }
    }

    /// Current engine state, or [`DEFAULT_STATE`](crate::DEFAULT_STATE) when
    /// no engine is installed. Never blocks.
    pub fn current_state(&self) -> EngineState {
        self.engine.current_state()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// True while the periodic publisher is scheduled.
    pub fn is_publishing(&self) -> bool {
        self.publisher
            .as_ref()
            .is_some_and(StatePublisher::is_publishing)
    }

    /// True while the event sources are registered.
    pub fn is_listening(&self) -> bool {
        self.router.is_registered()
    }

    /// Subscribes to the lifecycle event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    pub(crate) fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn start_locked(&self) {
        let phase = self.phase();
        if matches!(
            phase,
            Phase::StoppingNonDestructive | Phase::StoppingDestructive | Phase::Terminated
        ) {
            tracing::debug!(?phase, "start skipped");
            return;
        }
        if self.engine.start_engine() {
            self.host.register_session(&self.reporting);
            self.bus.publish(Event::new(EventKind::SessionStarted));
        }
    }

    async fn stop_locked(&self) -> StopOutcome {
        if !self.engine.is_running() {
            return StopOutcome::Idle;
        }
        self.host.unregister_session();
        let outcome = self.engine.stop_engine().await;
        self.bus.publish(Event::new(EventKind::SessionStopped));
        outcome
    }

    fn transition(&self, from: Phase, to: Phase) -> Result<(), RuntimeError> {
        let mut phase = self.phase.lock();
        if *phase != from {
            return Err(RuntimeError::InvalidPhase {
                expected: from,
                actual: *phase,
            });
        }
        *phase = to;
        Ok(())
    }

    fn set_phase(&self, to: Phase) {
        *self.phase.lock() = to;
    }
}

#[async_trait]
impl Lifecycle for Orchestrator {
    async fn restart(&self) {
        Orchestrator::restart(self).await;
    }

    async fn shutdown(&self, clear: bool) -> Result<(), RuntimeError> {
        Orchestrator::shutdown(self, clear).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::engine::DEFAULT_STATE;
    use crate::host::{CONNECTIVITY_ACTION, ExternalEvent, NOTIFICATION_ACTION};
    use crate::testing::{
        CountingSink, HostCall, Probe, RecordingHost, SinkMode, eventually, mock_factory,
    };

    struct Rig {
        orch: Arc<Orchestrator>,
        host: Arc<RecordingHost>,
        probe: Arc<Probe>,
        sink: Arc<CountingSink>,
    }

    fn rig_with(
        configure: impl FnOnce(OrchestratorBuilder) -> OrchestratorBuilder,
        stop_delay: Duration,
    ) -> Rig {
        let host = RecordingHost::new();
        let probe = Probe::new();
        let sink = CountingSink::new(SinkMode::Ok);
        let builder = Orchestrator::builder()
            .with_engine(mock_factory(&probe, stop_delay))
            .with_reporting(ReportingConfig::every(Duration::from_millis(20)))
            .with_sink(sink.clone());
        let orch = configure(builder).build(host.clone()).unwrap();
        Rig {
            orch,
            host,
            probe,
            sink,
        }
    }

    fn rig() -> Rig {
        rig_with(|b| b, Duration::ZERO)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn startup_wires_everything_and_runs_the_engine() {
        let Rig {
            orch,
            host,
            probe,
            sink,
        } = rig();
        assert_eq!(orch.phase(), Phase::Stopped);

        orch.startup().await.unwrap();
        assert_eq!(orch.phase(), Phase::Running);
        assert!(orch.is_listening());
        assert!(orch.is_publishing());
        assert!(host.is_registered(NOTIFICATION_ACTION));
        assert!(host.is_registered(CONNECTIVITY_ACTION));
        assert_eq!(host.calls(), vec![HostCall::RegisterSession]);
        assert!(sink.attempts() >= 1);
        assert_eq!(probe.created(), 1);
        assert!(eventually(|| orch.current_state() == EngineState::Started).await);

        assert!(matches!(
            orch.startup().await,
            Err(RuntimeError::InvalidPhase {
                expected: Phase::Stopped,
                actual: Phase::Running
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_requires_running() {
        let Rig { orch, host, .. } = rig();
        assert!(matches!(
            orch.shutdown(false).await,
            Err(RuntimeError::InvalidPhase { .. })
        ));
        assert!(host.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn notification_tap_without_hook_shuts_down_keeping_data() {
        let Rig {
            orch, host, probe, ..
        } = rig();
        orch.startup().await.unwrap();

        assert!(host.dispatch(ExternalEvent::NotificationTapped));
        assert!(host.wait_terminated(Duration::from_secs(2)).await);

        assert_eq!(
            host.calls(),
            vec![
                HostCall::RegisterSession,
                HostCall::Background,
                HostCall::UnregisterSession,
                HostCall::Terminate(0),
            ]
        );
        assert_eq!(orch.phase(), Phase::Terminated);
        assert_eq!(probe.stopped(), 1);
        assert_eq!(orch.current_state(), DEFAULT_STATE);
        assert!(!orch.is_publishing());
        assert!(!orch.is_listening());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn confirm_without_hook_clears_data_before_terminating() {
        let Rig { orch, host, .. } = rig();
        orch.startup().await.unwrap();

        assert!(host.dispatch(ExternalEvent::ConfirmTapped));
        assert!(host.wait_terminated(Duration::from_secs(2)).await);

        assert_eq!(
            host.calls(),
            vec![
                HostCall::RegisterSession,
                HostCall::Background,
                HostCall::UnregisterSession,
                HostCall::ClearData,
                HostCall::Terminate(0),
            ]
        );
        assert_eq!(orch.phase(), Phase::Terminated);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn hooks_override_the_default_shutdown() {
        let taps = Arc::new(AtomicUsize::new(0));
        let Rig { orch, host, .. } = rig_with(
            |b| {
                let taps = Arc::clone(&taps);
                b.on_notification_action(move || {
                    taps.fetch_add(1, Ordering::SeqCst);
                })
            },
            Duration::ZERO,
        );
        orch.startup().await.unwrap();

        host.dispatch(ExternalEvent::NotificationTapped);
        assert!(eventually(|| taps.load(Ordering::SeqCst) == 1).await);
        assert!(!host.wait_terminated(Duration::from_millis(100)).await);
        assert_eq!(orch.phase(), Phase::Running);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_is_bounded_by_stop_timeout() {
        let Rig { orch, host, .. } = rig_with(
            |b| b.stop_timeout(Duration::from_millis(100)),
            Duration::from_secs(2),
        );
        orch.startup().await.unwrap();

        let began = Instant::now();
        orch.shutdown(false).await.unwrap();
        assert!(began.elapsed() < Duration::from_secs(1));
        assert_eq!(host.calls().last(), Some(&HostCall::Terminate(0)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn start_after_shutdown_installs_nothing() {
        let Rig {
            orch, host, probe, ..
        } = rig();
        orch.startup().await.unwrap();
        orch.shutdown(false).await.unwrap();
        assert_eq!(orch.phase(), Phase::Terminated);

        orch.start().await;
        orch.restart().await;
        assert_eq!(probe.created(), 1);
        assert!(!orch.engine.is_running());
        assert_eq!(orch.current_state(), DEFAULT_STATE);
        assert_eq!(host.calls().last(), Some(&HostCall::Terminate(0)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn disabled_reporting_never_publishes() {
        let Rig { orch, host, sink, .. } = rig_with(
            |b| b.with_reporting(ReportingConfig::disabled()),
            Duration::ZERO,
        );
        orch.startup().await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(sink.attempts(), 0);
        assert!(!orch.is_publishing());
        assert!(host.is_registered(NOTIFICATION_ACTION));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_start_stop_never_overlap_engines() {
        let Rig { orch, probe, .. } = rig_with(|b| b, Duration::from_millis(2));

        let mut tasks = Vec::new();
        for i in 0..32 {
            let orch = Arc::clone(&orch);
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    orch.start().await;
                } else {
                    orch.stop().await;
                }
                let _ = orch.current_state();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        orch.stop().await;

        assert!(probe.created() >= 1);
        assert_eq!(probe.max_live(), 1);
        assert_eq!(probe.created(), probe.stopped());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reconnect_restarts_the_engine() {
        let Rig { orch, host, probe, .. } = rig();
        orch.startup().await.unwrap();

        for connected in [true, false, true] {
            host.dispatch(ExternalEvent::ConnectivityChanged { connected });
        }
        assert!(eventually(|| probe.created() == 2).await);
        assert_eq!(probe.stopped(), 1);
        assert!(eventually(|| orch.current_state() == EngineState::Started).await);
        assert_eq!(orch.phase(), Phase::Running);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn connectivity_watch_can_be_disabled() {
        let Rig { orch, host, .. } = rig_with(|b| b.watch_connectivity(false), Duration::ZERO);
        orch.startup().await.unwrap();
        assert!(!host.is_registered(CONNECTIVITY_ACTION));
        assert!(!host.dispatch(ExternalEvent::ConnectivityChanged { connected: true }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_until_signal_returns_after_external_shutdown() {
        let Rig { orch, host, .. } = rig();
        let runner = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.run_until_signal().await }
        });

        assert!(eventually(|| orch.phase() == Phase::Running).await);
        host.dispatch(ExternalEvent::NotificationTapped);
        let res = tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .unwrap()
            .unwrap();
        assert!(res.is_ok());
        assert_eq!(orch.phase(), Phase::Terminated);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lifecycle_events_are_broadcast() {
        let Rig { orch, .. } = rig();
        let mut rx = orch.subscribe();
        orch.startup().await.unwrap();
        orch.shutdown(false).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        for kind in [
            EventKind::StatePublished,
            EventKind::EngineStarting,
            EventKind::SessionStarted,
            EventKind::ShutdownRequested,
            EventKind::EngineStopping,
            EventKind::SessionStopped,
            EventKind::ShutdownCompleted,
        ] {
            assert!(kinds.contains(&kind), "missing {kind:?} in {kinds:?}");
        }
    }
}
