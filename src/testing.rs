//! Test doubles shared by the in-crate test modules.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::core::ReportingConfig;
use crate::engine::{Engine, EngineFactoryRef, EngineFn, EngineRef, EngineState};
use crate::error::{EngineError, SinkError};
use crate::host::{EventSender, ExternalEvent, Host, ProcessHost};
use crate::reporting::ReportSink;

/// Counters shared by every engine a mock factory creates.
#[derive(Default)]
pub(crate) struct Probe {
    created: AtomicUsize,
    started: AtomicUsize,
    stopped: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    fail: bool,
}

impl Probe {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engines whose `start` and `stop` both return errors.
    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Highest number of engines created and not yet stopped at any moment.
    pub(crate) fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

struct MockEngine {
    state: Mutex<EngineState>,
    stop_delay: Duration,
    probe: Arc<Probe>,
}

impl Engine for MockEngine {
    fn start(&self) -> Result<(), EngineError> {
        *self.state.lock() = EngineState::Starting;
        self.probe.started.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail {
            *self.state.lock() = EngineState::Failed;
            return Err(EngineError::failed("mock start failure"));
        }
        *self.state.lock() = EngineState::Started;
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        *self.state.lock() = EngineState::Stopping;
        std::thread::sleep(self.stop_delay);
        *self.state.lock() = EngineState::Stopped;
        self.probe.live.fetch_sub(1, Ordering::SeqCst);
        self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail {
            return Err(EngineError::failed("mock stop failure"));
        }
        Ok(())
    }

    fn state(&self) -> EngineState {
        *self.state.lock()
    }
}

/// Factory producing mock engines that report into `probe`.
pub(crate) fn mock_factory(probe: &Arc<Probe>, stop_delay: Duration) -> EngineFactoryRef {
    let probe = Arc::clone(probe);
    EngineFn::arc("mock", move || {
        probe.created.fetch_add(1, Ordering::SeqCst);
        let live = probe.live.fetch_add(1, Ordering::SeqCst) + 1;
        probe.max_live.fetch_max(live, Ordering::SeqCst);
        Arc::new(MockEngine {
            state: Mutex::new(EngineState::Created),
            stop_delay,
            probe: Arc::clone(&probe),
        }) as EngineRef
    })
}

/// Side effects a host observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostCall {
    RegisterSession,
    UnregisterSession,
    Background,
    ClearData,
    Terminate(i32),
}

/// Host that records calls instead of acting on the process.
#[derive(Default)]
pub(crate) struct RecordingHost {
    receivers: ProcessHost,
    calls: Mutex<Vec<HostCall>>,
    terminated: Notify,
}

impl RecordingHost {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn dispatch(&self, ev: ExternalEvent) -> bool {
        self.receivers.dispatch(ev)
    }

    pub(crate) fn is_registered(&self, action: &str) -> bool {
        self.receivers.is_registered(action)
    }

    /// Waits until `terminate` is called, up to `within`.
    pub(crate) async fn wait_terminated(&self, within: Duration) -> bool {
        tokio::time::timeout(within, self.terminated.notified())
            .await
            .is_ok()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }
}

impl Host for RecordingHost {
    fn register_session(&self, _reporting: &ReportingConfig) {
        self.record(HostCall::RegisterSession);
    }

    fn unregister_session(&self) {
        self.record(HostCall::UnregisterSession);
    }

    fn register_receiver(&self, action: &'static str, sender: EventSender) {
        self.receivers.register_receiver(action, sender);
    }

    fn unregister_receiver(&self, action: &'static str) {
        self.receivers.unregister_receiver(action);
    }

    fn move_to_background(&self) {
        self.record(HostCall::Background);
    }

    fn clear_user_data(&self) {
        self.record(HostCall::ClearData);
    }

    fn terminate(&self, code: i32) {
        self.record(HostCall::Terminate(code));
        self.terminated.notify_one();
    }
}

/// How a [`CountingSink`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SinkMode {
    Ok,
    Fail,
    Panic,
    Hang,
}

/// Sink that records every attempt.
pub(crate) struct CountingSink {
    mode: SinkMode,
    updates: Mutex<Vec<(u64, EngineState)>>,
}

impl CountingSink {
    pub(crate) fn new(mode: SinkMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            updates: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn attempts(&self) -> usize {
        self.updates.lock().len()
    }

    pub(crate) fn updates(&self) -> Vec<(u64, EngineState)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl ReportSink for CountingSink {
    async fn publish(
        &self,
        update: u64,
        _cfg: &ReportingConfig,
        state: EngineState,
    ) -> Result<(), SinkError> {
        self.updates.lock().push((update, state));
        match self.mode {
            SinkMode::Ok => Ok(()),
            SinkMode::Fail => Err(SinkError::Unreachable {
                error: "mock sink down".into(),
            }),
            SinkMode::Panic => panic!("mock sink panic"),
            SinkMode::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Polls `cond` every 5ms for up to 2s.
pub(crate) async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
