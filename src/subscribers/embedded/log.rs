//! # LogWriter - simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//!
//! ## Example output
//! ```text
//! [session-started]
//! [engine-starting] engine="proxy" generation=1
//! [engine-started] engine="proxy" generation=1
//! [published] update=1 state=STARTED
//! [publish-failed] update=2 state=STARTED err="sink unreachable: closed"
//! [connectivity] connected=true
//! [engine-stopping] engine="proxy" generation=1
//! [stop-timeout] engine="proxy" generation=1 timeout_ms=10000
//! [shutdown-requested] mode="destructive"
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let src = e.source.as_deref().unwrap_or("unknown");
        let gen_ = e.generation.unwrap_or(0);
        let why = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SessionStarted => println!("[session-started]"),
            EventKind::SessionStopped => println!("[session-stopped]"),
            EventKind::ShutdownRequested => println!("[shutdown-requested] mode={why:?}"),
            EventKind::ShutdownCompleted => println!("[shutdown-completed] mode={why:?}"),
            EventKind::EngineStarting => {
                println!("[engine-starting] engine={src:?} generation={gen_}")
            }
            EventKind::EngineStarted => {
                println!("[engine-started] engine={src:?} generation={gen_}")
            }
            EventKind::EngineStartFailed => {
                println!("[engine-start-failed] engine={src:?} generation={gen_} err={why:?}")
            }
            EventKind::EngineStopping => {
                println!("[engine-stopping] engine={src:?} generation={gen_}")
            }
            EventKind::EngineStopped => {
                println!("[engine-stopped] engine={src:?} generation={gen_}")
            }
            EventKind::EngineStopFailed => {
                println!("[engine-stop-failed] engine={src:?} generation={gen_} err={why:?}")
            }
            EventKind::StopTimeoutHit => println!(
                "[stop-timeout] engine={src:?} generation={gen_} timeout_ms={}",
                e.timeout_ms.unwrap_or(0)
            ),
            EventKind::StatePublished => println!(
                "[published] update={} state={}",
                e.update.unwrap_or(0),
                e.state.unwrap_or_default()
            ),
            EventKind::PublishFailed => println!(
                "[publish-failed] update={} state={} err={why:?}",
                e.update.unwrap_or(0),
                e.state.unwrap_or_default()
            ),
            EventKind::ConnectivityChanged => {
                println!("[connectivity] connected={}", e.connected.unwrap_or(false))
            }
            EventKind::NotificationAction => println!("[notification-action]"),
            EventKind::ConfirmAction => println!("[confirm-action]"),
            EventKind::OverrideInvoked => println!("[override] event={src:?}"),
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={src:?} reason={why:?}")
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={src} info={why}")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
