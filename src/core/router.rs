//! # EventRouter: external events to lifecycle actions.
//!
//! The router registers one inbound queue with the [`Host`](crate::Host) under
//! the notification action (always) and the connectivity action (when enabled),
//! then drains it on a dedicated task.
//!
//! ## Policy
//! ```text
//! NotificationTapped ─► on_notification hook set? ─ yes ─► invoke hook
//!                                                  └ no ──► shutdown(clear = false)
//! ConfirmTapped      ─► on_confirm hook set?      ─ yes ─► invoke hook
//!                                                  └ no ──► shutdown(clear = true)
//! ConnectivityChanged{connected}
//!   ├─ first report after register  ─► baseline only
//!   ├─ same as last report          ─► ignored
//!   └─ changed                      ─► ConnectivityChanged event
//!                                       └─ connected == true ─► restart()
//! ```
//!
//! ## Rules
//! - `register` and `unregister` must be paired; a second `register` or an
//!   unmatched `unregister` is an error.
//! - Events are handled one at a time, in arrival order.
//! - A panicking hook is logged; the router keeps running.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    host::{CONNECTIVITY_ACTION, EventSender, ExternalEvent, HostRef, NOTIFICATION_ACTION},
};

/// Capacity of the router's inbound queue.
const ROUTER_QUEUE: usize = 64;

/// Caller-supplied replacement for a default action.
pub type ActionHook = Arc<dyn Fn() + Send + Sync>;

/// Optional overrides for the two user-action events.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Replaces the non-destructive shutdown on [`ExternalEvent::NotificationTapped`].
    pub on_notification: Option<ActionHook>,
    /// Replaces the destructive shutdown on [`ExternalEvent::ConfirmTapped`].
    pub on_confirm: Option<ActionHook>,
}

/// Lifecycle operations the router may trigger.
#[async_trait]
pub(crate) trait Lifecycle: Send + Sync + 'static {
    /// Stops then starts the session.
    async fn restart(&self);

    /// Terminal shutdown, optionally clearing persisted state.
    async fn shutdown(&self, clear: bool) -> Result<(), RuntimeError>;
}

/// Decision for one external event.
enum Action {
    Ignore,
    Invoke(&'static str, ActionHook),
    Shutdown { clear: bool },
    Restart,
}

/// Immutable policy state shared with the listener task.
#[derive(Clone)]
struct Dispatcher {
    hooks: Hooks,
    watch_connectivity: bool,
    bus: Bus,
}

impl Dispatcher {
    fn resolve(&self, ev: ExternalEvent, connectivity: &mut Option<bool>) -> Action {
        match ev {
            ExternalEvent::NotificationTapped => {
                self.bus.publish(Event::new(EventKind::NotificationAction));
                match &self.hooks.on_notification {
                    Some(hook) => Action::Invoke("notification", Arc::clone(hook)),
                    None => Action::Shutdown { clear: false },
                }
            }
            ExternalEvent::ConfirmTapped => {
                self.bus.publish(Event::new(EventKind::ConfirmAction));
                match &self.hooks.on_confirm {
                    Some(hook) => Action::Invoke("confirm", Arc::clone(hook)),
                    None => Action::Shutdown { clear: true },
                }
            }
            ExternalEvent::ConnectivityChanged { .. } if !self.watch_connectivity => Action::Ignore,
            ExternalEvent::ConnectivityChanged { connected } => {
                match connectivity.replace(connected) {
                    None => Action::Ignore,
                    Some(prev) if prev == connected => Action::Ignore,
                    Some(_) => {
                        self.bus
                            .publish(Event::new(EventKind::ConnectivityChanged).with_connected(connected));
                        if connected { Action::Restart } else { Action::Ignore }
                    }
                }
            }
        }
    }

    async fn listen(
        self,
        mut rx: mpsc::Receiver<ExternalEvent>,
        token: CancellationToken,
        lifecycle: Weak<dyn Lifecycle>,
    ) {
        let mut connectivity = None;
        loop {
            let ev = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                ev = rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
            };

            match self.resolve(ev, &mut connectivity) {
                Action::Ignore => {}
                Action::Invoke(name, hook) => {
                    self.bus
                        .publish(Event::new(EventKind::OverrideInvoked).with_source(name));
                    if catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
                        tracing::warn!(hook = name, "override hook panicked");
                    }
                }
                Action::Shutdown { clear } => {
                    let Some(lifecycle) = lifecycle.upgrade() else { break };
                    tracing::debug!(clear, "default action: shutdown");
                    if let Err(err) = lifecycle.shutdown(clear).await {
                        tracing::warn!(%err, "shutdown request rejected");
                    }
                }
                Action::Restart => {
                    let Some(lifecycle) = lifecycle.upgrade() else { break };
                    tracing::debug!("connectivity restored: restarting session");
                    lifecycle.restart().await;
                }
            }
        }
        tracing::debug!("event router stopped");
    }
}

/// Routes external events into lifecycle actions.
pub struct EventRouter {
    host: HostRef,
    dispatcher: Dispatcher,
    registration: Mutex<Option<CancellationToken>>,
}

impl EventRouter {
    /// Creates an unregistered router.
    pub fn new(host: HostRef, hooks: Hooks, watch_connectivity: bool, bus: Bus) -> Self {
        Self {
            host,
            dispatcher: Dispatcher {
                hooks,
                watch_connectivity,
                bus,
            },
            registration: Mutex::new(None),
        }
    }

    /// Registers with the host's event sources and starts the listener task.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn register(&self, lifecycle: Weak<dyn Lifecycle>) -> Result<(), RuntimeError> {
        let mut registration = self.registration.lock();
        if registration.is_some() {
            return Err(RuntimeError::AlreadyRegistered);
        }

        let (tx, rx) = mpsc::channel(ROUTER_QUEUE);
        let sender = EventSender::new(tx);
        if self.dispatcher.watch_connectivity {
            self.host.register_receiver(CONNECTIVITY_ACTION, sender.clone());
        }
        self.host.register_receiver(NOTIFICATION_ACTION, sender);

        let token = CancellationToken::new();
        tokio::spawn(self.dispatcher.clone().listen(rx, token.clone(), lifecycle));
        *registration = Some(token);
        Ok(())
    }

    /// Unregisters from the host's event sources and stops the listener task.
    ///
    /// Does not wait for the listener: an event being handled finishes first.
    pub(crate) fn unregister(&self) -> Result<(), RuntimeError> {
        let token = self
            .registration
            .lock()
            .take()
            .ok_or(RuntimeError::NotRegistered)?;

        if self.dispatcher.watch_connectivity {
            self.host.unregister_receiver(CONNECTIVITY_ACTION);
        }
        self.host.unregister_receiver(NOTIFICATION_ACTION);
        token.cancel();
        Ok(())
    }

    /// True between `register` and `unregister`.
    pub fn is_registered(&self) -> bool {
        self.registration.lock().is_some()
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        if let Some(token) = self.registration.get_mut().take() {
            token.cancel();
        }
    }
}
