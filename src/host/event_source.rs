//! # External event sources.
//!
//! Sources deliver [`ExternalEvent`]s through an [`EventSender`] handed out when
//! the router registers with the host. Registrations are keyed by action
//! identifier: [`CONNECTIVITY_ACTION`] and [`NOTIFICATION_ACTION`].

use tokio::sync::mpsc;

/// Action identifier for connectivity transitions.
pub const CONNECTIVITY_ACTION: &str = "enginevisor.action.CONNECTIVITY_CHANGE";

/// Action identifier for user actions on the status surface.
pub const NOTIFICATION_ACTION: &str = "enginevisor.action.NOTIFICATION";

/// Event delivered by an external source to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalEvent {
    /// Network connectivity changed.
    ConnectivityChanged {
        /// Whether the device is now connected.
        connected: bool,
    },
    /// User acted on the status surface without confirming.
    NotificationTapped,
    /// User confirmed an irreversible action.
    ConfirmTapped,
}

impl ExternalEvent {
    /// Action identifier under which this event is delivered.
    pub fn action(&self) -> &'static str {
        match self {
            ExternalEvent::ConnectivityChanged { .. } => CONNECTIVITY_ACTION,
            ExternalEvent::NotificationTapped | ExternalEvent::ConfirmTapped => {
                NOTIFICATION_ACTION
            }
        }
    }
}

/// Cloneable inbound handle into the router's queue.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::Sender<ExternalEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::Sender<ExternalEvent>) -> Self {
        Self { tx }
    }

    /// Delivers an event without blocking.
    ///
    /// Returns `false` if the router queue is full or the router is gone.
    pub fn deliver(&self, ev: ExternalEvent) -> bool {
        match self.tx.try_send(ev) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(?ev, %err, "external event dropped");
                false
            }
        }
    }

    /// True once the router stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
