//! # Host trait.
//!
//! Side effects the orchestrator delegates to the hosting process. Only
//! receiver registration and termination have no default.

use std::sync::Arc;

use crate::core::ReportingConfig;
use crate::host::EventSender;

/// # Services the hosting process provides to the orchestrator.
///
/// Every method is called from async context and must return promptly.
/// Defaults are no-ops except [`terminate`](Host::terminate).
pub trait Host: Send + Sync + 'static {
    /// Marks the session as active (e.g. starts a foreground service showing
    /// the status surface configured by `reporting`).
    fn register_session(&self, reporting: &ReportingConfig) {
        let _ = reporting;
    }

    /// Clears the session-active marker.
    fn unregister_session(&self) {}

    /// Subscribes `sender` to events for `action`.
    fn register_receiver(&self, action: &'static str, sender: EventSender);

    /// Removes the subscription for `action`.
    fn unregister_receiver(&self, action: &'static str);

    /// Moves the visible UI surface to the background.
    fn move_to_background(&self) {}

    /// Clears all persisted application state.
    fn clear_user_data(&self) {}

    /// Terminates the hosting process with `code`.
    fn terminate(&self, code: i32);
}

/// Shared reference to a host.
pub type HostRef = Arc<dyn Host>;
