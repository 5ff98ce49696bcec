//! # Hosting-process boundary.
//!
//! The orchestrator lives inside a host (an app process, a daemon) that owns the
//! things the orchestrator must not implement itself:
//! - the "session is active" marker (a foreground service, a pid file, ...)
//! - event-source registration (connectivity and notification actions)
//! - the status surface (move to background)
//! - persisted user data and process termination
//!
//! [`Host`] abstracts those; [`ProcessHost`] is a plain in-process implementation.

mod event_source;
mod host;
mod process;

pub use event_source::{CONNECTIVITY_ACTION, EventSender, ExternalEvent, NOTIFICATION_ACTION};
pub use host::{Host, HostRef};
pub use process::ProcessHost;
