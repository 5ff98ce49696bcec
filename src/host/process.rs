//! # In-process host.
//!
//! [`ProcessHost`] suits daemons and CLIs: external sources call
//! [`ProcessHost::dispatch`] to feed the router, persisted state is a data
//! directory, and termination is [`std::process::exit`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::core::ReportingConfig;
use crate::host::{EventSender, ExternalEvent, Host};

/// Host backed by the current process.
#[derive(Default)]
pub struct ProcessHost {
    data_dir: Option<PathBuf>,
    receivers: Mutex<HashMap<&'static str, EventSender>>,
    session: AtomicBool,
}

impl ProcessHost {
    /// Creates a host without persisted data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host whose persisted data lives under `dir`.
    #[must_use]
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Routes `ev` to the receiver registered for its action.
    ///
    /// Returns `false` when nobody is registered or delivery failed.
    pub fn dispatch(&self, ev: ExternalEvent) -> bool {
        let sender = self.receivers.lock().get(ev.action()).cloned();
        match sender {
            Some(sender) => sender.deliver(ev),
            None => false,
        }
    }

    /// True while a session is registered.
    pub fn session_active(&self) -> bool {
        self.session.load(Ordering::Acquire)
    }

    /// True while a receiver is registered for `action`.
    pub fn is_registered(&self, action: &str) -> bool {
        self.receivers.lock().contains_key(action)
    }
}

fn clear_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

impl Host for ProcessHost {
    fn register_session(&self, reporting: &ReportingConfig) {
        tracing::debug!(interval = ?reporting.update_interval, "session registered");
        self.session.store(true, Ordering::Release);
    }

    fn unregister_session(&self) {
        tracing::debug!("session unregistered");
        self.session.store(false, Ordering::Release);
    }

    fn register_receiver(&self, action: &'static str, sender: EventSender) {
        self.receivers.lock().insert(action, sender);
    }

    fn unregister_receiver(&self, action: &'static str) {
        self.receivers.lock().remove(action);
    }

    fn clear_user_data(&self) {
        let Some(dir) = &self.data_dir else {
            return;
        };
        if let Err(err) = clear_dir(dir) {
            tracing::warn!(dir = %dir.display(), %err, "failed to clear user data");
        }
    }

    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}
