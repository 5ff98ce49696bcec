//! # Lifecycle observers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver lifecycle [`Event`](crate::Event)s broadcast through the
//! [`Bus`](crate::Bus) to external observers (dashboards, status
//! surfaces, metrics).
//!
//! ## Architecture
//! ```text
//! Supervisor / Publisher / Router ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                                     │
//!                                                              SubscriberSet::emit
//!                                                           ┌─────────┼─────────┐
//!                                                           ▼         ▼         ▼
//!                                                       LogWriter  Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use enginevisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Timeouts;
//!
//! #[async_trait]
//! impl Subscribe for Timeouts {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::StopTimeoutHit {
//!             // page someone
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
