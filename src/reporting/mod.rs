//! # Reporting sink boundary.
//!
//! The state publisher hands each report to a [`ReportSink`]. Delivery is
//! fire-and-forget: a failed or panicking `publish` is logged and the cadence
//! continues.
//!
//! - [`ReportSink`] - async sink contract
//! - [`TracingSink`] - default sink, logs reports via `tracing`

mod sink;

pub use sink::{ReportSink, ReportSinkRef, TracingSink};
