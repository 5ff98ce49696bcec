use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ReportingConfig;
use crate::engine::EngineState;
use crate::error::SinkError;

/// # Receives periodic state reports.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use enginevisor::{EngineState, ReportSink, ReportingConfig, SinkError};
///
/// struct Stdout;
///
/// #[async_trait]
/// impl ReportSink for Stdout {
///     async fn publish(
///         &self,
///         update: u64,
///         _cfg: &ReportingConfig,
///         state: EngineState,
///     ) -> Result<(), SinkError> {
///         println!("#{update}: {state}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ReportSink: Send + Sync + 'static {
    /// Emits one report.
    ///
    /// `update` increases by one per publisher cycle, starting at 1.
    async fn publish(
        &self,
        update: u64,
        cfg: &ReportingConfig,
        state: EngineState,
    ) -> Result<(), SinkError>;
}

/// Shared reference to a reporting sink.
pub type ReportSinkRef = Arc<dyn ReportSink>;

/// Sink that logs every report at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl ReportSink for TracingSink {
    async fn publish(
        &self,
        update: u64,
        _cfg: &ReportingConfig,
        state: EngineState,
    ) -> Result<(), SinkError> {
        tracing::info!(update, %state, "engine state");
        Ok(())
    }
}
