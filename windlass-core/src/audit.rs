//! Audit sink contract for api-key usage events.

use async_trait::async_trait;
use std::fmt::Debug;

/// Receives one pass/fail event per executed operation.
///
/// Sinks only ever see the opaque api-key id carried by the operation
/// context, never the raw secret. Sink failures are logged by the
/// executor and must not affect the operation outcome.
#[async_trait]
pub trait AuditSink: Send + Sync + Debug {
    async fn log_api_key_usage(
        &self,
        provider_name: &str,
        operation_name: &str,
        success: bool,
        api_key_id: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// Default sink that emits audit events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log_api_key_usage(
        &self,
        provider_name: &str,
        operation_name: &str,
        success: bool,
        api_key_id: Option<&str>,
    ) -> anyhow::Result<()> {
        tracing::info!(
            provider = provider_name,
            operation = operation_name,
            success,
            api_key_id = api_key_id.unwrap_or("-"),
            "api key usage"
        );
        Ok(())
    }
}
