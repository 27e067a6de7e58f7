// ── Single-device request execution ──
//
// Preflight, then the real request. A failed preflight is returned as-is
// and the transport is never called for that request.

use std::sync::Arc;
use tokio::time::Instant;

use tracing::{debug, warn};

use crate::capability::{CapabilityCache, CapabilityChecker, CapabilityFetcher};
use crate::config::ExecutorConfig;
use crate::error::ErrorKind;
use crate::model::{Device, OperationResult, OperationStatus, Payload, TelemetryRequest};
use crate::transport::Transport;

/// Runs telemetry requests against one device at a time.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    checker: Arc<CapabilityChecker>,
    config: ExecutorConfig,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        checker: Arc<CapabilityChecker>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            transport,
            checker,
            config,
        }
    }

    /// Wire fetcher and checker from `config` on top of a shared cache.
    pub fn from_config(
        transport: Arc<dyn Transport>,
        cache: Arc<CapabilityCache>,
        config: ExecutorConfig,
    ) -> Self {
        let fetcher = Arc::new(CapabilityFetcher::new(
            Arc::clone(&transport),
            cache,
            config.encoding_policy(),
        ));
        let checker = Arc::new(CapabilityChecker::new(fetcher, config.preflight_policy()));
        Self::new(transport, checker, config)
    }

    pub fn checker(&self) -> &Arc<CapabilityChecker> {
        &self.checker
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute one request. Always returns a result; failures are data.
    ///
    /// The negotiated encoding applies to this call only. Preflight warnings
    /// are carried onto the result whether or not the request succeeds.
    pub async fn execute(&self, device: &Device, request: &TelemetryRequest) -> OperationResult {
        let started = Instant::now();
        let check = self
            .checker
            .check(device, &request.paths, request.encoding.as_ref())
            .await;

        let mut result = OperationResult {
            device: device.info(),
            operation: request.name.clone(),
            status: OperationStatus::Failed,
            payload: None,
            warnings: check.warnings,
            error_kind: None,
            error_message: None,
            selected_encoding: check.selected_encoding,
            elapsed: started.elapsed(),
        };

        if !check.success {
            debug!(
                device = %device.name,
                operation = %request.name,
                kind = ?check.error_kind,
                "preflight failed, request not sent"
            );
            result.error_kind = check.error_kind.or(Some(ErrorKind::Internal));
            result.error_message = check.error_message;
            return result;
        }

        let Some(encoding) = result.selected_encoding.clone() else {
            result.error_kind = Some(ErrorKind::Internal);
            result.error_message = Some("preflight passed without selecting an encoding".into());
            return result;
        };

        match self
            .transport
            .get_telemetry(device, &request.paths, &encoding)
            .await
        {
            Ok(value) => {
                let payload = Payload::from_value(value);
                debug!(
                    device = %device.name,
                    operation = %request.name,
                    encoding = %encoding,
                    empty = payload.is_empty(),
                    "request completed"
                );
                result.status = OperationStatus::Success;
                result.payload = Some(payload);
            }
            Err(e) => {
                warn!(
                    device = %device.name,
                    operation = %request.name,
                    error = %e,
                    "request failed"
                );
                result.error_kind = Some(ErrorKind::Transport);
                result.error_message = Some(e.to_string());
            }
        }

        result.elapsed = started.elapsed();
        result
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("checker", &self.checker)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
