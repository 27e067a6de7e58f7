// ── Batch orchestration ──
//
// Resolve every device up front (all-or-nothing), then run the operation
// spec against each device with two levels of bounded concurrency:
//
//   devices     ── Semaphore(device_concurrency)
//   operations  ── Semaphore(per_device_concurrency), one per device
//
// Results are assembled by awaiting task handles in input order, so
// completion timing never affects the output.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::BatchConfig;
use crate::error::{CoreError, ErrorKind, TransportError};
use crate::executor::RequestExecutor;
use crate::inventory::{InventoryResolver, resolve_all};
use crate::model::{
    BatchOperationResult, Device, DeviceResult, OperationResult, OperationSpec, TelemetryRequest,
};

/// Runs an operation spec across many devices.
pub struct BatchOrchestrator {
    resolver: Arc<dyn InventoryResolver>,
    executor: Arc<RequestExecutor>,
}

impl BatchOrchestrator {
    pub fn new(resolver: Arc<dyn InventoryResolver>, executor: Arc<RequestExecutor>) -> Self {
        Self { resolver, executor }
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Run `spec` against every device in `device_refs`.
    ///
    /// Fails as a whole only for invalid input or when any reference does
    /// not resolve, in which case no device is contacted. Once devices are
    /// resolved, every per-device outcome is recorded on the result.
    pub async fn run_batch<S: AsRef<str>>(
        &self,
        device_refs: &[S],
        spec: &OperationSpec,
        config: &BatchConfig,
    ) -> Result<BatchOperationResult, CoreError> {
        config.validate()?;
        if device_refs.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "device list is empty".into(),
            });
        }
        if spec.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "operation spec is empty".into(),
            });
        }

        let devices = resolve_all(self.resolver.as_ref(), device_refs)?;
        let started = Instant::now();
        info!(
            devices = devices.len(),
            operations = spec.len(),
            device_concurrency = config.device_concurrency,
            per_device_concurrency = config.per_device_concurrency,
            "batch starting"
        );

        let device_limit = Arc::new(Semaphore::new(config.device_concurrency.min(devices.len())));
        let requests: Arc<[TelemetryRequest]> = spec.requests.clone().into();

        let handles: Vec<(Arc<Device>, JoinHandle<DeviceResult>)> = devices
            .into_iter()
            .map(|device| {
                let handle = tokio::spawn(run_device(
                    Arc::clone(&device),
                    Arc::clone(&requests),
                    Arc::clone(&self.executor),
                    Arc::clone(&device_limit),
                    config.per_device_concurrency.min(spec.len()),
                    config.operation_timeout,
                ));
                (device, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (device, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(device = %device.name, error = %e, "device task aborted");
                    let ops = requests
                        .iter()
                        .map(|req| {
                            OperationResult::failure(
                                device.info(),
                                &req.name,
                                ErrorKind::Internal,
                                format!("device task aborted: {e}"),
                                Duration::ZERO,
                            )
                        })
                        .collect();
                    DeviceResult::new(device.info(), ops)
                }
            };
            results.push(result);
        }

        let batch = BatchOperationResult::new(results, started.elapsed());
        info!(
            total = batch.summary.total,
            succeeded = batch.summary.succeeded,
            failed = batch.summary.failed,
            elapsed_ms = u64::try_from(batch.elapsed.as_millis()).unwrap_or(u64::MAX),
            "batch finished"
        );
        Ok(batch)
    }
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

// ── Per-device task ─────────────────────────────────────────────────

async fn run_device(
    device: Arc<Device>,
    requests: Arc<[TelemetryRequest]>,
    executor: Arc<RequestExecutor>,
    device_limit: Arc<Semaphore>,
    per_device_concurrency: usize,
    operation_timeout: Duration,
) -> DeviceResult {
    // The semaphore is never closed, so acquisition only fails if that
    // changes; run unthrottled rather than dropping the device.
    let _permit = device_limit.acquire_owned().await.ok();
    debug!(device = %device.name, "device task started");

    let op_limit = Arc::new(Semaphore::new(per_device_concurrency));
    let handles: Vec<(usize, JoinHandle<OperationResult>)> = (0..requests.len())
        .map(|idx| {
            let handle = tokio::spawn(run_operation(
                Arc::clone(&device),
                Arc::clone(&requests),
                idx,
                Arc::clone(&executor),
                Arc::clone(&op_limit),
                operation_timeout,
            ));
            (idx, handle)
        })
        .collect();

    let mut operations = Vec::with_capacity(handles.len());
    for (idx, handle) in handles {
        let op = match handle.await {
            Ok(op) => op,
            Err(e) => OperationResult::failure(
                device.info(),
                requests.get(idx).map(|r| r.name.as_str()).unwrap_or_default(),
                ErrorKind::Internal,
                format!("operation task aborted: {e}"),
                Duration::ZERO,
            ),
        };
        operations.push(op);
    }

    let result = DeviceResult::new(device.info(), operations);
    debug!(device = %device.name, status = %result.status, "device task finished");
    result
}

async fn run_operation(
    device: Arc<Device>,
    requests: Arc<[TelemetryRequest]>,
    idx: usize,
    executor: Arc<RequestExecutor>,
    op_limit: Arc<Semaphore>,
    operation_timeout: Duration,
) -> OperationResult {
    let _permit = op_limit.acquire_owned().await.ok();
    let Some(request) = requests.get(idx) else {
        return OperationResult::failure(
            device.info(),
            "",
            ErrorKind::Internal,
            format!("operation index {idx} out of range"),
            Duration::ZERO,
        );
    };

    let started = Instant::now();
    match tokio::time::timeout(operation_timeout, executor.execute(&device, request)).await {
        Ok(result) => result,
        Err(_) => {
            let source = TransportError::Timeout {
                after: operation_timeout,
            };
            warn!(device = %device.name, operation = %request.name, "operation timed out");
            OperationResult::failure(
                device.info(),
                &request.name,
                ErrorKind::Transport,
                CoreError::Transport {
                    device: device.name.clone(),
                    source,
                }
                .to_string(),
                started.elapsed(),
            )
        }
    }
}
