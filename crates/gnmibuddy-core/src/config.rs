// ── Runtime configuration for the core ──
//
// Plain structs with defaults. Loading from files and the environment is the
// job of `gnmibuddy-config`; the core only consumes the values.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::capability::{Encoding, EncodingPolicy, ModelTable, PreflightPolicy, RequestInspector};
use crate::error::CoreError;

/// Which preflight check runs first.
///
/// With `EncodingFirst` a device lacking both a usable encoding and a
/// required model reports `EncodingNotSupported`; with `ModelsFirst` it
/// reports `ModelNotSupported`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CheckOrder {
    #[default]
    EncodingFirst,
    ModelsFirst,
}

/// Settings for single-device request execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub check_order: CheckOrder,
    /// Fallback order used when a requested encoding is unavailable.
    pub encoding_preference: Vec<Encoding>,
    pub model_table: Arc<ModelTable>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            check_order: CheckOrder::default(),
            encoding_preference: EncodingPolicy::default().preference().to_vec(),
            model_table: Arc::new(ModelTable::openconfig()),
        }
    }
}

impl ExecutorConfig {
    pub fn encoding_policy(&self) -> EncodingPolicy {
        EncodingPolicy::with_preference(self.encoding_preference.clone())
    }

    pub fn preflight_policy(&self) -> PreflightPolicy {
        PreflightPolicy::new(
            RequestInspector::new(Arc::clone(&self.model_table)),
            self.encoding_policy(),
            self.check_order,
        )
    }
}

/// Settings for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Devices processed at once.
    pub device_concurrency: usize,
    /// Operations in flight per device.
    pub per_device_concurrency: usize,
    /// Upper bound on each operation, preflight included.
    #[serde(with = "secs")]
    pub operation_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            device_concurrency: 5,
            per_device_concurrency: 2,
            operation_timeout: Duration::from_secs(30),
        }
    }
}

impl BatchConfig {
    /// Reject limits that would deadlock the batch or that no semaphore
    /// can hold.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_limit("device_concurrency", self.device_concurrency)?;
        check_limit("per_device_concurrency", self.per_device_concurrency)?;
        if self.operation_timeout.is_zero() {
            return Err(CoreError::ValidationFailed {
                message: "operation_timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn check_limit(field: &str, value: usize) -> Result<(), CoreError> {
    if value == 0 {
        return Err(CoreError::ValidationFailed {
            message: format!("{field} must be at least 1"),
        });
    }
    if value > Semaphore::MAX_PERMITS {
        return Err(CoreError::ValidationFailed {
            message: format!("{field} must not exceed {}", Semaphore::MAX_PERMITS),
        });
    }
    Ok(())
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
