// ── Check and operation results ──
//
// Every per-device outcome is data. A failed device is a `DeviceResult`
// with `status == Failed`, never an `Err`.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::capability::Encoding;
use crate::error::ErrorKind;
use crate::model::DeviceInfo;

fn duration_ms<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// ── Preflight ───────────────────────────────────────────────────────

/// Outcome of the capability preflight for one request against one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityCheckResult {
    pub success: bool,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_encoding: Option<Encoding>,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CapabilityCheckResult {
    pub(crate) fn passed(
        selected_encoding: Option<Encoding>,
        used_fallback: bool,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            warnings,
            selected_encoding,
            used_fallback,
            error_kind: None,
            error_message: None,
        }
    }

    pub(crate) fn failed(kind: ErrorKind, message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            warnings,
            selected_encoding: None,
            used_fallback: false,
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }
}

// ── Operation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Failed,
}

/// Telemetry returned by a successful operation.
///
/// A device that answers with nothing is a success with `Empty`, not a
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Empty,
    Data(serde_json::Value),
}

impl Payload {
    /// `null`, `[]` and `{}` are all treated as an empty answer.
    pub fn from_value(value: serde_json::Value) -> Self {
        let empty = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
            _ => false,
        };
        if empty { Self::Empty } else { Self::Data(value) }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Empty => None,
            Self::Data(v) => Some(v),
        }
    }
}

/// Outcome of one telemetry request against one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub device: DeviceInfo,
    pub operation: String,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_encoding: Option<Encoding>,
    #[serde(rename = "elapsed_ms", serialize_with = "duration_ms")]
    pub elapsed: Duration,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    /// Failure that happened outside the executor (join error, timeout).
    pub fn failure(
        device: DeviceInfo,
        operation: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            device,
            operation: operation.into(),
            status: OperationStatus::Failed,
            payload: None,
            warnings: Vec::new(),
            error_kind: Some(kind),
            error_message: Some(message.into()),
            selected_encoding: None,
            elapsed,
        }
    }
}

// ── Device / batch ──────────────────────────────────────────────────

/// Every operation outcome for one device, in operation-spec order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceResult {
    pub device: DeviceInfo,
    /// `Success` iff every operation succeeded.
    pub status: OperationStatus,
    pub operations: Vec<OperationResult>,
}

impl DeviceResult {
    pub fn new(device: DeviceInfo, operations: Vec<OperationResult>) -> Self {
        let status = if operations.iter().all(OperationResult::is_success) {
            OperationStatus::Success
        } else {
            OperationStatus::Failed
        };
        Self {
            device,
            status,
            operations,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    /// First failed operation, if any.
    pub fn first_failure(&self) -> Option<&OperationResult> {
        self.operations.iter().find(|op| !op.is_success())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Fraction of devices that succeeded, `0.0` for an empty batch.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }
}

/// Aggregate batch outcome. `results` is in input device order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOperationResult {
    pub results: Vec<DeviceResult>,
    pub summary: BatchSummary,
    #[serde(rename = "elapsed_ms", serialize_with = "duration_ms")]
    pub elapsed: Duration,
}

impl BatchOperationResult {
    pub fn new(results: Vec<DeviceResult>, elapsed: Duration) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        };
        Self {
            results,
            summary,
            elapsed,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeviceResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(name: &str) -> DeviceInfo {
        DeviceInfo {
            name: name.into(),
            address: "10.0.0.1".into(),
            port: 57400,
            nos: "iosxr".into(),
        }
    }

    fn ok(name: &str) -> OperationResult {
        OperationResult {
            device: info(name),
            operation: "system".into(),
            status: OperationStatus::Success,
            payload: Some(Payload::Empty),
            warnings: vec![],
            error_kind: None,
            error_message: None,
            selected_encoding: Some(Encoding::JsonIetf),
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn payload_empty_detection() {
        assert!(Payload::from_value(json!(null)).is_empty());
        assert!(Payload::from_value(json!([])).is_empty());
        assert!(Payload::from_value(json!({})).is_empty());
        assert!(!Payload::from_value(json!({"a": 1})).is_empty());
        assert!(!Payload::from_value(json!(0)).is_empty());
    }

    #[test]
    fn device_status_requires_every_operation() {
        let failed = OperationResult::failure(
            info("r1"),
            "interfaces",
            ErrorKind::Transport,
            "reset",
            Duration::ZERO,
        );
        let mixed = DeviceResult::new(info("r1"), vec![ok("r1"), failed]);
        assert_eq!(mixed.status, OperationStatus::Failed);
        assert_eq!(mixed.first_failure().unwrap().operation, "interfaces");

        let clean = DeviceResult::new(info("r2"), vec![ok("r2")]);
        assert!(clean.is_success());
    }

    #[test]
    fn summary_counts_devices() {
        let failed = DeviceResult::new(
            info("r2"),
            vec![OperationResult::failure(
                info("r2"),
                "system",
                ErrorKind::CapabilityFetch,
                "refused",
                Duration::ZERO,
            )],
        );
        let batch = BatchOperationResult::new(
            vec![DeviceResult::new(info("r1"), vec![ok("r1")]), failed],
            Duration::from_millis(10),
        );
        assert_eq!(batch.summary.total, 2);
        assert_eq!(batch.summary.succeeded, 1);
        assert_eq!(batch.summary.failed, 1);
        assert!((batch.summary.success_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(batch.failed().count(), 1);
    }

    #[test]
    fn serialises_elapsed_as_millis() {
        let v = serde_json::to_value(ok("r1")).unwrap();
        assert_eq!(v["elapsed_ms"], json!(3));
        assert_eq!(v["status"], json!("success"));
        assert_eq!(v["selected_encoding"], json!("json_ietf"));
    }
}
