// ── Telemetry requests ──

use serde::{Deserialize, Serialize};

use crate::capability::Encoding;

/// One telemetry retrieval: a named set of paths plus an optional encoding
/// preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRequest {
    /// Operation name, echoed on the per-operation result.
    pub name: String,
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
}

impl TelemetryRequest {
    pub fn new<I, S>(name: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            paths: paths.into_iter().map(Into::into).collect(),
            encoding: None,
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// Ordered list of operations to run against every device in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSpec {
    pub requests: Vec<TelemetryRequest>,
}

impl OperationSpec {
    pub fn new(requests: Vec<TelemetryRequest>) -> Self {
        Self { requests }
    }

    /// Spec with a single operation.
    pub fn single(request: TelemetryRequest) -> Self {
        Self {
            requests: vec![request],
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TelemetryRequest> {
        self.requests.iter()
    }
}

impl<'a> IntoIterator for &'a OperationSpec {
    type Item = &'a TelemetryRequest;
    type IntoIter = std::slice::Iter<'a, TelemetryRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}
