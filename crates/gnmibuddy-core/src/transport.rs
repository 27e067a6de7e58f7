// ── Transport collaborator ──
//
// The core never talks to a device itself. Everything on the wire goes
// through an implementation of `Transport`, which owns connection handling,
// TLS, authentication and any retry policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::Encoding;
use crate::error::TransportError;
use crate::model::Device;

/// Model entry exactly as a device reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModel {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

/// Un-normalised capabilities response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapabilities {
    #[serde(default, alias = "supported_models")]
    pub models: Vec<RawModel>,
    #[serde(default, alias = "supported_encodings")]
    pub encodings: Vec<String>,
    #[serde(default, alias = "gnmi_version", alias = "gNMI_version")]
    pub protocol_version: Option<String>,
}

/// Device-facing I/O used by the fetcher and executor.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask the device what it supports.
    async fn query_capabilities(&self, device: &Device) -> Result<RawCapabilities, TransportError>;

    /// Retrieve telemetry for `paths` using `encoding`.
    ///
    /// An empty answer is `Value::Null` (or an empty container), not an
    /// error.
    async fn get_telemetry(
        &self,
        device: &Device,
        paths: &[String],
        encoding: &Encoding,
    ) -> Result<serde_json::Value, TransportError>;
}
