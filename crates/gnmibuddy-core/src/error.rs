// ── Core error types ──
//
// `CoreError` is what callers of the core see when a whole call fails.
// Per-device outcomes inside a batch never surface as `CoreError`; they are
// recorded as data (`ErrorKind` + message) on the device's result so that
// one device can never abort its siblings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::DeviceKey;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Batch-wide ───────────────────────────────────────────────────
    #[error("Inventory resolution failed for {} device(s): {}", .failures.len(), summarize(.failures))]
    InventoryResolution { failures: Vec<ResolutionFailure> },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Per device ───────────────────────────────────────────────────
    #[error("Failed to fetch capabilities from {device} ({key}): {source}")]
    CapabilityFetch {
        device: String,
        key: DeviceKey,
        #[source]
        source: TransportError,
    },

    #[error("Transport error for {device}: {source}")]
    Transport {
        device: String,
        #[source]
        source: TransportError,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The per-device error kind this error corresponds to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InventoryResolution { .. } => ErrorKind::InventoryResolution,
            Self::CapabilityFetch { .. } => ErrorKind::CapabilityFetch,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::ValidationFailed { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

fn summarize(failures: &[ResolutionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("'{}' ({})", f.reference, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One device reference that could not be resolved.
#[derive(Debug, Clone)]
pub struct ResolutionFailure {
    pub reference: String,
    pub error: ResolveError,
}

// ── Collaborator errors ─────────────────────────────────────────────

/// Failure to turn a device reference into a connectable device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("device '{name}' not found in inventory")]
    NotFound { name: String },

    #[error("inventory is empty")]
    EmptyInventory,
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
///
/// Any retry policy belongs to the transport; by the time the core sees one
/// of these, the transport has given up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection refused")]
    ConnectionRefused,

    #[error("timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Error status returned by the device for the RPC.
    #[error("RPC error ({code}): {message}")]
    Rpc { code: String, message: String },

    #[error("{0}")]
    Other(String),
}

// ── ErrorKind ───────────────────────────────────────────────────────

/// Classification attached to failed per-device results.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InventoryResolution,
    CapabilityFetch,
    ModelNotSupported,
    EncodingNotSupported,
    Transport,
    Internal,
}
