//! Capability-negotiated telemetry retrieval for network devices.
//!
//! This crate owns the decision of *whether* a telemetry request should be
//! sent to a device, and the orchestration of sending it to many devices at
//! once:
//!
//! - **[`CapabilityCache`]** / **[`CapabilityFetcher`]**: process-lifetime,
//!   fetch-coalescing store of what each device advertises.
//!
//! - **[`RequestInspector`]**: infers which YANG models a request touches
//!   from its paths, using an explicit [`ModelTable`].
//!
//! - **[`EncodingPolicy`]**: normalises encodings and negotiates a mutually
//!   supported one with a deterministic fallback order.
//!
//! - **[`CapabilityChecker`]**: the preflight decision for a live device.
//!   Pure evaluation against known capabilities lives in [`PreflightPolicy`].
//!
//! - **[`RequestExecutor`]**: preflight, then the real request through the
//!   [`Transport`] collaborator. A failed preflight never reaches the wire.
//!
//! - **[`BatchOrchestrator`]**: all-or-nothing device resolution through an
//!   [`InventoryResolver`], then two-level bounded concurrency with results
//!   assembled in input order.
//!
//! The transport and inventory are traits: this crate never opens sockets or
//! reads files.

pub mod batch;
pub mod capability;
pub mod config;
pub mod error;
pub mod executor;
pub mod inventory;
pub mod model;
pub mod transport;
pub mod version;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::BatchOrchestrator;
pub use capability::{
    CapabilityCache, CapabilityChecker, CapabilityFetcher, Encoding, EncodingChoice, EncodingPolicy,
    ModelTable, PreflightPolicy, RequestInspector,
};
pub use config::{BatchConfig, CheckOrder, ExecutorConfig};
pub use error::{CoreError, ErrorKind, ResolutionFailure, ResolveError, TransportError};
pub use executor::RequestExecutor;
pub use inventory::{InventoryResolver, StaticInventory, resolve_all};
pub use transport::{RawCapabilities, RawModel, Transport};
pub use version::{NormalizedVersion, VersionKind, compare_versions};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BatchOperationResult, BatchSummary, CapabilityCheckResult, Credentials, Device,
    DeviceCapabilities, DeviceInfo, DeviceKey, DeviceResult, ModelIdentifier, ModelRequirement,
    OperationResult, OperationSpec, OperationStatus, Payload, TelemetryRequest, TlsSettings,
};
