// ── Domain model ──
//
// Value types shared by every component. Capability types are created by
// the fetcher and owned by the cache; check and operation results are
// created per call and owned by the caller.

pub mod capability;
pub mod device;
pub mod request;
pub mod result;

pub use capability::{DeviceCapabilities, ModelIdentifier, ModelRequirement};
pub use device::{Credentials, Device, DeviceInfo, DeviceKey, TlsSettings};
pub use request::{OperationSpec, TelemetryRequest};
pub use result::{
    BatchOperationResult, BatchSummary, CapabilityCheckResult, DeviceResult, OperationResult,
    OperationStatus, Payload,
};
