// ── Capability negotiation ──
//
// Cache, fetch, inspect, negotiate, check. Everything here is read-mostly
// and shared across concurrent device tasks through `Arc`.

pub mod cache;
pub mod checker;
pub mod encoding;
pub mod fetcher;
pub mod inspector;

pub use cache::CapabilityCache;
pub use checker::{CapabilityChecker, PreflightPolicy};
pub use encoding::{Encoding, EncodingChoice, EncodingPolicy};
pub use fetcher::CapabilityFetcher;
pub use inspector::{ModelTable, RequestInspector};
