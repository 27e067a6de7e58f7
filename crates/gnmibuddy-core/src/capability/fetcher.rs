// ── Capability fetcher ──

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capability::{CapabilityCache, EncodingPolicy};
use crate::error::CoreError;
use crate::model::{Device, DeviceCapabilities};
use crate::transport::Transport;

/// Fetches device capabilities through the transport, at most once per
/// device key for the life of the cache.
pub struct CapabilityFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<CapabilityCache>,
    policy: EncodingPolicy,
}

impl CapabilityFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<CapabilityCache>,
        policy: EncodingPolicy,
    ) -> Self {
        Self {
            transport,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &Arc<CapabilityCache> {
        &self.cache
    }

    /// Cached capabilities for `device`, fetching them on first use.
    ///
    /// Transport failures map to [`CoreError::CapabilityFetch`] and are never
    /// cached.
    pub async fn get_or_fetch(&self, device: &Device) -> Result<Arc<DeviceCapabilities>, CoreError> {
        let key = device.key();
        if let Some(caps) = self.cache.get(&key) {
            debug!(device = %device.name, key = %key, "capabilities cache hit");
            return Ok(caps);
        }

        self.cache
            .get_or_try_init(&key, || async {
                debug!(device = %device.name, key = %key, "querying device capabilities");
                let raw = self.transport.query_capabilities(device).await.map_err(|e| {
                    warn!(device = %device.name, error = %e, "capability query failed");
                    CoreError::CapabilityFetch {
                        device: device.name.clone(),
                        key: key.clone(),
                        source: e,
                    }
                })?;
                let caps = DeviceCapabilities::from_raw(raw, &self.policy);
                info!(
                    device = %device.name,
                    models = caps.models.len(),
                    encodings = caps.encodings.len(),
                    "capabilities cached"
                );
                Ok::<_, CoreError>(Arc::new(caps))
            })
            .await
    }

    /// Force the next lookup for `device` to refetch.
    pub fn invalidate(&self, device: &Device) -> bool {
        let key = device.key();
        debug!(device = %device.name, key = %key, "invalidating cached capabilities");
        self.cache.invalidate(&key)
    }
}

impl std::fmt::Debug for CapabilityFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityFetcher")
            .field("cached", &self.cache.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
