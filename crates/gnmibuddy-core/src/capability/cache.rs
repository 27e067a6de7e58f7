// ── Capability cache ──
//
// Process-lifetime store of per-device capabilities, keyed by `DeviceKey`.
// Each key owns a `OnceCell`, so concurrent first lookups for the same
// device share a single fetch. A failed fetch leaves the cell empty and the
// next caller retries.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::model::{DeviceCapabilities, DeviceKey};

type Slot = Arc<OnceCell<Arc<DeviceCapabilities>>>;

/// Concurrent capability cache with per-key fetch coalescing.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: DashMap<DeviceKey, Slot>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached capabilities, if a fetch for this key has completed.
    pub fn get(&self, key: &DeviceKey) -> Option<Arc<DeviceCapabilities>> {
        self.entries.get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn has(&self, key: &DeviceKey) -> bool {
        self.get(key).is_some()
    }

    /// Store capabilities directly, replacing anything cached for `key`.
    pub fn set(&self, key: DeviceKey, caps: Arc<DeviceCapabilities>) {
        self.entries.insert(key, Arc::new(OnceCell::new_with(Some(caps))));
    }

    /// Return the cached value or run `init` to produce it.
    ///
    /// Concurrent callers for the same key wait on one `init`; callers for
    /// different keys never block each other. If `init` fails, nothing is
    /// cached and the error is returned to the caller that ran it. Callers
    /// that were waiting run their own attempt.
    pub async fn get_or_try_init<F, Fut, E>(
        &self,
        key: &DeviceKey,
        init: F,
    ) -> Result<Arc<DeviceCapabilities>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<DeviceCapabilities>, E>>,
    {
        // Clone the slot out so the shard lock is not held across the await.
        let slot = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        slot.get_or_try_init(init).await.cloned()
    }

    /// Drop the entry for one device so the next lookup refetches.
    pub fn invalidate(&self, key: &DeviceKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of keys with a completed fetch.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
