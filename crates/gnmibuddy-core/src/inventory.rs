// ── Inventory resolution ──

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{CoreError, ResolutionFailure, ResolveError};
use crate::model::Device;

/// Turns a device reference (usually a name) into a connectable device.
pub trait InventoryResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<Arc<Device>, ResolveError>;
}

/// In-memory inventory keyed by device name, in load order.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    devices: IndexMap<String, Arc<Device>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any earlier entry with the same name.
    pub fn insert(&mut self, device: Device) -> Option<Arc<Device>> {
        self.devices.insert(device.name.clone(), Arc::new(device))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Device>> {
        self.devices.get(name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromIterator<Device> for StaticInventory {
    fn from_iter<I: IntoIterator<Item = Device>>(iter: I) -> Self {
        let mut inv = Self::new();
        for device in iter {
            inv.insert(device);
        }
        inv
    }
}

impl InventoryResolver for StaticInventory {
    fn resolve(&self, reference: &str) -> Result<Arc<Device>, ResolveError> {
        if self.devices.is_empty() {
            return Err(ResolveError::EmptyInventory);
        }
        self.devices
            .get(reference.trim())
            .cloned()
            .ok_or_else(|| ResolveError::NotFound {
                name: reference.to_owned(),
            })
    }
}

/// Resolve every reference, collecting all failures before giving up.
///
/// Devices come back in reference order. Nothing is returned unless every
/// reference resolved.
pub fn resolve_all<S: AsRef<str>>(
    resolver: &dyn InventoryResolver,
    device_refs: &[S],
) -> Result<Vec<Arc<Device>>, CoreError> {
    let mut devices = Vec::with_capacity(device_refs.len());
    let mut failures = Vec::new();

    for reference in device_refs {
        let reference = reference.as_ref();
        match resolver.resolve(reference) {
            Ok(device) => devices.push(device),
            Err(error) => failures.push(ResolutionFailure {
                reference: reference.to_owned(),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(devices)
    } else {
        warn!(failed = failures.len(), "inventory resolution failed");
        Err(CoreError::InventoryResolution { failures })
    }
}
