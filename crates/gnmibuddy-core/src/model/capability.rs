// ── Capability model types ──

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::capability::{Encoding, EncodingPolicy};
use crate::transport::RawCapabilities;

/// A YANG model a device advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl ModelIdentifier {
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_owned),
            organization: None,
        }
    }

    /// Exact, case-sensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name
    }
}

/// A model a request needs, with the oldest version known to work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequirement {
    pub name: String,
    pub minimum_version: String,
}

impl ModelRequirement {
    pub fn new(name: impl Into<String>, minimum_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            minimum_version: minimum_version.into(),
        }
    }
}

/// Everything a device advertised in its capabilities response, normalised.
///
/// Immutable once built; shared through `Arc` by the cache and every check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub models: Vec<ModelIdentifier>,
    /// Normalised, deduplicated, in the order the device reported them.
    pub encodings: IndexSet<Encoding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl DeviceCapabilities {
    /// Normalise a raw transport response.
    ///
    /// Models with an empty name are dropped. Empty version strings become
    /// `None`. Encodings are normalised through `policy`.
    pub fn from_raw(raw: RawCapabilities, policy: &EncodingPolicy) -> Self {
        let models = raw
            .models
            .into_iter()
            .filter(|m| !m.name.trim().is_empty())
            .map(|m| ModelIdentifier {
                name: m.name.trim().to_owned(),
                version: m.version.filter(|v| !v.trim().is_empty()),
                organization: m.organization.filter(|o| !o.is_empty()),
            })
            .collect();

        let encodings = raw
            .encodings
            .iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| policy.normalize(e))
            .collect();

        Self {
            models,
            encodings,
            protocol_version: raw.protocol_version.filter(|v| !v.is_empty()),
        }
    }

    /// First advertised model with this exact name.
    pub fn model(&self, name: &str) -> Option<&ModelIdentifier> {
        self.models.iter().find(|m| m.matches(name))
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.model(name).is_some()
    }

    pub fn supports_encoding(&self, encoding: &Encoding) -> bool {
        self.encodings.contains(encoding)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::transport::RawModel;

    fn raw() -> RawCapabilities {
        RawCapabilities {
            models: vec![
                RawModel {
                    name: "openconfig-system".into(),
                    version: Some("0.17.1".into()),
                    organization: Some("OpenConfig working group".into()),
                },
                RawModel {
                    name: String::new(),
                    version: Some("1.0.0".into()),
                    organization: None,
                },
                RawModel {
                    name: "Cisco-IOS-XR-ifmgr-oper".into(),
                    version: Some(String::new()),
                    organization: None,
                },
            ],
            encodings: vec!["JSON_IETF".into(), "json_ietf".into(), "ASCII".into()],
            protocol_version: Some("0.8.0".into()),
        }
    }

    #[test]
    fn from_raw_normalises_and_dedupes() {
        let caps = DeviceCapabilities::from_raw(raw(), &EncodingPolicy::default());

        assert_eq!(caps.models.len(), 2);
        assert_eq!(caps.encodings.len(), 2);
        assert!(caps.supports_encoding(&Encoding::JsonIetf));
        assert!(caps.supports_encoding(&Encoding::Ascii));
        assert_eq!(caps.protocol_version.as_deref(), Some("0.8.0"));
    }

    #[test]
    fn empty_version_becomes_none() {
        let caps = DeviceCapabilities::from_raw(raw(), &EncodingPolicy::default());
        let xr = caps.model("Cisco-IOS-XR-ifmgr-oper").unwrap();
        assert!(xr.version.is_none());
    }

    #[test]
    fn model_lookup_is_exact() {
        let caps = DeviceCapabilities::from_raw(raw(), &EncodingPolicy::default());
        assert!(caps.has_model("openconfig-system"));
        assert!(!caps.has_model("OpenConfig-System"));
        assert!(!caps.has_model("openconfig"));
    }
}
