// ── Device identity and connection data ──
//
// A `Device` is what the inventory resolves a reference into. The core only
// looks at its identity (name, nos, address, port); credentials and TLS
// settings are carried through to the transport untouched.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default per-request timeout a device is given when the inventory is silent.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

/// A connectable network device.
#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    /// Management address (IP or hostname).
    pub address: String,
    pub port: u16,
    /// Network operating system identifier (e.g. `iosxr`).
    pub nos: String,
    pub credentials: Credentials,
    pub tls: TlsSettings,
    pub timeout: Duration,
}

impl Device {
    /// Minimal device with no credentials and default TLS settings.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        nos: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            nos: nos.into(),
            credentials: Credentials::default(),
            tls: TlsSettings::default(),
            timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }

    /// Stable per-connection identity used to key the capability cache.
    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(&self.nos, &self.address, self.port)
    }

    /// Non-sensitive projection suitable for listing and logs.
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.name.clone(),
            address: self.address.clone(),
            port: self.port,
            nos: self.nos.clone(),
        }
    }
}

/// Username/password pair. Either half may be absent (certificate auth).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// TLS options forwarded verbatim to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Plaintext connection, no TLS at all.
    pub insecure: bool,
    /// TLS without certificate verification.
    pub skip_verify: bool,
    pub root_ca: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    /// Override for the server name checked against the certificate.
    pub server_name_override: Option<String>,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            insecure: true,
            skip_verify: false,
            root_ca: None,
            client_cert: None,
            client_key: None,
            server_name_override: None,
        }
    }
}

// ── DeviceKey ───────────────────────────────────────────────────────

/// Cache key for a device endpoint: `nos:address:port`.
///
/// Excludes the device name, so two inventory entries with
/// the same name on different endpoints never share capabilities, and two
/// names pointing at one endpoint do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    pub fn new(nos: &str, address: &str, port: u16) -> Self {
        Self(format!("{nos}:{address}:{port}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── DeviceInfo ──────────────────────────────────────────────────────

/// Device fields that are safe to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub nos: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_name_but_not_endpoint() {
        let a = Device::new("edge-1", "10.0.0.1", 57400, "iosxr");
        let b = Device::new("edge-1-alias", "10.0.0.1", 57400, "iosxr");
        let c = Device::new("edge-1", "10.0.0.1", 57401, "iosxr");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_eq!(a.key().as_str(), "iosxr:10.0.0.1:57400");
    }

    #[test]
    fn info_omits_credentials() {
        let mut dev = Device::new("core-1", "192.0.2.7", 830, "iosxr");
        dev.credentials.username = Some("admin".into());
        dev.credentials.password = Some(SecretString::from("hunter2".to_string()));

        let json = serde_json::to_string(&dev.info()).unwrap_or_default();
        assert!(json.contains("core-1"));
        assert!(!json.contains("admin"));
        assert!(!json.contains("hunter2"));
    }
}
