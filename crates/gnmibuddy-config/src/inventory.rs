// ── Inventory files ──
//
// A JSON or YAML array of device entries. Entries are validated as a whole
// (every problem is reported, not just the first) before being turned into
// `gnmibuddy_core::Device`s.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gnmibuddy_core::{Credentials, Device, StaticInventory, TlsSettings};

use crate::{Config, ConfigError, INVENTORY_ENV, KEYRING_SERVICE};

const DEFAULT_PORT: i64 = 830;
const DEFAULT_GNMI_TIMEOUT: i64 = 5;

// ── Entry ───────────────────────────────────────────────────────────

/// One device as written in the inventory file.
///
/// Numeric fields are wide so that out-of-range values reach validation
/// instead of failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<i64>,
    pub nos: Option<String>,
    pub username: Option<String>,
    /// Plaintext password (prefer `password_env` or the keyring).
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    pub path_cert: Option<PathBuf>,
    pub path_key: Option<PathBuf>,
    pub path_root: Option<PathBuf>,
    /// TLS server name override.
    #[serde(rename = "override")]
    pub server_name_override: Option<String>,
    pub skip_verify: Option<bool>,
    pub insecure: Option<bool>,
    pub gnmi_timeout: Option<i64>,
}

impl InventoryEntry {
    fn label(&self, index: usize) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map_or_else(|| format!("<unnamed-device-{index}>"), str::to_owned)
    }

    /// Build a core `Device`. Call only on validated entries.
    fn into_device(self) -> Device {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default().to_owned();
        let password = resolve_password(&self, &name);
        let port = u16::try_from(self.port.unwrap_or(DEFAULT_PORT)).unwrap_or(830);
        let timeout_secs = u64::try_from(self.gnmi_timeout.unwrap_or(DEFAULT_GNMI_TIMEOUT)).unwrap_or(5);

        let mut device = Device::new(
            name,
            self.ip_address.unwrap_or_default(),
            port,
            self.nos.unwrap_or_default(),
        );
        device.credentials = Credentials {
            username: self.username,
            password,
        };
        device.tls = TlsSettings {
            insecure: self.insecure.unwrap_or(true),
            skip_verify: self.skip_verify.unwrap_or(false),
            root_ca: self.path_root,
            client_cert: self.path_cert,
            client_key: self.path_key,
            server_name_override: self.server_name_override,
        };
        device.timeout = Duration::from_secs(timeout_secs);
        device
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a device password: `password_env` → inline → keyring.
fn resolve_password(entry: &InventoryEntry, device_name: &str) -> Option<SecretString> {
    // 1. Entry's password_env → env var lookup
    if let Some(ref env_name) = entry.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
        debug!(device = device_name, env = %env_name, "password env var not set");
    }

    // 2. Plaintext in inventory
    if let Some(ref pw) = entry.password {
        return Some(SecretString::from(pw.clone()));
    }

    // 3. System keyring, only worth asking when a username is configured
    if entry.username.is_some() {
        if let Ok(kr) = keyring::Entry::new(KEYRING_SERVICE, &format!("{device_name}/password")) {
            if let Ok(pw) = kr.get_password() {
                return Some(SecretString::from(pw));
            }
        }
    }

    None
}

// ── Path resolution ─────────────────────────────────────────────────

/// Inventory path precedence: CLI flag → `NETWORK_INVENTORY` →
/// `defaults.inventory` in the config file.
pub fn inventory_path(cli: Option<&Path>, config: &Config) -> Result<PathBuf, ConfigError> {
    if let Some(p) = cli {
        debug!(path = %p.display(), "inventory from command line");
        return Ok(p.to_path_buf());
    }
    if let Some(p) = std::env::var_os(INVENTORY_ENV).filter(|v| !v.is_empty()) {
        let p = PathBuf::from(p);
        debug!(path = %p.display(), "inventory from {INVENTORY_ENV}");
        return Ok(p);
    }
    if let Some(ref p) = config.defaults.inventory {
        debug!(path = %p.display(), "inventory from config file");
        return Ok(p.clone());
    }
    Err(ConfigError::NoInventory)
}

// ── Reading ─────────────────────────────────────────────────────────

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Parse an inventory file. YAML for `.yaml`/`.yml`, JSON otherwise.
pub fn read_entries(path: &Path) -> Result<Vec<InventoryEntry>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::InventoryNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

// ── Validation ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    EmptyInventory,
    RequiredField,
    InvalidIpAddress,
    InvalidPort,
    InvalidTimeout,
    IncompleteAuthentication,
    DuplicateName,
}

/// One problem found in an inventory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn device(kind: IssueKind, entry_label: &str, index: usize, field: &str, message: String) -> Self {
        Self {
            kind,
            device: Some(entry_label.to_owned()),
            index: Some(index),
            field: Some(field.to_owned()),
            message,
        }
    }
}

/// Result of validating a whole inventory file.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub total: usize,
    pub valid: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check every entry and return all issues found.
pub fn validate_entries(entries: &[InventoryEntry]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if entries.is_empty() {
        issues.push(ValidationIssue {
            kind: IssueKind::EmptyInventory,
            device: None,
            index: None,
            field: None,
            message: "inventory contains no devices".into(),
        });
        return issues;
    }

    for (index, entry) in entries.iter().enumerate() {
        validate_entry(entry, index, &mut issues);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(name) = entry.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        if let Some(&first) = seen.get(name) {
            issues.push(ValidationIssue::device(
                IssueKind::DuplicateName,
                name,
                index,
                "name",
                format!("duplicate device name '{name}' (first defined at index {first})"),
            ));
        } else {
            seen.insert(name, index);
        }
    }

    issues
}

fn validate_entry(entry: &InventoryEntry, index: usize, issues: &mut Vec<ValidationIssue>) {
    let label = entry.label(index);

    for (field, value) in [
        ("name", &entry.name),
        ("ip_address", &entry.ip_address),
        ("nos", &entry.nos),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            issues.push(ValidationIssue::device(
                IssueKind::RequiredField,
                &label,
                index,
                field,
                format!("missing required field '{field}'"),
            ));
        }
    }

    if let Some(ip) = entry.ip_address.as_deref().filter(|v| !v.trim().is_empty()) {
        if ip.trim().parse::<IpAddr>().is_err() {
            issues.push(ValidationIssue::device(
                IssueKind::InvalidIpAddress,
                &label,
                index,
                "ip_address",
                format!("invalid IP address '{ip}'"),
            ));
        }
    }

    if let Some(port) = entry.port {
        if !(1..=65535).contains(&port) {
            issues.push(ValidationIssue::device(
                IssueKind::InvalidPort,
                &label,
                index,
                "port",
                format!("invalid port {port}; must be between 1 and 65535"),
            ));
        }
    }

    if let Some(timeout) = entry.gnmi_timeout {
        if timeout < 1 {
            issues.push(ValidationIssue::device(
                IssueKind::InvalidTimeout,
                &label,
                index,
                "gnmi_timeout",
                format!("invalid gnmi_timeout {timeout}; must be a positive number of seconds"),
            ));
        }
    }

    match (&entry.path_cert, &entry.path_key) {
        (Some(_), None) => issues.push(ValidationIssue::device(
            IssueKind::IncompleteAuthentication,
            &label,
            index,
            "path_key",
            "path_cert is set but path_key is missing".into(),
        )),
        (None, Some(_)) => issues.push(ValidationIssue::device(
            IssueKind::IncompleteAuthentication,
            &label,
            index,
            "path_cert",
            "path_key is set but path_cert is missing".into(),
        )),
        _ => {}
    }

    let has_password_source = entry.password.is_some() || entry.password_env.is_some();
    if has_password_source && entry.username.as_deref().is_none_or(|u| u.trim().is_empty()) {
        issues.push(ValidationIssue::device(
            IssueKind::IncompleteAuthentication,
            &label,
            index,
            "username",
            "password is configured but username is missing".into(),
        ));
    }
}

/// Read and validate a file, counting valid entries.
pub fn validate_inventory_file(path: &Path) -> Result<ValidationReport, ConfigError> {
    let entries = read_entries(path)?;
    let issues = validate_entries(&entries);

    let mut bad: Vec<usize> = issues.iter().filter_map(|i| i.index).collect();
    bad.sort_unstable();
    bad.dedup();

    let report = ValidationReport {
        path: path.to_path_buf(),
        total: entries.len(),
        valid: entries.len() - bad.len(),
        issues,
    };
    debug!(
        path = %path.display(),
        total = report.total,
        valid = report.valid,
        issues = report.issues.len(),
        "inventory validated"
    );
    Ok(report)
}

// ── Loading ─────────────────────────────────────────────────────────

/// Read, validate and convert an inventory file.
pub fn load_inventory(path: &Path) -> Result<StaticInventory, ConfigError> {
    let entries = read_entries(path)?;
    let issues = validate_entries(&entries);
    if !issues.is_empty() {
        warn!(path = %path.display(), issues = issues.len(), "inventory failed validation");
        return Err(ConfigError::InvalidInventory {
            path: path.to_path_buf(),
            issues,
        });
    }

    let inventory: StaticInventory = entries.into_iter().map(InventoryEntry::into_device).collect();
    debug!(path = %path.display(), devices = inventory.len(), "inventory loaded");
    Ok(inventory)
}

// ── Device lists ────────────────────────────────────────────────────

/// Split a comma-separated device list, dropping blanks.
pub fn parse_device_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// One device name per line; blank lines and `#` comments are ignored.
pub fn read_device_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}
