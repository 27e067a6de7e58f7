//! Configuration for the gnmibuddy CLI.
//!
//! TOML defaults merged with `GNMIBUDDY_*` environment variables, inventory
//! file loading and validation, and per-device credential resolution
//! (env + inline + keyring). Translates everything into the plain runtime
//! types of `gnmibuddy_core`.

pub mod inventory;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use gnmibuddy_core::{BatchConfig, CheckOrder, Encoding, ExecutorConfig};

pub use inventory::{
    InventoryEntry, IssueKind, ValidationIssue, ValidationReport, inventory_path, load_inventory,
    parse_device_list, read_device_file, read_entries, validate_entries, validate_inventory_file,
};

/// Environment variable naming the inventory file.
pub const INVENTORY_ENV: &str = "NETWORK_INVENTORY";

/// Keyring service under which device passwords are stored.
pub const KEYRING_SERVICE: &str = "gnmibuddy";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(
        "no inventory file specified; pass --inventory or set the NETWORK_INVENTORY environment variable"
    )]
    NoInventory,

    #[error("inventory file not found: {}", .path.display())]
    InventoryNotFound { path: PathBuf },

    #[error("inventory {} has {} problem(s)", .path.display(), .issues.len())]
    InvalidInventory {
        path: PathBuf,
        issues: Vec<ValidationIssue>,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-operation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_device_concurrency")]
    pub device_concurrency: usize,

    #[serde(default = "default_per_device_concurrency")]
    pub per_device_concurrency: usize,

    /// Preferred encoding when a request does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(default)]
    pub check_order: CheckOrder,

    /// Inventory used when neither the CLI nor the environment names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            device_concurrency: default_device_concurrency(),
            per_device_concurrency: default_per_device_concurrency(),
            encoding: None,
            check_order: CheckOrder::default(),
            inventory: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_device_concurrency() -> usize {
    5
}
fn default_per_device_concurrency() -> usize {
    2
}

impl Config {
    /// Batch limits from `[defaults]`.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            device_concurrency: self.defaults.device_concurrency,
            per_device_concurrency: self.defaults.per_device_concurrency,
            operation_timeout: Duration::from_secs(self.defaults.timeout),
        }
    }

    /// Executor settings. A configured default encoding is moved to the
    /// front of the fallback order.
    pub fn executor_config(&self) -> ExecutorConfig {
        let mut config = ExecutorConfig {
            check_order: self.defaults.check_order,
            ..ExecutorConfig::default()
        };
        if let Some(raw) = self.defaults.encoding.as_deref() {
            let preferred = Encoding::normalize(raw);
            config.encoding_preference.retain(|e| *e != preferred);
            config.encoding_preference.insert(0, preferred);
        }
        config
    }

    pub fn default_encoding(&self) -> Option<Encoding> {
        self.defaults.encoding.as_deref().map(Encoding::normalize)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "gnmibuddy", "gnmibuddy").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gnmibuddy");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` (missing file is fine) + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `GNMIBUDDY_DEFAULTS__DEVICE_CONCURRENCY=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GNMIBUDDY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}
