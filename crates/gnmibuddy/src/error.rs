//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use gnmibuddy_config::ConfigError;
use gnmibuddy_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 5;
    pub const PREFLIGHT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Inventory ────────────────────────────────────────────────────
    #[error("No inventory file specified")]
    #[diagnostic(
        code(gnmibuddy::no_inventory),
        help(
            "Pass --inventory <file>, export NETWORK_INVENTORY=<file>,\n\
             or set `inventory` under [defaults] in {config_path}"
        )
    )]
    NoInventory { config_path: String },

    #[error("Inventory file not found: {path}")]
    #[diagnostic(
        code(gnmibuddy::inventory_not_found),
        help("Check the path passed via --inventory or NETWORK_INVENTORY.")
    )]
    InventoryNotFound { path: String },

    #[error("Inventory {path} has {count} problem(s)")]
    #[diagnostic(
        code(gnmibuddy::invalid_inventory),
        help("Run: gnmibuddy inventory validate --inventory {path}")
    )]
    InvalidInventory { path: String, count: usize },

    #[error("Device(s) not found: {names}")]
    #[diagnostic(
        code(gnmibuddy::device_not_found),
        help("Run: gnmibuddy devices list to see available devices")
    )]
    DeviceNotFound { names: String },

    // ── Preflight ────────────────────────────────────────────────────
    #[error("Preflight failed ({kind}): {message}")]
    #[diagnostic(code(gnmibuddy::preflight_failed))]
    PreflightFailed { kind: ErrorKind, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gnmibuddy::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Failed to parse {path}: {message}")]
    #[diagnostic(
        code(gnmibuddy::parse),
        help("JSON is used unless the file ends in .yaml or .yml.")
    )]
    Parse { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(gnmibuddy::config))]
    Config(Box<figment::Error>),

    #[error("Failed to serialize config: {0}")]
    #[diagnostic(code(gnmibuddy::config))]
    ConfigSerialization(#[from] toml::ser::Error),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(gnmibuddy::internal))]
    Internal(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoInventory { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::InventoryNotFound { .. } | Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidInventory { .. } => exit_code::VALIDATION,
            Self::PreflightFailed { .. } => exit_code::PREFLIGHT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoInventory => Self::NoInventory {
                config_path: gnmibuddy_config::config_path().display().to_string(),
            },
            ConfigError::InventoryNotFound { path } => Self::InventoryNotFound {
                path: path.display().to_string(),
            },
            ConfigError::InvalidInventory { path, issues } => Self::InvalidInventory {
                path: path.display().to_string(),
                count: issues.len(),
            },
            ConfigError::Parse { path, message } => Self::Parse {
                path: path.display().to_string(),
                message,
            },
            ConfigError::Serialization(e) => Self::ConfigSerialization(e),
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InventoryResolution { failures } => Self::DeviceNotFound {
                names: failures
                    .iter()
                    .map(|f| f.reference.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "request".into(),
                reason: message,
            },
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnmibuddy_core::{ResolutionFailure, ResolveError};

    #[test]
    fn resolution_failures_become_not_found() {
        let err = CliError::from(CoreError::InventoryResolution {
            failures: vec![
                ResolutionFailure {
                    reference: "r2".into(),
                    error: ResolveError::NotFound { name: "r2".into() },
                },
                ResolutionFailure {
                    reference: "r9".into(),
                    error: ResolveError::NotFound { name: "r9".into() },
                },
            ],
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "Device(s) not found: r2, r9");
    }

    #[test]
    fn config_errors_keep_their_exit_codes() {
        assert_eq!(
            CliError::from(ConfigError::NoInventory).exit_code(),
            exit_code::USAGE
        );
        let invalid = CliError::from(ConfigError::InvalidInventory {
            path: "inv.json".into(),
            issues: Vec::new(),
        });
        assert_eq!(invalid.exit_code(), exit_code::VALIDATION);
    }
}
