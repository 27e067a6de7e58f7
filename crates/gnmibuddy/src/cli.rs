//! Clap derive structures for the `gnmibuddy` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use gnmibuddy_config::Config;
use gnmibuddy_core::CheckOrder;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gnmibuddy -- capability-checked gNMI telemetry for network inventories
#[derive(Debug, Parser)]
#[command(
    name = "gnmibuddy",
    version,
    about = "Check gNMI telemetry requests against device capabilities",
    long_about = "Validate network inventories, infer the YANG models a request needs,\n\
        and run capability preflight checks against captured device capabilities.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Inventory file (JSON or YAML); falls back to NETWORK_INVENTORY
    #[arg(long, short = 'i', global = true)]
    pub inventory: Option<PathBuf>,

    /// Output format (defaults to the configured output)
    #[arg(long, short = 'o', env = "GNMIBUDDY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    /// `--output`, else `defaults.output`, else table.
    pub fn output_format(&self, cfg: &Config) -> OutputFormat {
        self.output.clone().unwrap_or_else(|| {
            <OutputFormat as ValueEnum>::from_str(&cfg.defaults.output, true)
                .unwrap_or(OutputFormat::Table)
        })
    }

    /// `--color`, else `defaults.color`, else auto.
    pub fn color_mode(&self, cfg: &Config) -> ColorMode {
        self.color.clone().unwrap_or_else(|| {
            <ColorMode as ValueEnum>::from_str(&cfg.defaults.color, true)
                .unwrap_or(ColorMode::Auto)
        })
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckOrderArg {
    /// Negotiate the encoding before validating models
    EncodingFirst,
    /// Validate models before negotiating the encoding
    ModelsFirst,
}

impl From<CheckOrderArg> for CheckOrder {
    fn from(arg: CheckOrderArg) -> Self {
        match arg {
            CheckOrderArg::EncodingFirst => Self::EncodingFirst,
            CheckOrderArg::ModelsFirst => Self::ModelsFirst,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and validate the device inventory
    #[command(alias = "inv")]
    Inventory(InventoryArgs),

    /// List devices from the inventory
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show the YANG models (and minimum versions) a set of paths needs
    #[command(alias = "req")]
    Requirements(RequirementsArgs),

    /// Run the capability preflight against captured device capabilities
    #[command(alias = "pf")]
    Preflight(PreflightArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Inventory ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InventoryArgs {
    #[command(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Validate every entry and report all problems found
    Validate,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List inventory devices
    #[command(alias = "ls")]
    List {
        /// Only these devices (comma-separated names)
        #[arg(long, short = 'd', conflicts_with = "device_file")]
        devices: Option<String>,

        /// Only the devices named in this file (one per line)
        #[arg(long)]
        device_file: Option<PathBuf>,

        /// Include connection settings (user, transport security, timeout)
        #[arg(long)]
        detail: bool,
    },
}

// ── Requirements ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RequirementsArgs {
    /// Request paths, e.g. openconfig-interfaces:interfaces
    #[arg(required = true)]
    pub paths: Vec<String>,
}

// ── Preflight ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PreflightArgs {
    /// Captured capabilities of one device (JSON or YAML)
    #[arg(
        long,
        short = 'c',
        required_unless_present = "capabilities_dir",
        conflicts_with = "capabilities_dir"
    )]
    pub capabilities: Option<PathBuf>,

    /// Directory of captures named <device>.json, .yaml or .yml; checks
    /// inventory devices as a batch
    #[arg(long, short = 'C')]
    pub capabilities_dir: Option<PathBuf>,

    /// Only these devices (comma-separated names)
    #[arg(long, short = 'd', requires = "capabilities_dir", conflicts_with = "device_file")]
    pub devices: Option<String>,

    /// Only the devices named in this file (one per line)
    #[arg(long, requires = "capabilities_dir")]
    pub device_file: Option<PathBuf>,

    /// Request path (repeatable)
    #[arg(long = "path", short = 'p', required = true)]
    pub paths: Vec<String>,

    /// Requested encoding (falls back to the preference order if absent)
    #[arg(long, short = 'e')]
    pub encoding: Option<String>,

    /// Override the configured check order
    #[arg(long)]
    pub check_order: Option<CheckOrderArg>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
