//! Command dispatch: bridges CLI args -> config/core -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod inventory;
pub mod preflight;
pub mod requirements;

use std::path::PathBuf;

use gnmibuddy_config::{Config, parse_device_list, read_device_file};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything a handler needs: flags, loaded config, resolved output.
#[derive(Debug)]
pub struct Ctx {
    pub global: GlobalOpts,
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
}

impl Ctx {
    pub fn new(global: GlobalOpts, config: Config) -> Self {
        let format = global.output_format(&config);
        let color = output::should_color(&global.color_mode(&config));
        Self {
            global,
            config,
            format,
            color,
        }
    }

    /// Inventory path from `--inventory`, `NETWORK_INVENTORY` or config.
    pub fn inventory_path(&self) -> Result<PathBuf, CliError> {
        Ok(gnmibuddy_config::inventory_path(
            self.global.inventory.as_deref(),
            &self.config,
        )?)
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.global.quiet);
    }
}

/// Names picked with `--devices` or `--device-file`; `None` when neither
/// was given.
pub fn requested_devices(
    devices: Option<String>,
    device_file: Option<PathBuf>,
) -> Result<Option<Vec<String>>, CliError> {
    Ok(match (devices, device_file) {
        (Some(raw), _) => Some(parse_device_list(&raw)),
        (None, Some(path)) => Some(read_device_file(&path)?),
        (None, None) => None,
    })
}

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Ctx) -> Result<(), CliError> {
    match cmd {
        Command::Inventory(args) => inventory::handle(args, ctx),
        Command::Devices(args) => devices::handle(args, ctx),
        Command::Requirements(args) => requirements::handle(&args, ctx),
        Command::Preflight(args) => preflight::handle(args, ctx).await,
        Command::Config(args) => config_cmd::handle(&args, ctx),
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
