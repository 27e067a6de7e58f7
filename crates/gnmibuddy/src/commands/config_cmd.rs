//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Ctx;

pub fn handle(args: &ConfigArgs, ctx: &Ctx) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            // Table and plain both show the file format itself
            let rendered = match ctx.format {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&ctx.config)?,
                _ => output::render_single(&ctx.format, &ctx.config, |_| String::new(), |_| {
                    String::new()
                })?,
            };
            ctx.print(rendered.trim_end());
            Ok(())
        }
        ConfigCommand::Path => {
            ctx.print(&gnmibuddy_config::config_path().display().to_string());
            Ok(())
        }
    }
}
