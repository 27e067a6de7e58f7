//! `requirements`: which models (and minimum versions) a request needs.

use tabled::Tabled;

use gnmibuddy_core::{ModelRequirement, RequestInspector};

use crate::cli::RequirementsArgs;
use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct RequirementRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Minimum Version")]
    minimum_version: String,
}

impl From<&ModelRequirement> for RequirementRow {
    fn from(r: &ModelRequirement) -> Self {
        Self {
            name: r.name.clone(),
            minimum_version: r.minimum_version.clone(),
        }
    }
}

pub fn handle(args: &RequirementsArgs, ctx: &Ctx) -> Result<(), CliError> {
    let table = ctx.config.executor_config().model_table;
    let requirements = RequestInspector::new(table).infer_requirements(&args.paths);
    if requirements.is_empty() {
        tracing::info!(paths = args.paths.len(), "no known model in any path");
    }

    let rendered = output::render_list(&ctx.format, &requirements, |r| RequirementRow::from(r), |r| {
        format!("{}>={}", r.name, r.minimum_version)
    })?;
    ctx.print(&rendered);
    Ok(())
}
