//! Inventory command handlers.

use tabled::Tabled;

use gnmibuddy_config::{ValidationIssue, ValidationReport, validate_inventory_file};

use crate::cli::{InventoryArgs, InventoryCommand};
use crate::error::CliError;
use crate::output;

use super::Ctx;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "#")]
    index: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Problem")]
    message: String,
}

impl From<&ValidationIssue> for IssueRow {
    fn from(i: &ValidationIssue) -> Self {
        Self {
            index: i.index.map(|n| n.to_string()).unwrap_or_default(),
            device: i.device.clone().unwrap_or_default(),
            field: i.field.clone().unwrap_or_default(),
            message: i.message.clone(),
        }
    }
}

fn detail(report: &ValidationReport, color: bool) -> String {
    let headline = format!(
        "{}: {} device(s), {} valid",
        report.path.display(),
        report.total,
        report.valid
    );
    if report.is_valid() {
        return output::status(&headline, true, color);
    }
    let rows: Vec<IssueRow> = report.issues.iter().map(IssueRow::from).collect();
    format!(
        "{}\n{}",
        output::status(&headline, false, color),
        output::render_table(&rows)
    )
}

fn plain(report: &ValidationReport) -> String {
    if report.is_valid() {
        return "ok".into();
    }
    report
        .issues
        .iter()
        .map(|i| i.message.clone())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: InventoryArgs, ctx: &Ctx) -> Result<(), CliError> {
    match args.command {
        InventoryCommand::Validate => {
            let path = ctx.inventory_path()?;
            let report = validate_inventory_file(&path)?;
            tracing::info!(
                path = %path.display(),
                total = report.total,
                issues = report.issues.len(),
                "inventory validated"
            );

            let rendered =
                output::render_single(&ctx.format, &report, |r| detail(r, ctx.color), plain)?;
            ctx.print(&rendered);

            if report.is_valid() {
                Ok(())
            } else {
                Err(CliError::InvalidInventory {
                    path: path.display().to_string(),
                    count: report.issues.len(),
                })
            }
        }
    }
}
