//! `preflight`: run the capability check against captured snapshots.
//!
//! Snapshots are served through a [`Transport`] so the check takes the
//! same fetch, cache and evaluate path a live device would. With
//! `--capabilities-dir`, the selected inventory devices run through the
//! batch orchestrator under the configured limits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tabled::Tabled;

use gnmibuddy_config::load_inventory;
use gnmibuddy_core::{
    BatchOperationResult, BatchOrchestrator, CapabilityCache, CapabilityCheckResult,
    CapabilityChecker, CapabilityFetcher, Device, DeviceResult, Encoding, ErrorKind,
    ExecutorConfig, ModelRequirement, OperationSpec, RawCapabilities, RequestExecutor,
    TelemetryRequest, Transport, TransportError,
};

use crate::cli::PreflightArgs;
use crate::error::CliError;
use crate::output;

use super::{Ctx, requested_devices};

// ── Snapshot transport ──────────────────────────────────────────────

/// Answers capability queries from captured files, keyed by device name.
///
/// A capture carries no telemetry, so a request that clears preflight
/// gets an empty answer.
#[derive(Debug, Default)]
struct SnapshotTransport {
    snapshots: HashMap<String, Result<RawCapabilities, String>>,
}

impl SnapshotTransport {
    fn single(name: &str, capabilities: RawCapabilities) -> Self {
        Self {
            snapshots: HashMap::from([(name.to_owned(), Ok(capabilities))]),
        }
    }

    /// Read `<dir>/<name>.{json,yaml,yml}` for every name. A missing or
    /// unreadable capture fails only that device's capability query.
    fn from_dir(dir: &Path, names: &[String]) -> Self {
        let snapshots = names
            .iter()
            .map(|name| {
                let snapshot = find_snapshot(dir, name)
                    .ok_or_else(|| {
                        format!("no capture named {name}.json, .yaml or .yml in {}", dir.display())
                    })
                    .and_then(|path| read_snapshot(&path).map_err(|e| e.to_string()));
                (name.clone(), snapshot)
            })
            .collect();
        Self { snapshots }
    }
}

#[async_trait]
impl Transport for SnapshotTransport {
    async fn query_capabilities(&self, device: &Device) -> Result<RawCapabilities, TransportError> {
        match self.snapshots.get(&device.name) {
            Some(Ok(capabilities)) => Ok(capabilities.clone()),
            Some(Err(reason)) => Err(TransportError::Other(reason.clone())),
            None => Err(TransportError::Other(format!(
                "no capability snapshot for {}",
                device.name
            ))),
        }
    }

    async fn get_telemetry(
        &self,
        _device: &Device,
        _paths: &[String],
        _encoding: &Encoding,
    ) -> Result<serde_json::Value, TransportError> {
        Ok(serde_json::Value::Null)
    }
}

fn find_snapshot(dir: &Path, name: &str) -> Option<PathBuf> {
    ["json", "yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

fn read_snapshot(path: &Path) -> Result<RawCapabilities, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: "capabilities".into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    let yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let parsed = if yaml {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| CliError::Parse {
        path: path.display().to_string(),
        message,
    })
}

// ── Single-device report ────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PreflightReport {
    device: String,
    paths: Vec<String>,
    requirements: Vec<ModelRequirement>,
    #[serde(flatten)]
    result: CapabilityCheckResult,
}

fn detail(report: &PreflightReport, color: bool) -> String {
    let r = &report.result;
    let verdict = if r.success { "passed" } else { "failed" };
    let mut lines = vec![
        format!("Device:    {}", report.device),
        format!("Result:    {}", output::status(verdict, r.success, color)),
    ];
    if let Some(ref enc) = r.selected_encoding {
        let note = if r.used_fallback { " (fallback)" } else { "" };
        lines.push(format!("Encoding:  {enc}{note}"));
    }
    let requires = report
        .requirements
        .iter()
        .map(|m| format!("{}>={}", m.name, m.minimum_version))
        .collect::<Vec<_>>();
    lines.push(format!(
        "Requires:  {}",
        if requires.is_empty() {
            "-".into()
        } else {
            requires.join(", ")
        }
    ));
    for w in &r.warnings {
        lines.push(output::warning(&format!("Warning:   {w}"), color));
    }
    if let (Some(kind), Some(message)) = (r.error_kind, r.error_message.as_deref()) {
        lines.push(format!("Error:     {kind}: {message}"));
    }
    lines.join("\n")
}

fn plain(report: &PreflightReport) -> String {
    let r = &report.result;
    match (r.success, &r.selected_encoding, r.error_kind) {
        (true, Some(enc), _) => format!("passed {enc}"),
        (_, _, Some(kind)) => format!("failed {kind}"),
        _ => "failed".into(),
    }
}

// ── Batch report ────────────────────────────────────────────────────

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Encoding")]
    encoding: String,
    #[tabled(rename = "Warnings")]
    warnings: usize,
    #[tabled(rename = "Error")]
    error: String,
}

fn batch_row(result: &DeviceResult, color: bool) -> BatchRow {
    let op = result.first_failure().or_else(|| result.operations.first());
    let verdict = if result.is_success() { "passed" } else { "failed" };
    BatchRow {
        device: result.device.name.clone(),
        result: output::status(verdict, result.is_success(), color),
        encoding: op
            .and_then(|o| o.selected_encoding.as_ref())
            .map_or_else(|| "-".into(), ToString::to_string),
        warnings: result.operations.iter().map(|o| o.warnings.len()).sum(),
        error: op
            .and_then(|o| o.error_kind.zip(o.error_message.as_deref()))
            .map_or_else(|| "-".into(), |(kind, message)| format!("{kind}: {message}")),
    }
}

fn batch_detail(batch: &BatchOperationResult, color: bool) -> String {
    let rows: Vec<BatchRow> = batch.results.iter().map(|r| batch_row(r, color)).collect();
    format!(
        "{}\n{} of {} device(s) passed",
        output::render_table(&rows),
        batch.summary.succeeded,
        batch.summary.total
    )
}

fn batch_plain(batch: &BatchOperationResult) -> String {
    batch
        .results
        .iter()
        .map(|r| {
            let op = r.first_failure().or_else(|| r.operations.first());
            match op.and_then(|o| o.error_kind) {
                Some(kind) => format!("{} failed {kind}", r.device.name),
                None => match op.and_then(|o| o.selected_encoding.as_ref()) {
                    Some(enc) => format!("{} passed {enc}", r.device.name),
                    None => format!("{} passed", r.device.name),
                },
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(args: PreflightArgs, ctx: &Ctx) -> Result<(), CliError> {
    let mut exec = ctx.config.executor_config();
    if let Some(order) = args.check_order {
        exec.check_order = order.into();
    }
    let requested = args
        .encoding
        .as_deref()
        .map(|raw| exec.encoding_policy().normalize(raw));

    match (args.capabilities, args.capabilities_dir) {
        (Some(file), _) => check_snapshot(&file, args.paths, requested, &exec, ctx).await,
        (None, Some(dir)) => {
            let selection = requested_devices(args.devices, args.device_file)?;
            check_batch(&dir, selection, args.paths, requested, exec, ctx).await
        }
        (None, None) => Err(CliError::Validation {
            field: "capabilities".into(),
            reason: "pass --capabilities or --capabilities-dir".into(),
        }),
    }
}

async fn check_snapshot(
    file: &Path,
    paths: Vec<String>,
    requested: Option<Encoding>,
    exec: &ExecutorConfig,
    ctx: &Ctx,
) -> Result<(), CliError> {
    let capabilities = read_snapshot(file)?;
    let policy = exec.preflight_policy();

    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("snapshot")
        .to_owned();
    let device = Device::new(name, "snapshot", 0, "snapshot");

    let transport: Arc<dyn Transport> =
        Arc::new(SnapshotTransport::single(&device.name, capabilities));
    let fetcher = CapabilityFetcher::new(
        transport,
        Arc::new(CapabilityCache::new()),
        exec.encoding_policy(),
    );
    let requirements = policy.inspector.infer_requirements(&paths);
    let checker = CapabilityChecker::new(Arc::new(fetcher), policy);

    let result = checker.check(&device, &paths, requested.as_ref()).await;
    tracing::info!(
        device = %device.name,
        success = result.success,
        check_order = %exec.check_order,
        "preflight finished"
    );

    let report = PreflightReport {
        device: device.name.clone(),
        paths,
        requirements,
        result,
    };
    let rendered = output::render_single(&ctx.format, &report, |r| detail(r, ctx.color), plain)?;
    ctx.print(&rendered);

    match (report.result.error_kind, report.result.error_message) {
        (Some(kind), Some(message)) if !report.result.success => {
            Err(CliError::PreflightFailed { kind, message })
        }
        _ => Ok(()),
    }
}

async fn check_batch(
    dir: &Path,
    selection: Option<Vec<String>>,
    paths: Vec<String>,
    requested: Option<Encoding>,
    exec: ExecutorConfig,
    ctx: &Ctx,
) -> Result<(), CliError> {
    if !dir.is_dir() {
        return Err(CliError::Validation {
            field: "capabilities-dir".into(),
            reason: format!("{} is not a directory", dir.display()),
        });
    }
    let inventory = load_inventory(&ctx.inventory_path()?)?;
    let names = selection.unwrap_or_else(|| inventory.names().map(str::to_owned).collect());

    let transport: Arc<dyn Transport> = Arc::new(SnapshotTransport::from_dir(dir, &names));
    let executor = RequestExecutor::from_config(transport, Arc::new(CapabilityCache::new()), exec);
    let orchestrator = BatchOrchestrator::new(Arc::new(inventory), Arc::new(executor));

    let mut request = TelemetryRequest::new("preflight", paths);
    if let Some(encoding) = requested {
        request = request.with_encoding(encoding);
    }
    let batch = orchestrator
        .run_batch(&names[..], &OperationSpec::single(request), &ctx.config.batch_config())
        .await?;

    let rendered = output::render_single(
        &ctx.format,
        &batch,
        |b| batch_detail(b, ctx.color),
        batch_plain,
    )?;
    ctx.print(&rendered);

    if batch.summary.failed == 0 {
        return Ok(());
    }
    let kind = batch
        .failed()
        .find_map(|r| r.first_failure().and_then(|o| o.error_kind))
        .unwrap_or(ErrorKind::Internal);
    Err(CliError::PreflightFailed {
        kind,
        message: format!(
            "{} of {} device(s) failed",
            batch.summary.failed, batch.summary.total
        ),
    })
}
