//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use gnmibuddy_config::load_inventory;
use gnmibuddy_core::{Device, TlsSettings, resolve_all};

use crate::cli::{DevicesArgs, DevicesCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, requested_devices};

// ── View ────────────────────────────────────────────────────────────

/// What `devices list` shows. Never carries secrets.
#[derive(Debug, Serialize)]
struct DeviceView {
    name: String,
    address: String,
    port: u16,
    nos: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    security: &'static str,
    timeout_secs: u64,
}

fn security(tls: &TlsSettings) -> &'static str {
    match (tls.insecure, tls.skip_verify) {
        (true, _) => "plaintext",
        (false, true) => "tls-skip-verify",
        (false, false) => "tls",
    }
}

impl From<&Device> for DeviceView {
    fn from(d: &Device) -> Self {
        let info = d.info();
        Self {
            name: info.name,
            address: info.address,
            port: info.port,
            nos: info.nos,
            username: d.credentials.username.clone(),
            security: security(&d.tls),
            timeout_secs: d.timeout.as_secs(),
        }
    }
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "NOS")]
    nos: String,
}

#[derive(Tabled)]
struct DeviceDetailRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "NOS")]
    nos: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Security")]
    security: &'static str,
    #[tabled(rename = "Timeout")]
    timeout: String,
}

impl From<&DeviceView> for DeviceRow {
    fn from(v: &DeviceView) -> Self {
        Self {
            name: v.name.clone(),
            address: v.address.clone(),
            port: v.port,
            nos: v.nos.clone(),
        }
    }
}

impl From<&DeviceView> for DeviceDetailRow {
    fn from(v: &DeviceView) -> Self {
        Self {
            name: v.name.clone(),
            address: v.address.clone(),
            port: v.port,
            nos: v.nos.clone(),
            username: v.username.clone().unwrap_or_else(|| "-".into()),
            security: v.security,
            timeout: format!("{}s", v.timeout_secs),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: DevicesArgs, ctx: &Ctx) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List {
            devices,
            device_file,
            detail,
        } => {
            let inventory = load_inventory(&ctx.inventory_path()?)?;

            let views: Vec<DeviceView> = match requested_devices(devices, device_file)? {
                Some(names) => resolve_all(&inventory, &names[..])?
                    .iter()
                    .map(|d| DeviceView::from(d.as_ref()))
                    .collect(),
                None => inventory.devices().map(|d| DeviceView::from(d.as_ref())).collect(),
            };

            let rendered = if detail {
                output::render_list(&ctx.format, &views, |v| DeviceDetailRow::from(v), |v| {
                    v.name.clone()
                })?
            } else {
                output::render_list(&ctx.format, &views, |v| DeviceRow::from(v), |v| v.name.clone())?
            };
            ctx.print(&rendered);
            Ok(())
        }
    }
}
