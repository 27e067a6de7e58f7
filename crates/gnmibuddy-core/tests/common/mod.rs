#![allow(dead_code, clippy::unwrap_used)]
// Scripted in-memory transport shared by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use gnmibuddy_core::{
    BatchOrchestrator, CapabilityCache, Device, Encoding, ExecutorConfig, ModelTable,
    RawCapabilities, RawModel, RequestExecutor, StaticInventory, Transport, TransportError,
};

// ── Scripts ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Script {
    pub caps: RawCapabilities,
    /// Number of capability queries that fail before one succeeds.
    pub caps_failures: usize,
    pub caps_delay: Duration,
    pub telemetry: Result<Value, TransportError>,
    pub telemetry_delay: Duration,
}

impl Script {
    pub fn new(caps: RawCapabilities) -> Self {
        Self {
            caps,
            caps_failures: 0,
            caps_delay: Duration::ZERO,
            telemetry: Ok(serde_json::json!({"ok": true})),
            telemetry_delay: Duration::ZERO,
        }
    }

    pub fn failing_caps(mut self, times: usize) -> Self {
        self.caps_failures = times;
        self
    }

    pub fn caps_delay(mut self, delay: Duration) -> Self {
        self.caps_delay = delay;
        self
    }

    pub fn telemetry(mut self, telemetry: Result<Value, TransportError>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry_delay(mut self, delay: Duration) -> Self {
        self.telemetry_delay = delay;
        self
    }
}

pub fn raw_caps(models: &[(&str, &str)], encodings: &[&str]) -> RawCapabilities {
    RawCapabilities {
        models: models
            .iter()
            .map(|(name, version)| RawModel {
                name: (*name).to_string(),
                version: Some((*version).to_string()),
                organization: None,
            })
            .collect(),
        encodings: encodings.iter().map(|e| (*e).to_string()).collect(),
        protocol_version: Some("0.8.0".into()),
    }
}

// ── FakeTransport ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, Script>>,
    cap_calls: Mutex<HashMap<String, usize>>,
    telemetry_calls: Mutex<Vec<(String, Encoding)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, device: &str, script: Script) {
        self.scripts.lock().unwrap().insert(device.to_string(), script);
    }

    pub fn cap_calls(&self, device: &str) -> usize {
        self.cap_calls.lock().unwrap().get(device).copied().unwrap_or(0)
    }

    pub fn total_cap_calls(&self) -> usize {
        self.cap_calls.lock().unwrap().values().sum()
    }

    pub fn telemetry_calls(&self) -> Vec<(String, Encoding)> {
        self.telemetry_calls.lock().unwrap().clone()
    }

    pub fn telemetry_calls_for(&self, device: &str) -> usize {
        self.telemetry_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, _)| d == device)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn script_for(&self, device: &str) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(device)
            .cloned()
            .unwrap_or_else(|| panic!("no script for {device}"))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn query_capabilities(&self, device: &Device) -> Result<RawCapabilities, TransportError> {
        let script = self.script_for(&device.name);
        let attempt = {
            let mut calls = self.cap_calls.lock().unwrap();
            let n = calls.entry(device.name.clone()).or_insert(0);
            *n += 1;
            *n
        };
        if !script.caps_delay.is_zero() {
            tokio::time::sleep(script.caps_delay).await;
        }
        if attempt <= script.caps_failures {
            return Err(TransportError::ConnectionRefused);
        }
        Ok(script.caps)
    }

    async fn get_telemetry(
        &self,
        device: &Device,
        _paths: &[String],
        encoding: &Encoding,
    ) -> Result<Value, TransportError> {
        let script = self.script_for(&device.name);
        self.telemetry_calls
            .lock()
            .unwrap()
            .push((device.name.clone(), encoding.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !script.telemetry_delay.is_zero() {
            tokio::time::sleep(script.telemetry_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        script.telemetry
    }
}

// ── Wiring ──────────────────────────────────────────────────────────

pub fn device(name: &str, n: u8) -> Device {
    Device::new(name, format!("10.0.0.{n}"), 57400, "iosxr")
}

pub fn executor(transport: &Arc<FakeTransport>, table: ModelTable) -> Arc<RequestExecutor> {
    let config = ExecutorConfig {
        model_table: Arc::new(table),
        ..ExecutorConfig::default()
    };
    Arc::new(RequestExecutor::from_config(
        Arc::clone(transport) as Arc<dyn Transport>,
        Arc::new(CapabilityCache::new()),
        config,
    ))
}

pub fn orchestrator(
    transport: &Arc<FakeTransport>,
    devices: Vec<Device>,
    table: ModelTable,
) -> BatchOrchestrator {
    let inventory: StaticInventory = devices.into_iter().collect();
    BatchOrchestrator::new(Arc::new(inventory), executor(transport, table))
}
