#![allow(clippy::unwrap_used)]
// Integration tests for capability fetching, caching and request execution.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pretty_assertions::assert_eq;

use common::{FakeTransport, Script, device, executor, raw_caps};
use gnmibuddy_core::{
    CapabilityCache, CapabilityFetcher, CoreError, Encoding, EncodingPolicy, ErrorKind,
    ModelTable, OperationStatus, TelemetryRequest, Transport,
};

fn fetcher(transport: &Arc<FakeTransport>) -> CapabilityFetcher {
    CapabilityFetcher::new(
        Arc::clone(transport) as Arc<dyn Transport>,
        Arc::new(CapabilityCache::new()),
        EncodingPolicy::default(),
    )
}

fn healthy() -> Script {
    Script::new(raw_caps(
        &[("openconfig-system", "0.17.1"), ("openconfig-interfaces", "4.0.0")],
        &["JSON_IETF", "ASCII"],
    ))
}

// ── Fetch and cache ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_lookups_share_one_fetch() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy().caps_delay(Duration::from_millis(50)));
    let fetcher = Arc::new(fetcher(&transport));
    let dev = Arc::new(device("r1", 1));

    let tasks = (0..20).map(|_| {
        let fetcher = Arc::clone(&fetcher);
        let dev = Arc::clone(&dev);
        tokio::spawn(async move { fetcher.get_or_fetch(&dev).await })
    });
    let results = join_all(tasks).await;

    for r in results {
        let caps = r.unwrap().unwrap();
        assert!(caps.has_model("openconfig-system"));
    }
    assert_eq!(transport.cap_calls("r1"), 1);
}

#[tokio::test]
async fn sequential_lookups_are_idempotent() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy());
    let fetcher = fetcher(&transport);
    let dev = device("r1", 1);

    let first = fetcher.get_or_fetch(&dev).await.unwrap();
    let second = fetcher.get_or_fetch(&dev).await.unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(transport.cap_calls("r1"), 1);
}

#[tokio::test]
async fn fetch_failure_is_not_cached() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy().failing_caps(1));
    let fetcher = fetcher(&transport);
    let dev = device("r1", 1);

    let err = fetcher.get_or_fetch(&dev).await.unwrap_err();
    assert!(matches!(err, CoreError::CapabilityFetch { .. }));
    assert_eq!(err.kind(), ErrorKind::CapabilityFetch);
    assert!(!fetcher.cache().has(&dev.key()));

    fetcher.get_or_fetch(&dev).await.unwrap();
    assert_eq!(transport.cap_calls("r1"), 2);
}

#[tokio::test]
async fn invalidate_forces_refetch() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy());
    let fetcher = fetcher(&transport);
    let dev = device("r1", 1);

    fetcher.get_or_fetch(&dev).await.unwrap();
    assert!(fetcher.invalidate(&dev));
    fetcher.get_or_fetch(&dev).await.unwrap();

    assert_eq!(transport.cap_calls("r1"), 2);
}

#[tokio::test]
async fn devices_on_distinct_endpoints_are_cached_separately() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy());
    transport.script("r2", Script::new(raw_caps(&[], &["proto"])));
    let fetcher = fetcher(&transport);

    let a = fetcher.get_or_fetch(&device("r1", 1)).await.unwrap();
    let b = fetcher.get_or_fetch(&device("r2", 2)).await.unwrap();

    assert!(a.supports_encoding(&Encoding::JsonIetf));
    assert!(!b.supports_encoding(&Encoding::JsonIetf));
    assert_eq!(fetcher.cache().len(), 2);
}

// ── Execution ───────────────────────────────────────────────────────

#[tokio::test]
async fn negotiated_encoding_applies_per_call() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy());
    let executor = executor(&transport, ModelTable::openconfig());
    let dev = device("r1", 1);

    let fallback = TelemetryRequest::new("system", ["openconfig-system:/system"])
        .with_encoding(Encoding::Json);
    let explicit = TelemetryRequest::new("system", ["openconfig-system:/system"])
        .with_encoding(Encoding::Ascii);
    let default = TelemetryRequest::new("system", ["openconfig-system:/system"]);

    let a = executor.execute(&dev, &fallback).await;
    let b = executor.execute(&dev, &explicit).await;
    let c = executor.execute(&dev, &default).await;

    assert_eq!(a.selected_encoding, Some(Encoding::JsonIetf));
    assert!(a.warnings.iter().any(|w| w.contains("'json'")));
    assert_eq!(b.selected_encoding, Some(Encoding::Ascii));
    assert!(b.warnings.is_empty());
    assert_eq!(c.selected_encoding, Some(Encoding::JsonIetf));

    let sent: Vec<_> = transport.telemetry_calls().into_iter().map(|(_, e)| e).collect();
    assert_eq!(sent, vec![Encoding::JsonIetf, Encoding::Ascii, Encoding::JsonIetf]);
    assert_eq!(transport.cap_calls("r1"), 1);
}

#[tokio::test]
async fn unsupported_encoding_blocks_the_request() {
    let transport = Arc::new(FakeTransport::new());
    transport.script(
        "r1",
        Script::new(raw_caps(&[("openconfig-system", "0.17.1")], &["proto"])),
    );
    let executor = executor(&transport, ModelTable::openconfig());

    let result = executor
        .execute(
            &device("r1", 1),
            &TelemetryRequest::new("system", ["openconfig-system:/system"]),
        )
        .await;

    assert_eq!(result.status, OperationStatus::Failed);
    assert_eq!(result.error_kind, Some(ErrorKind::EncodingNotSupported));
    assert!(result.error_message.unwrap().contains("proto"));
    assert!(transport.telemetry_calls().is_empty());
}

#[tokio::test]
async fn capability_failure_blocks_the_request() {
    let transport = Arc::new(FakeTransport::new());
    transport.script("r1", healthy().failing_caps(usize::MAX));
    let executor = executor(&transport, ModelTable::openconfig());

    let result = executor
        .execute(
            &device("r1", 1),
            &TelemetryRequest::new("system", ["openconfig-system:/system"]),
        )
        .await;

    assert_eq!(result.error_kind, Some(ErrorKind::CapabilityFetch));
    assert!(result.error_message.unwrap().contains("connection refused"));
    assert!(transport.telemetry_calls().is_empty());
}
