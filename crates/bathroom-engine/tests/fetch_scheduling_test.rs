//! Integration tests for debounced fetching and merging
//!
//! Time is paused: sleeping in a test advances the virtual clock and runs
//! every timer that falls due on the way.

use async_trait::async_trait;
use bathroom_core::models::{
    Coordinates, DeviceId, Timestamp, Toilet, ToiletId, ToiletOrigin, ToiletStatus, ViewWindow,
};
use bathroom_core::ports::GeodataSource;
use bathroom_engine::{EngineSettings, FetchOutcome, ReconciliationEngine};
use bathroom_geodata::MemoryGeodataSource;
use bathroom_store::{MemoryRemoteStore, MemoryToiletCache};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn center() -> Coordinates {
    Coordinates::new(28.6139, 77.2090).unwrap()
}

fn window(latitude: f64) -> ViewWindow {
    ViewWindow::new(Coordinates::new(latitude, 77.2090).unwrap(), 0.05, 0.05).unwrap()
}

fn fetched(id: &str, coordinates: Coordinates, status: ToiletStatus) -> Toilet {
    Toilet {
        id: ToiletId::new(id),
        coordinates,
        status,
        last_confirmed: Timestamp::Missing,
        is_accessible: false,
        report_count: 0,
        name: None,
        fee: None,
        origin: ToiletOrigin::Geodata,
    }
}

fn engine_with(geodata: Arc<dyn GeodataSource>, cache: Arc<MemoryToiletCache>) -> ReconciliationEngine {
    ReconciliationEngine::new(
        geodata,
        cache,
        Arc::new(MemoryRemoteStore::new()),
        DeviceId::generate(),
        EngineSettings::default(),
    )
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_window_changes_fetch_once() {
    let source = Arc::new(MemoryGeodataSource::new(vec![fetched("node/1", center(), ToiletStatus::Unknown)]));
    let engine = engine_with(source.clone(), Arc::new(MemoryToiletCache::new()));

    engine.set_view_window(window(28.60));
    sleep_ms(500).await;
    engine.set_view_window(window(28.61));

    // The quiet period runs from the second event
    sleep_ms(999).await;
    assert_eq!(source.request_count(), 0);

    sleep_ms(2).await;
    assert_eq!(source.request_count(), 1);
    assert_eq!(source.requests()[0], window(28.61));
    assert_eq!(engine.len(), 1);

    sleep_ms(5_000).await;
    assert_eq!(source.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_spaced_window_changes_fetch_twice() {
    let source = Arc::new(MemoryGeodataSource::default());
    let engine = engine_with(source.clone(), Arc::new(MemoryToiletCache::new()));

    engine.set_view_window(window(28.60));
    sleep_ms(1500).await;
    engine.set_view_window(window(28.61));
    sleep_ms(1500).await;

    assert_eq!(source.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wide_window_is_never_fetched() {
    let source = Arc::new(MemoryGeodataSource::new(vec![fetched("node/1", center(), ToiletStatus::Unknown)]));
    let engine = engine_with(source.clone(), Arc::new(MemoryToiletCache::new()));
    let wide = ViewWindow::new(center(), 0.2, 0.2).unwrap();

    engine.set_view_window(wide);
    sleep_ms(2_000).await;

    assert_eq!(source.request_count(), 0);
    assert!(engine.is_empty());
    assert_eq!(engine.refresh().await, FetchOutcome::SpanTooWide);
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn test_overlapping_batches_keep_latest_version() {
    let source = Arc::new(MemoryGeodataSource::new(vec![
        fetched("77", center(), ToiletStatus::Open),
        fetched("78", center(), ToiletStatus::Open),
    ]));
    let engine = engine_with(source.clone(), Arc::new(MemoryToiletCache::new()));

    engine.set_view_window(ViewWindow::around(center()).unwrap());
    assert!(matches!(engine.refresh().await, FetchOutcome::Merged(stats) if stats.added == 2));

    source.set_fixtures(vec![fetched("77", center(), ToiletStatus::Closed)]);
    engine.set_view_window(ViewWindow::new(center(), 0.03, 0.03).unwrap());
    let outcome = engine.refresh().await;

    assert!(matches!(outcome, FetchOutcome::Merged(stats) if stats.replaced == 1 && stats.added == 0));
    assert_eq!(engine.get(&ToiletId::new("77")).unwrap().status, ToiletStatus::Closed);
    assert_eq!(engine.get(&ToiletId::new("78")).unwrap().status, ToiletStatus::Open);
    assert_eq!(engine.len(), 2);
}

/// Geodata source that takes a while and labels each batch by call number
struct SlowSource {
    calls: AtomicU64,
    latency: Duration,
}

impl SlowSource {
    fn new(latency_ms: u64) -> Self {
        Self { calls: AtomicU64::new(0), latency: Duration::from_millis(latency_ms) }
    }
}

#[async_trait]
impl GeodataSource for SlowSource {
    async fn fetch(&self, _window: &ViewWindow) -> Vec<Toilet> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.latency).await;
        vec![fetched(&format!("node/{}", call), center(), ToiletStatus::Unknown)]
    }
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_fetch_survives_window_change() {
    let source = Arc::new(SlowSource::new(800));
    let cache = Arc::new(MemoryToiletCache::new());
    let engine = engine_with(source.clone(), cache.clone());

    engine.set_view_window(window(28.60));
    // First fetch starts at t=1000 and is still running at t=1500
    sleep_ms(1_500).await;
    engine.set_view_window(window(28.61));
    sleep_ms(5_000).await;
    engine.flush_cache().await;

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    let ids: Vec<_> = engine.snapshot().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![ToiletId::new("node/1"), ToiletId::new("node/2")]);
    assert_eq!(cache.ids(), ids);
}

#[tokio::test(start_paused = true)]
async fn test_waiting_fetch_is_cancelled_by_refresh() {
    let source = Arc::new(SlowSource::new(0));
    let engine = engine_with(source.clone(), Arc::new(MemoryToiletCache::new()));

    let scheduled = engine.set_view_window(window(28.60));
    sleep_ms(500).await;
    assert!(matches!(engine.refresh().await, FetchOutcome::Merged(_)));
    sleep_ms(5_000).await;

    assert!(scheduled.is_cancelled());
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetched_batches_are_cached() {
    let source = Arc::new(MemoryGeodataSource::new(vec![fetched("node/5", center(), ToiletStatus::Unknown)]));
    let cache = Arc::new(MemoryToiletCache::new());
    let engine = engine_with(source, cache.clone());

    engine.set_view_window(ViewWindow::around(center()).unwrap());
    engine.refresh().await;
    engine.flush_cache().await;

    assert_eq!(cache.ids(), vec![ToiletId::new("node/5")]);
}

#[tokio::test]
async fn test_refresh_without_window() {
    let engine = engine_with(Arc::new(MemoryGeodataSource::default()), Arc::new(MemoryToiletCache::new()));
    assert_eq!(engine.refresh().await, FetchOutcome::NoWindow);
}

#[tokio::test]
async fn test_hydrate_discards_unconfirmed_records() {
    let confirmed = Toilet::local(
        ToiletId::new("AbC123"),
        center(),
        ToiletStatus::Open,
        true,
        chrono::Utc::now(),
    );
    let leftover = confirmed.with_id(ToiletId::temporary());
    let cache = Arc::new(MemoryToiletCache::with_toilets([
        confirmed.clone(),
        leftover.clone(),
        fetched("node/1", center(), ToiletStatus::Unknown),
    ]));
    let engine = engine_with(Arc::new(MemoryGeodataSource::default()), cache.clone());

    let loaded = engine.hydrate().await;
    engine.flush_cache().await;

    assert_eq!(loaded, 2);
    assert_eq!(engine.get(&confirmed.id), Some(confirmed));
    assert!(engine.get(&leftover.id).is_none());
    assert!(cache.get(&leftover.id).is_none());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_merge_bumps_revision() {
    let source = Arc::new(MemoryGeodataSource::new(vec![fetched("node/1", center(), ToiletStatus::Unknown)]));
    let engine = engine_with(source, Arc::new(MemoryToiletCache::new()));
    let mut revisions = engine.subscribe();
    let before = *revisions.borrow_and_update();

    engine.set_view_window(ViewWindow::around(center()).unwrap());
    engine.refresh().await;

    assert!(revisions.has_changed().unwrap());
    assert!(*revisions.borrow_and_update() > before);
}
