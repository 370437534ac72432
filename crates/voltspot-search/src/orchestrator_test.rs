use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use tokio::sync::Notify;
use voltspot_core::Bounds;

use super::*;
use crate::projection::{Projection, ScreenPoint};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Clone, Default)]
struct FakeFetcher {
    calls: Arc<Mutex<Vec<NearbyQuery>>>,
    responses: Arc<Mutex<VecDeque<Result<Vec<Station>, String>>>>,
    gates: Arc<Mutex<VecDeque<Arc<Notify>>>>,
    hang: bool,
}

impl FakeFetcher {
    fn push_ok(&self, stations: Vec<Station>) {
        self.responses.lock().unwrap().push_back(Ok(stations));
    }

    fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    /// The next call holds its response until the returned gate is notified.
    fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().push_back(Arc::clone(&gate));
        gate
    }

    fn calls(&self) -> Vec<NearbyQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl StationFetcher for FakeFetcher {
    type Error = FakeError;

    async fn fetch_nearby_stations(&self, query: &NearbyQuery) -> Result<Vec<Station>, FakeError> {
        self.calls.lock().unwrap().push(query.clone());
        let next = self.responses.lock().unwrap().pop_front();
        let gate = self.gates.lock().unwrap().pop_front();
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = gate {
            gate.notified().await;
        }
        next.unwrap_or_else(|| Ok(Vec::new())).map_err(FakeError)
    }
}

#[derive(Clone, Default)]
struct FakeGeocoder {
    known: Arc<HashMap<String, LatLng>>,
}

impl Geocoder for FakeGeocoder {
    type Error = FakeError;

    async fn geocode_address(&self, address: &str) -> Result<LatLng, FakeError> {
        self.known
            .get(address)
            .copied()
            .ok_or_else(|| FakeError("no match".to_string()))
    }
}

/// One pixel per degree unless overridden.
#[derive(Clone)]
struct FakeMap {
    scale: f64,
    viewport: Arc<Mutex<Option<Viewport>>>,
    recentered: Arc<Mutex<Vec<LatLng>>>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            scale: 1.0,
            viewport: Arc::default(),
            recentered: Arc::default(),
        }
    }
}

impl FakeMap {
    fn recentered(&self) -> Vec<LatLng> {
        self.recentered.lock().unwrap().clone()
    }
}

impl Projection for FakeMap {
    fn project(&self, point: LatLng) -> Option<ScreenPoint> {
        Some(ScreenPoint {
            x: point.lng * self.scale,
            y: -point.lat * self.scale,
        })
    }
}

impl MapView for FakeMap {
    fn viewport(&self) -> Option<Viewport> {
        *self.viewport.lock().unwrap()
    }

    fn recenter(&self, center: LatLng) {
        self.recentered.lock().unwrap().push(center);
    }
}

#[derive(Default)]
struct RecordingBooking {
    started: Mutex<Vec<StationId>>,
}

impl BookingFlow for RecordingBooking {
    fn start_booking(&self, station: Station) {
        self.started.lock().unwrap().push(station.id);
    }
}

struct Harness {
    orchestrator: SearchOrchestrator<FakeFetcher, FakeGeocoder, FakeMap>,
    fetcher: FakeFetcher,
    map: FakeMap,
}

fn harness_with(fetcher: FakeFetcher, geocoder: FakeGeocoder, config: SearchConfig) -> Harness {
    let map = FakeMap::default();
    let orchestrator = SearchOrchestrator::new(fetcher.clone(), geocoder, map.clone(), config);
    Harness {
        orchestrator,
        fetcher,
        map,
    }
}

fn harness() -> Harness {
    harness_with(
        FakeFetcher::default(),
        FakeGeocoder::default(),
        SearchConfig::default(),
    )
}

fn station(id: i64, latitude: f64, longitude: f64) -> Station {
    Station {
        id,
        name: Some(format!("Station {id}")),
        address: None,
        latitude,
        longitude,
        power_kw: Some(50.0),
        price_per_kwh: Some(0.35),
    }
}

/// Square viewport of `half_span` degrees around `center`.
fn viewport(center: LatLng, half_span: f64) -> Viewport {
    Viewport {
        center,
        bounds: Some(Bounds::new(
            LatLng::new(center.lat - half_span, center.lng - half_span),
            LatLng::new(center.lat + half_span, center.lng + half_span),
        )),
        zoom: 12.0,
    }
}

/// Viewport whose north-east corner sits `radius_km` due north of the centre.
fn viewport_with_radius(radius_km: f64) -> Viewport {
    let lat = (radius_km / crate::geo::EARTH_RADIUS_KM).to_degrees();
    Viewport {
        center: LatLng::new(0.0, 0.0),
        bounds: Some(Bounds::new(LatLng::new(-lat, -1.0), LatLng::new(lat, 0.0))),
        zoom: 3.0,
    }
}

fn ids(stations: &[Station]) -> Vec<i64> {
    stations.iter().map(|s| s.id).collect()
}

#[tokio::test]
async fn refresh_filters_merges_and_clusters() {
    let h = harness();
    h.fetcher.push_ok(vec![
        station(1, 0.0, 0.0),
        station(2, 0.0, 0.5),
        station(3, 0.0, 0.9),
        station(4, 5.0, 5.0), // outside the viewport
    ]);

    let count = h
        .orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap();

    let snap = h.orchestrator.snapshot();
    assert_eq!(count, 3);
    assert_eq!(ids(&snap.results), vec![1, 2, 3]);
    assert_eq!(snap.status, SearchStatus::Idle);
    assert_eq!(snap.completed_cycles, 1);
    // One pixel per degree: everything in view is one cluster.
    assert_eq!(snap.clusters.len(), 1);
    assert_eq!(snap.clusters[0].count, 3);
    assert!(snap.individuals.is_empty());
}

#[tokio::test]
async fn refresh_sends_truncated_center_and_rounded_radius() {
    let h = harness();
    let vp = viewport(LatLng::new(48.856_613_999_9, 2.352_221_999_9), 0.05);

    h.orchestrator.refresh(vp).await.unwrap();

    let calls = h.fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert!((calls[0].latitude - 48.856_613_99).abs() < 1e-12);
    assert!((calls[0].longitude - 2.352_221_99).abs() < 1e-12);
    let expected = crate::geo::viewport_radius_km(&vp).ceil();
    assert!((f64::from(calls[0].radius_km) - expected).abs() < f64::EPSILON);
    assert!(calls[0].time_window.is_none());
}

#[tokio::test]
async fn successive_cycles_drop_stale_and_add_new() {
    let h = harness();
    let vp = viewport(LatLng::new(0.0, 0.0), 1.0);
    h.fetcher
        .push_ok(vec![station(1, 0.1, 0.1), station(2, 0.2, 0.2)]);
    h.fetcher
        .push_ok(vec![station(2, 0.2, 0.2), station(3, 0.3, 0.3)]);

    h.orchestrator.refresh(vp).await.unwrap();
    h.orchestrator.refresh(vp).await.unwrap();

    assert_eq!(ids(&h.orchestrator.snapshot().results), vec![2, 3]);
}

#[tokio::test]
async fn radius_over_ceiling_skips_fetch_and_leaves_state() {
    let h = harness();
    let before = h.orchestrator.snapshot();

    let result = h.orchestrator.refresh(viewport_with_radius(1001.0)).await;

    assert!(
        matches!(result, Err(SearchError::DegenerateViewport { radius_km, .. }) if (radius_km - 1001.0).abs() < 0.01),
        "got {result:?}"
    );
    assert!(h.fetcher.calls().is_empty());
    assert_eq!(h.orchestrator.snapshot(), before);
}

#[tokio::test]
async fn world_wrapping_viewport_is_skipped() {
    let h = harness();
    let vp = Viewport {
        center: LatLng::new(0.0, 0.0),
        bounds: Some(Bounds::new(
            LatLng::new(-80.0, -190.0),
            LatLng::new(80.0, 190.0),
        )),
        zoom: 1.0,
    };

    let result = h.orchestrator.refresh(vp).await;

    assert!(
        matches!(result, Err(SearchError::DegenerateViewport { .. })),
        "got {result:?}"
    );
    assert!(h.fetcher.calls().is_empty());
}

#[tokio::test]
async fn degenerate_viewport_after_failure_returns_to_idle() {
    let h = harness();
    h.fetcher.push_err("backend down");
    h.orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap_err();
    assert_eq!(h.orchestrator.snapshot().status, SearchStatus::Error);

    let result = h.orchestrator.refresh(viewport_with_radius(1001.0)).await;

    assert!(matches!(result, Err(SearchError::DegenerateViewport { .. })));
    let snap = h.orchestrator.snapshot();
    assert_eq!(snap.status, SearchStatus::Idle);
    assert_eq!(
        snap.last_error,
        Some(SearchError::FetchFailure("backend down".to_string()))
    );
    assert_eq!(h.fetcher.calls().len(), 1);
}

#[tokio::test]
async fn radius_under_ceiling_fetches() {
    let h = harness();
    h.orchestrator
        .refresh(viewport_with_radius(999.0))
        .await
        .unwrap();

    let calls = h.fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].radius_km, 999);
}

#[tokio::test]
async fn missing_bounds_uses_fallback_radius_and_keeps_everything() {
    let h = harness();
    h.fetcher
        .push_ok(vec![station(1, 0.0, 0.0), station(2, 70.0, 120.0)]);

    let vp = Viewport {
        center: LatLng::new(0.0, 0.0),
        bounds: None,
        zoom: 12.0,
    };
    h.orchestrator.refresh(vp).await.unwrap();

    assert_eq!(h.fetcher.calls()[0].radius_km, 10);
    assert_eq!(ids(&h.orchestrator.snapshot().results), vec![1, 2]);
}

#[tokio::test]
async fn selection_cleared_when_station_leaves_results() {
    let h = harness();
    let vp = viewport(LatLng::new(0.0, 0.0), 1.0);
    h.fetcher
        .push_ok(vec![station(5, 0.1, 0.1), station(6, 0.2, 0.2)]);
    h.fetcher.push_ok(vec![station(6, 0.2, 0.2)]);

    h.orchestrator.refresh(vp).await.unwrap();
    assert!(h.orchestrator.select_station(5));
    assert_eq!(h.orchestrator.snapshot().selected, Some(5));

    h.orchestrator.refresh(vp).await.unwrap();
    assert_eq!(h.orchestrator.snapshot().selected, None);
}

#[tokio::test]
async fn selection_survives_when_station_still_present() {
    let h = harness();
    let vp = viewport(LatLng::new(0.0, 0.0), 1.0);
    h.fetcher.push_ok(vec![station(5, 0.1, 0.1)]);
    h.fetcher
        .push_ok(vec![station(5, 0.1, 0.1), station(7, 0.3, 0.3)]);

    h.orchestrator.refresh(vp).await.unwrap();
    h.orchestrator.select_station(5);
    h.orchestrator.refresh(vp).await.unwrap();

    assert_eq!(h.orchestrator.selected_station().map(|s| s.id), Some(5));
}

#[tokio::test]
async fn selecting_unknown_station_is_noop() {
    let h = harness();
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0)]);
    h.orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap();

    assert!(!h.orchestrator.select_station(42));
    assert_eq!(h.orchestrator.snapshot().selected, None);

    assert!(h.orchestrator.select_station(1));
    h.orchestrator.clear_selection();
    assert!(h.orchestrator.selected_station().is_none());
}

#[tokio::test]
async fn fetch_failure_keeps_results_and_next_success_clears_error() {
    let h = harness();
    let vp = viewport(LatLng::new(0.0, 0.0), 1.0);
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0)]);
    h.fetcher.push_err("backend down");
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0), station(2, 0.5, 0.5)]);

    h.orchestrator.refresh(vp).await.unwrap();

    let err = h.orchestrator.refresh(vp).await.unwrap_err();
    assert_eq!(err, SearchError::FetchFailure("backend down".to_string()));
    let snap = h.orchestrator.snapshot();
    assert_eq!(snap.status, SearchStatus::Error);
    assert_eq!(snap.last_error, Some(err));
    assert_eq!(ids(&snap.results), vec![1]);
    assert_eq!(snap.completed_cycles, 1);

    h.orchestrator.refresh(vp).await.unwrap();
    let snap = h.orchestrator.snapshot();
    assert_eq!(snap.status, SearchStatus::Idle);
    assert!(snap.last_error.is_none());
    assert_eq!(ids(&snap.results), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_times_out() {
    let fetcher = FakeFetcher {
        hang: true,
        ..FakeFetcher::default()
    };
    let config = SearchConfig {
        fetch_timeout: Some(Duration::from_secs(1)),
        ..SearchConfig::default()
    };
    let h = harness_with(fetcher, FakeGeocoder::default(), config);

    let err = h
        .orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap_err();

    assert_eq!(err, SearchError::FetchTimeout { secs: 1 });
    assert_eq!(h.orchestrator.snapshot().status, SearchStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn viewport_burst_fetches_once_with_last_viewport() {
    let h = harness();
    let mut rx = h.orchestrator.subscribe();

    h.orchestrator
        .on_viewport_change(viewport(LatLng::new(1.0, 1.0), 0.1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.orchestrator
        .on_viewport_change(viewport(LatLng::new(2.0, 2.0), 0.1));
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.orchestrator
        .on_viewport_change(viewport(LatLng::new(3.0, 3.0), 0.1));

    rx.wait_for(|s| s.completed_cycles == 1).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let calls = h.fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert!((calls[0].latitude - 3.0).abs() < 1e-9);
    assert!((calls[0].longitude - 3.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn viewport_events_outside_window_each_fetch() {
    let h = harness();

    h.orchestrator
        .on_viewport_change(viewport(LatLng::new(1.0, 1.0), 0.1));
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.orchestrator
        .on_viewport_change(viewport(LatLng::new(2.0, 2.0), 0.1));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(h.fetcher.calls().len(), 2);
}

#[tokio::test]
async fn address_search_recenters_without_fetching() {
    let target = LatLng::new(52.52, 13.405);
    let geocoder = FakeGeocoder {
        known: Arc::new(HashMap::from([("Alexanderplatz, Berlin".to_string(), target)])),
    };
    let h = harness_with(FakeFetcher::default(), geocoder, SearchConfig::default());

    let resolved = h
        .orchestrator
        .on_address_search("  Alexanderplatz, Berlin ")
        .await;

    assert_eq!(resolved, Some(target));
    assert_eq!(h.map.recentered(), vec![target]);
    assert!(h.fetcher.calls().is_empty());
}

#[tokio::test]
async fn address_search_failure_records_error_and_keeps_results() {
    let h = harness();
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0)]);
    h.orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap();

    let resolved = h.orchestrator.on_address_search("nowhere at all").await;

    assert!(resolved.is_none());
    assert!(h.map.recentered().is_empty());
    let snap = h.orchestrator.snapshot();
    assert_eq!(snap.status, SearchStatus::Error);
    assert!(matches!(
        snap.last_error,
        Some(SearchError::GeocodeFailure { ref address, ref reason })
            if address == "nowhere at all" && reason == "no match"
    ));
    assert_eq!(ids(&snap.results), vec![1]);
}

#[tokio::test]
async fn blank_address_is_rejected_without_geocoding() {
    let h = harness();
    assert!(h.orchestrator.on_address_search("   ").await.is_none());
    assert!(matches!(
        h.orchestrator.snapshot().last_error,
        Some(SearchError::GeocodeFailure { .. })
    ));
}

#[tokio::test]
async fn location_result_recenters_or_records_error() {
    let h = harness();

    h.orchestrator
        .on_location_result(Err(LocationError::Denied));
    assert_eq!(
        h.orchestrator.snapshot().last_error,
        Some(SearchError::GeolocationDenied)
    );

    h.orchestrator
        .on_location_result(Err(LocationError::Unavailable));
    assert_eq!(
        h.orchestrator.snapshot().last_error,
        Some(SearchError::GeolocationUnavailable)
    );

    let here = LatLng::new(40.4168, -3.7038);
    h.orchestrator.on_location_result(Ok(here));
    assert_eq!(h.map.recentered(), vec![here]);
}

#[tokio::test]
async fn refresh_current_requires_a_map_viewport() {
    let h = harness();
    assert_eq!(
        h.orchestrator.refresh_current().await,
        Err(SearchError::GeolocationUnavailable)
    );

    *h.map.viewport.lock().unwrap() = Some(viewport(LatLng::new(0.0, 0.0), 1.0));
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0)]);
    assert_eq!(h.orchestrator.refresh_current().await, Ok(1));
}

#[tokio::test]
async fn book_selected_hands_station_to_flow() {
    let h = harness();
    let flow = RecordingBooking::default();
    assert!(!h.orchestrator.book_selected(&flow));

    h.fetcher.push_ok(vec![station(9, 0.0, 0.0)]);
    h.orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap();
    h.orchestrator.select_station(9);

    assert!(h.orchestrator.book_selected(&flow));
    assert_eq!(*flow.started.lock().unwrap(), vec![9]);
}

#[tokio::test]
async fn time_window_is_forwarded_to_fetch() {
    let h = harness();
    let window = TimeWindow {
        start: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
    };
    h.orchestrator.set_time_window(Some(window));

    h.orchestrator
        .refresh(viewport(LatLng::new(0.0, 0.0), 1.0))
        .await
        .unwrap();

    assert_eq!(h.fetcher.calls()[0].time_window, Some(window));
}

#[tokio::test]
async fn subscribers_observe_completed_cycle() {
    let h = harness();
    let rx = h.orchestrator.subscribe();
    h.fetcher.push_ok(vec![station(1, 0.0, 0.0), station(2, 0.0, 100.0)]);

    h.orchestrator
        .refresh(Viewport {
            center: LatLng::new(0.0, 0.0),
            bounds: None,
            zoom: 4.0,
        })
        .await
        .unwrap();

    let snap = rx.borrow().clone();
    assert_eq!(snap.completed_cycles, 1);
    assert_eq!(ids(&snap.individuals), vec![1, 2]);
}

#[tokio::test]
async fn older_fetch_completing_last_wins_until_next_cycle() {
    let h = harness();
    let older = viewport(LatLng::new(0.0, 0.0), 1.0);
    let newer = viewport(LatLng::new(10.0, 10.0), 1.0);
    let older_gate = h.fetcher.gate();
    let newer_gate = h.fetcher.gate();
    h.fetcher
        .push_ok(vec![station(1, 0.0, 0.0), station(2, 0.5, 0.5)]);
    h.fetcher
        .push_ok(vec![station(2, 0.5, 0.5), station(3, 10.0, 10.0)]);

    let driver = async {
        while h.fetcher.calls().len() < 2 {
            tokio::task::yield_now().await;
        }
        newer_gate.notify_one();
        while h.orchestrator.snapshot().completed_cycles < 1 {
            tokio::task::yield_now().await;
        }
        let snap = h.orchestrator.snapshot();
        assert_eq!(ids(&snap.results), vec![3]);
        assert_eq!(snap.status, SearchStatus::Idle);
        older_gate.notify_one();
    };
    let (first, second, ()) = tokio::join!(
        h.orchestrator.refresh(older),
        h.orchestrator.refresh(newer),
        driver
    );
    assert_eq!(first.unwrap(), 2);
    assert_eq!(second.unwrap(), 1);

    let snap = h.orchestrator.snapshot();
    assert_eq!(ids(&snap.results), vec![1, 2]);
    assert_eq!(snap.status, SearchStatus::Idle);
    assert_eq!(snap.completed_cycles, 2);

    h.fetcher
        .push_ok(vec![station(2, 0.5, 0.5), station(3, 10.0, 10.0)]);
    h.orchestrator.refresh(newer).await.unwrap();
    assert_eq!(ids(&h.orchestrator.snapshot().results), vec![3]);
}
