//! Stateful controller for the nearby-station search.
//!
//! A cycle runs: radius check → fetch → bounds filter → merge with the
//! current results → cluster → selection re-validation. State lives in a
//! [`tokio::sync::watch`] channel; subscribers (marker rendering) see every
//! transition.
//!
//! In-flight fetches are never cancelled. If a fetch for an older viewport
//! completes after a newer one, it is merged last and wins until the next
//! viewport event re-queries; that window of staleness is accepted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use voltspot_core::{LatLng, Station, StationId, TimeWindow, Viewport};

use crate::bounds::filter_to_bounds;
use crate::cluster::{cluster_stations, Cluster};
use crate::collaborators::{BookingFlow, Geocoder, LocationError, MapView, NearbyQuery, StationFetcher};
use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::error::SearchError;
use crate::geo::viewport_radius_km;
use crate::merge::merge_results;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Fetching,
    Error,
}

/// Everything the view needs to render the current search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub status: SearchStatus,
    /// Current result set, unique by station id.
    pub results: Vec<Station>,
    pub clusters: Vec<Cluster>,
    pub individuals: Vec<Station>,
    pub selected: Option<StationId>,
    pub last_error: Option<SearchError>,
    pub time_window: Option<TimeWindow>,
    /// Number of fetch cycles that completed successfully.
    pub completed_cycles: u64,
}

impl SearchSnapshot {
    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.results.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn selected_station(&self) -> Option<&Station> {
        self.selected.and_then(|id| self.station(id))
    }
}

struct Inner<F, G, M> {
    fetcher: F,
    geocoder: G,
    map: M,
    config: SearchConfig,
    state: watch::Sender<SearchSnapshot>,
}

/// Drives the search for one mounted map view.
///
/// Dropping the orchestrator discards any pending debounced cycle.
pub struct SearchOrchestrator<F, G, M> {
    inner: Arc<Inner<F, G, M>>,
    debouncer: Debouncer,
}

impl<F, G, M> SearchOrchestrator<F, G, M>
where
    F: StationFetcher,
    G: Geocoder,
    M: MapView,
{
    pub fn new(fetcher: F, geocoder: G, map: M, config: SearchConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce);
        let (state, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                fetcher,
                geocoder,
                map,
                config,
                state,
            }),
            debouncer,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn map(&self) -> &M {
        &self.inner.map
    }

    /// Debounced entry point for map move/zoom events.
    ///
    /// Only the last viewport of a burst is searched. Must be called from
    /// within a Tokio runtime.
    pub fn on_viewport_change(&self, viewport: Viewport) {
        let inner = Arc::clone(&self.inner);
        self.debouncer.schedule(async move {
            if let Err(err) = inner.run_cycle(viewport).await {
                tracing::debug!(error = %err, "debounced search cycle ended without results");
            }
        });
    }

    /// Run one cycle immediately for `viewport`, bypassing the debounce.
    ///
    /// Returns the size of the result set. Errors are also recorded in the
    /// published state, except [`SearchError::DegenerateViewport`], which
    /// only returns the status to idle.
    ///
    /// # Errors
    ///
    /// - [`SearchError::DegenerateViewport`] when the viewport is too large.
    /// - [`SearchError::FetchFailure`] / [`SearchError::FetchTimeout`] when
    ///   the fetch collaborator fails.
    pub async fn refresh(&self, viewport: Viewport) -> Result<usize, SearchError> {
        self.inner.run_cycle(viewport).await
    }

    /// Run one cycle for the map's current viewport.
    ///
    /// # Errors
    ///
    /// [`SearchError::GeolocationUnavailable`] if the map has no centre yet,
    /// otherwise as [`SearchOrchestrator::refresh`].
    pub async fn refresh_current(&self) -> Result<usize, SearchError> {
        let Some(viewport) = self.inner.map.viewport() else {
            return Err(SearchError::GeolocationUnavailable);
        };
        self.refresh(viewport).await
    }

    /// Resolve `address` and recentre the map on it.
    ///
    /// The fetch is not run here; the map's move event feeds back into
    /// [`SearchOrchestrator::on_viewport_change`]. Failures are recorded as
    /// [`SearchError::GeocodeFailure`] and leave the results untouched.
    pub async fn on_address_search(&self, address: &str) -> Option<LatLng> {
        let address = address.trim();
        if address.is_empty() {
            self.inner.record_error(SearchError::GeocodeFailure {
                address: String::new(),
                reason: "address is empty".to_string(),
            });
            return None;
        }

        let outcome = with_timeout(
            self.inner.config.fetch_timeout,
            self.inner.geocoder.geocode_address(address),
        )
        .await;

        let reason = match outcome {
            Some(Ok(point)) if point.is_valid() => {
                tracing::info!(address, lat = point.lat, lng = point.lng, "address resolved");
                self.inner.map.recenter(point);
                return Some(point);
            }
            Some(Ok(point)) => format!(
                "geocoder returned out-of-range coordinates ({}, {})",
                point.lat, point.lng
            ),
            Some(Err(err)) => err.to_string(),
            None => "geocoding timed out".to_string(),
        };

        tracing::warn!(address, reason = %reason, "address search failed");
        self.inner.record_error(SearchError::GeocodeFailure {
            address: address.to_string(),
            reason,
        });
        None
    }

    /// Apply the result of acquiring the device location.
    ///
    /// Until a location or an address search provides a centre, the view has
    /// nothing to search around.
    pub fn on_location_result(&self, location: Result<LatLng, LocationError>) {
        match location {
            Ok(point) if point.is_valid() => {
                tracing::debug!(lat = point.lat, lng = point.lng, "device location acquired");
                self.inner.map.recenter(point);
            }
            Ok(_) | Err(LocationError::Unavailable) => {
                tracing::warn!("device location unavailable");
                self.inner.record_error(SearchError::GeolocationUnavailable);
            }
            Err(LocationError::Denied) => {
                tracing::warn!("device location permission denied");
                self.inner.record_error(SearchError::GeolocationDenied);
            }
        }
    }

    /// Select a station in the current result set. Unknown ids are ignored.
    pub fn select_station(&self, id: StationId) -> bool {
        self.inner.state.send_if_modified(|s| {
            if s.selected == Some(id) || s.station(id).is_none() {
                return false;
            }
            s.selected = Some(id);
            true
        });
        self.inner.state.borrow().selected == Some(id)
    }

    pub fn clear_selection(&self) {
        self.inner
            .state
            .send_if_modified(|s| s.selected.take().is_some());
    }

    pub fn selected_station(&self) -> Option<Station> {
        self.inner.state.borrow().selected_station().cloned()
    }

    /// Hand the selected station to the booking flow. Returns `false` when
    /// nothing is selected.
    pub fn book_selected<B: BookingFlow + ?Sized>(&self, flow: &B) -> bool {
        match self.selected_station() {
            Some(station) => {
                tracing::info!(station_id = station.id, "starting booking for selected station");
                flow.start_booking(station);
                true
            }
            None => false,
        }
    }

    /// Restrict future fetches to stations available in `window`.
    pub fn set_time_window(&self, window: Option<TimeWindow>) {
        self.inner.state.send_if_modified(|s| {
            if s.time_window == window {
                return false;
            }
            s.time_window = window;
            true
        });
    }
}

impl<F, G, M> Inner<F, G, M>
where
    F: StationFetcher,
    G: Geocoder,
    M: MapView,
{
    async fn run_cycle(&self, viewport: Viewport) -> Result<usize, SearchError> {
        let radius_km = viewport_radius_km(&viewport);
        if radius_km > self.config.max_radius_km {
            tracing::debug!(
                radius_km,
                max_radius_km = self.config.max_radius_km,
                "viewport too large; skipping station fetch"
            );
            self.state.send_if_modified(|s| {
                let changed = s.status != SearchStatus::Idle;
                s.status = SearchStatus::Idle;
                changed
            });
            return Err(SearchError::DegenerateViewport {
                radius_km,
                max_km: self.config.max_radius_km,
            });
        }
        let radius_km = if radius_km > 0.0 {
            radius_km
        } else {
            self.config.fallback_radius_km
        };

        let time_window = self.state.borrow().time_window;
        let query = NearbyQuery::new(viewport.center, radius_km, time_window);
        tracing::debug!(
            lat = query.latitude,
            lng = query.longitude,
            radius_km = query.radius_km,
            zoom = viewport.zoom,
            "fetching nearby stations"
        );
        self.state.send_modify(|s| s.status = SearchStatus::Fetching);

        let fetched = match with_timeout(
            self.config.fetch_timeout,
            self.fetcher.fetch_nearby_stations(&query),
        )
        .await
        {
            Some(Ok(stations)) => stations,
            Some(Err(err)) => {
                let err = SearchError::FetchFailure(err.to_string());
                tracing::warn!(error = %err, "nearby station fetch failed");
                self.record_error(err.clone());
                return Err(err);
            }
            None => {
                let err = SearchError::FetchTimeout {
                    secs: self.config.fetch_timeout.map_or(0, |d| d.as_secs()),
                };
                tracing::warn!(error = %err, "nearby station fetch timed out");
                self.record_error(err.clone());
                return Err(err);
            }
        };

        let fetched_count = fetched.len();
        let fresh = filter_to_bounds(fetched, viewport.bounds);
        let threshold_px = self.config.cluster_threshold_px;

        let mut result_count = 0;
        self.state.send_modify(|s| {
            let merged = merge_results(&s.results, fresh);
            let clustering = cluster_stations(&merged, &self.map, threshold_px);

            if let Some(id) = s.selected {
                if !merged.iter().any(|st| st.id == id) {
                    tracing::debug!(station_id = id, "selected station left the result set");
                    s.selected = None;
                }
            }

            result_count = merged.len();
            s.results = merged;
            s.clusters = clustering.clusters;
            s.individuals = clustering.individuals;
            s.status = SearchStatus::Idle;
            s.last_error = None;
            s.completed_cycles += 1;
        });

        tracing::debug!(
            fetched = fetched_count,
            results = result_count,
            "search cycle complete"
        );
        Ok(result_count)
    }

    fn record_error(&self, err: SearchError) {
        self.state.send_modify(|s| {
            s.status = SearchStatus::Error;
            s.last_error = Some(err);
        });
    }
}

/// `None` when `limit` elapses first.
async fn with_timeout<T>(limit: Option<Duration>, fut: impl Future<Output = T>) -> Option<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
