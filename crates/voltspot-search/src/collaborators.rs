//! Contracts for the external collaborators the orchestrator drives.

use std::future::Future;

use voltspot_core::{LatLng, Station, TimeWindow, Viewport};

use crate::projection::Projection;

/// Parameters for one nearby-stations request.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: u32,
    pub time_window: Option<TimeWindow>,
}

impl NearbyQuery {
    /// Coordinates are truncated to 8 decimal places and the radius is
    /// rounded up to a whole kilometre.
    #[must_use]
    pub fn new(center: LatLng, radius_km: f64, time_window: Option<TimeWindow>) -> Self {
        Self {
            latitude: truncate_8(center.lat),
            longitude: truncate_8(center.lng),
            radius_km: ceil_km(radius_km),
            time_window,
        }
    }
}

fn truncate_8(value: f64) -> f64 {
    (value * 1e8).trunc() / 1e8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ceil_km(radius_km: f64) -> u32 {
    if radius_km.is_finite() && radius_km > 0.0 {
        radius_km.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Loads stations around a point from the backend.
pub trait StationFetcher: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_nearby_stations(
        &self,
        query: &NearbyQuery,
    ) -> impl Future<Output = Result<Vec<Station>, Self::Error>> + Send;
}

/// Resolves free-text addresses to coordinates. Fails when nothing matches.
pub trait Geocoder: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn geocode_address(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<LatLng, Self::Error>> + Send;
}

/// The map widget: owns rendering, the camera, and the projection.
///
/// A `recenter` is expected to surface as a move event that the owner feeds
/// back into [`crate::SearchOrchestrator::on_viewport_change`].
pub trait MapView: Projection + Send + Sync + 'static {
    /// `None` until the map has a centre.
    fn viewport(&self) -> Option<Viewport>;

    fn recenter(&self, center: LatLng);
}

/// Receives the station the user chose to book.
pub trait BookingFlow {
    fn start_booking(&self, station: Station);
}

/// Outcome of acquiring the device location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location unavailable")]
    Unavailable,
    #[error("location permission denied")]
    Denied,
}
