//! Geographic value types shared by the search engine and the HTTP client.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when both coordinates are finite and inside
    /// `[-90, 90]` × `[-180, 180]`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Rectangular viewport extent as reported by the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

impl Bounds {
    #[must_use]
    pub const fn new(southwest: LatLng, northeast: LatLng) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    /// Inclusive containment on all four edges.
    ///
    /// Corners are normalised with `min`/`max` so a map reporting swapped
    /// corners still yields the intended rectangle.
    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        let min_lat = self.southwest.lat.min(self.northeast.lat);
        let max_lat = self.southwest.lat.max(self.northeast.lat);
        let min_lng = self.southwest.lng.min(self.northeast.lng);
        let max_lng = self.southwest.lng.max(self.northeast.lng);

        (min_lat..=max_lat).contains(&point.lat) && (min_lng..=max_lng).contains(&point.lng)
    }
}

/// The visible map region at the moment of a move/zoom event.
///
/// `bounds` is optional because the map may not have laid out yet when the
/// first event fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub bounds: Option<Bounds>,
    pub zoom: f64,
}

/// Availability window forwarded to the nearby-stations endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// RFC 3339 `(start, end)` strings as the backend expects them.
    #[must_use]
    pub fn to_query_strings(&self) -> (String, String) {
        (
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}
