//! Wire shapes for the backend REST API.

use serde::Deserialize;
use voltspot_core::{LatLng, Station};

/// `GET /stations/nearby` answers either with a bare array or with the
/// array wrapped in `{"stations": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NearbyResponse {
    List(Vec<Station>),
    Wrapped { stations: Vec<Station> },
}

impl NearbyResponse {
    pub(crate) fn into_stations(self) -> Vec<Station> {
        match self {
            NearbyResponse::List(stations) | NearbyResponse::Wrapped { stations } => stations,
        }
    }
}

/// `GET /geocode` body.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeocodeResponse> for LatLng {
    fn from(value: GeocodeResponse) -> Self {
        LatLng::new(value.latitude, value.longitude)
    }
}
