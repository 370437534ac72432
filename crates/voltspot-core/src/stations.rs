use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

pub type StationId = i64;

/// A charging station as returned by the backend.
///
/// Instances are transient copies; the search engine never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub power_kw: Option<f64>,
    #[serde(default)]
    pub price_per_kwh: Option<f64>,
}

/// Display-only estimate for charging a given amount of energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeEstimate {
    pub energy_kwh: f64,
    pub duration_hours: Option<f64>,
    pub cost: Option<f64>,
}

impl Station {
    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Estimate charge time and cost for `energy_kwh`.
    ///
    /// Each half is `None` when the backing attribute is missing or not
    /// strictly positive.
    #[must_use]
    pub fn estimate(&self, energy_kwh: f64) -> ChargeEstimate {
        let positive = |v: &f64| v.is_finite() && *v > 0.0;
        ChargeEstimate {
            energy_kwh,
            duration_hours: self
                .power_kw
                .filter(positive)
                .map(|power| energy_kwh / power),
            cost: self
                .price_per_kwh
                .filter(positive)
                .map(|price| energy_kwh * price),
        }
    }
}
