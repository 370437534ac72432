use std::time::Duration;

use voltspot_core::AppConfig;

use crate::cluster::DEFAULT_CLUSTER_THRESHOLD_PX;

/// Tunables for [`crate::SearchOrchestrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Trailing debounce window for viewport events.
    pub debounce: Duration,
    pub cluster_threshold_px: f64,
    /// Viewports whose visible radius exceeds this are not queried.
    pub max_radius_km: f64,
    /// Radius used when the map has not reported bounds yet.
    pub fallback_radius_km: f64,
    /// Upper bound on a single fetch or geocode call; `None` waits forever.
    pub fetch_timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            cluster_threshold_px: DEFAULT_CLUSTER_THRESHOLD_PX,
            max_radius_km: 1000.0,
            fallback_radius_km: 10.0,
            fetch_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.search_debounce_ms),
            cluster_threshold_px: config.cluster_threshold_px,
            max_radius_km: config.max_radius_km,
            fetch_timeout: (config.fetch_timeout_secs > 0)
                .then(|| Duration::from_secs(config.fetch_timeout_secs)),
            ..Self::default()
        }
    }
}
