use thiserror::Error;

/// Failures surfaced by the orchestrator.
///
/// These are recorded in [`crate::SearchSnapshot::last_error`] for display
/// rather than propagated, so the type is `Clone` and carries rendered
/// messages instead of source errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("current location is unavailable")]
    GeolocationUnavailable,

    #[error("location permission was denied")]
    GeolocationDenied,

    #[error("failed to load nearby stations: {0}")]
    FetchFailure(String),

    #[error("nearby station request timed out after {secs}s")]
    FetchTimeout { secs: u64 },

    #[error("could not find address \"{address}\": {reason}")]
    GeocodeFailure { address: String, reason: String },

    /// Zoomed out too far. Never recorded as an error; only returned from
    /// [`crate::SearchOrchestrator::refresh`].
    #[error("visible radius {radius_km} km exceeds the {max_km} km search limit")]
    DegenerateViewport { radius_km: f64, max_km: f64 },
}
