//! Viewport containment filtering.

use voltspot_core::{Bounds, Station};

/// Predicate accepting stations inside `bounds` (inclusive on every edge).
///
/// With no bounds the predicate accepts everything: a map that has not
/// reported its extent yet must not hide stations.
pub fn bounds_filter(bounds: Option<Bounds>) -> impl Fn(&Station) -> bool {
    move |station| bounds.is_none_or(|b| b.contains(station.position()))
}

#[must_use]
pub fn filter_to_bounds(stations: Vec<Station>, bounds: Option<Bounds>) -> Vec<Station> {
    let keep = bounds_filter(bounds);
    stations.into_iter().filter(|s| keep(s)).collect()
}
