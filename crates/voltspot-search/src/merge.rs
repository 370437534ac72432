//! Incremental merging of fetch results across viewport moves.

use std::collections::HashSet;

use voltspot_core::{Station, StationId};

/// Merge a fresh fetch into the previous result set.
///
/// Previous entries survive only if the fresh fetch still reports them, and
/// they keep their position at the front so already-rendered markers do not
/// reshuffle. Fresh stations not already retained are appended in fetch
/// order. The output never contains two stations with the same id, and every
/// id in it is present in `fresh`.
#[must_use]
pub fn merge_results(previous: &[Station], fresh: Vec<Station>) -> Vec<Station> {
    let mut seen: HashSet<StationId> = HashSet::with_capacity(fresh.len());

    if previous.is_empty() {
        return fresh.into_iter().filter(|s| seen.insert(s.id)).collect();
    }

    let fresh_ids: HashSet<StationId> = fresh.iter().map(|s| s.id).collect();

    let mut merged: Vec<Station> = previous
        .iter()
        .filter(|s| fresh_ids.contains(&s.id) && seen.insert(s.id))
        .cloned()
        .collect();

    merged.extend(fresh.into_iter().filter(|s| seen.insert(s.id)));
    merged
}
