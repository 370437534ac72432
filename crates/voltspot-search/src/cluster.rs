//! Greedy pixel-distance clustering of station markers.
//!
//! Each unprocessed station, in input order, anchors a group and pulls in
//! every other unprocessed station within the threshold of the anchor. The
//! result depends on input order and is not a globally optimal clustering.
//! Because pixel distance depends on zoom, clusters are recomputed on every
//! viewport change and never cached.

use voltspot_core::{LatLng, Station};

use crate::projection::{Projection, ScreenPoint};

pub const DEFAULT_CLUSTER_THRESHOLD_PX: f64 = 50.0;

/// Two or more stations drawn as a single marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Sequence number within one clustering pass; not stable across passes.
    pub id: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub stations: Vec<Station>,
    pub count: usize,
}

impl Cluster {
    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Output of one pass. Every input station lands in exactly one cluster or
/// in `individuals`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    pub individuals: Vec<Station>,
}

/// Cluster `stations` at the projection's current zoom.
///
/// Stations strictly closer than `threshold_px` to a group's anchor join it.
///
/// When the projection cannot place any station it has no context, and every
/// pair is at distance zero as in [`crate::geo::pixel_distance`]. Otherwise a
/// station it cannot place (bad coordinates) never joins a group.
pub fn cluster_stations<P: Projection + ?Sized>(
    stations: &[Station],
    projection: &P,
    threshold_px: f64,
) -> Clustering {
    let projected: Vec<Option<ScreenPoint>> = stations
        .iter()
        .map(|s| projection.project(s.position()))
        .collect();
    let has_context = projected.iter().any(Option::is_some);
    let distance = |i: usize, j: usize| match (projected[i], projected[j]) {
        (Some(a), Some(b)) => a.distance_to(b),
        _ if has_context => f64::INFINITY,
        _ => 0.0,
    };

    let mut processed = vec![false; stations.len()];
    let mut out = Clustering::default();

    for i in 0..stations.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let mut members = vec![i];

        for j in (i + 1)..stations.len() {
            if !processed[j] && distance(i, j) < threshold_px {
                processed[j] = true;
                members.push(j);
            }
        }

        if members.len() > 1 {
            let group: Vec<Station> = members.iter().map(|&k| stations[k].clone()).collect();
            let (latitude, longitude) = centroid(&group);
            out.clusters.push(Cluster {
                id: out.clusters.len(),
                latitude,
                longitude,
                count: group.len(),
                stations: group,
            });
        } else {
            out.individuals.push(stations[i].clone());
        }
    }

    out
}

#[allow(clippy::cast_precision_loss)]
fn centroid(stations: &[Station]) -> (f64, f64) {
    let n = stations.len() as f64;
    let lat = stations.iter().map(|s| s.latitude).sum::<f64>() / n;
    let lng = stations.iter().map(|s| s.longitude).sum::<f64>() / n;
    (lat, lng)
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
