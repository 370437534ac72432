//! Best-effort viewport geometry.
//!
//! None of these functions fail: missing or non-finite inputs produce `0.0`.

use voltspot_core::{LatLng, Viewport};

use crate::projection::Projection;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres.
#[must_use]
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Approximate visible radius: centre → north-east corner, rounded to two
/// decimals. Returns `0.0` when either point is missing or non-finite.
///
/// Map widgets report unwrapped longitudes (past ±180°) once the world
/// repeats on screen; those are accepted as-is. A corner more than half the
/// globe east of the centre means the view wraps, so the radius is taken as
/// half the Earth's circumference.
#[must_use]
pub fn visible_radius_km(center: Option<LatLng>, northeast: Option<LatLng>) -> f64 {
    let (Some(center), Some(northeast)) = (center, northeast) else {
        return 0.0;
    };
    if !is_finite(center) || !is_finite(northeast) {
        return 0.0;
    }
    if northeast.lng - center.lng >= 180.0 {
        return (std::f64::consts::PI * EARTH_RADIUS_KM * 100.0).round() / 100.0;
    }

    let clamp = |p: LatLng| LatLng::new(p.lat.clamp(-90.0, 90.0), p.lng);
    (haversine_km(clamp(center), clamp(northeast)) * 100.0).round() / 100.0
}

fn is_finite(point: LatLng) -> bool {
    point.lat.is_finite() && point.lng.is_finite()
}

#[must_use]
pub fn viewport_radius_km(viewport: &Viewport) -> f64 {
    visible_radius_km(
        Some(viewport.center),
        viewport.bounds.map(|b| b.northeast),
    )
}

/// Euclidean distance in pixels between two projected points, or `0.0` if
/// the projection cannot place either of them.
pub fn pixel_distance<P: Projection + ?Sized>(a: LatLng, b: LatLng, projection: &P) -> f64 {
    match (projection.project(a), projection.project(b)) {
        (Some(pa), Some(pb)) => pa.distance_to(pb),
        _ => 0.0,
    }
}
