//! In-memory map view for driving the search engine from the terminal.

use std::sync::{Mutex, PoisonError};

use voltspot_core::{Bounds, LatLng, Viewport};
use voltspot_search::{MapView, Projection, ScreenPoint, WebMercator};

/// A fixed-size Web Mercator viewport whose centre moves on `recenter`.
pub(crate) struct StaticMap {
    projection: WebMercator,
    width_px: f64,
    height_px: f64,
    center: Mutex<Option<LatLng>>,
}

impl StaticMap {
    pub(crate) fn new(zoom: f64, width_px: u32, height_px: u32) -> Self {
        Self {
            projection: WebMercator::new(zoom),
            width_px: f64::from(width_px),
            height_px: f64::from(height_px),
            center: Mutex::new(None),
        }
    }
}

impl Projection for StaticMap {
    fn project(&self, point: LatLng) -> Option<ScreenPoint> {
        self.projection.project(point)
    }
}

impl MapView for StaticMap {
    fn viewport(&self) -> Option<Viewport> {
        let center = (*self.center.lock().unwrap_or_else(PoisonError::into_inner))?;
        let pixel = self.projection.project(center)?;

        let half_w = self.width_px / 2.0;
        let half_h = self.height_px / 2.0;
        let southwest = clamp_to_world(self.projection.unproject(ScreenPoint {
            x: pixel.x - half_w,
            y: pixel.y + half_h,
        }));
        let northeast = clamp_to_world(self.projection.unproject(ScreenPoint {
            x: pixel.x + half_w,
            y: pixel.y - half_h,
        }));

        Some(Viewport {
            center,
            bounds: Some(Bounds::new(southwest, northeast)),
            zoom: self.projection.zoom,
        })
    }

    fn recenter(&self, center: LatLng) {
        tracing::debug!(lat = center.lat, lng = center.lng, "map recentred");
        *self.center.lock().unwrap_or_else(PoisonError::into_inner) = Some(center);
    }
}

/// A viewport wider than the world unprojects past the antimeridian.
fn clamp_to_world(point: LatLng) -> LatLng {
    LatLng::new(point.lat.clamp(-90.0, 90.0), point.lng.clamp(-180.0, 180.0))
}
