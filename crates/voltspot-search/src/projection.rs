//! Geographic → screen-space projection capability.

use std::f64::consts::PI;
use std::sync::Arc;

use voltspot_core::LatLng;

/// Web Mercator is undefined at the poles; latitudes are clamped here.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
const DEFAULT_TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Projects a geographic point into pixel coordinates at the map's current
/// zoom. `None` means the projection context is not available.
pub trait Projection {
    fn project(&self, point: LatLng) -> Option<ScreenPoint>;
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, point: LatLng) -> Option<ScreenPoint> {
        (**self).project(point)
    }
}

impl<P: Projection + ?Sized> Projection for Arc<P> {
    fn project(&self, point: LatLng) -> Option<ScreenPoint> {
        (**self).project(point)
    }
}

/// Standard tiled Web Mercator world projection.
///
/// Returned coordinates are world pixels, which differ from viewport pixels
/// only by a translation, so distances are identical.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
    pub tile_size: f64,
}

impl WebMercator {
    #[must_use]
    pub fn new(zoom: f64) -> Self {
        Self {
            zoom,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    fn world_size(&self) -> f64 {
        self.tile_size * self.zoom.exp2()
    }

    /// Inverse of [`Projection::project`] for world-pixel coordinates.
    #[must_use]
    pub fn unproject(&self, point: ScreenPoint) -> LatLng {
        let world = self.world_size();
        let lng = point.x / world * 360.0 - 180.0;
        let n = PI - 2.0 * PI * point.y / world;
        let lat = n.sinh().atan().to_degrees();
        LatLng::new(lat, lng)
    }
}

impl Projection for WebMercator {
    fn project(&self, point: LatLng) -> Option<ScreenPoint> {
        if !point.is_valid() || !self.zoom.is_finite() {
            return None;
        }
        let world = self.world_size();
        let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let sin_lat = lat.to_radians().sin();

        let x = (point.lng + 180.0) / 360.0 * world;
        let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * world;
        Some(ScreenPoint { x, y })
    }
}
