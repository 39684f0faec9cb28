use crate::bounds::Aabb2;

use super::Vec2;

/// Latitude limit of the square web-Mercator world.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Spherical Mercator projection onto a pixel canvas.
///
/// `project` maps `(lon, lat)` degrees to canvas pixels with `y` growing
/// downwards. A projection is usually built with [`Mercator::fit_size`] so a
/// whole feature collection fills the canvas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub translate: Vec2,
}

impl Default for Mercator {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate: Vec2::new(0.0, 0.0),
        }
    }
}

impl Mercator {
    pub fn new(scale: f64, translate: Vec2) -> Self {
        Self { scale, translate }
    }

    /// Fits `lon_lat_bounds` (x = lon, y = lat, degrees) into a `width` x `height`
    /// canvas, preserving aspect ratio and centering the result.
    ///
    /// Returns `None` for empty or zero-area bounds or a non-positive canvas.
    pub fn fit_size(width: f64, height: f64, lon_lat_bounds: &Aabb2) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 || lon_lat_bounds.is_empty() {
            return None;
        }
        let unit = Self::default();
        // Mercator is monotonic per axis, so the corners bound the projection.
        let raw = Aabb2::from_points([
            unit.project(lon_lat_bounds.min[0], lon_lat_bounds.min[1]),
            unit.project(lon_lat_bounds.max[0], lon_lat_bounds.max[1]),
        ]);
        if raw.width() <= 0.0 || raw.height() <= 0.0 {
            return None;
        }

        let scale = (width / raw.width()).min(height / raw.height());
        let c = raw.center();
        Some(Self {
            scale,
            translate: Vec2::new(width * 0.5 - scale * c.x, height * 0.5 - scale * c.y),
        })
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let lat = lat_deg.clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG);
        let x = lon_deg.to_radians();
        let y = (std::f64::consts::FRAC_PI_4 + lat.to_radians() * 0.5).tan().ln();
        Vec2::new(
            self.scale * x + self.translate.x,
            -self.scale * y + self.translate.y,
        )
    }

    /// Projected bounds of a set of `(lon, lat)` points.
    pub fn project_bounds<'a>(&self, points: impl IntoIterator<Item = &'a [f64; 2]>) -> Aabb2 {
        Aabb2::from_points(points.into_iter().map(|p| self.project(p[0], p[1])))
    }
}
