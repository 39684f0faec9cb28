use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Axis-aligned 2D bounding box.
///
/// An empty box has `min > max` on both axes so that `extend` works without a
/// special first-point case.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut out = Self::empty();
        for p in points {
            out.extend(p);
        }
        out
    }

    pub fn extend(&mut self, p: Vec2) {
        if !p.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    /// Empty, or zero extent on both axes (a single point).
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || (self.width() <= 0.0 && self.height() <= 0.0)
    }

    pub fn width(&self) -> f64 {
        (self.max[0] - self.min[0]).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max[1] - self.min[1]).max(0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn extend_from_empty() {
        let b = Aabb2::from_points([Vec2::new(1.0, 5.0), Vec2::new(-2.0, 3.0)]);
        assert_eq!(b, Aabb2::new([-2.0, 3.0], [1.0, 5.0]));
        assert_eq!(b.width(), 3.0);
        assert_eq!(b.height(), 2.0);
        assert_eq!(b.center(), Vec2::new(-0.5, 4.0));
    }

    #[test]
    fn empty_and_degenerate() {
        assert!(Aabb2::empty().is_empty());
        assert!(Aabb2::empty().is_degenerate());
        let point = Aabb2::from_points([Vec2::new(1.0, 1.0)]);
        assert!(!point.is_empty());
        assert!(point.is_degenerate());
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let b = Aabb2::from_points([Vec2::new(f64::NAN, 0.0), Vec2::new(2.0, 2.0)]);
        assert_eq!(b, Aabb2::new([2.0, 2.0], [2.0, 2.0]));
    }

    #[test]
    fn union_covers_both() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb2::new([2.0, -1.0], [3.0, 0.5]);
        assert_eq!(a.union(&b), Aabb2::new([0.0, -1.0], [3.0, 1.0]));
        assert_eq!(Aabb2::empty().union(&a), a);
    }
}
