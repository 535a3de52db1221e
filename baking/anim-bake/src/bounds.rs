//! Axis-aligned bounding boxes

use glam::Vec3;

/// Axis-aligned box stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Aabb {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Full edge lengths
    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    pub fn contains_point(&self, point: Vec3, tolerance: f32) -> bool {
        let delta = (point - self.center).abs();
        delta.cmple(self.extents + Vec3::splat(tolerance)).all()
    }
}

/// Running min/max over a stream of points
#[derive(Debug, Clone, Copy)]
pub struct BoundsAccumulator {
    min: Vec3,
    max: Vec3,
    initialized: bool,
}

impl Default for BoundsAccumulator {
    fn default() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
            initialized: false,
        }
    }
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self.initialized = true;
    }

    pub fn is_empty(&self) -> bool {
        !self.initialized
    }

    /// The accumulated box, or `None` if no point was added
    pub fn finish(&self) -> Option<Aabb> {
        self.initialized
            .then(|| Aabb::from_min_max(self.min, self.max))
    }
}

/// Bounds of a point set, `None` when empty
pub fn calculate_aabb(points: &[Vec3]) -> Option<Aabb> {
    let mut accumulator = BoundsAccumulator::new();
    for point in points {
        accumulator.add_point(*point);
    }
    accumulator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator() {
        let accumulator = BoundsAccumulator::new();
        assert!(accumulator.is_empty());
        assert_eq!(accumulator.finish(), None);
        assert_eq!(calculate_aabb(&[]), None);
    }

    #[test]
    fn test_center_and_extents() {
        let aabb = calculate_aabb(&[Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 2.0)])
            .unwrap_or_default();
        assert_eq!(aabb.center, Vec3::new(1.0, 2.0, 2.0));
        assert_eq!(aabb.extents, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(aabb.min(), Vec3::new(-1.0, 0.0, 2.0));
        assert_eq!(aabb.size(), Vec3::new(4.0, 4.0, 0.0));
        assert!(aabb.contains_point(Vec3::new(3.0, 4.0, 2.0), 0.0));
        assert!(!aabb.contains_point(Vec3::new(3.5, 4.0, 2.0), 0.25));
    }
}
