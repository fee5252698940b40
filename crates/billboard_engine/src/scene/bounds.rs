//! Bounding volumes

use crate::foundation::math::{Transform, Vec3};

/// Axis-Aligned Bounding Box
///
/// A box with `min > max` on any axis is *null*: it contains nothing and
/// merging a point into it yields a degenerate box around that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::null()
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Empty box
    pub fn null() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Whether the box is empty
    pub fn is_null(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Replace both corners
    pub fn set_extents(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.max = max;
    }

    /// Grow the box to include `point`
    pub fn merge_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to include `other`
    pub fn merge(&mut self, other: &Self) {
        if other.is_null() {
            return;
        }
        self.merge_point(other.min);
        self.merge_point(other.max);
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Radius of the origin-centred sphere enclosing both corners
    pub fn bounding_radius(&self) -> f32 {
        if self.is_null() {
            return 0.0;
        }
        self.min.norm().max(self.max.norm())
    }

    /// Box enclosing this box's corners after `transform`; null stays null
    pub fn transformed(&self, transform: &Transform) -> Self {
        if self.is_null() {
            return *self;
        }
        let mut result = Self::null();
        for corner in 0..8 {
            let pick = |bit: usize, axis: usize| if corner & bit == 0 { self.min[axis] } else { self.max[axis] };
            let point = Vec3::new(pick(1, 0), pick(2, 1), pick(4, 2));
            result.merge_point(transform.transform_point(point));
        }
        result
    }
}

/// Sphere used for visibility tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Centre
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl Sphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}
