//! Bounding box and radius of a billboard set

use crate::foundation::math::{Transform, Vec3};
use crate::scene::AABB;

/// Cached bounds of a set, in the set's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTracker {
    aabb: AABB,
    radius: f32,
}

impl Default for BoundsTracker {
    fn default() -> Self {
        Self {
            aabb: AABB::null(),
            radius: 0.0,
        }
    }
}

impl BoundsTracker {
    /// Bounding box
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Bounding radius about the local origin
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Grow to include a billboard at `position` padded by `pad` on every
    /// axis. Never shrinks.
    pub fn merge_billboard(&mut self, position: Vec3, pad: f32) {
        let pad = Vec3::repeat(pad);
        self.aabb.merge_point(position - pad);
        self.aabb.merge_point(position + pad);
        self.radius = self.aabb.bounding_radius();
    }

    /// Recompute from scratch over `positions`
    ///
    /// Positions are taken through `to_local` first when given (world-space
    /// billboards under a node). The box is padded by `pad`; the radius is the
    /// largest unpadded distance from the origin. No positions gives a null
    /// box and zero radius.
    pub fn recompute(&mut self, positions: impl Iterator<Item = Vec3>, to_local: Option<&Transform>, pad: f32) {
        let mut aabb = AABB::null();
        let mut max_squared_length: Option<f32> = None;

        for position in positions {
            let position = to_local.map_or(position, |transform| transform.transform_point(position));
            aabb.merge_point(position);
            let squared = position.norm_squared();
            max_squared_length = Some(max_squared_length.map_or(squared, |max| max.max(squared)));
        }

        match max_squared_length {
            Some(squared) => {
                let pad = Vec3::repeat(pad);
                self.aabb.set_extents(aabb.min - pad, aabb.max + pad);
                self.radius = squared.sqrt();
            }
            None => *self = Self::default(),
        }
    }

    /// Override the bounds
    pub fn set(&mut self, aabb: AABB, radius: f32) {
        self.aabb = aabb;
        self.radius = radius;
    }
}
