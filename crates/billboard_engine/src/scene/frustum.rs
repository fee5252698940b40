//! View frustum for visibility culling

use super::bounds::{Sphere, AABB};
use crate::foundation::math::{utils, Quat, Vec3};

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: utils::normalise(normal), distance }
    }

    /// Plane through `point` facing along `normal`
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = utils::normalise(normal);
        Self { normal, distance: -normal.dot(&point) }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Six inward-facing planes; a point is inside when it is on the positive side
/// of all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, top, bottom, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Perspective frustum of a camera at `position` looking along
    /// `orientation * -Z`, with vertical field of view `fov_y` in radians.
    pub fn from_camera(
        position: Vec3,
        orientation: &Quat,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let forward = orientation * -Vec3::z();
        let right = orientation * Vec3::x();
        let up = orientation * Vec3::y();

        let tan_v = (fov_y * 0.5).tan();
        let tan_h = tan_v * aspect;

        let left = Plane::from_normal_and_point(forward * tan_h + right, position);
        let right_plane = Plane::from_normal_and_point(forward * tan_h - right, position);
        let top = Plane::from_normal_and_point(forward * tan_v - up, position);
        let bottom = Plane::from_normal_and_point(forward * tan_v + up, position);
        let near_plane = Plane::from_normal_and_point(forward, position + forward * near);
        let far_plane = Plane::from_normal_and_point(-forward, position + forward * far);

        Self::new([left, right_plane, top, bottom, near_plane, far_plane])
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        if aabb.is_null() {
            return false;
        }
        // For each plane, check if the AABB is completely outside
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;

    fn frustum() -> Frustum {
        Frustum::from_camera(Vec3::zeros(), &Quat::identity(), HALF_PI, 1.0, 1.0, 100.0)
    }

    #[test]
    fn test_point_in_front_is_inside() {
        assert!(frustum().intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -10.0), 0.0)));
    }

    #[test]
    fn test_spheres_outside_each_side() {
        let f = frustum();
        // Behind, beyond far, and far off to the side
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -200.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(50.0, 0.0, -10.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, -50.0, -10.0), 1.0)));
    }

    #[test]
    fn test_sphere_straddling_side_plane_is_visible() {
        // 90 degree fov: the right plane passes through x == -z
        let f = frustum();
        assert!(f.intersects_sphere(&Sphere::new(Vec3::new(11.0, 0.0, -10.0), 2.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(14.0, 0.0, -10.0), 2.0)));
    }

    #[test]
    fn test_aabb_culling() {
        let f = frustum();
        assert!(f.intersects_aabb(&AABB::new(Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -4.0))));
        assert!(!f.intersects_aabb(&AABB::new(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 6.0))));
        assert!(!f.intersects_aabb(&AABB::null()));
    }
}
