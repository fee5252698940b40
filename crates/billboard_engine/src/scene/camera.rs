//! # Camera
//!
//! Perspective camera described by a position and an orientation quaternion.
//! The camera looks down its local -Z axis with +Y up, so
//! `orientation * -Z` is the view direction and `orientation * X` /
//! `orientation * Y` span the view plane. Billboards built from those axes
//! face the camera.

use super::bounds::Sphere;
use super::frustum::Frustum;
use crate::foundation::math::{utils, Mat4, Quat, Vec3};

/// 3D perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Camera orientation in world space
    pub orientation: Quat,

    /// Vertical field of view angle in radians
    pub fov: f32,

    /// Aspect ratio (width / height) for projection calculations
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::zeros(), 60.0, 4.0 / 3.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Create a perspective camera looking down -Z
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view angle in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            orientation: Quat::identity(),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Set the orientation directly
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    /// Turn the camera towards `target`, keeping `up` as close to the view
    /// plane's vertical as possible
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let direction = target - self.position;
        if direction.norm_squared() <= f32::EPSILON {
            return;
        }
        self.orientation = if direction.cross(&up).norm_squared() > f32::EPSILON {
            // face_towards maps local +Z onto its argument
            Quat::face_towards(&-direction, &up)
        } else {
            Quat::rotation_between(&-Vec3::z(), &direction).unwrap_or_else(|| {
                Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::PI)
            })
        };
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Orientation in world space
    pub fn derived_orientation(&self) -> Quat {
        self.orientation
    }

    /// Position in world space
    pub fn derived_position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction in world space
    pub fn direction(&self) -> Vec3 {
        self.orientation * -Vec3::z()
    }

    /// Unit right vector in world space
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// Unit up vector in world space
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        let inverse = self.orientation.inverse();
        inverse.to_homogeneous() * Mat4::new_translation(&-self.position)
    }

    /// Right-handed perspective projection, depth mapped to [-1, 1]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Current view frustum
    pub fn frustum(&self) -> Frustum {
        Frustum::from_camera(self.position, &self.orientation, self.fov, self.aspect, self.near, self.far)
    }

    /// Whether any part of `sphere` lies inside the view frustum
    pub fn is_visible(&self, sphere: &Sphere) -> bool {
        self.frustum().intersects_sphere(sphere)
    }
}
