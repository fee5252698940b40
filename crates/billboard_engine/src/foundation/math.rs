//! Math utilities and types
//!
//! Provides the fundamental math types used by billboard geometry, camera
//! frames and scene nodes. Everything is `f32`, matching what ends up in
//! vertex buffers.

pub use nalgebra::{Matrix4, Rotation3, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = nalgebra::UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }

    /// Combine this transform with a child transform expressed in its space
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Get the inverse transform
    ///
    /// Exact for uniform scale; non-uniform scale combined with rotation has
    /// no exact TRS inverse and is approximated.
    pub fn inverse(&self) -> Self {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_scale.component_mul(&(inv_rotation * -self.position));

        Self {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Lengths below this are treated as zero when normalising
    pub const NORMALISE_EPSILON: f32 = 1e-8;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Normalise a vector, leaving (near) zero vectors untouched instead of
    /// producing NaNs.
    pub fn normalise(v: Vec3) -> Vec3 {
        let length = v.norm();
        if length > constants::NORMALISE_EPSILON {
            v / length
        } else {
            v
        }
    }

    /// Transform a point by an affine 4x4 matrix
    pub fn transform_point(matrix: &Mat4, point: Vec3) -> Vec3 {
        matrix.transform_point(&point.into()).coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_transform_inverse_round_trip() {
        let transform = Transform {
            position: Vec3::new(3.0, -2.0, 7.5),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let point = Vec3::new(1.0, 4.0, -3.0);

        let world = transform.transform_point(point);
        let back = transform.inverse().transform_point(world);

        assert_relative_eq!(back, point, epsilon = EPSILON);
    }

    #[test]
    fn test_transform_matrix_matches_point_transform() {
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI),
            scale: Vec3::new(1.0, 2.0, 1.0),
        };
        let point = Vec3::new(1.0, 1.0, 0.0);

        let by_matrix = utils::transform_point(&transform.to_matrix(), point);
        assert_relative_eq!(by_matrix, transform.transform_point(point), epsilon = EPSILON);
    }

    #[test]
    fn test_normalise_keeps_zero_vector() {
        assert_eq!(utils::normalise(Vec3::zeros()), Vec3::zeros());
        assert_relative_eq!(utils::normalise(Vec3::new(0.0, 3.0, 4.0)).norm(), 1.0, epsilon = EPSILON);
    }
}
