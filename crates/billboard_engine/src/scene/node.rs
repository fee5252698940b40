//! Scene nodes
//!
//! A node carries a local transform relative to its parent and a cached
//! derived (world) transform. [`SceneNode::update_from_parent`] refreshes the
//! derived transform; the scene does this top-down before rendering.

use super::camera::Camera;
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};

/// Positioned node that renderables attach to
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    name: String,
    local: Transform,
    derived: Transform,
}

impl SceneNode {
    /// Root-level node at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform::identity(),
            derived: Transform::identity(),
        }
    }

    /// Root-level node with the given transform
    pub fn with_transform(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            local: transform,
            derived: transform,
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transform relative to the parent
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Replace the local transform; the derived transform follows on the next
    /// [`update_from_parent`](Self::update_from_parent)
    pub fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    /// Move relative to the parent
    pub fn set_position(&mut self, position: Vec3) {
        self.local.position = position;
    }

    /// Rotate relative to the parent
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.local.rotation = orientation;
    }

    /// Scale relative to the parent
    pub fn set_scale(&mut self, scale: Vec3) {
        self.local.scale = scale;
    }

    /// Recompute the derived transform, `None` for root nodes
    pub fn update_from_parent(&mut self, parent: Option<&Transform>) {
        self.derived = match parent {
            Some(parent) => parent.combine(&self.local),
            None => self.local,
        };
    }

    /// World-space transform
    pub fn derived_transform(&self) -> &Transform {
        &self.derived
    }

    /// World-space position
    pub fn derived_position(&self) -> Vec3 {
        self.derived.position
    }

    /// World-space orientation
    pub fn derived_orientation(&self) -> Quat {
        self.derived.rotation
    }

    /// World-space scale
    pub fn derived_scale(&self) -> Vec3 {
        self.derived.scale
    }

    /// Local-to-world matrix
    pub fn full_transform(&self) -> Mat4 {
        self.derived.to_matrix()
    }

    /// World-to-local transform
    pub fn full_inverse(&self) -> Transform {
        self.derived.inverse()
    }

    /// Express a world-space position in this node's space
    pub fn convert_world_to_local_position(&self, world: Vec3) -> Vec3 {
        convert_world_to_local_position(&self.derived, world)
    }

    /// Express a world-space orientation in this node's space
    pub fn convert_world_to_local_orientation(&self, world: &Quat) -> Quat {
        convert_world_to_local_orientation(&self.derived, world)
    }

    /// Squared distance from the camera to this node's origin
    pub fn squared_view_depth(&self, camera: &Camera) -> f32 {
        (self.derived.position - camera.derived_position()).norm_squared()
    }
}

/// Express `world` in the space described by `frame`
pub fn convert_world_to_local_position(frame: &Transform, world: Vec3) -> Vec3 {
    (frame.rotation.inverse() * (world - frame.position)).component_div(&frame.scale)
}

/// Express `world` relative to the orientation of `frame`
pub fn convert_world_to_local_orientation(frame: &Transform, world: &Quat) -> Quat {
    frame.rotation.inverse() * world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn rotated_node() -> SceneNode {
        SceneNode::with_transform(
            "node",
            Transform {
                position: Vec3::new(10.0, 0.0, 0.0),
                rotation: Quat::from_axis_angle(&Vec3::y_axis(), HALF_PI),
                scale: Vec3::repeat(2.0),
            },
        )
    }

    #[test]
    fn test_world_to_local_inverts_derived_transform() {
        let node = rotated_node();
        let local = Vec3::new(1.0, 2.0, 3.0);
        let world = node.derived_transform().transform_point(local);

        assert_relative_eq!(node.convert_world_to_local_position(world), local, epsilon = EPSILON);
        assert_relative_eq!(node.full_inverse().transform_point(world), local, epsilon = EPSILON);
    }

    #[test]
    fn test_world_to_local_orientation() {
        let node = rotated_node();
        let local = node.convert_world_to_local_orientation(&node.derived_orientation());
        assert_relative_eq!(local.angle(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_child_derives_from_parent() {
        let parent = rotated_node();
        let mut child = SceneNode::new("child");
        child.set_position(Vec3::new(0.0, 0.0, 1.0));
        child.update_from_parent(Some(parent.derived_transform()));

        // +Z rotated a quarter turn about Y is +X, then scaled by 2
        assert_relative_eq!(child.derived_position(), Vec3::new(12.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(child.derived_scale(), Vec3::repeat(2.0), epsilon = EPSILON);
    }

    #[test]
    fn test_squared_view_depth() {
        let node = rotated_node();
        let camera = Camera::perspective(Vec3::new(10.0, 3.0, 4.0), 60.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(node.squared_view_depth(&camera), 25.0, epsilon = EPSILON);
    }
}
