//! Billboard axis calculations
//!
//! Every quad is spanned by an X (right) and a Y (up) axis computed from the
//! camera and the set's orientation settings. Inputs are expressed in the
//! set's working frame: node-local space, or world space for sets whose
//! billboards live in world space.

use super::record::Billboard;
use super::types::BillboardType;
use crate::foundation::math::{utils::normalise, Quat, Vec3};

/// Camera state expressed in a set's working frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    /// Camera orientation
    pub orientation: Quat,
    /// Camera position
    pub position: Vec3,
    /// Unit view direction, `orientation * -Z`
    pub direction: Vec3,
}

impl Default for CameraFrame {
    fn default() -> Self {
        Self::new(Quat::identity(), Vec3::zeros())
    }
}

impl CameraFrame {
    /// Frame for a camera at `position` with `orientation`
    pub fn new(orientation: Quat, position: Vec3) -> Self {
        Self {
            orientation,
            position,
            direction: orientation * -Vec3::z(),
        }
    }
}

/// Right and up axes of a billboard's plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardAxes {
    /// Right
    pub x: Vec3,
    /// Up
    pub y: Vec3,
}

/// Set-wide inputs to the axis calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSettings {
    /// Orientation mode
    pub billboard_type: BillboardType,
    /// Face the camera position rather than the view plane
    pub accurate_facing: bool,
    /// Direction shared by the `*Common` types
    pub common_direction: Vec3,
    /// Up vector shared by the `Perpendicular*` types
    pub common_up: Vec3,
}

impl OrientationSettings {
    /// Whether axes depend on the individual billboard, so they cannot be
    /// computed once per frame
    pub fn per_billboard_axes(&self) -> bool {
        self.billboard_type.uses_own_direction()
            || (self.accurate_facing && self.billboard_type != BillboardType::PerpendicularCommon)
    }

    /// Axes for `billboard`, or the shared axes when `billboard` is `None`
    pub fn axes(&self, camera: &CameraFrame, billboard: Option<&Billboard>) -> BillboardAxes {
        let camera_up = camera.orientation * Vec3::y();

        // Accurate facing looks from the camera position at each billboard
        let facing = match billboard {
            Some(bb) if self.accurate_facing && !self.billboard_type.is_perpendicular() => {
                normalise(bb.position() - camera.position)
            }
            _ => camera.direction,
        };

        match self.billboard_type {
            BillboardType::Point => {
                if self.accurate_facing {
                    let x = normalise(facing.cross(&camera_up));
                    BillboardAxes { x, y: x.cross(&facing) }
                } else {
                    BillboardAxes {
                        x: camera.orientation * Vec3::x(),
                        y: camera_up,
                    }
                }
            }
            BillboardType::OrientedCommon => {
                let y = self.common_direction;
                BillboardAxes { x: normalise(facing.cross(&y)), y }
            }
            BillboardType::OrientedSelf => {
                let y = billboard.map_or(self.common_direction, Billboard::direction);
                BillboardAxes { x: normalise(facing.cross(&y)), y }
            }
            BillboardType::PerpendicularCommon => {
                let x = self.common_up.cross(&self.common_direction);
                BillboardAxes { x, y: self.common_direction.cross(&x) }
            }
            BillboardType::PerpendicularSelf => {
                let direction = billboard.map_or(self.common_direction, Billboard::direction);
                let x = normalise(self.common_up.cross(&direction));
                BillboardAxes { x, y: direction.cross(&x) }
            }
        }
    }
}
