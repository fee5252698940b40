//! Corner offsets from origin, size and axes

use super::orientation::BillboardAxes;
use super::types::BillboardOrigin;
use crate::foundation::math::Vec3;

/// Edge positions of a unit quad relative to its origin point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricOffsets {
    /// Left edge, in widths
    pub left: f32,
    /// Right edge, in widths
    pub right: f32,
    /// Top edge, in heights
    pub top: f32,
    /// Bottom edge, in heights
    pub bottom: f32,
}

impl ParametricOffsets {
    /// Offsets placing `origin` at the billboard's position
    pub const fn for_origin(origin: BillboardOrigin) -> Self {
        let (left, right) = match origin {
            BillboardOrigin::TopLeft | BillboardOrigin::CenterLeft | BillboardOrigin::BottomLeft => (0.0, 1.0),
            BillboardOrigin::TopCenter | BillboardOrigin::Center | BillboardOrigin::BottomCenter => (-0.5, 0.5),
            BillboardOrigin::TopRight | BillboardOrigin::CenterRight | BillboardOrigin::BottomRight => (-1.0, 0.0),
        };
        let (top, bottom) = match origin {
            BillboardOrigin::TopLeft | BillboardOrigin::TopCenter | BillboardOrigin::TopRight => (0.0, -1.0),
            BillboardOrigin::CenterLeft | BillboardOrigin::Center | BillboardOrigin::CenterRight => (0.5, -0.5),
            BillboardOrigin::BottomLeft | BillboardOrigin::BottomCenter | BillboardOrigin::BottomRight => (1.0, 0.0),
        };
        Self { left, right, top, bottom }
    }

    /// Corner offsets for a `width` x `height` quad on `axes`, in the order
    /// top-left, top-right, bottom-left, bottom-right
    pub fn vertex_offsets(&self, width: f32, height: f32, axes: &BillboardAxes) -> [Vec3; 4] {
        let left = axes.x * (self.left * width);
        let right = axes.x * (self.right * width);
        let top = axes.y * (self.top * height);
        let bottom = axes.y * (self.bottom * height);

        [left + top, right + top, left + bottom, right + bottom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL_ORIGINS: [BillboardOrigin; 9] = [
        BillboardOrigin::TopLeft,
        BillboardOrigin::TopCenter,
        BillboardOrigin::TopRight,
        BillboardOrigin::CenterLeft,
        BillboardOrigin::Center,
        BillboardOrigin::CenterRight,
        BillboardOrigin::BottomLeft,
        BillboardOrigin::BottomCenter,
        BillboardOrigin::BottomRight,
    ];

    fn unit_axes() -> BillboardAxes {
        BillboardAxes { x: Vec3::x(), y: Vec3::y() }
    }

    #[test]
    fn test_center_offsets_sum_to_zero() {
        let axes = BillboardAxes { x: Vec3::new(0.3, 0.4, 0.0), y: Vec3::new(0.0, 0.6, 0.8) };
        let offsets = ParametricOffsets::for_origin(BillboardOrigin::Center).vertex_offsets(7.0, 3.0, &axes);

        let sum: Vec3 = offsets.iter().sum();
        assert_relative_eq!(sum, Vec3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn test_every_origin_spans_one_by_one() {
        for origin in ALL_ORIGINS {
            let p = ParametricOffsets::for_origin(origin);
            assert_eq!(p.right - p.left, 1.0, "{origin:?}");
            assert_eq!(p.top - p.bottom, 1.0, "{origin:?}");
        }
    }

    #[test]
    fn test_top_left_origin_hangs_right_and_down() {
        let offsets = ParametricOffsets::for_origin(BillboardOrigin::TopLeft).vertex_offsets(2.0, 4.0, &unit_axes());

        assert_eq!(offsets[0], Vec3::zeros());
        assert_eq!(offsets[1], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(offsets[2], Vec3::new(0.0, -4.0, 0.0));
        assert_eq!(offsets[3], Vec3::new(2.0, -4.0, 0.0));
    }

    #[test]
    fn test_bottom_right_origin() {
        let offsets = ParametricOffsets::for_origin(BillboardOrigin::BottomRight).vertex_offsets(2.0, 4.0, &unit_axes());

        assert_eq!(offsets[0], Vec3::new(-2.0, 4.0, 0.0));
        assert_eq!(offsets[3], Vec3::zeros());
    }
}
