//! Billboard data structures and types

use serde::{Deserialize, Serialize};

/// How the plane of each billboard is oriented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BillboardType {
    /// Always faces the camera
    #[default]
    Point,

    /// Up axis fixed to the set's common direction, rotates about it to face
    /// the camera
    OrientedCommon,

    /// Up axis fixed to each billboard's own direction, rotates about it to
    /// face the camera
    OrientedSelf,

    /// Plane perpendicular to the set's common direction, up axis from the
    /// set's common up vector
    PerpendicularCommon,

    /// Plane perpendicular to each billboard's own direction, up axis from the
    /// set's common up vector
    PerpendicularSelf,
}

impl BillboardType {
    /// Whether each billboard supplies its own direction
    pub const fn uses_own_direction(self) -> bool {
        matches!(self, Self::OrientedSelf | Self::PerpendicularSelf)
    }

    /// Whether the plane is perpendicular to a direction rather than facing
    /// the camera
    pub const fn is_perpendicular(self) -> bool {
        matches!(self, Self::PerpendicularCommon | Self::PerpendicularSelf)
    }

    /// Whether the type needs the set's common direction
    pub const fn uses_common_direction(self) -> bool {
        matches!(self, Self::OrientedCommon | Self::PerpendicularCommon)
    }

    /// Whether the type needs the set's common up vector
    pub const fn uses_common_up(self) -> bool {
        self.is_perpendicular()
    }
}

/// Point of the billboard that sits at its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BillboardOrigin {
    /// Top edge, left corner
    TopLeft,
    /// Top edge, centred
    TopCenter,
    /// Top edge, right corner
    TopRight,
    /// Vertically centred, left edge
    CenterLeft,
    /// Middle of the quad
    #[default]
    Center,
    /// Vertically centred, right edge
    CenterRight,
    /// Bottom edge, left corner
    BottomLeft,
    /// Bottom edge, centred
    BottomCenter,
    /// Bottom edge, right corner
    BottomRight,
}

/// What a billboard's rotation angle rotates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BillboardRotationType {
    /// Rotate the quad's corner positions
    Vertex,
    /// Rotate the texture coordinates inside an unrotated quad
    #[default]
    TexCoord,
}

/// Key the visibility sorter orders billboards by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    /// Projection onto the camera direction
    Direction,
    /// Distance from the camera position
    Distance,
}

/// Axis-aligned rectangle in texture space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRect {
    /// Left edge (u)
    pub left: f32,
    /// Top edge (v)
    pub top: f32,
    /// Right edge (u)
    pub right: f32,
    /// Bottom edge (v)
    pub bottom: f32,
}

impl Default for FloatRect {
    fn default() -> Self {
        Self::UNIT
    }
}

impl FloatRect {
    /// Full texture, `0..1` on both axes
    pub const UNIT: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a rect from its edges
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Width (may be negative for flipped rects)
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height (may be negative for flipped rects)
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(BillboardType::default(), BillboardType::Point);
        assert_eq!(BillboardOrigin::default(), BillboardOrigin::Center);
        assert_eq!(BillboardRotationType::default(), BillboardRotationType::TexCoord);
        assert_eq!(FloatRect::default(), FloatRect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_type_classification() {
        assert!(BillboardType::OrientedSelf.uses_own_direction());
        assert!(BillboardType::PerpendicularSelf.uses_own_direction());
        assert!(!BillboardType::OrientedCommon.uses_own_direction());
        assert!(BillboardType::PerpendicularCommon.is_perpendicular());
        assert!(!BillboardType::Point.is_perpendicular());
        assert!(BillboardType::PerpendicularCommon.uses_common_direction());
        assert!(!BillboardType::OrientedSelf.uses_common_direction());
        assert!(BillboardType::PerpendicularSelf.uses_common_up());
        assert!(!BillboardType::OrientedCommon.uses_common_up());
    }
}
