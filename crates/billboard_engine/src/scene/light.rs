//! Light sources affecting renderables

use crate::foundation::math::Vec3;
use crate::render::ColourValue;

/// Kind of light source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light shining along a direction
    Directional {
        /// Direction the light travels in
        direction: Vec3,
    },
    /// Omnidirectional light at a position
    Point {
        /// World-space position
        position: Vec3,
        /// Distance beyond which the light has no effect
        range: f32,
    },
}

/// Light passed along with a renderable to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light name
    pub name: String,
    /// Source kind
    pub kind: LightKind,
    /// Diffuse colour
    pub colour: ColourValue,
}

impl Light {
    /// White directional light
    pub fn directional(name: impl Into<String>, direction: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Directional { direction },
            colour: ColourValue::WHITE,
        }
    }

    /// White point light
    pub fn point(name: impl Into<String>, position: Vec3, range: f32) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Point { position, range },
            colour: ColourValue::WHITE,
        }
    }

    /// Whether a sphere at `center` with `radius` is within reach of this light
    pub fn affects(&self, center: Vec3, radius: f32) -> bool {
        match self.kind {
            LightKind::Directional { .. } => true,
            LightKind::Point { position, range } => (position - center).norm() <= range + radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_reach() {
        let light = Light::point("lamp", Vec3::zeros(), 10.0);
        assert!(light.affects(Vec3::new(12.0, 0.0, 0.0), 3.0));
        assert!(!light.affects(Vec3::new(12.0, 0.0, 0.0), 1.0));
        assert!(Light::directional("sun", -Vec3::y()).affects(Vec3::repeat(1e6), 0.0));
    }
}
