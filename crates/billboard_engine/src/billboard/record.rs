//! Individual billboard records
//!
//! A [`Billboard`] is plain data. Records owned by a
//! [`BillboardSet`](super::BillboardSet) are modified through
//! [`BillboardMut`], which also keeps the set's bookkeeping in step: giving a
//! billboard its own size or a non-zero rotation disables the set-wide
//! shortcuts that assume neither happens, and every change marks the set's
//! geometry as stale.

use std::ops::Deref;

use super::types::FloatRect;
use crate::foundation::math::Vec3;
use crate::render::ColourValue;

/// Stable reference to a billboard inside a set
///
/// The generation changes whenever the slot is released, so a handle kept
/// across a remove or clear never refers to whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillboardHandle {
    /// Slot index in the set's pool
    pub index: u32,
    /// Generation of the slot when the handle was issued
    pub generation: u32,
}

/// One camera-facing quad (or point)
#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    position: Vec3,
    direction: Vec3,
    colour: ColourValue,
    rotation: f32,
    own_dimensions: Option<(f32, f32)>,
    tex_coord_index: u16,
    tex_coord_rect: Option<FloatRect>,
}

impl Default for Billboard {
    fn default() -> Self {
        Self::new(Vec3::zeros(), ColourValue::WHITE)
    }
}

impl Billboard {
    /// Billboard at `position` with default size, no rotation and the first
    /// texture coordinate set
    pub fn new(position: Vec3, colour: ColourValue) -> Self {
        Self {
            position,
            direction: Vec3::zeros(),
            colour,
            rotation: 0.0,
            own_dimensions: None,
            tex_coord_index: 0,
            tex_coord_rect: None,
        }
    }

    /// Return to the state of a freshly created billboard
    pub(crate) fn reset(&mut self, position: Vec3, colour: ColourValue) {
        *self = Self::new(position, colour);
    }

    /// Position in the set's space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Direction used by the `*Self` billboard types
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Set the direction used by the `*Self` billboard types
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction;
    }

    /// Colour
    pub fn colour(&self) -> ColourValue {
        self.colour
    }

    /// Set the colour
    pub fn set_colour(&mut self, colour: ColourValue) {
        self.colour = colour;
    }

    /// Rotation in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Set the rotation in radians
    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    /// Whether the billboard overrides the set's default size
    pub fn has_own_dimensions(&self) -> bool {
        self.own_dimensions.is_some()
    }

    /// Own `(width, height)`, if set
    pub fn own_dimensions(&self) -> Option<(f32, f32)> {
        self.own_dimensions
    }

    /// Give the billboard its own size
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.own_dimensions = Some((width, height));
    }

    /// Go back to the set's default size
    pub fn reset_dimensions(&mut self) {
        self.own_dimensions = None;
    }

    /// Own dimensions, or the given defaults
    pub fn dimensions_or(&self, default_width: f32, default_height: f32) -> (f32, f32) {
        self.own_dimensions.unwrap_or((default_width, default_height))
    }

    /// Index into the set's texture coordinate table
    pub fn tex_coord_index(&self) -> u16 {
        self.tex_coord_index
    }

    /// Use entry `index` of the set's texture coordinate table
    pub fn set_tex_coord_index(&mut self, index: u16) {
        self.tex_coord_index = index;
        self.tex_coord_rect = None;
    }

    /// Explicit texture rect, if one overrides the table
    pub fn tex_coord_rect(&self) -> Option<FloatRect> {
        self.tex_coord_rect
    }

    /// Use an explicit texture rect instead of the set's table
    pub fn set_tex_coord_rect(&mut self, rect: FloatRect) {
        self.tex_coord_rect = Some(rect);
    }

    /// Texture rect to draw with, given the set's table
    ///
    /// An index past the end of the table falls back to the full texture.
    pub fn resolve_tex_coords(&self, table: &[FloatRect]) -> FloatRect {
        match self.tex_coord_rect {
            Some(rect) => rect,
            None => table
                .get(usize::from(self.tex_coord_index))
                .copied()
                .unwrap_or_default(),
        }
    }
}

/// Set-wide bookkeeping updated as billboards change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChangeFlags {
    /// No billboard has ever been given its own size
    pub all_default_size: bool,
    /// No billboard has ever been given a non-zero rotation
    pub all_default_rotation: bool,
    /// Geometry needs rebuilding even when auto-update is off
    pub data_changed: bool,
    /// Bounds were recomputed for the coming render and nothing moved since
    pub bounds_fresh: bool,
}

impl ChangeFlags {
    /// Geometry and bounds both need rebuilding
    pub fn mark_data_changed(&mut self) {
        self.data_changed = true;
        self.bounds_fresh = false;
    }
}

impl Default for ChangeFlags {
    fn default() -> Self {
        Self {
            all_default_size: true,
            all_default_rotation: true,
            data_changed: true,
            bounds_fresh: false,
        }
    }
}

/// Mutable access to a billboard owned by a set
#[derive(Debug)]
pub struct BillboardMut<'a> {
    billboard: &'a mut Billboard,
    flags: &'a mut ChangeFlags,
}

impl<'a> BillboardMut<'a> {
    pub(crate) fn new(billboard: &'a mut Billboard, flags: &'a mut ChangeFlags) -> Self {
        Self { billboard, flags }
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec3) {
        self.billboard.set_position(position);
        self.flags.mark_data_changed();
    }

    /// Set the direction used by the `*Self` billboard types
    pub fn set_direction(&mut self, direction: Vec3) {
        self.billboard.set_direction(direction);
        self.flags.mark_data_changed();
    }

    /// Set the colour
    pub fn set_colour(&mut self, colour: ColourValue) {
        self.billboard.set_colour(colour);
        self.flags.mark_data_changed();
    }

    /// Set the rotation in radians
    pub fn set_rotation(&mut self, radians: f32) {
        self.billboard.set_rotation(radians);
        if radians != 0.0 {
            self.flags.all_default_rotation = false;
        }
        self.flags.mark_data_changed();
    }

    /// Give the billboard its own size
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.billboard.set_dimensions(width, height);
        self.flags.all_default_size = false;
        self.flags.mark_data_changed();
    }

    /// Go back to the set's default size
    pub fn reset_dimensions(&mut self) {
        self.billboard.reset_dimensions();
        self.flags.mark_data_changed();
    }

    /// Use entry `index` of the set's texture coordinate table
    pub fn set_tex_coord_index(&mut self, index: u16) {
        self.billboard.set_tex_coord_index(index);
        self.flags.mark_data_changed();
    }

    /// Use an explicit texture rect instead of the set's table
    pub fn set_tex_coord_rect(&mut self, rect: FloatRect) {
        self.billboard.set_tex_coord_rect(rect);
        self.flags.mark_data_changed();
    }
}

impl Deref for BillboardMut<'_> {
    type Target = Billboard;

    fn deref(&self) -> &Billboard {
        self.billboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tex_coord_index_clears_rect() {
        let mut billboard = Billboard::default();
        billboard.set_tex_coord_rect(FloatRect::new(0.0, 0.0, 0.5, 0.5));
        assert!(billboard.tex_coord_rect().is_some());

        billboard.set_tex_coord_index(2);
        assert_eq!(billboard.tex_coord_rect(), None);
        assert_eq!(billboard.tex_coord_index(), 2);
    }

    #[test]
    fn test_resolve_tex_coords() {
        let table = [FloatRect::new(0.0, 0.0, 0.5, 1.0), FloatRect::new(0.5, 0.0, 1.0, 1.0)];
        let mut billboard = Billboard::default();

        billboard.set_tex_coord_index(1);
        assert_eq!(billboard.resolve_tex_coords(&table), table[1]);

        billboard.set_tex_coord_index(7);
        assert_eq!(billboard.resolve_tex_coords(&table), FloatRect::UNIT);

        let rect = FloatRect::new(0.25, 0.25, 0.75, 0.75);
        billboard.set_tex_coord_rect(rect);
        assert_eq!(billboard.resolve_tex_coords(&table), rect);
    }

    #[test]
    fn test_mut_accessor_updates_flags() {
        let mut billboard = Billboard::default();
        let mut flags = ChangeFlags { data_changed: false, ..ChangeFlags::default() };

        {
            let mut access = BillboardMut::new(&mut billboard, &mut flags);
            access.set_rotation(0.0);
        }
        assert!(flags.all_default_rotation);
        assert!(flags.data_changed);

        {
            let mut access = BillboardMut::new(&mut billboard, &mut flags);
            access.set_rotation(0.5);
            access.set_dimensions(4.0, 2.0);
            assert_eq!(access.dimensions_or(1.0, 1.0), (4.0, 2.0));
        }
        assert!(!flags.all_default_rotation);
        assert!(!flags.all_default_size);
    }
}
