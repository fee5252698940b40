//! Vertex generation for a single billboard
//!
//! Writes one [`PointVertex`] per billboard when point rendering, otherwise
//! four [`BillboardVertex`] corners in the order top-left, top-right,
//! bottom-left, bottom-right.

use super::record::Billboard;
use super::types::{BillboardRotationType, FloatRect};
use crate::foundation::math::{Rotation3, Unit, Vec3};
use crate::render::{BillboardVertex, PointVertex, RenderResult, VertexColourFormat, VertexWriter};

/// Index pattern of one quad, relative to its first vertex
pub const QUAD_INDICES: [u32; 6] = [0, 2, 1, 1, 2, 3];

/// Axis shorter than this is treated as degenerate
const AXIS_EPSILON: f32 = 1e-6;

/// Set-wide inputs to vertex generation
#[derive(Debug, Clone, Copy)]
pub struct EmitSettings<'a> {
    /// What a rotation angle rotates
    pub rotation_type: BillboardRotationType,
    /// No billboard in the set has ever been rotated
    pub all_default_rotation: bool,
    /// Texture coordinate table
    pub tex_coords: &'a [FloatRect],
    /// Packed colour channel order
    pub colour_format: VertexColourFormat,
}

/// Write the single vertex of a point-rendered billboard
pub fn emit_point(writer: &mut VertexWriter<'_>, billboard: &Billboard, colour_format: VertexColourFormat) -> RenderResult<()> {
    writer.write(&PointVertex {
        position: billboard.position().into(),
        colour: colour_format.pack(&billboard.colour()),
    })
}

/// Write the four corners of a quad billboard placed with `offsets`
pub fn emit_quad(
    writer: &mut VertexWriter<'_>,
    billboard: &Billboard,
    offsets: &[Vec3; 4],
    settings: &EmitSettings<'_>,
) -> RenderResult<()> {
    let colour = settings.colour_format.pack(&billboard.colour());
    let rect = billboard.resolve_tex_coords(settings.tex_coords);
    let angle = billboard.rotation();
    let position = billboard.position();

    let unrotated_uvs = [
        [rect.left, rect.top],
        [rect.right, rect.top],
        [rect.left, rect.bottom],
        [rect.right, rect.bottom],
    ];

    let (corners, uvs) = if settings.all_default_rotation || angle == 0.0 {
        (*offsets, unrotated_uvs)
    } else {
        match settings.rotation_type {
            BillboardRotationType::Vertex => (rotate_offsets(offsets, angle), unrotated_uvs),
            BillboardRotationType::TexCoord => (*offsets, rotate_tex_coords(&rect, angle)),
        }
    };

    let vertices: [BillboardVertex; 4] = std::array::from_fn(|corner| BillboardVertex {
        position: (corners[corner] + position).into(),
        colour,
        tex_coord: uvs[corner],
    });
    writer.write_all(&vertices)
}

/// Rotate corner offsets about the quad normal. A quad too thin to have a
/// normal is left unrotated.
fn rotate_offsets(offsets: &[Vec3; 4], angle: f32) -> [Vec3; 4] {
    let normal = (offsets[3] - offsets[0]).cross(&(offsets[2] - offsets[1]));
    match Unit::try_new(normal, AXIS_EPSILON) {
        Some(axis) => {
            let rotation = Rotation3::from_axis_angle(&axis, angle);
            offsets.map(|offset| rotation * offset)
        }
        None => *offsets,
    }
}

/// Texture coordinates of `rect` rotated by `angle` about its centre
fn rotate_tex_coords(rect: &FloatRect, angle: f32) -> [[f32; 2]; 4] {
    let half_width = rect.width() / 2.0;
    let half_height = rect.height() / 2.0;
    let mid_u = rect.left + half_width;
    let mid_v = rect.top + half_height;

    let (sin, cos) = angle.sin_cos();
    let cos_w = cos * half_width;
    let cos_h = cos * half_height;
    let sin_w = sin * half_width;
    let sin_h = sin * half_height;

    [
        [mid_u - cos_w + sin_h, mid_v - sin_w - cos_h],
        [mid_u + cos_w + sin_h, mid_v + sin_w - cos_h],
        [mid_u - cos_w - sin_h, mid_v - sin_w + cos_h],
        [mid_u + cos_w - sin_h, mid_v + sin_w + cos_h],
    ]
}
