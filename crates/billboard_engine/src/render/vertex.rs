//! Vertex formats written by the billboard core
//!
//! Quads use [`BillboardVertex`] (position, packed colour, texcoord); point
//! rendering uses [`PointVertex`] (position, packed colour) because point
//! sprites generate their own texture coordinates. Both are `#[repr(C)]` and
//! [`Pod`], so they are copied straight into locked buffer memory.

use bytemuck::{Pod, Zeroable};

use super::{RenderError, RenderResult};

/// What a vertex element feeds in the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementSemantic {
    /// Object-space position
    Position,
    /// Packed diffuse colour
    Diffuse,
    /// Texture coordinates, set 0
    TextureCoordinates,
}

/// Storage type of a vertex element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementType {
    /// Two 32-bit floats
    Float2,
    /// Three 32-bit floats
    Float3,
    /// One packed 32-bit colour
    Colour,
}

impl VertexElementType {
    /// Size in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Colour => 4,
        }
    }
}

/// One attribute inside a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// Byte offset from the start of the vertex
    pub offset: usize,
    /// Storage type
    pub element_type: VertexElementType,
    /// Shader semantic
    pub semantic: VertexElementSemantic,
}

impl VertexElement {
    const fn new(offset: usize, element_type: VertexElementType, semantic: VertexElementSemantic) -> Self {
        Self { offset, element_type, semantic }
    }
}

/// Quad corner vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BillboardVertex {
    /// Position
    pub position: [f32; 3],
    /// Packed colour in the render system's channel order
    pub colour: u32,
    /// Texture coordinate
    pub tex_coord: [f32; 2],
}

impl BillboardVertex {
    /// Vertex declaration matching the struct layout
    pub const LAYOUT: [VertexElement; 3] = [
        VertexElement::new(0, VertexElementType::Float3, VertexElementSemantic::Position),
        VertexElement::new(12, VertexElementType::Colour, VertexElementSemantic::Diffuse),
        VertexElement::new(16, VertexElementType::Float2, VertexElementSemantic::TextureCoordinates),
    ];
}

/// Point-rendering vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    /// Position
    pub position: [f32; 3],
    /// Packed colour in the render system's channel order
    pub colour: u32,
}

impl PointVertex {
    /// Vertex declaration matching the struct layout
    pub const LAYOUT: [VertexElement; 2] = [
        VertexElement::new(0, VertexElementType::Float3, VertexElementSemantic::Position),
        VertexElement::new(12, VertexElementType::Colour, VertexElementSemantic::Diffuse),
    ];
}

const _: () = assert!(std::mem::size_of::<BillboardVertex>() == 24);
const _: () = assert!(std::mem::size_of::<PointVertex>() == 16);

/// Total size of a vertex declaration in bytes
pub fn declaration_size(layout: &[VertexElement]) -> usize {
    layout
        .iter()
        .map(|element| element.offset + element.element_type.size())
        .max()
        .unwrap_or(0)
}

/// Bounds-checked cursor writing vertices into locked buffer bytes
#[derive(Debug)]
pub struct VertexWriter<'a> {
    bytes: &'a mut [u8],
    cursor: usize,
}

impl<'a> VertexWriter<'a> {
    /// Start writing at the beginning of `bytes`
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Append one vertex
    ///
    /// # Errors
    ///
    /// Fails without writing when the vertex does not fit.
    pub fn write<V: Pod>(&mut self, vertex: &V) -> RenderResult<()> {
        self.write_all(std::slice::from_ref(vertex))
    }

    /// Append several vertices
    ///
    /// # Errors
    ///
    /// Fails without writing when the vertices do not all fit.
    pub fn write_all<V: Pod>(&mut self, vertices: &[V]) -> RenderResult<()> {
        let src: &[u8] = bytemuck::cast_slice(vertices);
        let end = self.cursor + src.len();
        let size = self.bytes.len();
        let dst = self
            .bytes
            .get_mut(self.cursor..end)
            .ok_or(RenderError::WriteOutOfRange {
                offset: self.cursor,
                length: src.len(),
                size,
            })?;
        dst.copy_from_slice(src);
        self.cursor = end;
        Ok(())
    }

    /// Bytes written so far
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }
}
