//! Draw call description

use super::buffer::IndexType;
use super::vertex::VertexElement;

/// Primitive topology of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// One point per vertex
    PointList,
    /// Three indices (or vertices) per triangle
    TriangleList,
}

/// Everything a renderer needs to issue one draw from a renderable's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOperation {
    /// Primitive topology
    pub operation_type: OperationType,
    /// Layout of one vertex
    pub vertex_declaration: &'static [VertexElement],
    /// First vertex to draw
    pub vertex_start: usize,
    /// Number of vertices to draw
    pub vertex_count: usize,
    /// Whether the draw reads an index buffer
    pub use_indexes: bool,
    /// Index width, `None` for non-indexed draws
    pub index_type: Option<IndexType>,
    /// First index to read
    pub index_start: usize,
    /// Number of indices to read
    pub index_count: usize,
}

impl RenderOperation {
    /// Non-indexed point list
    pub const fn points(vertex_declaration: &'static [VertexElement], vertex_count: usize) -> Self {
        Self {
            operation_type: OperationType::PointList,
            vertex_declaration,
            vertex_start: 0,
            vertex_count,
            use_indexes: false,
            index_type: None,
            index_start: 0,
            index_count: 0,
        }
    }

    /// Indexed triangle list
    pub const fn indexed_triangles(
        vertex_declaration: &'static [VertexElement],
        vertex_count: usize,
        index_type: IndexType,
        index_count: usize,
    ) -> Self {
        Self {
            operation_type: OperationType::TriangleList,
            vertex_declaration,
            vertex_start: 0,
            vertex_count,
            use_indexes: true,
            index_type: Some(index_type),
            index_start: 0,
            index_count,
        }
    }

    /// Whether the draw would produce nothing
    pub const fn is_empty(&self) -> bool {
        if self.use_indexes {
            self.index_count == 0
        } else {
            self.vertex_count == 0
        }
    }

    /// Number of primitives the draw produces
    pub const fn primitive_count(&self) -> usize {
        match self.operation_type {
            OperationType::PointList => self.vertex_count,
            OperationType::TriangleList if self.use_indexes => self.index_count / 3,
            OperationType::TriangleList => self.vertex_count / 3,
        }
    }
}
