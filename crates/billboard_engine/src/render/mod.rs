//! Rendering-side contracts used by the billboard core
//!
//! Nothing in here talks to a graphics API. The types describe what the
//! billboard engine needs from one:
//!
//! - [`buffer`]: hardware buffers that can be locked for CPU writes, plus a
//!   system-memory implementation
//! - [`vertex`]: exact vertex layouts written into those buffers
//! - [`colour`]: colour values and their packed 32-bit forms
//! - [`render_operation`]: the draw description handed to a renderer
//! - [`material`]: material lookup with default fallback

pub mod buffer;
pub mod colour;
pub mod material;
pub mod render_operation;
pub mod vertex;

pub use buffer::{
    BufferLock, BufferUsage, Capabilities, HardwareBuffer, HardwareBufferManager, IndexType,
    LockMode, SystemBufferManager, SystemMemoryBuffer,
};
pub use colour::{ColourValue, VertexColourFormat};
pub use material::{BlendMode, Material, MaterialId, MaterialLibrary};
pub use render_operation::{OperationType, RenderOperation};
pub use vertex::{
    BillboardVertex, PointVertex, VertexElement, VertexElementSemantic, VertexElementType,
    VertexWriter,
};

use thiserror::Error;

/// Rendering-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A buffer was locked while a previous lock was still held
    #[error("Buffer is already locked")]
    BufferAlreadyLocked,

    /// A lock request fell outside the buffer
    #[error("Lock range {offset}..{end} exceeds buffer size {size}", end = offset + length)]
    LockOutOfRange {
        /// Requested start offset in bytes
        offset: usize,
        /// Requested length in bytes
        length: usize,
        /// Buffer size in bytes
        size: usize,
    },

    /// A read request fell outside the buffer
    #[error("Read range {offset}..{end} exceeds buffer size {size}", end = offset + length)]
    ReadOutOfRange {
        /// Requested start offset in bytes
        offset: usize,
        /// Requested length in bytes
        length: usize,
        /// Buffer size in bytes
        size: usize,
    },

    /// A vertex write ran past the end of the locked range
    #[error("Write of {length} bytes at {offset} exceeds locked range of {size} bytes")]
    WriteOutOfRange {
        /// Cursor position in bytes
        offset: usize,
        /// Size of the rejected write in bytes
        length: usize,
        /// Locked range size in bytes
        size: usize,
    },

    /// Resource creation or management failed
    ///
    /// Occurs when GPU resources cannot be created, typically due to memory
    /// constraints or invalid sizes.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
