//! Hardware buffer contract and a system-memory implementation
//!
//! A renderer hands out vertex and index buffers through a
//! [`HardwareBufferManager`]. The billboard core only needs to lock a byte
//! range, write into it and unlock, so that is all [`HardwareBuffer`] asks for.
//! [`BufferLock`] scopes a lock and releases it when dropped, including on
//! early returns.
//!
//! [`SystemBufferManager`] keeps buffer contents in plain `Vec<u8>` storage and
//! is used for headless rendering and tests.

use std::fmt;
use std::ops::Range;

use bitflags::bitflags;

use super::colour::VertexColourFormat;
use super::{RenderError, RenderResult};

/// Usage hint supplied when a buffer is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Rewritten every frame; previous contents may be thrown away on lock
    DynamicWriteOnlyDiscardable,
    /// Written rarely, never read back by the CPU in normal use
    StaticWriteOnly,
}

impl BufferUsage {
    /// Whether this usage is one of the dynamic variants
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::DynamicWriteOnlyDiscardable)
    }

    /// Lock mode matching this usage: discard for dynamic buffers
    pub const fn preferred_lock_mode(self) -> LockMode {
        if self.is_dynamic() {
            LockMode::Discard
        } else {
            LockMode::Normal
        }
    }
}

/// How existing contents are treated when a buffer is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Existing contents of the locked range are undefined
    Discard,
    /// Existing contents are preserved
    Normal,
}

/// Width of the entries in an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Largest vertex index representable by 16-bit indices
    pub const MAX_U16_VERTEX: usize = u16::MAX as usize;

    /// Smallest index type that can address `vertex_count` vertices
    pub const fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= Self::MAX_U16_VERTEX {
            Self::U16
        } else {
            Self::U32
        }
    }

    /// Size of one index in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

bitflags! {
    /// Optional render system features the billboard core checks for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Point sprites: textured, screen-aligned quads from single points
        const POINT_SPRITES = 1 << 0;
    }
}

/// Lockable region of renderer-owned memory
pub trait HardwareBuffer: Send + fmt::Debug {
    /// Total size in bytes
    fn size_in_bytes(&self) -> usize;

    /// Size of one element (vertex or index) in bytes
    fn element_size(&self) -> usize;

    /// Number of elements the buffer was created for
    fn element_count(&self) -> usize;

    /// Usage hint the buffer was created with
    fn usage(&self) -> BufferUsage;

    /// Whether a lock is currently held
    fn is_locked(&self) -> bool;

    /// Lock `length` bytes starting at `offset` for writing
    ///
    /// # Errors
    ///
    /// Fails when the buffer is already locked or the range does not fit.
    fn lock(&mut self, offset: usize, length: usize, mode: LockMode) -> RenderResult<()>;

    /// Bytes of the currently locked range, `None` when not locked
    fn locked_mut(&mut self) -> Option<&mut [u8]>;

    /// Release the current lock; unlocking an unlocked buffer does nothing
    fn unlock(&mut self);

    /// Copy `dest.len()` bytes starting at `offset` out of the buffer
    ///
    /// # Errors
    ///
    /// Fails when the range does not fit in the buffer.
    fn read_data(&self, offset: usize, dest: &mut [u8]) -> RenderResult<()>;
}

/// Scoped lock over a [`HardwareBuffer`]; unlocks on drop
#[derive(Debug)]
pub struct BufferLock<'a> {
    buffer: &'a mut dyn HardwareBuffer,
}

impl<'a> BufferLock<'a> {
    /// Lock `length` bytes from `offset`
    ///
    /// # Errors
    ///
    /// Propagates the buffer's lock error.
    pub fn new(
        buffer: &'a mut dyn HardwareBuffer,
        offset: usize,
        length: usize,
        mode: LockMode,
    ) -> RenderResult<Self> {
        buffer.lock(offset, length, mode)?;
        Ok(Self { buffer })
    }

    /// Lock the whole buffer
    ///
    /// # Errors
    ///
    /// Propagates the buffer's lock error.
    pub fn whole(buffer: &'a mut dyn HardwareBuffer, mode: LockMode) -> RenderResult<Self> {
        let size = buffer.size_in_bytes();
        Self::new(buffer, 0, size, mode)
    }

    /// Locked bytes
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.locked_mut().unwrap_or_default()
    }

    /// Size of the locked range in bytes
    pub fn len(&mut self) -> usize {
        self.bytes_mut().len()
    }

    /// Whether the locked range is empty
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}

impl Drop for BufferLock<'_> {
    fn drop(&mut self) {
        self.buffer.unlock();
    }
}

/// Creates hardware buffers and reports render system capabilities
pub trait HardwareBufferManager: Send + Sync + fmt::Debug {
    /// Create a vertex buffer holding `vertex_count` vertices of `vertex_size` bytes
    ///
    /// # Errors
    ///
    /// Fails when the renderer cannot allocate the buffer.
    fn create_vertex_buffer(
        &self,
        vertex_size: usize,
        vertex_count: usize,
        usage: BufferUsage,
    ) -> RenderResult<Box<dyn HardwareBuffer>>;

    /// Create an index buffer holding `index_count` indices
    ///
    /// # Errors
    ///
    /// Fails when the renderer cannot allocate the buffer.
    fn create_index_buffer(
        &self,
        index_type: IndexType,
        index_count: usize,
        usage: BufferUsage,
    ) -> RenderResult<Box<dyn HardwareBuffer>>;

    /// Optional features supported by the render system
    fn capabilities(&self) -> Capabilities;

    /// Channel order expected for packed vertex colours
    fn vertex_colour_format(&self) -> VertexColourFormat {
        VertexColourFormat::default()
    }
}

/// Buffer backed by system memory
#[derive(Debug, Clone)]
pub struct SystemMemoryBuffer {
    data: Vec<u8>,
    element_size: usize,
    element_count: usize,
    usage: BufferUsage,
    locked: Option<Range<usize>>,
}

impl SystemMemoryBuffer {
    /// Create a zero-filled buffer of `element_count` elements
    ///
    /// # Errors
    ///
    /// Fails when the total size overflows `usize`.
    pub fn new(element_size: usize, element_count: usize, usage: BufferUsage) -> RenderResult<Self> {
        let size = element_size.checked_mul(element_count).ok_or_else(|| {
            RenderError::ResourceCreationFailed(format!(
                "buffer of {element_count} elements of {element_size} bytes overflows"
            ))
        })?;
        Ok(Self {
            data: vec![0; size],
            element_size,
            element_count,
            usage,
            locked: None,
        })
    }

    /// Entire contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn checked_range(&self, offset: usize, length: usize) -> Option<Range<usize>> {
        let end = offset.checked_add(length)?;
        (end <= self.data.len()).then_some(offset..end)
    }
}

impl HardwareBuffer for SystemMemoryBuffer {
    fn size_in_bytes(&self) -> usize {
        self.data.len()
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn element_count(&self) -> usize {
        self.element_count
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    fn lock(&mut self, offset: usize, length: usize, mode: LockMode) -> RenderResult<()> {
        if self.locked.is_some() {
            return Err(RenderError::BufferAlreadyLocked);
        }
        let range = self
            .checked_range(offset, length)
            .ok_or(RenderError::LockOutOfRange {
                offset,
                length,
                size: self.data.len(),
            })?;
        if mode == LockMode::Discard {
            self.data[range.clone()].fill(0);
        }
        self.locked = Some(range);
        Ok(())
    }

    fn locked_mut(&mut self) -> Option<&mut [u8]> {
        let range = self.locked.clone()?;
        Some(&mut self.data[range])
    }

    fn unlock(&mut self) {
        self.locked = None;
    }

    fn read_data(&self, offset: usize, dest: &mut [u8]) -> RenderResult<()> {
        let range = self
            .checked_range(offset, dest.len())
            .ok_or(RenderError::ReadOutOfRange {
                offset,
                length: dest.len(),
                size: self.data.len(),
            })?;
        dest.copy_from_slice(&self.data[range]);
        Ok(())
    }
}

/// [`HardwareBufferManager`] producing [`SystemMemoryBuffer`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBufferManager {
    capabilities: Capabilities,
    colour_format: VertexColourFormat,
}

impl SystemBufferManager {
    /// Manager reporting no optional capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager reporting the given capabilities
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Change the packed vertex colour order
    #[must_use]
    pub fn with_colour_format(mut self, colour_format: VertexColourFormat) -> Self {
        self.colour_format = colour_format;
        self
    }
}

impl HardwareBufferManager for SystemBufferManager {
    fn create_vertex_buffer(
        &self,
        vertex_size: usize,
        vertex_count: usize,
        usage: BufferUsage,
    ) -> RenderResult<Box<dyn HardwareBuffer>> {
        log::trace!("Creating system vertex buffer: {} x {} bytes", vertex_count, vertex_size);
        Ok(Box::new(SystemMemoryBuffer::new(vertex_size, vertex_count, usage)?))
    }

    fn create_index_buffer(
        &self,
        index_type: IndexType,
        index_count: usize,
        usage: BufferUsage,
    ) -> RenderResult<Box<dyn HardwareBuffer>> {
        log::trace!("Creating system index buffer: {} x {:?}", index_count, index_type);
        Ok(Box::new(SystemMemoryBuffer::new(index_type.size(), index_count, usage)?))
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn vertex_colour_format(&self) -> VertexColourFormat {
        self.colour_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(size: usize) -> SystemMemoryBuffer {
        SystemMemoryBuffer::new(1, size, BufferUsage::DynamicWriteOnlyDiscardable).unwrap()
    }

    #[test]
    fn test_lock_write_unlock_read() {
        let mut buf = buffer(8);
        {
            let mut lock = BufferLock::new(&mut buf, 2, 4, LockMode::Normal).unwrap();
            assert_eq!(lock.len(), 4);
            lock.bytes_mut().copy_from_slice(&[1, 2, 3, 4]);
        }
        assert!(!buf.is_locked());

        let mut out = [0u8; 8];
        buf.read_data(0, &mut out).unwrap();
        assert_eq!(out, [0, 0, 1, 2, 3, 4, 0, 0]);
    }

    #[test]
    fn test_double_lock_is_an_error() {
        let mut buf = buffer(4);
        buf.lock(0, 4, LockMode::Normal).unwrap();

        assert_eq!(buf.lock(0, 1, LockMode::Normal), Err(RenderError::BufferAlreadyLocked));
        buf.unlock();
        assert!(buf.lock(0, 1, LockMode::Normal).is_ok());
    }

    #[test]
    fn test_out_of_range_lock_and_read() {
        let mut buf = buffer(4);

        assert_eq!(
            buf.lock(2, 3, LockMode::Normal),
            Err(RenderError::LockOutOfRange { offset: 2, length: 3, size: 4 })
        );
        assert!(!buf.is_locked());

        let mut out = [0u8; 2];
        assert!(buf.read_data(3, &mut out).is_err());
    }

    #[test]
    fn test_lock_released_on_early_return() {
        fn fails(buf: &mut dyn HardwareBuffer) -> RenderResult<()> {
            let _lock = BufferLock::whole(buf, LockMode::Discard)?;
            Err(RenderError::ResourceCreationFailed("bail".into()))
        }

        let mut buf = buffer(4);
        assert!(fails(&mut buf).is_err());
        assert!(!buf.is_locked());
    }

    #[test]
    fn test_index_type_selection() {
        assert_eq!(IndexType::for_vertex_count(4), IndexType::U16);
        assert_eq!(IndexType::for_vertex_count(65_535), IndexType::U16);
        assert_eq!(IndexType::for_vertex_count(65_536), IndexType::U32);
        assert_eq!(IndexType::U32.size(), 4);
    }

    #[test]
    fn test_manager_reports_capabilities() {
        let manager = SystemBufferManager::with_capabilities(Capabilities::POINT_SPRITES);
        assert!(manager.capabilities().contains(Capabilities::POINT_SPRITES));
        assert!(SystemBufferManager::new().capabilities().is_empty());

        let vb = manager.create_vertex_buffer(24, 10, BufferUsage::StaticWriteOnly).unwrap();
        assert_eq!(vb.size_in_bytes(), 240);
        assert_eq!(vb.usage(), BufferUsage::StaticWriteOnly);
    }
}
