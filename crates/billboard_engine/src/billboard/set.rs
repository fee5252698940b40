//! # Billboard Sets
//!
//! A [`BillboardSet`] owns a pool of billboards that share one material,
//! one orientation mode and one pair of vertex/index buffers, and renders
//! them as a single draw.
//!
//! ## Frame flow
//!
//! ```text
//! notify_current_camera ──► update_render_queue
//!                               │
//!                               ├── sort (optional, farthest first)
//!                               ├── begin_billboards  (shared axes, lock)
//!                               ├── inject × N        (write vertices)
//!                               ├── end               (unlock)
//!                               └── RenderQueue::add_renderable
//! ```
//!
//! Sets created with external data skip the pool entirely: the caller drives
//! [`BillboardSet::begin_billboards`] with its own billboards and supplies
//! bounds through [`BillboardSet::set_bounds`].

use std::sync::Arc;

use super::bounds::BoundsTracker;
use super::emitter::{emit_point, emit_quad, EmitSettings, QUAD_INDICES};
use super::offsets::ParametricOffsets;
use super::orientation::{BillboardAxes, CameraFrame, OrientationSettings};
use super::pool::BillboardPool;
use super::record::{Billboard, BillboardHandle, BillboardMut, ChangeFlags};
use super::sorting::{sort_mode, VisibilitySorter};
use super::types::{BillboardOrigin, BillboardRotationType, BillboardType, FloatRect, SortMode};
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::{
    BillboardVertex, BufferLock, BufferUsage, Capabilities, ColourValue, HardwareBuffer,
    HardwareBufferManager, IndexType, LockMode, MaterialId, MaterialLibrary, PointVertex,
    RenderError, RenderOperation, RenderResult, VertexColourFormat, VertexWriter,
};
use crate::scene::node::{convert_world_to_local_orientation, convert_world_to_local_position};
use crate::scene::render_queue::{groups, DEFAULT_PRIORITY};
use crate::scene::{Camera, Frustum, Light, RenderQueue, Renderable, Sphere, AABB};

/// Pool size used when none is given
pub const DEFAULT_POOL_SIZE: usize = 20;

/// Default billboard width and height
pub const DEFAULT_DIMENSION: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
struct SetSettings {
    origin: BillboardOrigin,
    rotation_type: BillboardRotationType,
    orientation: OrientationSettings,
    default_width: f32,
    default_height: f32,
    world_space: bool,
    cull_individually: bool,
    sorting_enabled: bool,
    point_rendering: bool,
    auto_update: bool,
    auto_extend: bool,
    tex_coords: Vec<FloatRect>,
}

impl Default for SetSettings {
    fn default() -> Self {
        Self {
            origin: BillboardOrigin::Center,
            rotation_type: BillboardRotationType::TexCoord,
            orientation: OrientationSettings {
                billboard_type: BillboardType::Point,
                accurate_facing: false,
                common_direction: Vec3::z(),
                common_up: Vec3::y(),
            },
            default_width: DEFAULT_DIMENSION,
            default_height: DEFAULT_DIMENSION,
            world_space: false,
            cull_individually: false,
            sorting_enabled: false,
            point_rendering: false,
            auto_update: true,
            auto_extend: true,
            tex_coords: vec![FloatRect::UNIT],
        }
    }
}

/// Per-frame state derived from the camera
#[derive(Debug, Clone)]
struct FrameState {
    camera: CameraFrame,
    view_frustum: Option<Frustum>,
    parametric: ParametricOffsets,
    shared_axes: BillboardAxes,
    shared_offsets: [Vec3; 4],
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            camera: CameraFrame::default(),
            view_frustum: None,
            parametric: ParametricOffsets::for_origin(BillboardOrigin::Center),
            shared_axes: BillboardAxes { x: Vec3::x(), y: Vec3::y() },
            shared_offsets: [Vec3::zeros(); 4],
        }
    }
}

#[derive(Debug)]
struct IndexBuffer {
    buffer: Box<dyn HardwareBuffer>,
    index_type: IndexType,
}

#[derive(Debug)]
struct GeometryBuffers {
    vertex: Box<dyn HardwareBuffer>,
    index: Option<IndexBuffer>,
}

/// A pool of billboards rendered together
#[derive(Debug)]
pub struct BillboardSet {
    name: String,
    buffer_manager: Arc<dyn HardwareBufferManager>,
    pool: BillboardPool,
    pool_size: usize,
    external_data: bool,
    settings: SetSettings,
    flags: ChangeFlags,
    frame: FrameState,
    buffers: Option<GeometryBuffers>,
    visible_count: usize,
    bounds: BoundsTracker,
    parent: Option<Transform>,
    sorter: VisibilitySorter,
    material: MaterialId,
    material_transparent: bool,
    render_queue_group: u8,
    render_queue_priority: u16,
    lights: Vec<Light>,
    point_sprite_warning_logged: bool,
}

impl BillboardSet {
    /// Create a set with room for `pool_size` billboards
    ///
    /// With `external_data` the set keeps no billboards of its own; its pool
    /// size only sizes the buffers.
    pub fn new(
        name: impl Into<String>,
        pool_size: usize,
        external_data: bool,
        buffer_manager: Arc<dyn HardwareBufferManager>,
    ) -> Self {
        let mut set = Self {
            name: name.into(),
            buffer_manager,
            pool: BillboardPool::default(),
            pool_size: 0,
            external_data,
            settings: SetSettings::default(),
            flags: ChangeFlags::default(),
            frame: FrameState::default(),
            buffers: None,
            visible_count: 0,
            bounds: BoundsTracker::default(),
            parent: None,
            sorter: VisibilitySorter::new(),
            material: MaterialId::default(),
            material_transparent: false,
            render_queue_group: groups::MAIN,
            render_queue_priority: DEFAULT_PRIORITY,
            lights: Vec::new(),
            point_sprite_warning_logged: false,
        };
        set.set_pool_size(pool_size);
        set
    }

    /// Set name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether billboards are supplied by the caller each frame
    pub fn is_external_data(&self) -> bool {
        self.external_data
    }

    // ----------------------------------------------------------------------
    // Pool management
    // ----------------------------------------------------------------------

    /// Create a white billboard at `position`
    ///
    /// Returns `None` when the pool is exhausted and auto-extend is off, or
    /// when the set uses external data.
    pub fn create_billboard(&mut self, position: Vec3) -> Option<BillboardHandle> {
        self.create_billboard_with_colour(position, ColourValue::WHITE)
    }

    /// Create a billboard at `position` with `colour`
    pub fn create_billboard_with_colour(&mut self, position: Vec3, colour: ColourValue) -> Option<BillboardHandle> {
        if self.external_data {
            log::warn!("Billboard set {} uses external data and cannot create billboards", self.name);
            return None;
        }
        if self.pool.free_count() == 0 {
            if !self.settings.auto_extend {
                return None;
            }
            self.set_pool_size((self.pool_size * 2).max(1));
        }

        let handle = self.pool.acquire(position, colour)?;
        let pad = self.settings.default_width.max(self.settings.default_height);
        self.bounds.merge_billboard(position, pad);
        self.flags.mark_data_changed();
        Some(handle)
    }

    /// Number of active billboards
    pub fn billboard_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Number of free records
    pub fn free_count(&self) -> usize {
        self.pool.free_count()
    }

    /// Number of billboards the set has room for
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Grow the pool to `size` billboards; smaller sizes are ignored
    ///
    /// Growing discards the current buffers, which are recreated at the new
    /// size on the next render.
    pub fn set_pool_size(&mut self, size: usize) {
        if size <= self.pool_size {
            return;
        }
        if !self.external_data {
            self.pool.grow_to(size);
        }
        log::debug!("Billboard set {} pool size {} -> {}", self.name, self.pool_size, size);
        self.pool_size = size;
        self.destroy_buffers();
    }

    /// Whether the pool doubles when a create finds it full
    pub fn auto_extend(&self) -> bool {
        self.settings.auto_extend
    }

    /// Enable or disable pool doubling on exhaustion
    pub fn set_auto_extend(&mut self, auto_extend: bool) {
        self.settings.auto_extend = auto_extend;
    }

    /// Move every active billboard to the free list
    pub fn clear(&mut self) {
        self.pool.release_all();
        self.flags.mark_data_changed();
    }

    /// Remove the `index`th active billboard
    ///
    /// `index` must be below [`billboard_count`](Self::billboard_count).
    pub fn remove_billboard(&mut self, index: usize) -> bool {
        debug_assert!(
            index < self.pool.active_count(),
            "billboard index {index} out of bounds ({} active)",
            self.pool.active_count()
        );
        let removed = self.pool.release_nth(index);
        if removed {
            self.flags.mark_data_changed();
        }
        removed
    }

    /// Remove the billboard `handle` refers to; stale handles are ignored
    pub fn remove(&mut self, handle: BillboardHandle) -> bool {
        let removed = self.pool.release(handle);
        if removed {
            self.flags.mark_data_changed();
        }
        removed
    }

    /// The `index`th active billboard
    ///
    /// `index` must be below [`billboard_count`](Self::billboard_count).
    pub fn billboard(&self, index: usize) -> Option<&Billboard> {
        debug_assert!(index < self.pool.active_count(), "billboard index {index} out of bounds");
        self.pool.nth_index(index).map(|slot| self.pool.slot(slot))
    }

    /// Mutable access to the `index`th active billboard
    pub fn billboard_mut(&mut self, index: usize) -> Option<BillboardMut<'_>> {
        debug_assert!(index < self.pool.active_count(), "billboard index {index} out of bounds");
        let slot = self.pool.nth_index(index)?;
        Some(BillboardMut::new(self.pool.slot_mut(slot), &mut self.flags))
    }

    /// Handle of the `index`th active billboard
    pub fn handle(&self, index: usize) -> Option<BillboardHandle> {
        self.pool.nth_handle(index)
    }

    /// Whether `handle` refers to an active billboard of this set
    pub fn contains(&self, handle: BillboardHandle) -> bool {
        self.pool.contains(handle)
    }

    /// Billboard `handle` refers to
    pub fn get(&self, handle: BillboardHandle) -> Option<&Billboard> {
        self.pool.get(handle)
    }

    /// Mutable access to the billboard `handle` refers to
    pub fn get_mut(&mut self, handle: BillboardHandle) -> Option<BillboardMut<'_>> {
        let billboard = self.pool.get_mut(handle)?;
        Some(BillboardMut::new(billboard, &mut self.flags))
    }

    /// Active billboards in render order
    pub fn billboards(&self) -> impl ExactSizeIterator<Item = &Billboard> + '_ {
        self.pool.iter()
    }

    // ----------------------------------------------------------------------
    // Appearance
    // ----------------------------------------------------------------------

    /// Point of each billboard placed at its position
    pub fn origin(&self) -> BillboardOrigin {
        self.settings.origin
    }

    /// Set the origin point
    pub fn set_origin(&mut self, origin: BillboardOrigin) {
        self.settings.origin = origin;
        self.flags.mark_data_changed();
    }

    /// What billboard rotation rotates
    pub fn rotation_type(&self) -> BillboardRotationType {
        self.settings.rotation_type
    }

    /// Set what billboard rotation rotates
    pub fn set_rotation_type(&mut self, rotation_type: BillboardRotationType) {
        self.settings.rotation_type = rotation_type;
        self.flags.mark_data_changed();
    }

    /// Size of billboards without their own dimensions
    pub fn default_dimensions(&self) -> (f32, f32) {
        (self.settings.default_width, self.settings.default_height)
    }

    /// Set the size of billboards without their own dimensions
    pub fn set_default_dimensions(&mut self, width: f32, height: f32) {
        self.settings.default_width = width;
        self.settings.default_height = height;
        self.flags.mark_data_changed();
    }

    /// Default billboard width
    pub fn default_width(&self) -> f32 {
        self.settings.default_width
    }

    /// Set the default billboard width
    pub fn set_default_width(&mut self, width: f32) {
        self.set_default_dimensions(width, self.settings.default_height);
    }

    /// Default billboard height
    pub fn default_height(&self) -> f32 {
        self.settings.default_height
    }

    /// Set the default billboard height
    pub fn set_default_height(&mut self, height: f32) {
        self.set_default_dimensions(self.settings.default_width, height);
    }

    /// Orientation mode
    pub fn billboard_type(&self) -> BillboardType {
        self.settings.orientation.billboard_type
    }

    /// Set the orientation mode
    pub fn set_billboard_type(&mut self, billboard_type: BillboardType) {
        self.settings.orientation.billboard_type = billboard_type;
        self.flags.mark_data_changed();
    }

    /// Direction shared by the `*Common` types
    pub fn common_direction(&self) -> Vec3 {
        self.settings.orientation.common_direction
    }

    /// Set the direction shared by the `*Common` types; should be unit length
    pub fn set_common_direction(&mut self, direction: Vec3) {
        self.settings.orientation.common_direction = direction;
        self.flags.mark_data_changed();
    }

    /// Up vector shared by the `Perpendicular*` types
    pub fn common_up_vector(&self) -> Vec3 {
        self.settings.orientation.common_up
    }

    /// Set the up vector shared by the `Perpendicular*` types; should be unit
    /// length
    pub fn set_common_up_vector(&mut self, up: Vec3) {
        self.settings.orientation.common_up = up;
        self.flags.mark_data_changed();
    }

    /// Whether billboard positions are in world space rather than node space
    pub fn billboards_in_world_space(&self) -> bool {
        self.settings.world_space
    }

    /// Choose between world-space and node-space billboard positions
    pub fn set_billboards_in_world_space(&mut self, world_space: bool) {
        self.settings.world_space = world_space;
        self.flags.mark_data_changed();
    }

    /// Whether billboards face the camera position instead of the view plane
    pub fn use_accurate_facing(&self) -> bool {
        self.settings.orientation.accurate_facing
    }

    /// Enable or disable accurate facing
    pub fn set_use_accurate_facing(&mut self, accurate: bool) {
        self.settings.orientation.accurate_facing = accurate;
        self.flags.mark_data_changed();
    }

    /// Whether each billboard is culled against the view frustum
    pub fn cull_individually(&self) -> bool {
        self.settings.cull_individually
    }

    /// Enable or disable per-billboard frustum culling
    pub fn set_cull_individually(&mut self, cull: bool) {
        self.settings.cull_individually = cull;
    }

    /// Whether billboards are sorted farthest first before rendering
    pub fn sorting_enabled(&self) -> bool {
        self.settings.sorting_enabled
    }

    /// Enable or disable sorting
    pub fn set_sorting_enabled(&mut self, enabled: bool) {
        self.settings.sorting_enabled = enabled;
    }

    /// Key the sorter uses for the current settings
    pub fn sort_mode(&self) -> SortMode {
        sort_mode(self.settings.orientation.billboard_type, self.settings.orientation.accurate_facing)
    }

    /// Whether billboards are drawn as point sprites
    pub fn point_rendering_enabled(&self) -> bool {
        self.settings.point_rendering
    }

    /// Request point-sprite rendering. Without render system support the
    /// request is ignored with a warning. Returns the effective setting.
    pub fn set_point_rendering_enabled(&mut self, enabled: bool) -> bool {
        let supported = self.buffer_manager.capabilities().contains(Capabilities::POINT_SPRITES);
        let enabled = if enabled && !supported {
            if !self.point_sprite_warning_logged {
                log::warn!(
                    "Point sprites are not supported by the render system, billboard set {} keeps quad rendering",
                    self.name
                );
                self.point_sprite_warning_logged = true;
            }
            false
        } else {
            enabled
        };

        if enabled != self.settings.point_rendering {
            self.settings.point_rendering = enabled;
            self.destroy_buffers();
        }
        enabled
    }

    /// Whether geometry is rebuilt every frame
    pub fn auto_update(&self) -> bool {
        self.settings.auto_update
    }

    /// Rebuild geometry every frame, or only after
    /// [`notify_billboard_data_changed`](Self::notify_billboard_data_changed)
    pub fn set_auto_update(&mut self, auto_update: bool) {
        if auto_update != self.settings.auto_update {
            self.settings.auto_update = auto_update;
            // Buffer usage differs between the two modes
            self.destroy_buffers();
        }
    }

    /// Mark geometry stale so the next render rebuilds it
    pub fn notify_billboard_data_changed(&mut self) {
        self.flags.mark_data_changed();
    }

    /// Record that an externally supplied billboard has its own size
    pub fn notify_billboard_resized(&mut self) {
        self.flags.all_default_size = false;
    }

    /// Record that an externally supplied billboard is rotated
    pub fn notify_billboard_rotated(&mut self) {
        self.flags.all_default_rotation = false;
    }

    /// Replace the texture coordinate table; an empty table resets to the
    /// full texture
    pub fn set_texture_coords(&mut self, coords: &[FloatRect]) {
        if coords.is_empty() {
            self.set_texture_stacks_and_slices(1, 1);
            return;
        }
        self.settings.tex_coords = coords.to_vec();
        self.flags.mark_data_changed();
    }

    /// Fill the texture coordinate table with a `stacks` x `slices` grid,
    /// row by row; zero counts are treated as one
    pub fn set_texture_stacks_and_slices(&mut self, stacks: u8, slices: u8) {
        let stacks = f32::from(stacks.max(1));
        let slices = f32::from(slices.max(1));

        let mut coords = Vec::new();
        let mut v = 0.0;
        while v < stacks {
            let mut u = 0.0;
            while u < slices {
                coords.push(FloatRect::new(u / slices, v / stacks, (u + 1.0) / slices, (v + 1.0) / stacks));
                u += 1.0;
            }
            v += 1.0;
        }
        self.settings.tex_coords = coords;
        self.flags.mark_data_changed();
    }

    /// Texture coordinate table
    pub fn texture_coords(&self) -> &[FloatRect] {
        &self.settings.tex_coords
    }

    // ----------------------------------------------------------------------
    // Scene integration
    // ----------------------------------------------------------------------

    /// Material drawn with
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Use material `id` from `library`
    pub fn set_material(&mut self, library: &MaterialLibrary, id: MaterialId) {
        self.material = id;
        self.material_transparent = library.get(id).blend_mode.is_transparent();
    }

    /// Use the material called `name`, or the library default when it does
    /// not exist
    pub fn set_material_name(&mut self, library: &MaterialLibrary, name: &str) {
        let id = library.resolve(name);
        self.set_material(library, id);
    }

    /// Render queue group the set registers in
    pub fn render_queue_group(&self) -> u8 {
        self.render_queue_group
    }

    /// Set the render queue group
    pub fn set_render_queue_group(&mut self, group: u8) {
        self.render_queue_group = group;
    }

    /// Priority within the render queue group
    pub fn render_queue_priority(&self) -> u16 {
        self.render_queue_priority
    }

    /// Set the group and priority together
    pub fn set_render_queue_group_and_priority(&mut self, group: u8, priority: u16) {
        self.render_queue_group = group;
        self.render_queue_priority = priority;
    }

    /// Replace the lights passed to the renderer
    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights = lights;
    }

    /// Derived transform of the node the set is attached to
    pub fn parent_transform(&self) -> Option<&Transform> {
        self.parent.as_ref()
    }

    /// Attach to (or detach from) a node with the given derived transform
    pub fn set_parent_transform(&mut self, parent: Option<Transform>) {
        if self.settings.world_space && parent != self.parent {
            self.flags.bounds_fresh = false;
        }
        self.parent = parent;
    }

    /// Cache the camera for the coming frame, converted into the set's space
    pub fn notify_current_camera(&mut self, camera: &Camera) {
        let mut orientation = camera.derived_orientation();
        let mut position = camera.derived_position();

        if !self.settings.world_space {
            if let Some(parent) = &self.parent {
                orientation = convert_world_to_local_orientation(parent, &orientation);
                position = convert_world_to_local_position(parent, position);
            }
        }

        self.frame.camera = CameraFrame::new(orientation, position);
        self.frame.view_frustum = Some(camera.frustum());
    }

    /// Sort active billboards farthest first for the cached camera
    pub fn sort_billboards(&mut self) {
        let mode = self.sort_mode();
        self.sorter.sort(&mut self.pool, mode, &self.frame.camera);
    }

    // ----------------------------------------------------------------------
    // Bounds
    // ----------------------------------------------------------------------

    /// Bounding box in the set's local space
    pub fn bounding_box(&self) -> &AABB {
        self.bounds.aabb()
    }

    /// Bounding radius about the local origin
    pub fn bounding_radius(&self) -> f32 {
        self.bounds.radius()
    }

    /// Recompute bounds from the active billboards
    pub fn update_bounds(&mut self) {
        let to_local = if self.settings.world_space {
            self.parent.as_ref().map(Transform::inverse)
        } else {
            None
        };
        let pad = self.settings.default_width.max(self.settings.default_height);
        self.bounds
            .recompute(self.pool.iter().map(Billboard::position), to_local.as_ref(), pad);
    }

    /// Whether the next render rebuilds geometry
    ///
    /// True for sets owning their billboards when auto-update is on, data
    /// changed or buffers were discarded.
    pub fn needs_update(&self) -> bool {
        !self.external_data
            && (self.settings.auto_update || self.flags.data_changed || self.buffers.is_none())
    }

    /// Recompute bounds if the coming render rebuilds geometry
    ///
    /// The result holds until [`update_render_queue`](Self::update_render_queue)
    /// consumes it, so culling ahead of the render does not pay twice.
    pub fn refresh_bounds(&mut self) {
        if self.needs_update() && !self.flags.bounds_fresh {
            self.update_bounds();
            self.flags.bounds_fresh = true;
        }
    }

    /// Override the bounds, for sets fed with external data
    pub fn set_bounds(&mut self, aabb: AABB, radius: f32) {
        self.bounds.set(aabb, radius);
    }

    // ----------------------------------------------------------------------
    // Geometry
    // ----------------------------------------------------------------------

    /// Billboards written by the last batch
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Vertex buffer, once created
    pub fn vertex_buffer(&self) -> Option<&dyn HardwareBuffer> {
        self.buffers.as_ref().map(|buffers| buffers.vertex.as_ref())
    }

    /// Index buffer, once created; point rendering has none
    pub fn index_buffer(&self) -> Option<&dyn HardwareBuffer> {
        self.buffers
            .as_ref()
            .and_then(|buffers| buffers.index.as_ref())
            .map(|index| index.buffer.as_ref())
    }

    /// Start writing up to `expected` billboards (zero for "as many as fit")
    ///
    /// Creates buffers if needed, computes per-frame axes and locks the
    /// vertex buffer. The returned batch unlocks when dropped.
    ///
    /// # Errors
    ///
    /// Fails when buffers cannot be created or locked.
    pub fn begin_billboards(&mut self, expected: usize) -> RenderResult<BillboardBatch<'_>> {
        self.ensure_buffers()?;

        if !self.settings.point_rendering {
            self.frame.parametric = ParametricOffsets::for_origin(self.settings.origin);
            if !self.settings.orientation.per_billboard_axes() {
                let axes = self.settings.orientation.axes(&self.frame.camera, None);
                self.frame.shared_axes = axes;
                self.frame.shared_offsets = self.frame.parametric.vertex_offsets(
                    self.settings.default_width,
                    self.settings.default_height,
                    &axes,
                );
            }
        }
        self.visible_count = 0;

        let capacity = if expected == 0 { self.pool_size } else { expected.min(self.pool_size) };
        let cull_transform = match (&self.parent, self.settings.world_space) {
            (Some(parent), false) => *parent,
            _ => Transform::identity(),
        };
        let colour_format = self.buffer_manager.vertex_colour_format();

        let Self { name, pool, settings, flags, frame, buffers, visible_count, .. } = self;
        let buffers = buffers
            .as_mut()
            .ok_or_else(|| RenderError::ResourceCreationFailed("billboard buffers missing".into()))?;

        let per_billboard = if settings.point_rendering { 1 } else { 4 };
        let stride = buffers.vertex.element_size() * per_billboard;
        let lock_mode = buffers.vertex.usage().preferred_lock_mode();
        let lock = BufferLock::new(buffers.vertex.as_mut(), 0, capacity * stride, lock_mode)?;

        log::trace!("Billboard set {} locked for {} billboards", name, capacity);
        Ok(BillboardBatch {
            lock,
            settings,
            flags,
            frame,
            pool,
            cull_transform,
            colour_format,
            visible: visible_count,
            capacity,
            stride,
        })
    }

    /// Rebuild geometry if needed and register with `queue`
    ///
    /// Geometry and bounds are rebuilt when [`needs_update`](Self::needs_update)
    /// holds. Sets fed with external data are only registered.
    ///
    /// # Errors
    ///
    /// Fails when buffers cannot be created or locked.
    pub fn update_render_queue(&mut self, queue: &mut RenderQueue) -> RenderResult<()> {
        if self.needs_update() {
            self.refresh_bounds();
            self.flags.bounds_fresh = false;
            if self.settings.sorting_enabled {
                self.sort_billboards();
            }
            let count = self.pool.active_count();
            let mut batch = self.begin_billboards(count)?;
            batch.inject_active();
            batch.end();
            self.flags.data_changed = false;
        }

        queue.add_renderable(&*self, self.render_queue_group, self.render_queue_priority);
        Ok(())
    }

    fn ensure_buffers(&mut self) -> RenderResult<()> {
        if self.buffers.is_some() {
            return Ok(());
        }

        let point_rendering = self.settings.point_rendering;
        if point_rendering && self.settings.orientation.billboard_type != BillboardType::Point {
            log::warn!(
                "Billboard set {} has point rendering enabled but uses {:?} billboards, which point sprites cannot represent",
                self.name,
                self.settings.orientation.billboard_type
            );
        }

        let usage = if self.settings.auto_update {
            BufferUsage::DynamicWriteOnlyDiscardable
        } else {
            BufferUsage::StaticWriteOnly
        };

        let (vertex, index) = if point_rendering {
            let vertex = self.buffer_manager.create_vertex_buffer(
                std::mem::size_of::<PointVertex>(),
                self.pool_size,
                usage,
            )?;
            (vertex, None)
        } else {
            let vertex_count = self.pool_size * 4;
            let vertex = self.buffer_manager.create_vertex_buffer(
                std::mem::size_of::<BillboardVertex>(),
                vertex_count,
                usage,
            )?;
            let index_type = IndexType::for_vertex_count(vertex_count);
            let mut buffer = self.buffer_manager.create_index_buffer(
                index_type,
                self.pool_size * QUAD_INDICES.len(),
                BufferUsage::StaticWriteOnly,
            )?;
            write_quad_indices(buffer.as_mut(), index_type, self.pool_size)?;
            (vertex, Some(IndexBuffer { buffer, index_type }))
        };

        log::debug!(
            "Created buffers for billboard set {}: {} billboards, {}",
            self.name,
            self.pool_size,
            if point_rendering { "points" } else { "quads" }
        );
        self.buffers = Some(GeometryBuffers { vertex, index });
        Ok(())
    }

    fn destroy_buffers(&mut self) {
        if self.buffers.take().is_some() {
            log::debug!("Discarded buffers for billboard set {}", self.name);
        }
        self.visible_count = 0;
    }
}

/// Write the index pattern for `quads` quads
fn write_quad_indices(buffer: &mut dyn HardwareBuffer, index_type: IndexType, quads: usize) -> RenderResult<()> {
    let overflow = || RenderError::ResourceCreationFailed(format!("{quads} billboards exceed {index_type:?} indices"));

    let mut lock = BufferLock::whole(buffer, LockMode::Discard)?;
    let mut writer = VertexWriter::new(lock.bytes_mut());
    for quad in 0..quads {
        let base = u32::try_from(quad * 4).map_err(|_| overflow())?;
        let indices = QUAD_INDICES.map(|offset| base + offset);
        match index_type {
            IndexType::U32 => writer.write_all(&indices)?,
            IndexType::U16 => {
                let mut narrow = [0u16; 6];
                for (dst, &src) in narrow.iter_mut().zip(&indices) {
                    *dst = u16::try_from(src).map_err(|_| overflow())?;
                }
                writer.write_all(&narrow)?;
            }
        }
    }
    Ok(())
}

impl Renderable for BillboardSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn material(&self) -> MaterialId {
        self.material
    }

    fn is_transparent(&self) -> bool {
        self.material_transparent
    }

    fn world_transform(&self) -> Mat4 {
        match (&self.parent, self.settings.world_space) {
            (Some(parent), false) => parent.to_matrix(),
            _ => Mat4::identity(),
        }
    }

    fn render_operation(&self) -> RenderOperation {
        let visible = self.visible_count;
        match &self.buffers {
            Some(GeometryBuffers { index: Some(index), .. }) => RenderOperation::indexed_triangles(
                &BillboardVertex::LAYOUT,
                visible * 4,
                index.index_type,
                visible * QUAD_INDICES.len(),
            ),
            Some(GeometryBuffers { index: None, .. }) => RenderOperation::points(&PointVertex::LAYOUT, visible),
            None if self.settings.point_rendering => RenderOperation::points(&PointVertex::LAYOUT, 0),
            None => RenderOperation::indexed_triangles(&BillboardVertex::LAYOUT, 0, IndexType::U16, 0),
        }
    }

    fn squared_view_depth(&self, camera: &Camera) -> f32 {
        let origin = self.parent.as_ref().map_or_else(Vec3::zeros, |parent| parent.position);
        (origin - camera.derived_position()).norm_squared()
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// Locked vertex range of a [`BillboardSet`] being filled
///
/// Created by [`BillboardSet::begin_billboards`]. Dropping the batch (or
/// calling [`end`](Self::end)) unlocks the buffer.
#[derive(Debug)]
pub struct BillboardBatch<'a> {
    lock: BufferLock<'a>,
    settings: &'a SetSettings,
    flags: &'a ChangeFlags,
    frame: &'a FrameState,
    pool: &'a BillboardPool,
    cull_transform: Transform,
    colour_format: VertexColourFormat,
    visible: &'a mut usize,
    capacity: usize,
    stride: usize,
}

impl BillboardBatch<'_> {
    /// Billboards written so far
    pub fn visible_count(&self) -> usize {
        *self.visible
    }

    /// Billboards the locked range has room for
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write one billboard
    ///
    /// Returns `false` without writing when the locked range is full or the
    /// billboard is culled.
    pub fn inject(&mut self, billboard: &Billboard) -> bool {
        if *self.visible >= self.capacity || !self.is_visible(billboard) {
            return false;
        }

        let settings = self.settings;
        let frame = self.frame;
        let start = *self.visible * self.stride;
        let Some(bytes) = self.lock.bytes_mut().get_mut(start..start + self.stride) else {
            return false;
        };
        let mut writer = VertexWriter::new(bytes);

        let written = if settings.point_rendering {
            emit_point(&mut writer, billboard, self.colour_format)
        } else {
            let orientation = &settings.orientation;
            let per_billboard = orientation.per_billboard_axes();
            let axes = if per_billboard {
                orientation.axes(&frame.camera, Some(billboard))
            } else {
                frame.shared_axes
            };
            let offsets = if per_billboard || (!self.flags.all_default_size && billboard.has_own_dimensions()) {
                let (width, height) = billboard.dimensions_or(settings.default_width, settings.default_height);
                frame.parametric.vertex_offsets(width, height, &axes)
            } else {
                frame.shared_offsets
            };
            emit_quad(
                &mut writer,
                billboard,
                &offsets,
                &EmitSettings {
                    rotation_type: settings.rotation_type,
                    all_default_rotation: self.flags.all_default_rotation,
                    tex_coords: &settings.tex_coords,
                    colour_format: self.colour_format,
                },
            )
        };

        match written {
            Ok(()) => {
                *self.visible += 1;
                true
            }
            Err(err) => {
                log::error!("Failed to write billboard vertices: {}", err);
                false
            }
        }
    }

    /// Write every active billboard of the set's pool, in order. Returns the
    /// number written.
    pub fn inject_active(&mut self) -> usize {
        let pool = self.pool;
        let before = *self.visible;
        for billboard in pool.iter() {
            if *self.visible >= self.capacity {
                break;
            }
            self.inject(billboard);
        }
        *self.visible - before
    }

    /// Finish the batch and unlock the buffer
    pub fn end(self) {}

    fn is_visible(&self, billboard: &Billboard) -> bool {
        if !self.settings.cull_individually {
            return true;
        }
        let Some(frustum) = &self.frame.view_frustum else {
            return true;
        };
        let (width, height) = billboard.dimensions_or(self.settings.default_width, self.settings.default_height);
        let center = self.cull_transform.transform_point(billboard.position());
        frustum.intersects_sphere(&Sphere::new(center, width.max(height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SystemBufferManager;
    use approx::assert_relative_eq;

    fn manager() -> Arc<dyn HardwareBufferManager> {
        Arc::new(SystemBufferManager::new())
    }

    fn set(pool_size: usize) -> BillboardSet {
        BillboardSet::new("test", pool_size, false, manager())
    }

    fn read_vertices(set: &BillboardSet) -> Vec<BillboardVertex> {
        let buffer = set.vertex_buffer().unwrap();
        let mut bytes = vec![0u8; buffer.size_in_bytes()];
        buffer.read_data(0, &mut bytes).unwrap();
        bytes
            .chunks_exact(std::mem::size_of::<BillboardVertex>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    fn read_u16_indices(set: &BillboardSet) -> Vec<u16> {
        let buffer = set.index_buffer().unwrap();
        let mut bytes = vec![0u8; buffer.size_in_bytes()];
        buffer.read_data(0, &mut bytes).unwrap();
        bytes.chunks_exact(2).map(bytemuck::pod_read_unaligned).collect()
    }

    #[test]
    fn test_defaults() {
        let set = set(0);
        assert_eq!(set.origin(), BillboardOrigin::Center);
        assert_eq!(set.billboard_type(), BillboardType::Point);
        assert_eq!(set.rotation_type(), BillboardRotationType::TexCoord);
        assert_eq!(set.default_dimensions(), (100.0, 100.0));
        assert_eq!(set.common_direction(), Vec3::z());
        assert_eq!(set.common_up_vector(), Vec3::y());
        assert!(set.auto_extend());
        assert!(set.auto_update());
        assert!(!set.sorting_enabled());
        assert_eq!(set.texture_coords(), &[FloatRect::UNIT]);
        assert_eq!(set.render_queue_group(), groups::MAIN);
    }

    #[test]
    fn test_auto_extend_doubles_pool() {
        let mut set = set(2);
        for i in 0..3 {
            assert!(set.create_billboard(Vec3::new(i as f32, 0.0, 0.0)).is_some());
        }

        assert_eq!(set.pool_size(), 4);
        assert_eq!(set.billboard_count(), 3);
        assert_eq!(set.free_count(), 1);
    }

    #[test]
    fn test_empty_pool_grows_to_one() {
        let mut set = set(0);
        assert!(set.create_billboard(Vec3::zeros()).is_some());
        assert_eq!(set.pool_size(), 1);
    }

    #[test]
    fn test_exhausted_pool_without_auto_extend() {
        let mut set = set(1);
        set.set_auto_extend(false);
        assert!(set.create_billboard(Vec3::zeros()).is_some());
        assert!(set.create_billboard(Vec3::zeros()).is_none());
        assert_eq!(set.pool_size(), 1);
    }

    #[test]
    fn test_set_pool_size_never_shrinks() {
        let mut set = set(8);
        set.set_pool_size(3);
        assert_eq!(set.pool_size(), 8);
        set.set_pool_size(10);
        assert_eq!(set.pool_size(), 10);
        assert_eq!(set.free_count(), 10);
    }

    #[test]
    fn test_create_merges_padded_bounds() {
        let mut set = set(4);
        set.set_default_dimensions(2.0, 1.0);
        set.create_billboard(Vec3::new(10.0, 0.0, 0.0));

        assert_eq!(set.bounding_box().min, Vec3::new(8.0, -2.0, -2.0));
        assert_eq!(set.bounding_box().max, Vec3::new(12.0, 2.0, 2.0));
        assert_relative_eq!(set.bounding_radius(), Vec3::new(12.0, 2.0, 2.0).norm());
    }

    #[test]
    fn test_clear_and_recompute_bounds() {
        let mut set = set(4);
        set.create_billboard(Vec3::new(5.0, 5.0, 5.0));
        set.clear();
        set.update_bounds();

        assert!(set.bounding_box().is_null());
        assert_eq!(set.bounding_radius(), 0.0);

        set.create_billboard(Vec3::zeros());
        set.update_bounds();
        assert_eq!(set.bounding_box().min, Vec3::repeat(-100.0));
        assert_eq!(set.bounding_box().max, Vec3::repeat(100.0));
    }

    #[test]
    fn test_render_refreshes_bounds_after_moves() {
        let mut set = set(2);
        set.set_default_dimensions(1.0, 1.0);
        let handle = set.create_billboard(Vec3::new(0.0, 0.0, 50.0)).unwrap();
        set.get_mut(handle).unwrap().set_position(Vec3::new(0.0, 0.0, -10.0));
        assert!(set.bounding_box().contains_point(Vec3::new(0.0, 0.0, 50.0)));

        let camera = Camera::default();
        set.notify_current_camera(&camera);
        set.update_render_queue(&mut RenderQueue::new(&camera)).unwrap();

        assert_eq!(set.bounding_box().min, Vec3::new(-1.0, -1.0, -11.0));
        assert_eq!(set.bounding_box().max, Vec3::new(1.0, 1.0, -9.0));
    }

    #[test]
    fn test_refresh_bounds_skips_clean_static_sets() {
        let mut set = set(2);
        set.set_auto_update(false);
        set.set_default_dimensions(1.0, 1.0);
        set.create_billboard(Vec3::zeros());
        let camera = Camera::default();
        set.update_render_queue(&mut RenderQueue::new(&camera)).unwrap();
        assert!(!set.needs_update());

        let explicit = AABB::new(Vec3::repeat(-7.0), Vec3::repeat(7.0));
        set.set_bounds(explicit, 7.0);
        set.refresh_bounds();
        assert_eq!(set.bounding_box().max, Vec3::repeat(7.0));

        set.notify_billboard_data_changed();
        assert!(set.needs_update());
        set.refresh_bounds();
        assert_eq!(set.bounding_box().max, Vec3::repeat(1.0));
    }

    #[test]
    fn test_world_space_bounds_use_inverse_parent() {
        let mut set = set(4);
        set.set_default_dimensions(0.0, 0.0);
        set.set_billboards_in_world_space(true);
        set.set_parent_transform(Some(Transform::from_position(Vec3::new(0.0, 10.0, 0.0))));
        set.create_billboard(Vec3::new(1.0, 10.0, 0.0));

        set.update_bounds();

        assert_relative_eq!(set.bounding_box().max, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(set.bounding_radius(), 1.0);
    }

    #[test]
    fn test_texture_grid() {
        let mut set = set(0);
        set.set_texture_stacks_and_slices(2, 2);

        let coords = set.texture_coords();
        assert_eq!(coords.len(), 4);
        assert_eq!(coords[0], FloatRect::new(0.0, 0.0, 0.5, 0.5));
        assert_eq!(coords[1], FloatRect::new(0.5, 0.0, 1.0, 0.5));
        assert_eq!(coords[3], FloatRect::new(0.5, 0.5, 1.0, 1.0));

        set.set_texture_stacks_and_slices(0, 3);
        assert_eq!(set.texture_coords().len(), 3);

        set.set_texture_coords(&[]);
        assert_eq!(set.texture_coords(), &[FloatRect::UNIT]);
    }

    #[test]
    fn test_point_rendering_requires_capability() {
        let mut set = set(4);
        assert!(!set.set_point_rendering_enabled(true));
        assert!(!set.point_rendering_enabled());

        let sprites = Arc::new(SystemBufferManager::with_capabilities(Capabilities::POINT_SPRITES));
        let mut set = BillboardSet::new("sprites", 4, false, sprites);
        assert!(set.set_point_rendering_enabled(true));
        assert!(set.point_rendering_enabled());
    }

    #[test]
    fn test_index_buffer_pattern() {
        let mut set = set(2);
        set.create_billboard(Vec3::zeros());
        let mut queue = RenderQueue::new(&Camera::default());
        set.update_render_queue(&mut queue).unwrap();

        assert_eq!(read_u16_indices(&set), vec![0, 2, 1, 1, 2, 3, 4, 6, 5, 5, 6, 7]);
    }

    #[test]
    fn test_large_pool_uses_32_bit_indices() {
        let mut set = set(20_000);
        set.create_billboard(Vec3::zeros());
        let mut queue = RenderQueue::new(&Camera::default());
        set.update_render_queue(&mut queue).unwrap();

        assert_eq!(set.index_buffer().unwrap().element_size(), 4);
        assert_eq!(set.render_operation().index_type, Some(IndexType::U32));
    }

    #[test]
    fn test_begin_clamps_to_pool_and_expected() {
        let mut set = set(3);
        for _ in 0..3 {
            set.create_billboard(Vec3::zeros());
        }

        let mut batch = set.begin_billboards(2).unwrap();
        assert_eq!(batch.capacity(), 2);
        assert_eq!(batch.inject_active(), 2);
        let extra = Billboard::default();
        assert!(!batch.inject(&extra));
        batch.end();
        assert_eq!(set.visible_count(), 2);
        assert!(!set.vertex_buffer().unwrap().is_locked());

        let batch = set.begin_billboards(0).unwrap();
        assert_eq!(batch.capacity(), 3);
    }

    #[test]
    fn test_batch_unlocks_on_drop() {
        let mut set = set(2);
        {
            let _batch = set.begin_billboards(1).unwrap();
        }
        assert!(!set.vertex_buffer().unwrap().is_locked());
        assert!(set.begin_billboards(1).is_ok());
    }

    #[test]
    fn test_default_point_billboard_vertices() {
        let mut set = set(1);
        set.set_default_dimensions(2.0, 2.0);
        set.create_billboard(Vec3::new(0.0, 0.0, -10.0));
        set.notify_current_camera(&Camera::default());

        let mut batch = set.begin_billboards(1).unwrap();
        batch.inject_active();
        batch.end();

        let vertices = read_vertices(&set);
        assert_eq!(vertices[0].position, [-1.0, 1.0, -10.0]);
        assert_eq!(vertices[1].position, [1.0, 1.0, -10.0]);
        assert_eq!(vertices[2].position, [-1.0, -1.0, -10.0]);
        assert_eq!(vertices[3].position, [1.0, -1.0, -10.0]);
    }

    #[test]
    fn test_own_dimensions_override_default() {
        let mut set = set(2);
        set.set_default_dimensions(2.0, 2.0);
        set.create_billboard(Vec3::zeros());
        let handle = set.create_billboard(Vec3::zeros()).unwrap();
        set.get_mut(handle).unwrap().set_dimensions(4.0, 6.0);

        let mut batch = set.begin_billboards(0).unwrap();
        batch.inject_active();
        batch.end();

        let vertices = read_vertices(&set);
        assert_eq!(vertices[0].position, [-1.0, 1.0, 0.0]);
        assert_eq!(vertices[4].position, [-2.0, 3.0, 0.0]);
        assert_eq!(vertices[7].position, [2.0, -3.0, 0.0]);
    }

    #[test]
    fn test_individual_culling() {
        let mut set = set(2);
        set.set_default_dimensions(1.0, 1.0);
        set.set_cull_individually(true);
        set.create_billboard(Vec3::new(0.0, 0.0, -10.0));
        set.create_billboard(Vec3::new(0.0, 0.0, 10.0));
        set.notify_current_camera(&Camera::default());

        let mut batch = set.begin_billboards(0).unwrap();
        assert_eq!(batch.inject_active(), 1);
    }

    #[test]
    fn test_camera_converted_into_node_space() {
        let mut set = set(1);
        set.set_parent_transform(Some(Transform::from_position(Vec3::new(0.0, 0.0, -20.0))));
        set.notify_current_camera(&Camera::default());

        assert_relative_eq!(set.frame.camera.position, Vec3::new(0.0, 0.0, 20.0));

        set.set_billboards_in_world_space(true);
        set.notify_current_camera(&Camera::default());
        assert_relative_eq!(set.frame.camera.position, Vec3::zeros());
    }

    #[test]
    fn test_render_operation_sizes() {
        let mut set = set(4);
        for _ in 0..3 {
            set.create_billboard(Vec3::new(0.0, 0.0, -5.0));
        }
        let mut queue = RenderQueue::new(&Camera::default());
        set.update_render_queue(&mut queue).unwrap();

        let op = set.render_operation();
        assert_eq!(op.vertex_count, 12);
        assert_eq!(op.index_count, 18);
        assert!(op.use_indexes);
        assert_eq!(queue.command_count(), 1);
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let mut set = set(2);
        let handle = set.create_billboard(Vec3::zeros()).unwrap();
        assert!(set.remove(handle));
        assert!(!set.remove(handle));
        assert!(set.get(handle).is_none());
        assert_eq!(set.billboard_count(), 0);
    }

    #[test]
    fn test_structural_changes_discard_buffers() {
        let mut set = set(2);
        set.create_billboard(Vec3::zeros());
        let mut queue = RenderQueue::new(&Camera::default());
        set.update_render_queue(&mut queue).unwrap();
        assert!(set.vertex_buffer().is_some());

        set.set_auto_update(false);
        assert!(set.vertex_buffer().is_none());

        set.update_render_queue(&mut queue).unwrap();
        assert_eq!(set.vertex_buffer().unwrap().usage(), BufferUsage::StaticWriteOnly);

        set.set_pool_size(8);
        assert!(set.vertex_buffer().is_none());
    }

    #[test]
    fn test_billboard_set_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<BillboardSet>();
    }
}
