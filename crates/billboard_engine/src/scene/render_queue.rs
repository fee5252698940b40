//! # Render Queue
//!
//! Collects renderables registered during a frame, grouped by render queue
//! group and ordered within a group for submission.
//!
//! ## Ordering
//!
//! - Groups are drawn in ascending id order ([`groups`] lists the usual ids)
//! - Inside a group, lower priority values come first
//! - At equal priority, opaque commands come first (near to far) followed by
//!   transparent commands (far to near)

use std::collections::BTreeMap;

use super::camera::Camera;
use super::light::Light;
use crate::foundation::math::Mat4;
use crate::render::{MaterialId, RenderOperation};

/// Well-known render queue group ids
pub mod groups {
    /// Drawn first, e.g. skies
    pub const BACKGROUND: u8 = 0;
    /// Early world geometry
    pub const WORLD_GEOMETRY_1: u8 = 25;
    /// Default group for most renderables
    pub const MAIN: u8 = 50;
    /// Late world geometry
    pub const WORLD_GEOMETRY_2: u8 = 75;
    /// Drawn last, e.g. overlays
    pub const OVERLAY: u8 = 100;
}

/// Priority used when a renderable does not ask for one
pub const DEFAULT_PRIORITY: u16 = 100;

/// Something the render queue can draw
pub trait Renderable {
    /// Identifying name, used for diagnostics
    fn name(&self) -> &str;

    /// Material to draw with
    fn material(&self) -> MaterialId;

    /// Whether the material blends with what is behind it
    fn is_transparent(&self) -> bool {
        false
    }

    /// Object-to-world matrix for the draw
    fn world_transform(&self) -> Mat4;

    /// Draw description for the current contents of the renderable's buffers
    fn render_operation(&self) -> RenderOperation;

    /// Squared distance used to order the renderable relative to others
    fn squared_view_depth(&self, camera: &Camera) -> f32;

    /// Lights affecting the renderable
    fn lights(&self) -> &[Light];
}

/// Type of render command for sorting and batching
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandType {
    /// Opaque objects rendered front-to-back for depth testing efficiency
    Opaque,
    /// Transparent objects rendered back-to-front for alpha blending
    Transparent,
}

/// Snapshot of a renderable taken when it was queued
#[derive(Debug, Clone)]
pub struct RenderCommand {
    /// Name of the renderable
    pub name: String,
    /// Material to apply
    pub material_id: MaterialId,
    /// World transform matrix
    pub transform: Mat4,
    /// Draw description
    pub operation: RenderOperation,
    /// Type of command for sorting
    pub command_type: CommandType,
    /// Squared distance from camera for depth sorting
    pub depth_key: f32,
    /// Priority within the group
    pub priority: u16,
    /// Number of lights affecting the renderable
    pub light_count: usize,
}

/// Commands of one render queue group
#[derive(Debug, Clone, Default)]
pub struct RenderGroup {
    commands: Vec<RenderCommand>,
    sorted: bool,
}

impl RenderGroup {
    /// Commands in submission order once the queue is sorted
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.commands.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.command_type.cmp(&b.command_type))
                .then_with(|| match a.command_type {
                    CommandType::Opaque => a.depth_key.total_cmp(&b.depth_key),
                    CommandType::Transparent => b.depth_key.total_cmp(&a.depth_key),
                })
        });
        self.sorted = true;
    }
}

/// Per-frame collection of render commands
#[derive(Debug, Clone)]
pub struct RenderQueue {
    camera: Camera,
    groups: BTreeMap<u8, RenderGroup>,
}

impl RenderQueue {
    /// Empty queue ordering commands relative to `camera`
    pub fn new(camera: &Camera) -> Self {
        Self {
            camera: camera.clone(),
            groups: BTreeMap::new(),
        }
    }

    /// Camera used for depth keys
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Switch camera; commands already queued keep their depth keys
    pub fn set_camera(&mut self, camera: &Camera) {
        self.camera = camera.clone();
    }

    /// Queue `renderable` in `group` at `priority`
    pub fn add_renderable(&mut self, renderable: &dyn Renderable, group: u8, priority: u16) {
        let operation = renderable.render_operation();
        if operation.is_empty() {
            log::trace!("Skipping empty renderable {}", renderable.name());
            return;
        }

        let command = RenderCommand {
            name: renderable.name().to_string(),
            material_id: renderable.material(),
            transform: renderable.world_transform(),
            operation,
            command_type: if renderable.is_transparent() {
                CommandType::Transparent
            } else {
                CommandType::Opaque
            },
            depth_key: renderable.squared_view_depth(&self.camera),
            priority,
            light_count: renderable.lights().len(),
        };

        let group = self.groups.entry(group).or_default();
        group.commands.push(command);
        group.sorted = false;
    }

    /// Order every group for submission
    pub fn sort(&mut self) {
        for group in self.groups.values_mut() {
            group.sort();
        }
    }

    /// Commands of `group`, if anything was queued there
    pub fn group(&self, group: u8) -> Option<&RenderGroup> {
        self.groups.get(&group)
    }

    /// All commands, group by group in ascending group order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &RenderCommand)> + '_ {
        self.groups
            .iter()
            .flat_map(|(&id, group)| group.commands.iter().map(move |command| (id, command)))
    }

    /// Get total number of commands
    pub fn command_count(&self) -> usize {
        self.groups.values().map(|group| group.commands.len()).sum()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.command_count() == 0
    }

    /// Clear all commands for next frame
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
