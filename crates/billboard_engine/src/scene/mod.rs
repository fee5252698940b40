//! Scene management
//!
//! The collaborators billboard sets are rendered against: cameras, nodes,
//! lights, bounding volumes and the render queue, plus [`BillboardScene`]
//! which owns sets and drives them each frame.
//!
//! ## Frame flow
//!
//! ```text
//! BillboardScene::render
//!      ↓
//! SceneNode transforms (top-down)
//!      ↓
//! BillboardSet::update_render_queue (per visible set)
//!      ↓
//! RenderQueue (sorted by group, priority, depth)
//! ```

pub mod bounds;
pub mod camera;
pub mod frustum;
pub mod light;
pub mod node;
pub mod render_queue;
mod scene_manager;

pub use bounds::{Sphere, AABB};
pub use camera::Camera;
pub use frustum::{Frustum, Plane};
pub use light::{Light, LightKind};
pub use node::SceneNode;
pub use render_queue::{CommandType, RenderCommand, RenderGroup, RenderQueue, Renderable};
pub use scene_manager::{BillboardScene, NodeKey, SceneConfig, SetKey};
