//! # Billboard Engine
//!
//! Camera-facing billboard sets for a real-time 3D renderer.
//!
//! ## Features
//!
//! - **Pooled Billboards**: growable arena with O(1) create, remove and clear
//! - **Orientation Modes**: point, oriented and perpendicular billboards,
//!   with common or per-billboard directions
//! - **Transparency Sorting**: back-to-front ordering by view direction or
//!   distance
//! - **Vertex Packing**: quads or point sprites written straight into locked
//!   hardware buffers
//! - **Configuration**: set descriptions in TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use billboard_engine::prelude::*;
//!
//! fn main() -> Result<(), BillboardError> {
//!     let mut scene = BillboardScene::new(Arc::new(SystemBufferManager::new()));
//!     let node = scene.create_node("emitter", None);
//!     let key = scene.create_set_from_config("smoke", &BillboardSetConfig::new().with_sorting(true));
//!     scene.attach_set(key, Some(node));
//!
//!     if let Some(set) = scene.set_mut(key) {
//!         set.create_billboard(Vec3::new(0.0, 0.0, -10.0));
//!     }
//!
//!     let camera = Camera::default();
//!     let mut queue = RenderQueue::new(&camera);
//!     scene.render(&camera, &mut queue)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod billboard;
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        billboard::{
            Billboard, BillboardError, BillboardHandle, BillboardOrigin, BillboardResult,
            BillboardRotationType, BillboardSet, BillboardSetFactory, BillboardType, FloatRect,
        },
        core::config::{BillboardSetConfig, Config, ConfigFormat, EngineConfig},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        render::{
            ColourValue, HardwareBufferManager, MaterialId, MaterialLibrary, SystemBufferManager,
        },
        scene::{BillboardScene, Camera, RenderQueue, Renderable, SceneNode},
    };
}
