//! # Billboards
//!
//! Camera-facing quads (or point sprites) managed in sets. A
//! [`BillboardSet`] pools its records, orients them with one of five
//! [`BillboardType`]s, optionally sorts them back to front and packs their
//! vertices into a locked hardware buffer each frame.
//!
//! ## Pieces
//!
//! - [`pool`]: arena with intrusive active/free lists
//! - [`orientation`]: right/up axes for every billboard type
//! - [`offsets`]: corner offsets from origin, size and axes
//! - [`sorting`]: back-to-front ordering
//! - [`emitter`]: vertex packing for one billboard
//! - [`bounds`]: bounding box and radius bookkeeping
//! - [`set`]: the set tying them together
//! - [`factory`]: parameter-driven set creation

pub mod bounds;
pub mod emitter;
pub mod factory;
pub mod offsets;
pub mod orientation;
pub mod pool;
pub mod record;
pub mod set;
pub mod sorting;
pub mod types;


pub use factory::BillboardSetFactory;
pub use record::{Billboard, BillboardHandle, BillboardMut};
pub use set::{BillboardBatch, BillboardSet, DEFAULT_DIMENSION, DEFAULT_POOL_SIZE};
pub use types::{BillboardOrigin, BillboardRotationType, BillboardType, FloatRect, SortMode};

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::RenderError;

/// Billboard subsystem errors
#[derive(Error, Debug)]
pub enum BillboardError {
    /// A creation parameter could not be parsed
    #[error("Invalid value {value:?} for parameter {name}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Raw value
        value: String,
    },

    /// A set description failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Buffer creation or locking failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Loading a set description failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for billboard operations
pub type BillboardResult<T> = Result<T, BillboardError>;
