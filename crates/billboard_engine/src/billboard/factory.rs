//! Creation of billboard sets from name/value parameters

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::set::{BillboardSet, DEFAULT_POOL_SIZE};
use super::{BillboardError, BillboardResult};
use crate::render::HardwareBufferManager;

/// Creates [`BillboardSet`]s for a scene
#[derive(Debug, Clone)]
pub struct BillboardSetFactory {
    buffer_manager: Arc<dyn HardwareBufferManager>,
}

impl BillboardSetFactory {
    /// Type name sets are registered under
    pub const TYPE_NAME: &'static str = "BillboardSet";

    /// Parameter holding the initial pool size
    pub const POOL_SIZE_PARAM: &'static str = "poolSize";

    /// Parameter selecting external data mode
    pub const EXTERNAL_DATA_PARAM: &'static str = "externalData";

    /// Factory whose sets allocate through `buffer_manager`
    pub fn new(buffer_manager: Arc<dyn HardwareBufferManager>) -> Self {
        Self { buffer_manager }
    }

    /// Buffer manager handed to created sets
    pub fn buffer_manager(&self) -> &Arc<dyn HardwareBufferManager> {
        &self.buffer_manager
    }

    /// Create a set called `name`
    ///
    /// Recognised parameters are `poolSize` (unsigned, default 20 when
    /// missing or zero) and `externalData` (`true`/`false`, default false).
    /// Unknown parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BillboardError::InvalidParameter`] when a recognised
    /// parameter does not parse.
    pub fn create_instance(&self, name: &str, params: &HashMap<String, String>) -> BillboardResult<BillboardSet> {
        let pool_size = match parse_param::<usize>(params, Self::POOL_SIZE_PARAM)? {
            Some(size) if size > 0 => size,
            _ => DEFAULT_POOL_SIZE,
        };
        let external_data = parse_param::<bool>(params, Self::EXTERNAL_DATA_PARAM)?.unwrap_or(false);

        log::debug!(
            "Creating {} {} (pool size {}, external data {})",
            Self::TYPE_NAME,
            name,
            pool_size,
            external_data
        );
        Ok(BillboardSet::new(name, pool_size, external_data, Arc::clone(&self.buffer_manager)))
    }
}

fn parse_param<T: FromStr>(params: &HashMap<String, String>, name: &str) -> BillboardResult<Option<T>> {
    params
        .get(name)
        .map(|value| {
            value.trim().parse().map_err(|_| BillboardError::InvalidParameter {
                name: name.to_string(),
                value: value.clone(),
            })
        })
        .transpose()
}
