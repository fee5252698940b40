//! # Billboard Configuration
//!
//! Serializable descriptions of billboard sets and of the engine that hosts
//! them. Both load from TOML or RON through the [`Config`] trait.
//!
//! ## Example (TOML)
//!
//! ```toml
//! log_filter = "billboard_engine=debug"
//!
//! [sets.smoke]
//! pool_size = 200
//! billboard_type = "OrientedCommon"
//! sorting_enabled = true
//! texture_stacks = 4
//! texture_slices = 4
//! material = "Smoke"
//! ```
//!
//! Every field has a default, so a set only lists what it changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::billboard::{
    BillboardOrigin, BillboardRotationType, BillboardSet, BillboardType, DEFAULT_DIMENSION,
    DEFAULT_POOL_SIZE,
};
use crate::foundation::math::Vec3;
use crate::render::{HardwareBufferManager, MaterialLibrary};
use crate::scene::render_queue::{groups, DEFAULT_PRIORITY};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// # Billboard Set Configuration
///
/// Every attribute of a [`BillboardSet`] that can be chosen up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillboardSetConfig {
    /// Initial pool size
    pub pool_size: usize,
    /// Caller supplies billboards each frame
    pub external_data: bool,
    /// Double the pool when a create finds it full
    pub auto_extend: bool,
    /// Point of each billboard placed at its position
    pub origin: BillboardOrigin,
    /// Orientation mode
    pub billboard_type: BillboardType,
    /// What billboard rotation rotates
    pub rotation_type: BillboardRotationType,
    /// Width of billboards without their own size
    pub default_width: f32,
    /// Height of billboards without their own size
    pub default_height: f32,
    /// Direction shared by the `*Common` types
    pub common_direction: [f32; 3],
    /// Up vector shared by the `Perpendicular*` types
    pub common_up: [f32; 3],
    /// Billboard positions are in world space
    pub world_space: bool,
    /// Face the camera position instead of the view plane
    pub accurate_facing: bool,
    /// Frustum-cull each billboard
    pub cull_individually: bool,
    /// Sort billboards back to front
    pub sorting_enabled: bool,
    /// Draw point sprites instead of quads
    pub point_rendering: bool,
    /// Rebuild geometry every frame
    pub auto_update: bool,
    /// Rows of the texture grid
    pub texture_stacks: u8,
    /// Columns of the texture grid
    pub texture_slices: u8,
    /// Material name; `None` keeps the library default
    pub material: Option<String>,
    /// Render queue group
    pub render_queue_group: u8,
    /// Priority within the group
    pub render_queue_priority: u16,
}

impl BillboardSetConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            external_data: false,
            auto_extend: true,
            origin: BillboardOrigin::default(),
            billboard_type: BillboardType::default(),
            rotation_type: BillboardRotationType::default(),
            default_width: DEFAULT_DIMENSION,
            default_height: DEFAULT_DIMENSION,
            common_direction: [0.0, 0.0, 1.0],
            common_up: [0.0, 1.0, 0.0],
            world_space: false,
            accurate_facing: false,
            cull_individually: false,
            sorting_enabled: false,
            point_rendering: false,
            auto_update: true,
            texture_stacks: 1,
            texture_slices: 1,
            material: None,
            render_queue_group: groups::MAIN,
            render_queue_priority: DEFAULT_PRIORITY,
        }
    }

    /// Set the pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the orientation mode
    pub fn with_billboard_type(mut self, billboard_type: BillboardType) -> Self {
        self.billboard_type = billboard_type;
        self
    }

    /// Set the default billboard size
    pub fn with_default_dimensions(mut self, width: f32, height: f32) -> Self {
        self.default_width = width;
        self.default_height = height;
        self
    }

    /// Set the texture grid
    pub fn with_texture_grid(mut self, stacks: u8, slices: u8) -> Self {
        self.texture_stacks = stacks;
        self.texture_slices = slices;
        self
    }

    /// Set the material name
    pub fn with_material(mut self, name: impl Into<String>) -> Self {
        self.material = Some(name.into());
        self
    }

    /// Enable or disable sorting
    pub fn with_sorting(mut self, enabled: bool) -> Self {
        self.sorting_enabled = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let dimensions_ok = |d: f32| d.is_finite() && d >= 0.0;
        if !dimensions_ok(self.default_width) || !dimensions_ok(self.default_height) {
            return Err(format!(
                "Default dimensions must be finite and non-negative, got {}x{}",
                self.default_width, self.default_height
            ));
        }

        if self.billboard_type.uses_common_direction() && Vec3::from(self.common_direction).norm_squared() == 0.0 {
            return Err(format!("{:?} billboards need a non-zero common direction", self.billboard_type));
        }

        if self.billboard_type.uses_common_up() && Vec3::from(self.common_up).norm_squared() == 0.0 {
            return Err(format!("{:?} billboards need a non-zero common up vector", self.billboard_type));
        }

        Ok(())
    }

    /// Create a set called `name` from this configuration
    pub fn create_set(
        &self,
        name: impl Into<String>,
        buffer_manager: Arc<dyn HardwareBufferManager>,
        materials: &MaterialLibrary,
    ) -> BillboardSet {
        let mut set = BillboardSet::new(name, self.pool_size, self.external_data, buffer_manager);
        self.apply_to(&mut set, materials);
        set
    }

    /// Apply every attribute except pool mode to an existing set
    ///
    /// The pool only grows; a smaller `pool_size` leaves it unchanged.
    pub fn apply_to(&self, set: &mut BillboardSet, materials: &MaterialLibrary) {
        if self.external_data != set.is_external_data() {
            log::warn!(
                "Billboard set {} keeps external data {}; configuration asks for {}",
                set.name(),
                set.is_external_data(),
                self.external_data
            );
        }

        set.set_pool_size(self.pool_size);
        set.set_auto_extend(self.auto_extend);
        set.set_origin(self.origin);
        set.set_billboard_type(self.billboard_type);
        set.set_rotation_type(self.rotation_type);
        set.set_default_dimensions(self.default_width, self.default_height);
        set.set_common_direction(Vec3::from(self.common_direction));
        set.set_common_up_vector(Vec3::from(self.common_up));
        set.set_billboards_in_world_space(self.world_space);
        set.set_use_accurate_facing(self.accurate_facing);
        set.set_cull_individually(self.cull_individually);
        set.set_sorting_enabled(self.sorting_enabled);
        set.set_point_rendering_enabled(self.point_rendering);
        set.set_auto_update(self.auto_update);
        set.set_texture_stacks_and_slices(self.texture_stacks, self.texture_slices);
        set.set_render_queue_group_and_priority(self.render_queue_group, self.render_queue_priority);

        if let Some(material) = &self.material {
            set.set_material_name(materials, material);
        }
    }
}

impl Default for BillboardSetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for BillboardSetConfig {}

/// # Engine Configuration
///
/// Logging setup plus the billboard sets a scene starts with, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter in `RUST_LOG` syntax
    pub log_filter: String,
    /// Named set descriptions
    pub sets: BTreeMap<String, BillboardSetConfig>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_filter: "info".to_string(),
            sets: BTreeMap::new(),
        }
    }

    /// Set the log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Add a named set description
    pub fn with_set(mut self, name: impl Into<String>, config: BillboardSetConfig) -> Self {
        self.sets.insert(name.into(), config);
        self
    }

    /// Install the logger with [`log_filter`](Self::log_filter)
    ///
    /// Returns `false` if a logger was already installed.
    pub fn init_logging(&self) -> bool {
        crate::foundation::logging::init_with_filter(&self.log_filter)
    }

    /// Validate every set description
    pub fn validate(&self) -> Result<(), String> {
        for (name, set) in &self.sets {
            set.validate().map_err(|e| format!("Set {name}: {e}"))?;
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BlendMode, Material, SystemBufferManager};

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            log_filter = "billboard_engine=trace"

            [sets.smoke]
            pool_size = 200
            billboard_type = "OrientedCommon"
            texture_stacks = 2
            texture_slices = 2
        "#;

        let config = EngineConfig::from_str_with_format(toml, ConfigFormat::Toml).unwrap();
        let smoke = &config.sets["smoke"];

        assert_eq!(config.log_filter, "billboard_engine=trace");
        assert_eq!(smoke.pool_size, 200);
        assert_eq!(smoke.billboard_type, BillboardType::OrientedCommon);
        assert_eq!(smoke.default_width, DEFAULT_DIMENSION);
        assert!(smoke.auto_update);
        assert_eq!(smoke.render_queue_group, groups::MAIN);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = EngineConfig::new().with_set(
            "sparks",
            BillboardSetConfig::new()
                .with_pool_size(8)
                .with_billboard_type(BillboardType::PerpendicularSelf)
                .with_material("Spark"),
        );

        let text = config.to_string_with_format(ConfigFormat::Ron).unwrap();
        let parsed = EngineConfig::from_str_with_format(&text, ConfigFormat::Ron).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(BillboardSetConfig::new().validate().is_ok());
        assert!(BillboardSetConfig::new().with_default_dimensions(-1.0, 1.0).validate().is_err());

        let mut config = BillboardSetConfig::new().with_billboard_type(BillboardType::OrientedCommon);
        config.common_direction = [0.0; 3];
        let engine = EngineConfig::new().with_set("broken", config);
        assert!(engine.validate().unwrap_err().contains("broken"));

        // Vectors the type never reads are not checked
        let mut config = BillboardSetConfig::new().with_billboard_type(BillboardType::OrientedSelf);
        config.common_up = [0.0; 3];
        assert!(config.validate().is_ok());
        assert!(config.with_billboard_type(BillboardType::PerpendicularSelf).validate().is_err());
    }

    #[test]
    fn test_create_set_applies_attributes() {
        let mut materials = MaterialLibrary::new();
        let smoke = materials.register(Material::new("Smoke").with_blend_mode(BlendMode::AlphaBlend));

        let config = BillboardSetConfig::new()
            .with_pool_size(4)
            .with_default_dimensions(2.0, 3.0)
            .with_texture_grid(2, 2)
            .with_sorting(true)
            .with_material("Smoke");
        let set = config.create_set("smoke", Arc::new(SystemBufferManager::new()), &materials);

        assert_eq!(set.pool_size(), 4);
        assert_eq!(set.default_dimensions(), (2.0, 3.0));
        assert_eq!(set.texture_coords().len(), 4);
        assert!(set.sorting_enabled());
        assert_eq!(set.material(), smoke);
    }

    #[test]
    fn test_unknown_material_falls_back_to_default() {
        let materials = MaterialLibrary::new();
        let config = BillboardSetConfig::new().with_material("Missing");
        let set = config.create_set("x", Arc::new(SystemBufferManager::new()), &materials);

        assert_eq!(set.material(), materials.default_id());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = ConfigFormat::from_path("sets.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
