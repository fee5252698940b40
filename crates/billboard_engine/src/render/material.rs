//! Material lookup
//!
//! Materials are referenced by name from configuration and by [`MaterialId`]
//! at runtime. Looking up a name that is not registered falls back to the
//! library's default material and logs an error instead of failing the
//! frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the material every library starts with
pub const DEFAULT_MATERIAL_NAME: &str = "BaseWhite";

/// Runtime handle to a registered material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MaterialId(pub u32);

/// How a material's fragments combine with the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// No blending (fully opaque)
    Opaque,

    /// Standard alpha blending
    #[default]
    AlphaBlend,

    /// Additive blending (for glowing effects)
    Additive,
}

impl BlendMode {
    /// Whether geometry using this mode needs back-to-front ordering
    pub const fn is_transparent(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// Named surface description referenced by renderables
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Unique name
    pub name: String,
    /// Blend mode
    pub blend_mode: BlendMode,
}

impl Material {
    /// Create an alpha-blended material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blend_mode: BlendMode::default(),
        }
    }

    /// Set the blend mode
    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }
}

/// Registry of materials with a guaranteed default entry
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLibrary {
    /// Library holding only the default material
    pub fn new() -> Self {
        let mut library = Self {
            materials: Vec::new(),
            by_name: HashMap::new(),
        };
        library.register(Material::new(DEFAULT_MATERIAL_NAME).with_blend_mode(BlendMode::Opaque));
        library
    }

    /// Id of the default material
    pub const fn default_id(&self) -> MaterialId {
        MaterialId(0)
    }

    /// Add a material, replacing any existing one with the same name
    pub fn register(&mut self, material: Material) -> MaterialId {
        if let Some(&id) = self.by_name.get(&material.name) {
            self.materials[id.0 as usize] = material;
            return id;
        }
        let id = MaterialId(u32::try_from(self.materials.len()).unwrap_or(u32::MAX));
        self.by_name.insert(material.name.clone(), id);
        self.materials.push(material);
        id
    }

    /// Id of the material called `name`, if registered
    pub fn find(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    /// Id of the material called `name`, or the default material when it is
    /// not registered
    pub fn resolve(&self, name: &str) -> MaterialId {
        self.find(name).unwrap_or_else(|| {
            log::error!(
                "Could not find material {}, falling back to {}",
                name,
                DEFAULT_MATERIAL_NAME
            );
            self.default_id()
        })
    }

    /// Material for `id`, or the default material for unknown ids
    pub fn get(&self, id: MaterialId) -> &Material {
        self.materials
            .get(id.0 as usize)
            .unwrap_or(&self.materials[self.default_id().0 as usize])
    }

    /// Number of registered materials, default included
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Always false; the default material is always present
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
