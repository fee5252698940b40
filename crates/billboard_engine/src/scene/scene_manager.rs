//! Billboard scene - owns nodes and billboard sets and renders them per frame
//!
//! The scene keeps two slot maps: [`SceneNode`]s arranged in a parent/child
//! hierarchy, and [`BillboardSet`]s optionally attached to a node. Each frame
//! [`BillboardScene::render`]:
//!
//! 1. refreshes derived node transforms top-down
//! 2. hands every set its node transform and the camera
//! 3. culls sets whose bounds are outside the view frustum
//! 4. lets the remaining sets rebuild geometry and join the render queue

use std::collections::HashMap;
use std::sync::Arc;

use crate::billboard::{BillboardError, BillboardResult, BillboardSet, BillboardSetFactory};
use crate::core::config::{BillboardSetConfig, EngineConfig};
use crate::foundation::collections::{new_key_type, SlotMap};
use crate::foundation::math::Transform;
use crate::render::{HardwareBufferManager, MaterialLibrary};
use crate::scene::{Camera, RenderQueue, SceneNode};

new_key_type! {
    /// Key of a node in a [`BillboardScene`]
    pub struct NodeKey;

    /// Key of a billboard set in a [`BillboardScene`]
    pub struct SetKey;
}

/// Scene configuration
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Skip sets whose bounding box is outside the view frustum
    pub enable_culling: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { enable_culling: true }
    }
}

#[derive(Debug)]
struct NodeEntry {
    node: SceneNode,
    parent: Option<NodeKey>,
}

#[derive(Debug)]
struct SetEntry {
    set: BillboardSet,
    node: Option<NodeKey>,
}

/// Owns nodes and billboard sets and drives their per-frame update
#[derive(Debug)]
pub struct BillboardScene {
    config: SceneConfig,
    factory: BillboardSetFactory,
    materials: MaterialLibrary,
    nodes: SlotMap<NodeKey, NodeEntry>,
    sets: SlotMap<SetKey, SetEntry>,
}

impl BillboardScene {
    /// Empty scene allocating buffers through `buffer_manager`
    pub fn new(buffer_manager: Arc<dyn HardwareBufferManager>) -> Self {
        Self::with_config(buffer_manager, SceneConfig::default())
    }

    /// Empty scene with custom configuration
    pub fn with_config(buffer_manager: Arc<dyn HardwareBufferManager>, config: SceneConfig) -> Self {
        Self {
            config,
            factory: BillboardSetFactory::new(buffer_manager),
            materials: MaterialLibrary::new(),
            nodes: SlotMap::with_key(),
            sets: SlotMap::with_key(),
        }
    }

    /// Scene configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Materials sets resolve names against
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Mutable access to the material library
    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Create a node under `parent`, or at the root
    ///
    /// A parent key that no longer exists places the node at the root.
    pub fn create_node(&mut self, name: impl Into<String>, parent: Option<NodeKey>) -> NodeKey {
        let parent = parent.filter(|key| self.nodes.contains_key(*key));
        self.nodes.insert(NodeEntry {
            node: SceneNode::new(name),
            parent,
        })
    }

    /// Node `key` refers to
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key).map(|entry| &entry.node)
    }

    /// Mutable access to node `key`
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key).map(|entry| &mut entry.node)
    }

    /// Remove a node; its children move to the root and its sets detach
    pub fn destroy_node(&mut self, key: NodeKey) -> bool {
        if self.nodes.remove(key).is_none() {
            return false;
        }
        for entry in self.nodes.values_mut() {
            if entry.parent == Some(key) {
                entry.parent = None;
            }
        }
        for entry in self.sets.values_mut() {
            if entry.node == Some(key) {
                entry.node = None;
                entry.set.set_parent_transform(None);
            }
        }
        true
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Refresh every node's derived transform from its ancestors
    pub fn update_nodes(&mut self) {
        let keys: Vec<NodeKey> = self.nodes.keys().collect();
        for key in keys {
            let parent = self.nodes[key].parent.map(|parent| self.world_transform(parent));
            self.nodes[key].node.update_from_parent(parent.as_ref());
        }
    }

    /// Local transforms composed from the root down to `key`
    fn world_transform(&self, key: NodeKey) -> Transform {
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(entry) = current.and_then(|key| self.nodes.get(key)) {
            chain.push(*entry.node.local_transform());
            current = entry.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Transform::identity(), |world, local| world.combine(local))
    }

    // ------------------------------------------------------------------
    // Billboard sets
    // ------------------------------------------------------------------

    /// Create a set through the factory
    ///
    /// # Errors
    ///
    /// Fails when a recognised parameter does not parse.
    pub fn create_set(&mut self, name: &str, params: &HashMap<String, String>) -> BillboardResult<SetKey> {
        let set = self.factory.create_instance(name, params)?;
        Ok(self.insert_set(set))
    }

    /// Create a set from a configuration
    pub fn create_set_from_config(&mut self, name: &str, config: &BillboardSetConfig) -> SetKey {
        let set = config.create_set(name, Arc::clone(self.factory.buffer_manager()), &self.materials);
        self.insert_set(set)
    }

    /// Create every set `config` describes
    ///
    /// # Errors
    ///
    /// Fails without creating anything when a set description is invalid.
    pub fn load_config(&mut self, config: &EngineConfig) -> BillboardResult<Vec<SetKey>> {
        config.validate().map_err(BillboardError::InvalidConfig)?;
        Ok(config
            .sets
            .iter()
            .map(|(name, set)| self.create_set_from_config(name, set))
            .collect())
    }

    /// Take ownership of an existing set
    pub fn insert_set(&mut self, set: BillboardSet) -> SetKey {
        log::debug!("Adding billboard set {} to scene", set.name());
        self.sets.insert(SetEntry { set, node: None })
    }

    /// Remove a set, returning it
    pub fn destroy_set(&mut self, key: SetKey) -> Option<BillboardSet> {
        self.sets.remove(key).map(|entry| entry.set)
    }

    /// Set `key` refers to
    pub fn set(&self, key: SetKey) -> Option<&BillboardSet> {
        self.sets.get(key).map(|entry| &entry.set)
    }

    /// Mutable access to set `key`
    pub fn set_mut(&mut self, key: SetKey) -> Option<&mut BillboardSet> {
        self.sets.get_mut(key).map(|entry| &mut entry.set)
    }

    /// Key of the first set called `name`
    pub fn find_set(&self, name: &str) -> Option<SetKey> {
        self.sets
            .iter()
            .find(|(_, entry)| entry.set.name() == name)
            .map(|(key, _)| key)
    }

    /// Number of sets
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Attach set `key` to `node`, or detach it with `None`
    ///
    /// Returns `false` when the set or node does not exist.
    pub fn attach_set(&mut self, key: SetKey, node: Option<NodeKey>) -> bool {
        if node.is_some_and(|node| !self.nodes.contains_key(node)) {
            return false;
        }
        let Some(entry) = self.sets.get_mut(key) else {
            return false;
        };
        entry.node = node;
        if node.is_none() {
            entry.set.set_parent_transform(None);
        }
        true
    }

    /// Node set `key` is attached to
    pub fn attached_node(&self, key: SetKey) -> Option<NodeKey> {
        self.sets.get(key).and_then(|entry| entry.node)
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Update nodes and queue every visible set for `camera`
    ///
    /// Returns the number of sets that were processed. The queue is sorted
    /// before returning.
    ///
    /// # Errors
    ///
    /// Stops at the first set whose buffers cannot be created or locked.
    pub fn render(&mut self, camera: &Camera, queue: &mut RenderQueue) -> BillboardResult<usize> {
        self.update_nodes();
        queue.set_camera(camera);
        let frustum = camera.frustum();

        let mut rendered = 0;
        for entry in self.sets.values_mut() {
            let parent = entry
                .node
                .and_then(|node| self.nodes.get(node))
                .map(|node| *node.node.derived_transform());
            entry.set.set_parent_transform(parent);

            if self.config.enable_culling {
                entry.set.refresh_bounds();
                let world_bounds = entry
                    .set
                    .bounding_box()
                    .transformed(&parent.unwrap_or_else(Transform::identity));
                if !frustum.intersects_aabb(&world_bounds) {
                    log::trace!("Culled billboard set {}", entry.set.name());
                    continue;
                }
            }

            entry.set.notify_current_camera(camera);
            entry.set.update_render_queue(queue)?;
            rendered += 1;
        }

        queue.sort();
        log::trace!("Rendered {} of {} billboard sets", rendered, self.sets.len());
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::SystemBufferManager;
    use crate::scene::render_queue::groups;
    use approx::assert_relative_eq;

    fn scene() -> BillboardScene {
        BillboardScene::new(Arc::new(SystemBufferManager::new()))
    }

    #[test]
    fn test_create_and_find_sets() {
        let mut scene = scene();
        let key = scene.create_set("smoke", &HashMap::new()).unwrap();

        assert_eq!(scene.find_set("smoke"), Some(key));
        assert_eq!(scene.set(key).unwrap().pool_size(), 20);
        assert!(scene.destroy_set(key).is_some());
        assert_eq!(scene.set_count(), 0);
    }

    #[test]
    fn test_nested_node_transforms() {
        let mut scene = scene();
        let root = scene.create_node("root", None);
        let child = scene.create_node("child", Some(root));
        scene.node_mut(root).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        scene.node_mut(child).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));

        scene.update_nodes();

        assert_relative_eq!(scene.node(child).unwrap().derived_position(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_render_queues_visible_sets() {
        let mut scene = scene();
        let node = scene.create_node("emitter", None);
        scene.node_mut(node).unwrap().set_position(Vec3::new(0.0, 0.0, -50.0));

        let key = scene.create_set("sparks", &HashMap::new()).unwrap();
        assert!(scene.attach_set(key, Some(node)));
        let set = scene.set_mut(key).unwrap();
        set.set_default_dimensions(1.0, 1.0);
        set.create_billboard(Vec3::zeros());

        let camera = Camera::default();
        let mut queue = RenderQueue::new(&camera);
        let rendered = scene.render(&camera, &mut queue).unwrap();

        assert_eq!(rendered, 1);
        let commands = queue.group(groups::MAIN).unwrap().commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name, "sparks");
        assert_relative_eq!(commands[0].transform[(2, 3)], -50.0);
    }

    #[test]
    fn test_sets_behind_camera_are_culled() {
        let mut scene = scene();
        let key = scene.create_set("behind", &HashMap::new()).unwrap();
        let set = scene.set_mut(key).unwrap();
        set.set_default_dimensions(1.0, 1.0);
        set.create_billboard(Vec3::new(0.0, 0.0, 50.0));

        let camera = Camera::default();
        let mut queue = RenderQueue::new(&camera);

        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_moved_billboard_brings_set_into_view() {
        let mut scene = scene();
        let key = scene.create_set("moved", &HashMap::new()).unwrap();
        let set = scene.set_mut(key).unwrap();
        set.set_default_dimensions(1.0, 1.0);
        let handle = set.create_billboard(Vec3::new(0.0, 0.0, 50.0)).unwrap();

        let camera = Camera::default();
        let mut queue = RenderQueue::new(&camera);
        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 0);

        scene.set_mut(key).unwrap().get_mut(handle).unwrap().set_position(Vec3::new(0.0, 0.0, -10.0));
        let mut queue = RenderQueue::new(&camera);
        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 1);
        assert_eq!(queue.command_count(), 1);
    }

    #[test]
    fn test_static_set_bounds_follow_data_changes() {
        let mut scene = scene();
        let key = scene.create_set("static", &HashMap::new()).unwrap();
        let set = scene.set_mut(key).unwrap();
        set.set_auto_update(false);
        let handle = set.create_billboard(Vec3::new(0.0, 0.0, -10.0)).unwrap();

        let camera = Camera::default();
        let mut queue = RenderQueue::new(&camera);
        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 1);

        scene.set_mut(key).unwrap().get_mut(handle).unwrap().set_position(Vec3::new(0.0, 0.0, 500.0));
        let mut queue = RenderQueue::new(&camera);
        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 0);
    }

    #[test]
    fn test_world_space_set_under_moved_node_is_not_culled() {
        let mut scene = scene();
        let node = scene.create_node("far", None);
        scene.node_mut(node).unwrap().set_position(Vec3::new(0.0, 0.0, 100.0));

        let key = scene.create_set("world", &HashMap::new()).unwrap();
        assert!(scene.attach_set(key, Some(node)));
        let set = scene.set_mut(key).unwrap();
        set.set_billboards_in_world_space(true);
        set.set_default_dimensions(1.0, 1.0);
        set.create_billboard(Vec3::new(0.0, 0.0, -10.0));

        let camera = Camera::default();
        let mut queue = RenderQueue::new(&camera);
        assert_eq!(scene.render(&camera, &mut queue).unwrap(), 1);

        let set = scene.set(key).unwrap();
        assert_relative_eq!(set.bounding_box().center().z, -110.0);
    }

    #[test]
    fn test_destroying_node_detaches_sets() {
        let mut scene = scene();
        let node = scene.create_node("n", None);
        let key = scene.create_set("s", &HashMap::new()).unwrap();
        scene.attach_set(key, Some(node));

        assert!(scene.destroy_node(node));
        assert_eq!(scene.attached_node(key), None);
        assert!(!scene.attach_set(key, Some(node)));
    }

    #[test]
    fn test_load_config_creates_named_sets() {
        let mut scene = scene();
        let config = EngineConfig::new()
            .with_set("a", BillboardSetConfig::new().with_pool_size(3))
            .with_set("b", BillboardSetConfig::new());

        let keys = scene.load_config(&config).unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(scene.set(scene.find_set("a").unwrap()).unwrap().pool_size(), 3);

        let broken = EngineConfig::new().with_set("c", BillboardSetConfig::new().with_default_dimensions(f32::NAN, 1.0));
        assert!(matches!(scene.load_config(&broken), Err(BillboardError::InvalidConfig(_))));
        assert_eq!(scene.set_count(), 2);
    }
}
