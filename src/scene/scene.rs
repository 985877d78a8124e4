use glam::{Affine3A, Vec3};
use slotmap::SlotMap;

use crate::resources::{BoundingBox, Mesh, Texture};
use crate::scene::camera::Camera;
use crate::scene::environment::Environment;
use crate::scene::helper::Helper;
use crate::scene::light::Light;
use crate::scene::node::{Node, NodeKind};
use crate::scene::{CameraKey, LightKey, MeshKey, NodeHandle, TextureKey};

/// Scene graph container.
///
/// Owns every node and component of one editor session. Other parts of the
/// editor hold [`NodeHandle`]s into it and never copy node state out.
pub struct Scene {
    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Component pools ====
    pub meshes: SlotMap<MeshKey, Mesh>,
    pub cameras: SlotMap<CameraKey, Camera>,
    pub lights: SlotMap<LightKey, Light>,
    pub textures: SlotMap<TextureKey, Texture>,
    pub helpers: Vec<(NodeHandle, Helper)>,

    pub environment: Environment,
    /// Clear color, linear RGB.
    pub background: Vec3,

    pub active_camera: Option<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            helpers: Vec::new(),
            environment: Environment::new(),
            background: Vec3::ZERO,
            active_camera: None,
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Adds a node at the root level.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, mut child: Node, parent: NodeHandle) -> NodeHandle {
        if !self.nodes.contains_key(parent) {
            log::warn!("add_to_parent: parent not found, adding '{}' at root", child.name);
            return self.add_node(child);
        }
        child.parent = Some(parent);
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Re-parents `child` under `parent`, detaching it from its old parent.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::error!("attach: node not found");
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Cannot attach a node below its own descendant");
            return;
        }

        self.detach_from_parent(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    fn detach_from_parent(&mut self, handle: NodeHandle) {
        match self.nodes.get(handle).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent)
                    && let Some(i) = p.children.iter().position(|&x| x == handle)
                {
                    p.children.remove(i);
                }
            }
            None => {
                if let Some(i) = self.root_nodes.iter().position(|&x| x == handle) {
                    self.root_nodes.remove(i);
                }
            }
        }
    }

    /// Whether `ancestor` is `node` or one of its parents.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = Some(node);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Removes a node and its whole subtree, releasing their components.
    ///
    /// Textures no longer referenced by any remaining mesh are released too.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.detach_from_parent(handle);

        let subtree = self.collect_subtree(handle);
        for node_handle in subtree {
            let Some(node) = self.nodes.remove(node_handle) else {
                continue;
            };
            match node.kind {
                NodeKind::Mesh(key) => {
                    self.meshes.remove(key);
                }
                NodeKind::Camera(key) => {
                    self.cameras.remove(key);
                    if self.active_camera == Some(node_handle) {
                        self.active_camera = None;
                    }
                }
                NodeKind::Light(key) => {
                    self.lights.remove(key);
                }
                NodeKind::Helper(_) => {
                    self.helpers.retain(|(h, _)| *h != node_handle);
                }
                NodeKind::Group => {}
            }
        }

        self.release_unused_textures();
    }

    fn release_unused_textures(&mut self) {
        if self.textures.is_empty() {
            return;
        }
        let in_use: rustc_hash::FxHashSet<TextureKey> =
            self.meshes.values().flat_map(Mesh::texture_keys).collect();
        let before = self.textures.len();
        self.textures.retain(|key, _| in_use.contains(&key));
        let released = before - self.textures.len();
        if released > 0 {
            log::debug!("Released {released} unused texture(s)");
        }
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Depth-first pre-order handles of `root` and its descendants.
    #[must_use]
    pub fn collect_subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            out.push(handle);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every node reachable from the root list, pre-order.
    #[must_use]
    pub fn reachable_nodes(&self) -> Vec<NodeHandle> {
        self.root_nodes
            .iter()
            .flat_map(|&root| self.collect_subtree(root))
            .collect()
    }

    /// Whether the node and all its ancestors are visible.
    #[must_use]
    pub fn is_visible_in_hierarchy(&self, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            match self.nodes.get(h) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn add_mesh(&mut self, mesh: Mesh) -> NodeHandle {
        let name = mesh.name.clone();
        let key = self.meshes.insert(mesh);
        self.add_node(Node::with_kind(&name, NodeKind::Mesh(key)))
    }

    pub fn add_mesh_to_parent(&mut self, mesh: Mesh, parent: NodeHandle) -> NodeHandle {
        let name = mesh.name.clone();
        let key = self.meshes.insert(mesh);
        self.add_to_parent(Node::with_kind(&name, NodeKind::Mesh(key)), parent)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let key = self.cameras.insert(camera);
        self.add_node(Node::with_kind("Camera", NodeKind::Camera(key)))
    }

    pub fn add_light(&mut self, light: Light) -> NodeHandle {
        let key = self.lights.insert(light);
        self.add_node(Node::with_kind("Light", NodeKind::Light(key)))
    }

    pub fn add_helper(&mut self, helper: Helper) -> NodeHandle {
        let name = format!("{:?}Helper", helper.kind);
        let handle = self.add_node(Node::with_kind(&name, NodeKind::Helper(helper.kind)));
        self.helpers.push((handle, helper));
        handle
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    /// Mesh component of a node, if it has one.
    #[must_use]
    pub fn mesh_of(&self, handle: NodeHandle) -> Option<&Mesh> {
        self.meshes.get(self.nodes.get(handle)?.mesh()?)
    }

    /// The active camera component, with its world matrix as of the last update.
    #[must_use]
    pub fn main_camera(&self) -> Option<&Camera> {
        let node = self.nodes.get(self.active_camera?)?;
        match node.kind {
            NodeKind::Camera(key) => self.cameras.get(key),
            _ => None,
        }
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut Camera> {
        let node = self.nodes.get(self.active_camera?)?;
        match node.kind {
            NodeKind::Camera(key) => self.cameras.get_mut(key),
            _ => None,
        }
    }

    // ========================================================================
    // Matrix update
    // ========================================================================

    /// Recomputes world matrices for the whole graph and refreshes the
    /// active camera's view-projection.
    pub fn update_matrix_world(&mut self) {
        let roots = self.root_nodes.clone();
        for root in roots {
            self.update_subtree_from(root, Affine3A::IDENTITY);
        }
        self.sync_cameras();
    }

    /// Recomputes world matrices below `root`, using its parent's current
    /// world matrix.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        let parent_world = self
            .nodes
            .get(root)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);
        self.update_subtree_from(root, parent_world);
        self.sync_cameras();
    }

    // Iterative to survive deep hierarchies
    fn update_subtree_from(&mut self, root: NodeHandle, parent_world: Affine3A) {
        let mut stack = vec![(root, parent_world)];
        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * node.transform.local_matrix;
            node.transform.world_matrix = world;
            stack.extend(node.children.iter().map(|&c| (c, world)));
        }
    }

    fn sync_cameras(&mut self) {
        for node in self.nodes.values() {
            if let NodeKind::Camera(key) = node.kind
                && let Some(camera) = self.cameras.get_mut(key)
            {
                camera.update_view_projection(&node.transform.world_matrix);
            }
        }
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    /// World-space bounds of the meshes under `root`, using current world
    /// matrices. `None` when the subtree has no geometry.
    #[must_use]
    pub fn get_bbox_of_node(&self, root: NodeHandle) -> Option<BoundingBox> {
        self.collect_subtree(root)
            .into_iter()
            .filter_map(|handle| {
                let node = self.nodes.get(handle)?;
                let local = self.meshes.get(node.mesh()?)?.local_bounding_box()?;
                Some(local.transform(&node.transform.world_matrix))
            })
            .reduce(|a, b| a.union(&b))
    }
}
