use glam::Affine3A;

use crate::scene::transform::Transform;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeHandle};
use crate::scene::helper::HelperKind;

/// What a node carries besides its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Pure grouping node.
    Group,
    Mesh(MeshKey),
    Light(LightKey),
    Camera(CameraKey),
    /// Grid, axes and other editor overlays. Never picked or exported.
    Helper(HelperKind),
}

/// A scene node containing only hierarchy, transform and visibility.
///
/// Component data (meshes, lights, cameras) is stored in the [`Scene`]'s pools
/// and referenced through [`NodeKind`].
///
/// [`Scene`]: crate::scene::Scene
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,

    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub transform: Transform,
    pub visible: bool,
    pub kind: NodeKind,
}

impl Node {
    /// Creates a group node with default transform and visibility.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    #[must_use]
    pub fn with_kind(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<MeshKey> {
        match self.kind {
            NodeKind::Mesh(key) => Some(key),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_helper(&self) -> bool {
        matches!(self.kind, NodeKind::Helper(_))
    }

    /// World matrix as of the last [`Scene::update_matrix_world`](crate::scene::Scene::update_matrix_world).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("")
    }
}
