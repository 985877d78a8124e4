use crate::resources::{Mesh, Texture, TextureSlot};
use crate::scene::node::Node;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, Scene};

/// A mesh as decoded, with texture references still expressed as indices
/// into [`Prefab::textures`].
#[derive(Debug, Clone)]
pub struct PrefabMesh {
    pub mesh: Mesh,
    /// `(material slot in mesh, map slot, prefab texture index)`
    pub texture_bindings: Vec<(usize, TextureSlot, usize)>,
}

/// Prefab node: data only, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices into [`Prefab::nodes`].
    pub children_indices: Vec<usize>,
    pub mesh: Option<PrefabMesh>,
}

/// Intermediate result of decoding a model file.
///
/// Holds no scene handles, so it can be produced off the main flow and
/// dropped without side effects when a load turns out to be stale.
/// [`Prefab::instantiate`] turns it into scene nodes.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    pub nodes: Vec<PrefabNode>,
    pub root_indices: Vec<usize>,
    pub textures: Vec<Texture>,
}

impl Prefab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.mesh.is_some()).count()
    }

    /// Adds the prefab to `scene` under a new root group named `name`.
    ///
    /// Returns the group's handle. Cyclic or dangling child indices are
    /// skipped.
    pub fn instantiate(&self, scene: &mut Scene, name: &str) -> NodeHandle {
        let texture_keys: Vec<_> = self
            .textures
            .iter()
            .map(|t| scene.add_texture(t.clone()))
            .collect();

        let root = scene.add_node(Node::new(name));
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, NodeHandle)> =
            self.root_indices.iter().rev().map(|&i| (i, root)).collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(prefab_node) = self.nodes.get(index) else {
                log::warn!("Prefab node index {index} out of range");
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                log::warn!("Prefab node {index} reached twice, skipping");
                continue;
            }

            let handle = match &prefab_node.mesh {
                Some(prefab_mesh) => {
                    let mut mesh = prefab_mesh.mesh.clone();
                    for &(material, slot, texture) in &prefab_mesh.texture_bindings {
                        if let (Some(m), Some(&key)) =
                            (mesh.materials.get_mut(material), texture_keys.get(texture))
                        {
                            m.maps.set(slot, Some(key));
                        }
                    }
                    scene.add_mesh_to_parent(mesh, parent)
                }
                None => scene.add_to_parent(Node::new(""), parent),
            };

            if let Some(node) = scene.get_node_mut(handle) {
                node.name = prefab_node
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("node_{index}"));
                node.transform = prefab_node.transform.clone();
                node.transform.mark_dirty();
            }

            stack.extend(
                prefab_node
                    .children_indices
                    .iter()
                    .rev()
                    .map(|&child| (child, handle)),
            );
        }

        root
    }
}
