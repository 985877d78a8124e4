use crate::resources::geometry::{BoundingBox, Geometry};
use crate::resources::material::Material;
use crate::scene::TextureKey;

/// One draw unit: geometry plus an index into [`Mesh::materials`].
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub geometry: Geometry,
    pub material: usize,
}

/// A possibly multi-material mesh.
///
/// Each named material slot is a candidate "skin".
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
    pub materials: Vec<Material>,
}

impl Mesh {
    /// Single-primitive, single-material mesh.
    #[must_use]
    pub fn new(name: &str, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.to_string(),
            primitives: vec![Primitive { geometry, material: 0 }],
            materials: vec![material],
        }
    }

    #[must_use]
    pub fn material_of(&self, primitive: &Primitive) -> Option<&Material> {
        self.materials.get(primitive.material)
    }

    /// Union of primitive bounds in mesh-local space.
    #[must_use]
    pub fn local_bounding_box(&self) -> Option<BoundingBox> {
        self.primitives
            .iter()
            .filter_map(|p| p.geometry.bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    pub fn texture_keys(&self) -> impl Iterator<Item = TextureKey> + '_ {
        self.materials.iter().flat_map(|m| m.maps.iter())
    }
}
