//! CPU-side resources: geometry, meshes, materials and textures.

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod texture;

pub use geometry::{BoundingBox, Geometry, create_box};
pub use material::{Material, MaterialData, MaterialKind, MaterialMaps, Side, TextureSlot};
pub use mesh::{Mesh, Primitive};
pub use texture::Texture;
