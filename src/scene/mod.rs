//! Scene Graph
//!
//! Hierarchy and component storage for one editor session:
//! - [`Node`]: hierarchy plus transform, tagged with a [`NodeKind`]
//! - [`Transform`]: TRS with cached local/world matrices
//! - [`Scene`]: node arena and component pools
//! - [`Camera`], [`Light`], [`Helper`], [`Environment`]: components

pub mod camera;
pub mod environment;
pub mod helper;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use environment::{Environment, EnvironmentMap};
pub use helper::{Helper, HelperKind};
pub use light::{Light, LightKind};
pub use node::{Node, NodeKind};
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct CameraKey;
    pub struct LightKey;
    pub struct TextureKey;
}
