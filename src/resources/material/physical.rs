use glam::Vec3;

use super::standard::MeshStandardMaterial;

/// Standard material plus clearcoat, sheen and index of refraction.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPhysicalMaterial {
    pub standard: MeshStandardMaterial,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub sheen: f32,
    pub ior: f32,
}

impl MeshPhysicalMaterial {
    #[must_use]
    pub fn new(color: Vec3) -> Self {
        Self {
            standard: MeshStandardMaterial::new(color),
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            sheen: 0.0,
            ior: 1.5,
        }
    }
}

impl Default for MeshPhysicalMaterial {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}
