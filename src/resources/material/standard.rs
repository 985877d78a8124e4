use glam::Vec3;

/// Metallic-roughness PBR material.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStandardMaterial {
    pub color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
    /// Scales the contribution of the scene environment map, 0..=2 in the UI.
    pub env_map_intensity: f32,
    pub emissive: Vec3,
}

impl MeshStandardMaterial {
    #[must_use]
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            metalness: 0.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
            emissive: Vec3::ZERO,
        }
    }
}

impl Default for MeshStandardMaterial {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}
