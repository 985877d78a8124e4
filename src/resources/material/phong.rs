use glam::Vec3;

/// Blinn-Phong material.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPhongMaterial {
    pub color: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub emissive: Vec3,
}

impl MeshPhongMaterial {
    #[must_use]
    pub fn new(color: Vec3) -> Self {
        Self {
            color,
            specular: Vec3::splat(0x11 as f32 / 255.0),
            shininess: 30.0,
            emissive: Vec3::ZERO,
        }
    }
}

impl Default for MeshPhongMaterial {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}
