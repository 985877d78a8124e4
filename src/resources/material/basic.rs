use glam::Vec3;

/// Unlit material: flat color only.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBasicMaterial {
    pub color: Vec3,
}

impl MeshBasicMaterial {
    #[must_use]
    pub fn new(color: Vec3) -> Self {
        Self { color }
    }
}

impl Default for MeshBasicMaterial {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}
