use glam::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    /// Uniform fill light with no direction.
    Ambient,
    /// Parallel light along the node's -Z, or from its position towards the origin.
    Directional { cast_shadows: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional { cast_shadows: false },
        }
    }
}
