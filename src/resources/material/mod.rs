//! Materials
//!
//! A [`Material`] carries the properties every shading model shares (name,
//! visibility, wireframe, opacity, texture maps) and a [`MaterialData`]
//! variant for the model-specific parameters. Switching shading model goes
//! through [`Material::convert_to`], which produces a fresh instance and
//! carries over everything the two models have in common.

pub mod basic;
pub mod phong;
pub mod physical;
pub mod standard;

pub use basic::MeshBasicMaterial;
pub use phong::MeshPhongMaterial;
pub use physical::MeshPhysicalMaterial;
pub use standard::MeshStandardMaterial;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::TextureKey;

/// Shading model selector exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Standard,
    Phong,
    Basic,
    Physical,
}

impl MaterialKind {
    /// Whether metalness, roughness and environment intensity mean anything.
    #[must_use]
    pub fn supports_pbr(self) -> bool {
        matches!(self, Self::Standard | Self::Physical)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialData {
    Basic(MeshBasicMaterial),
    Phong(MeshPhongMaterial),
    Standard(MeshStandardMaterial),
    Physical(MeshPhysicalMaterial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Texture slots shared by all shading models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialMaps {
    pub map: Option<TextureKey>,
    pub normal_map: Option<TextureKey>,
    pub emissive_map: Option<TextureKey>,
    pub metalness_roughness_map: Option<TextureKey>,
    pub ao_map: Option<TextureKey>,
}

/// Names one of the [`MaterialMaps`] slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    BaseColor,
    Normal,
    Emissive,
    MetallicRoughness,
    Occlusion,
}

impl MaterialMaps {
    #[must_use]
    pub fn get(&self, slot: TextureSlot) -> Option<TextureKey> {
        match slot {
            TextureSlot::BaseColor => self.map,
            TextureSlot::Normal => self.normal_map,
            TextureSlot::Emissive => self.emissive_map,
            TextureSlot::MetallicRoughness => self.metalness_roughness_map,
            TextureSlot::Occlusion => self.ao_map,
        }
    }

    pub fn set(&mut self, slot: TextureSlot, texture: Option<TextureKey>) {
        let target = match slot {
            TextureSlot::BaseColor => &mut self.map,
            TextureSlot::Normal => &mut self.normal_map,
            TextureSlot::Emissive => &mut self.emissive_map,
            TextureSlot::MetallicRoughness => &mut self.metalness_roughness_map,
            TextureSlot::Occlusion => &mut self.ao_map,
        };
        *target = texture;
    }

    pub fn iter(&self) -> impl Iterator<Item = TextureKey> {
        [
            self.map,
            self.normal_map,
            self.emissive_map,
            self.metalness_roughness_map,
            self.ao_map,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Identity of this instance. A type switch yields a new uuid.
    pub uuid: Uuid,
    /// Name from the source file. Skins are keyed on it.
    pub name: Option<String>,
    pub visible: bool,
    pub wireframe: bool,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    pub maps: MaterialMaps,
    pub data: MaterialData,
}

impl Material {
    fn from_data(data: MaterialData) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            visible: true,
            wireframe: false,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            maps: MaterialMaps::default(),
            data,
        }
    }

    #[must_use]
    pub fn new_basic(color: Vec3) -> Self {
        Self::from_data(MaterialData::Basic(MeshBasicMaterial::new(color)))
    }

    #[must_use]
    pub fn new_phong(color: Vec3) -> Self {
        Self::from_data(MaterialData::Phong(MeshPhongMaterial::new(color)))
    }

    #[must_use]
    pub fn new_standard(color: Vec3) -> Self {
        Self::from_data(MaterialData::Standard(MeshStandardMaterial::new(color)))
    }

    #[must_use]
    pub fn new_physical(color: Vec3) -> Self {
        Self::from_data(MaterialData::Physical(MeshPhysicalMaterial::new(color)))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        match self.data {
            MaterialData::Basic(_) => MaterialKind::Basic,
            MaterialData::Phong(_) => MaterialKind::Phong,
            MaterialData::Standard(_) => MaterialKind::Standard,
            MaterialData::Physical(_) => MaterialKind::Physical,
        }
    }

    #[must_use]
    pub fn color(&self) -> Vec3 {
        match &self.data {
            MaterialData::Basic(m) => m.color,
            MaterialData::Phong(m) => m.color,
            MaterialData::Standard(m) => m.color,
            MaterialData::Physical(m) => m.standard.color,
        }
    }

    pub fn set_color(&mut self, color: Vec3) {
        match &mut self.data {
            MaterialData::Basic(m) => m.color = color,
            MaterialData::Phong(m) => m.color = color,
            MaterialData::Standard(m) => m.color = color,
            MaterialData::Physical(m) => m.standard.color = color,
        }
    }

    #[must_use]
    pub fn emissive(&self) -> Option<Vec3> {
        match &self.data {
            MaterialData::Basic(_) => None,
            MaterialData::Phong(m) => Some(m.emissive),
            MaterialData::Standard(m) => Some(m.emissive),
            MaterialData::Physical(m) => Some(m.standard.emissive),
        }
    }

    fn set_emissive(&mut self, emissive: Vec3) {
        match &mut self.data {
            MaterialData::Basic(_) => {}
            MaterialData::Phong(m) => m.emissive = emissive,
            MaterialData::Standard(m) => m.emissive = emissive,
            MaterialData::Physical(m) => m.standard.emissive = emissive,
        }
    }

    /// Metallic-roughness parameters, for standard and physical materials only.
    #[must_use]
    pub fn pbr(&self) -> Option<&MeshStandardMaterial> {
        match &self.data {
            MaterialData::Standard(m) => Some(m),
            MaterialData::Physical(m) => Some(&m.standard),
            _ => None,
        }
    }

    pub fn pbr_mut(&mut self) -> Option<&mut MeshStandardMaterial> {
        match &mut self.data {
            MaterialData::Standard(m) => Some(m),
            MaterialData::Physical(m) => Some(&mut m.standard),
            _ => None,
        }
    }

    /// Builds a new instance of another shading model.
    ///
    /// Shared properties, maps, color and emissive carry over. PBR
    /// parameters carry over between standard and physical. Converting to
    /// the current kind still yields a new instance.
    #[must_use]
    pub fn convert_to(&self, kind: MaterialKind) -> Material {
        let color = self.color();
        let mut converted = match kind {
            MaterialKind::Basic => Self::new_basic(color),
            MaterialKind::Phong => Self::new_phong(color),
            MaterialKind::Standard => Self::new_standard(color),
            MaterialKind::Physical => Self::new_physical(color),
        };

        converted.name.clone_from(&self.name);
        converted.visible = self.visible;
        converted.wireframe = self.wireframe;
        converted.opacity = self.opacity;
        converted.transparent = self.transparent;
        converted.side = self.side;
        converted.maps = self.maps;

        if let Some(emissive) = self.emissive() {
            converted.set_emissive(emissive);
        }
        if let (Some(src), Some(dst)) = (self.pbr().cloned(), converted.pbr_mut()) {
            *dst = src;
        }
        converted
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new_standard(Vec3::ONE)
    }
}
