//! Material panel state and its application to the current model.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::resources::{Material, MaterialKind};
use crate::scene::{NodeHandle, Scene};

/// Values of the material panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    /// `#rrggbb`.
    pub color: String,
    pub metalness: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
    pub wireframe: bool,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Standard,
            color: "#ffffff".to_string(),
            metalness: 0.5,
            roughness: 0.5,
            env_map_intensity: 1.0,
            wireframe: false,
        }
    }
}

impl MaterialParams {
    /// Parsed color, or `None` if `color` is not `#rrggbb`.
    #[must_use]
    pub fn rgb(&self) -> Option<Vec3> {
        parse_hex_color(&self.color)
    }
}

/// Parses `#rrggbb` (the `#` is optional) into 0..=1 components.
#[must_use]
pub fn parse_hex_color(text: &str) -> Option<Vec3> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().map(hex_to_rgb)
}

/// `0xRRGGBB` into 0..=1 components.
#[must_use]
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Applies `params` to every material under `root`.
///
/// Materials of another kind are replaced by converted instances; the rest
/// are updated in place, so applying the same parameters twice changes
/// nothing. Returns the number of materials touched.
pub fn apply_material_params(scene: &mut Scene, root: NodeHandle, params: &MaterialParams) -> usize {
    let color = params.rgb();
    if color.is_none() {
        log::warn!("Ignoring malformed material color '{}'", params.color);
    }
    let metalness = params.metalness.clamp(0.0, 1.0);
    let roughness = params.roughness.clamp(0.0, 1.0);
    let env_intensity = params.env_map_intensity.clamp(0.0, 2.0);

    let mut touched = 0;
    for handle in scene.collect_subtree(root) {
        let Some(key) = scene.get_node(handle).and_then(|n| n.mesh()) else {
            continue;
        };
        let Some(mesh) = scene.meshes.get_mut(key) else {
            continue;
        };
        for material in &mut mesh.materials {
            if material.kind() != params.kind {
                *material = material.convert_to(params.kind);
            }
            sync_material(material, color, metalness, roughness, env_intensity, params.wireframe);
            touched += 1;
        }
    }
    log::trace!("Applied material params to {touched} material(s)");
    touched
}

fn sync_material(
    material: &mut Material,
    color: Option<Vec3>,
    metalness: f32,
    roughness: f32,
    env_intensity: f32,
    wireframe: bool,
) {
    if let Some(color) = color {
        material.set_color(color);
    }
    material.wireframe = wireframe;
    if let Some(pbr) = material.pbr_mut() {
        pbr.metalness = metalness;
        pbr.roughness = roughness;
        pbr.env_map_intensity = env_intensity;
    }
}

// ============================================================================
// Skins
// ============================================================================

/// Named materials of the current model. Exactly one is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkinSet {
    names: Vec<String>,
    current: Option<String>,
}

impl SkinSet {
    /// Distinct material names under `root`, in traversal order. The first
    /// one is current.
    #[must_use]
    pub fn discover(scene: &Scene, root: NodeHandle) -> Self {
        let mut names: Vec<String> = Vec::new();
        for handle in scene.collect_subtree(root) {
            let Some(mesh) = scene.mesh_of(handle) else {
                continue;
            };
            for name in mesh.materials.iter().filter_map(|m| m.name.as_deref()) {
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        let current = names.first().cloned();
        Self { names, current }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Shows materials named `name` and hides every other material under `root`.
    ///
    /// An unknown name hides everything. Returns whether `name` is a known skin.
    pub fn change_skin(&mut self, scene: &mut Scene, root: NodeHandle, name: &str) -> bool {
        let known = self.names.iter().any(|n| n == name);
        if !known {
            log::warn!("Unknown skin '{name}'");
        }
        for handle in scene.collect_subtree(root) {
            let Some(key) = scene.get_node(handle).and_then(|n| n.mesh()) else {
                continue;
            };
            if let Some(mesh) = scene.meshes.get_mut(key) {
                for material in &mut mesh.materials {
                    material.visible = material.name.as_deref() == Some(name);
                }
            }
        }
        self.current = known.then(|| name.to_string());
        log::info!("Skin switched to '{name}'");
        known
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(parse_hex_color("00ff00"), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn params_deserialize_with_type_key() {
        let params: MaterialParams =
            serde_json::from_str(r##"{"type":"phong","color":"#336699"}"##).unwrap();
        assert_eq!(params.kind, MaterialKind::Phong);
        assert_eq!(params.metalness, 0.5);
    }
}
