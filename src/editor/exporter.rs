//! glTF 2.0 export of the current model.
//!
//! The subtree under the model root is written node by node with its local
//! transforms, so edits made with the gizmo survive the round trip. Geometry,
//! materials and embedded textures share one binary buffer, stored either in
//! the GLB `BIN` chunk or as a base64 `data:` URI in a `.gltf` file.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use gltf::json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use rustc_hash::FxHashMap;

use crate::config::{ExportFormat, ExportSettings};
use crate::errors::{EditorError, Result};
use crate::resources::{Geometry, Material, Mesh, Side, TextureSlot};
use crate::scene::node::NodeKind;
use crate::scene::{NodeHandle, Scene, TextureKey};

/// A serialized model ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Destination of exported files (browser download, file system, upload).
pub trait DownloadSink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<()>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, artifact: &ExportArtifact) -> Result<()> {
        let path = self.dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)?;
        log::info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        Ok(())
    }
}

/// Serializes the subtree rooted at `root`.
pub fn export_subtree(scene: &Scene, root: NodeHandle, settings: &ExportSettings) -> Result<ExportArtifact> {
    if !scene.contains(root) {
        return Err(EditorError::Export("model is no longer part of the scene".into()));
    }

    let mut builder = DocumentBuilder::new(settings.only_visible);
    let root_node = builder
        .push_node(scene, root)?
        .ok_or_else(|| EditorError::Export("model is hidden, nothing to export".into()))?;
    let document = builder.finish(root_node);

    let bytes = match settings.format {
        ExportFormat::Glb => document.into_glb()?,
        ExportFormat::Gltf => document.into_embedded_gltf()?,
    };

    log::info!("Exported '{}' ({} bytes)", settings.file_name(), bytes.len());
    Ok(ExportArtifact {
        file_name: settings.file_name(),
        mime_type: settings.format.mime_type(),
        bytes,
    })
}

// ============================================================================
// Document assembly
// ============================================================================

struct DocumentBuilder {
    root: json::Root,
    bin: Vec<u8>,
    textures: FxHashMap<TextureKey, json::Index<json::Texture>>,
    only_visible: bool,
}

struct Document {
    root: json::Root,
    bin: Vec<u8>,
}

impl DocumentBuilder {
    fn new(only_visible: bool) -> Self {
        let mut root = json::Root::default();
        root.asset = json::Asset {
            version: "2.0".to_string(),
            generator: Some(concat!("animsync ", env!("CARGO_PKG_VERSION")).to_string()),
            ..Default::default()
        };
        Self {
            root,
            bin: Vec::new(),
            textures: FxHashMap::default(),
            only_visible,
        }
    }

    /// Pushes `handle` and its descendants. Returns `None` for skipped nodes.
    fn push_node(&mut self, scene: &Scene, handle: NodeHandle) -> Result<Option<json::Index<json::Node>>> {
        let Some(node) = scene.get_node(handle) else {
            return Ok(None);
        };
        if (self.only_visible && !node.visible) || node.is_helper() {
            return Ok(None);
        }

        let mut children = Vec::with_capacity(node.children().len());
        for &child in node.children() {
            if let Some(index) = self.push_node(scene, child)? {
                children.push(index);
            }
        }

        let mesh = match node.kind {
            NodeKind::Mesh(key) => match scene.meshes.get(key) {
                Some(mesh) => self.push_mesh(scene, mesh)?,
                None => None,
            },
            _ => None,
        };

        let t = &node.transform;
        Ok(Some(self.root.push(json::Node {
            name: (!node.name.is_empty()).then(|| node.name.clone()),
            translation: Some(t.position.to_array()),
            rotation: Some(json::scene::UnitQuaternion(t.rotation.to_array())),
            scale: Some(t.scale.to_array()),
            children: (!children.is_empty()).then_some(children),
            mesh,
            ..Default::default()
        })))
    }

    fn push_mesh(&mut self, scene: &Scene, mesh: &Mesh) -> Result<Option<json::Index<json::Mesh>>> {
        let mut materials: FxHashMap<usize, json::Index<json::Material>> = FxHashMap::default();
        let mut primitives = Vec::with_capacity(mesh.primitives.len());

        for primitive in &mesh.primitives {
            let Some(material) = mesh.material_of(primitive) else {
                continue;
            };
            if self.only_visible && !material.visible {
                continue;
            }
            let Some((attributes, indices)) = self.push_geometry(&primitive.geometry)? else {
                continue;
            };
            let material_index = match materials.get(&primitive.material) {
                Some(&index) => index,
                None => {
                    let index = self.push_material(scene, material);
                    materials.insert(primitive.material, index);
                    index
                }
            };

            primitives.push(json::mesh::Primitive {
                attributes,
                indices,
                material: Some(material_index),
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
                extensions: None,
                extras: Default::default(),
            });
        }

        if primitives.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.root.push(json::Mesh {
            name: Some(mesh.name.clone()),
            primitives,
            weights: None,
            extensions: Default::default(),
            extras: Default::default(),
        })))
    }

    #[allow(clippy::type_complexity)]
    fn push_geometry(
        &mut self,
        geometry: &Geometry,
    ) -> Result<
        Option<(
            BTreeMap<json::validation::Checked<json::mesh::Semantic>, json::Index<json::Accessor>>,
            Option<json::Index<json::Accessor>>,
        )>,
    > {
        let Some(bbox) = geometry.bounding_box() else {
            return Ok(None);
        };
        let count = geometry.vertex_count();
        let mut attributes = BTreeMap::new();

        let positions = self.push_accessor(
            geometry.positions.iter().flat_map(|p| p.to_array()),
            count,
            json::accessor::Type::Vec3,
            Some((bbox.min.to_array().to_vec(), bbox.max.to_array().to_vec())),
        );
        attributes.insert(Valid(json::mesh::Semantic::Positions), positions);

        if geometry.normals.len() == count {
            let normals = self.push_accessor(
                geometry.normals.iter().flat_map(|n| n.to_array()),
                count,
                json::accessor::Type::Vec3,
                None,
            );
            attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
        }
        if geometry.uvs.len() == count {
            let uvs = self.push_accessor(
                geometry.uvs.iter().flat_map(|uv| uv.to_array()),
                count,
                json::accessor::Type::Vec2,
                None,
            );
            attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), uvs);
        }

        let indices = match &geometry.indices {
            Some(indices) if indices.iter().any(|&i| i as usize >= count) => {
                return Err(EditorError::Export(format!(
                    "index out of range for a {count}-vertex geometry"
                )));
            }
            Some(indices) => Some(self.push_indices(indices)),
            None => None,
        };

        Ok(Some((attributes, indices)))
    }

    fn push_view(&mut self, bytes: &[u8], target: Option<json::buffer::Target>) -> json::Index<json::buffer::View> {
        let byte_offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        let byte_length = self.bin.len() - byte_offset;
        pad_to_4(&mut self.bin);

        self.root.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: USize64::from(byte_length),
            byte_offset: Some(USize64::from(byte_offset)),
            byte_stride: None,
            target: target.map(Valid),
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    fn push_accessor(
        &mut self,
        components: impl Iterator<Item = f32>,
        count: usize,
        type_: json::accessor::Type,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> json::Index<json::Accessor> {
        let bytes: Vec<u8> = components.flat_map(f32::to_le_bytes).collect();
        let view = self.push_view(&bytes, Some(json::buffer::Target::ArrayBuffer));
        let (min, max) = match bounds {
            Some((min, max)) => (Some(json::Value::from(min)), Some(json::Value::from(max))),
            None => (None, None),
        };

        self.root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64::from(count),
            component_type: Valid(json::accessor::GenericComponentType(json::accessor::ComponentType::F32)),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    fn push_indices(&mut self, indices: &[u32]) -> json::Index<json::Accessor> {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes, Some(json::buffer::Target::ElementArrayBuffer));
        self.root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64::from(indices.len()),
            component_type: Valid(json::accessor::GenericComponentType(json::accessor::ComponentType::U32)),
            type_: Valid(json::accessor::Type::Scalar),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    fn push_material(&mut self, scene: &Scene, material: &Material) -> json::Index<json::Material> {
        let color = material.color();
        // Non-PBR shading models export as fully rough dielectrics
        let (metallic, roughness) = material
            .pbr()
            .map_or((0.0, 1.0), |pbr| (pbr.metalness, pbr.roughness));

        let base_color_texture = self.texture_info(scene, material, TextureSlot::BaseColor);
        let metallic_roughness_texture = self.texture_info(scene, material, TextureSlot::MetallicRoughness);
        let emissive_texture = self.texture_info(scene, material, TextureSlot::Emissive);
        let normal_texture = self
            .texture_info(scene, material, TextureSlot::Normal)
            .map(|info| json::material::NormalTexture {
                index: info.index,
                scale: 1.0,
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });
        let occlusion_texture = self
            .texture_info(scene, material, TextureSlot::Occlusion)
            .map(|info| json::material::OcclusionTexture {
                index: info.index,
                strength: json::material::StrengthFactor(1.0),
                tex_coord: 0,
                extensions: None,
                extras: Default::default(),
            });

        self.root.push(json::Material {
            name: material.name.clone(),
            alpha_mode: Valid(if material.transparent {
                json::material::AlphaMode::Blend
            } else {
                json::material::AlphaMode::Opaque
            }),
            double_sided: material.side != Side::Front,
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor([
                    color.x,
                    color.y,
                    color.z,
                    material.opacity,
                ]),
                base_color_texture,
                metallic_factor: json::material::StrengthFactor(metallic),
                roughness_factor: json::material::StrengthFactor(roughness),
                metallic_roughness_texture,
                ..Default::default()
            },
            normal_texture,
            occlusion_texture,
            emissive_texture,
            emissive_factor: json::material::EmissiveFactor(material.emissive().unwrap_or_default().to_array()),
            ..Default::default()
        })
    }

    fn texture_info(&mut self, scene: &Scene, material: &Material, slot: TextureSlot) -> Option<json::texture::Info> {
        let key = material.maps.get(slot)?;
        let index = match self.textures.get(&key) {
            Some(&index) => index,
            None => {
                let texture = scene.textures.get(key)?;
                if texture.mime_type.is_empty() || texture.data.is_empty() {
                    return None;
                }
                let view = self.push_view(&texture.data, None);
                let image = self.root.push(json::Image {
                    buffer_view: Some(view),
                    mime_type: Some(json::image::MimeType(texture.mime_type.clone())),
                    uri: None,
                    name: texture.name.clone(),
                    extensions: Default::default(),
                    extras: Default::default(),
                });
                let index = self.root.push(json::Texture {
                    source: image,
                    sampler: None,
                    name: texture.name.clone(),
                    extensions: Default::default(),
                    extras: Default::default(),
                });
                self.textures.insert(key, index);
                index
            }
        };
        Some(json::texture::Info {
            index,
            tex_coord: 0,
            extensions: None,
            extras: Default::default(),
        })
    }

    fn finish(mut self, root_node: json::Index<json::Node>) -> Document {
        let scene = self.root.push(json::Scene {
            nodes: vec![root_node],
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.root.scene = Some(scene);
        Document { root: self.root, bin: self.bin }
    }
}

impl Document {
    fn push_buffer(&mut self, uri: Option<String>) {
        if self.bin.is_empty() {
            return;
        }
        self.root.push(json::Buffer {
            byte_length: USize64::from(self.bin.len()),
            uri,
            name: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    fn into_glb(mut self) -> Result<Vec<u8>> {
        self.push_buffer(None);
        let json_string = json::serialize::to_string(&self.root)
            .map_err(|e| EditorError::Export(e.to_string()))?;

        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: 0,
            },
            json: Cow::Owned(json_string.into_bytes()),
            bin: (!self.bin.is_empty()).then(|| Cow::Owned(self.bin)),
        };
        glb.to_vec().map_err(|e| EditorError::Export(e.to_string()))
    }

    fn into_embedded_gltf(mut self) -> Result<Vec<u8>> {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bin)
        );
        self.push_buffer(Some(uri));
        json::serialize::to_vec_pretty(&self.root).map_err(|e| EditorError::Export(e.to_string()))
    }
}

fn pad_to_4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}
