//! glTF 2.0 / GLB decoding into a [`Prefab`].
//!
//! Models arrive as a single in-memory payload (a storage download, a picked
//! file, or a conversion result), so only self-contained files are accepted:
//! buffers must live in the GLB binary chunk or in `data:` URIs. Images are
//! kept in their original encoding.

use base64::Engine as _;
use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::assets::prefab::{Prefab, PrefabMesh, PrefabNode};
use crate::errors::{EditorError, Result};
use crate::resources::{Geometry, Material, Mesh, Primitive, Side, Texture, TextureSlot};
use crate::scene::transform::Transform;

/// Stateless glTF decoder.
pub struct GltfLoader;

impl GltfLoader {
    /// Decodes a `.glb` or self-contained `.gltf` payload.
    pub fn load_from_slice(bytes: &[u8]) -> Result<Prefab> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffers = Self::load_buffers(&gltf)?;

        let mut prefab = Prefab::new();
        let texture_map = Self::load_textures(&gltf, &buffers, &mut prefab);
        let materials = Self::load_materials(&gltf, &texture_map);

        let meshes: Vec<Option<PrefabMesh>> = gltf
            .meshes()
            .map(|mesh| Self::load_mesh(&mesh, &buffers, &materials))
            .collect::<Result<_>>()?;

        prefab.nodes = gltf
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                PrefabNode {
                    name: node.name().map(str::to_string),
                    transform: Transform::from_trs(translation, rotation, scale),
                    children_indices: node.children().map(|c| c.index()).collect(),
                    mesh: node
                        .mesh()
                        .and_then(|m| meshes.get(m.index()).cloned().flatten()),
                }
            })
            .collect();

        let scene = gltf
            .default_scene()
            .or_else(|| gltf.scenes().next())
            .ok_or_else(|| EditorError::Parse("file contains no scene".into()))?;
        prefab.root_indices = scene.nodes().map(|n| n.index()).collect();

        log::debug!(
            "Decoded glTF: {} node(s), {} mesh node(s), {} texture(s)",
            prefab.nodes.len(),
            prefab.mesh_count(),
            prefab.textures.len()
        );
        Ok(prefab)
    }

    fn load_buffers(gltf: &gltf::Gltf) -> Result<Vec<Vec<u8>>> {
        let mut buffer_data = Vec::new();
        for buffer in gltf.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf
                    .blob
                    .clone()
                    .ok_or_else(|| EditorError::Parse("missing GLB binary chunk".into()))?,
                gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri)? {
                    Some((_, data)) => data,
                    None => {
                        return Err(EditorError::Parse(format!(
                            "external buffer '{uri}' cannot be resolved from an in-memory model"
                        )));
                    }
                },
            };
            if data.len() < buffer.length() {
                return Err(EditorError::Parse(format!(
                    "buffer {} is truncated ({} < {} bytes)",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                )));
            }
            buffer_data.push(data);
        }
        Ok(buffer_data)
    }

    /// Returns, per glTF texture index, the prefab texture index if loaded.
    fn load_textures(
        gltf: &gltf::Gltf,
        buffers: &[Vec<u8>],
        prefab: &mut Prefab,
    ) -> Vec<Option<usize>> {
        let mut image_cache: FxHashMap<usize, Option<usize>> = FxHashMap::default();

        gltf.textures()
            .map(|texture| {
                let image = texture.source();
                *image_cache.entry(image.index()).or_insert_with(|| {
                    let loaded = match image.source() {
                        gltf::image::Source::View { view, mime_type } => {
                            let start = view.offset();
                            let end = start + view.length();
                            buffers
                                .get(view.buffer().index())
                                .and_then(|b| b.get(start..end))
                                .map(|bytes| (mime_type.to_string(), bytes.to_vec()))
                        }
                        gltf::image::Source::Uri { uri, mime_type } => {
                            match decode_data_uri(uri) {
                                Ok(Some((uri_mime, data))) => Some((
                                    mime_type.map(str::to_string).or(uri_mime).unwrap_or_default(),
                                    data,
                                )),
                                Ok(None) => {
                                    log::warn!("Skipping external image '{uri}'");
                                    None
                                }
                                Err(err) => {
                                    log::warn!("Skipping undecodable image: {err}");
                                    None
                                }
                            }
                        }
                    };
                    loaded.map(|(mime, data)| {
                        prefab
                            .textures
                            .push(Texture::new(image.name().map(str::to_string), mime, data));
                        prefab.textures.len() - 1
                    })
                })
            })
            .collect()
    }

    /// Materials by glTF index, with map bindings to prefab textures.
    fn load_materials(
        gltf: &gltf::Gltf,
        texture_map: &[Option<usize>],
    ) -> Vec<(Material, Vec<(TextureSlot, usize)>)> {
        let resolve = |index: usize| texture_map.get(index).copied().flatten();

        gltf.materials()
            .map(|mat| {
                let pbr = mat.pbr_metallic_roughness();
                let [r, g, b, a] = pbr.base_color_factor();

                let mut material = Material::new_standard(Vec3::new(r, g, b));
                material.name = mat.name().map(str::to_string);
                material.opacity = a;
                material.transparent = mat.alpha_mode() == gltf::material::AlphaMode::Blend;
                material.side = if mat.double_sided() { Side::Double } else { Side::Front };
                if let Some(standard) = material.pbr_mut() {
                    standard.metalness = pbr.metallic_factor();
                    standard.roughness = pbr.roughness_factor();
                    standard.emissive = Vec3::from_array(mat.emissive_factor());
                }

                let mut bindings = Vec::new();
                let mut bind = |slot: TextureSlot, texture: Option<usize>| {
                    if let Some(index) = texture.and_then(resolve) {
                        bindings.push((slot, index));
                    }
                };
                bind(TextureSlot::BaseColor, pbr.base_color_texture().map(|t| t.texture().index()));
                bind(
                    TextureSlot::MetallicRoughness,
                    pbr.metallic_roughness_texture().map(|t| t.texture().index()),
                );
                bind(TextureSlot::Normal, mat.normal_texture().map(|t| t.texture().index()));
                bind(TextureSlot::Occlusion, mat.occlusion_texture().map(|t| t.texture().index()));
                bind(TextureSlot::Emissive, mat.emissive_texture().map(|t| t.texture().index()));

                (material, bindings)
            })
            .collect()
    }

    fn load_mesh(
        mesh: &gltf::Mesh<'_>,
        buffers: &[Vec<u8>],
        materials: &[(Material, Vec<(TextureSlot, usize)>)],
    ) -> Result<Option<PrefabMesh>> {
        let mut out = Mesh {
            name: mesh.name().unwrap_or("Mesh").to_string(),
            primitives: Vec::new(),
            materials: Vec::new(),
        };
        let mut texture_bindings = Vec::new();
        // glTF material index (None = default material) -> slot in `out.materials`
        let mut slots: FxHashMap<Option<usize>, usize> = FxHashMap::default();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!(
                    "Skipping non-triangle primitive {} of mesh '{}'",
                    primitive.index(),
                    out.name
                );
                continue;
            }

            let reader = primitive.reader(|b| buffers.get(b.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                return Err(EditorError::Parse(format!(
                    "primitive {} of mesh '{}' has no POSITION attribute",
                    primitive.index(),
                    out.name
                )));
            };

            let mut geometry = Geometry::new(positions.map(Vec3::from_array).collect());
            if let Some(normals) = reader.read_normals() {
                geometry = geometry.with_normals(normals.map(Vec3::from_array).collect());
            }
            if let Some(uvs) = reader.read_tex_coords(0) {
                geometry = geometry.with_uvs(uvs.into_f32().map(Vec2::from_array).collect());
            }
            if let Some(indices) = reader.read_indices() {
                let indices: Vec<u32> = indices.into_u32().collect();
                let count = geometry.vertex_count() as u32;
                if indices.iter().any(|&i| i >= count) {
                    return Err(EditorError::Parse(format!(
                        "mesh '{}' references vertices past the end of its buffer",
                        out.name
                    )));
                }
                geometry = geometry.with_indices(indices);
            }

            let gltf_material = primitive.material().index();
            let slot = *slots.entry(gltf_material).or_insert_with(|| {
                let (material, bindings) = gltf_material
                    .and_then(|i| materials.get(i))
                    .cloned()
                    .unwrap_or_else(|| (Material::default(), Vec::new()));
                let slot = out.materials.len();
                // Each mesh owns its own material instances
                let mut material = material;
                material.uuid = uuid::Uuid::new_v4();
                out.materials.push(material);
                texture_bindings.extend(bindings.into_iter().map(|(map, tex)| (slot, map, tex)));
                slot
            });

            out.primitives.push(Primitive { geometry, material: slot });
        }

        if out.primitives.is_empty() {
            return Ok(None);
        }
        Ok(Some(PrefabMesh { mesh: out, texture_bindings }))
    }
}

/// Decodes a `data:` URI. Returns `Ok(None)` for any other URI.
fn decode_data_uri(uri: &str) -> Result<Option<(Option<String>, Vec<u8>)>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(None);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return Err(EditorError::Parse("malformed data URI".into()));
    };
    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    if !is_base64 {
        return Err(EditorError::Parse("only base64 data URIs are supported".into()));
    }
    let data = base64::engine::general_purpose::STANDARD.decode(payload)?;
    let mime = (!mime.is_empty()).then(|| mime.to_string());
    Ok(Some((mime, data)))
}
