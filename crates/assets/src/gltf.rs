//! glTF 2.0 model import.
//!
//! Reads binary `.glb` containers and `.gltf` JSON with external `.bin`
//! buffers. Only triangle primitives are imported: positions, normals,
//! indices and the metallic-roughness material factors. Node transforms are
//! flattened into the vertex data so the result can be placed as one object.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::AssetError;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

const MODE_TRIANGLES: u32 = 4;

/// Upper bound on an accessor with no bufferView, which has no bytes to
/// bound its count.
const MAX_ZEROED_ELEMENTS: usize = 1 << 24;

/// One triangle list with its material factors.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

/// An imported model: all primitives of the default scene in model space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub primitives: Vec<ModelPrimitive>,
}

impl ModelData {
    /// Load a `.glb` or `.gltf` file. The container is detected from the
    /// file's magic bytes, not its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        if bytes.starts_with(GLB_MAGIC) {
            Self::from_glb(&bytes)
        } else {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            Self::from_gltf_json(&bytes, base)
        }
    }

    /// Parse a binary glTF container.
    pub fn from_glb(bytes: &[u8]) -> Result<Self, AssetError> {
        let (json, bin) = split_glb(bytes)?;
        let doc: Document = serde_json::from_slice(json)
            .map_err(|e| AssetError::GltfParse(e.to_string()))?;
        let mut buffers = Vec::with_capacity(doc.buffers.len());
        for (i, buffer) in doc.buffers.iter().enumerate() {
            match (&buffer.uri, i) {
                (None, 0) => {
                    let bin = bin.ok_or_else(|| {
                        AssetError::GltfParse("buffer 0 refers to a missing BIN chunk".into())
                    })?;
                    buffers.push(bin.to_vec());
                }
                (None, _) => {
                    return Err(AssetError::GltfParse(format!(
                        "buffer {i} has no uri and is not the BIN chunk"
                    )));
                }
                (Some(uri), _) => {
                    return Err(AssetError::GltfParse(format!(
                        "external buffer {uri:?} inside a .glb is not supported"
                    )));
                }
            }
        }
        doc.build(&buffers)
    }

    /// Parse `.gltf` JSON, resolving buffer URIs relative to `base_dir`.
    pub fn from_gltf_json(json: &[u8], base_dir: &Path) -> Result<Self, AssetError> {
        let doc: Document =
            serde_json::from_slice(json).map_err(|e| AssetError::GltfParse(e.to_string()))?;
        let mut buffers = Vec::with_capacity(doc.buffers.len());
        for (i, buffer) in doc.buffers.iter().enumerate() {
            let uri = buffer
                .uri
                .as_deref()
                .ok_or_else(|| AssetError::GltfParse(format!("buffer {i} has no uri")))?;
            if uri.starts_with("data:") {
                return Err(AssetError::GltfParse(
                    "embedded data URIs are not supported".into(),
                ));
            }
            buffers.push(std::fs::read(base_dir.join(uri))?);
        }
        doc.build(&buffers)
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.indices.len() / 3).sum()
    }

    /// Axis-aligned bounds over every primitive, or `None` for an empty model.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self
            .primitives
            .iter()
            .flat_map(|p| p.positions.iter())
            .map(|p| Vec3::from_array(*p));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

/// Split a GLB container into its JSON chunk and optional BIN chunk.
fn split_glb(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>), AssetError> {
    if bytes.len() < 12 || &bytes[..4] != GLB_MAGIC {
        return Err(AssetError::GltfParse("missing glTF magic".into()));
    }
    let version = read_u32(bytes, 4)?;
    if version != 2 {
        return Err(AssetError::GltfParse(format!(
            "unsupported container version {version}"
        )));
    }
    let total = read_u32(bytes, 8)? as usize;
    if total > bytes.len() {
        return Err(AssetError::GltfParse(format!(
            "header declares {total} bytes, file has {}",
            bytes.len()
        )));
    }

    let mut offset = 12;
    let mut json = None;
    let mut bin = None;
    while offset + 8 <= total {
        let len = read_u32(bytes, offset)? as usize;
        let kind = read_u32(bytes, offset + 4)?;
        let start = offset + 8;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= total)
            .ok_or_else(|| AssetError::GltfParse("chunk runs past end of file".into()))?;
        match kind {
            CHUNK_JSON if json.is_none() => json = Some(&bytes[start..end]),
            CHUNK_BIN if bin.is_none() => bin = Some(&bytes[start..end]),
            _ => tracing::debug!(kind, "skipping unknown glb chunk"),
        }
        offset = end;
    }

    let json = json.ok_or_else(|| AssetError::GltfParse("no JSON chunk".into()))?;
    Ok((json, bin))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, AssetError> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| AssetError::GltfParse(format!("truncated at byte {offset}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    buffers: Vec<BufferDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
}

#[derive(Debug, Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeDef {
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

impl NodeDef {
    fn local_matrix(&self) -> Mat4 {
        if let Some(m) = self.matrix {
            return Mat4::from_cols_array(&m);
        }
        let t = self.translation.map(Vec3::from_array).unwrap_or(Vec3::ZERO);
        let r = self.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY);
        let s = self.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE);
        Mat4::from_scale_rotation_translation(s, r, t)
    }
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BufferDef {
    uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDef {
    pbr_metallic_roughness: Option<PbrDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PbrDef {
    base_color_factor: Option<[f32; 4]>,
    metallic_factor: Option<f32>,
    roughness_factor: Option<f32>,
}

impl Document {
    fn build(&self, buffers: &[Vec<u8>]) -> Result<ModelData, AssetError> {
        let roots = self.root_nodes();
        let mut model = ModelData::default();
        let mut visited = HashSet::new();
        for root in roots {
            self.visit(root, Mat4::IDENTITY, buffers, &mut model, &mut visited)?;
        }
        Ok(model)
    }

    fn root_nodes(&self) -> Vec<usize> {
        if let Some(scene) = self.scenes.get(self.scene.unwrap_or(0)) {
            return scene.nodes.clone();
        }
        let children: HashSet<usize> = self
            .nodes
            .iter()
            .flat_map(|n| n.children.iter().copied())
            .collect();
        (0..self.nodes.len())
            .filter(|i| !children.contains(i))
            .collect()
    }

    fn visit(
        &self,
        index: usize,
        parent: Mat4,
        buffers: &[Vec<u8>],
        model: &mut ModelData,
        visited: &mut HashSet<usize>,
    ) -> Result<(), AssetError> {
        if !visited.insert(index) {
            return Err(AssetError::GltfParse(format!(
                "node {index} appears twice in the hierarchy"
            )));
        }
        let node = self
            .nodes
            .get(index)
            .ok_or_else(|| AssetError::GltfParse(format!("node {index} out of range")))?;
        let world = parent * node.local_matrix();

        if let Some(mesh_index) = node.mesh {
            let mesh = self
                .meshes
                .get(mesh_index)
                .ok_or_else(|| AssetError::GltfParse(format!("mesh {mesh_index} out of range")))?;
            for prim in &mesh.primitives {
                if let Some(p) = self.primitive(prim, world, buffers)? {
                    model.primitives.push(p);
                }
            }
        }

        for &child in &node.children {
            self.visit(child, world, buffers, model, visited)?;
        }
        Ok(())
    }

    fn primitive(
        &self,
        prim: &PrimitiveDef,
        world: Mat4,
        buffers: &[Vec<u8>],
    ) -> Result<Option<ModelPrimitive>, AssetError> {
        let mode = prim.mode.unwrap_or(MODE_TRIANGLES);
        if mode != MODE_TRIANGLES {
            tracing::warn!(mode, "skipping non-triangle glTF primitive");
            return Ok(None);
        }
        let Some(&position_accessor) = prim.attributes.get("POSITION") else {
            tracing::warn!("skipping glTF primitive without POSITION");
            return Ok(None);
        };

        let positions: Vec<[f32; 3]> = self
            .read_vec3(position_accessor, buffers)?
            .into_iter()
            .map(|p| world.transform_point3(Vec3::from_array(p)).to_array())
            .collect();

        let indices = match prim.indices {
            Some(i) => self.read_indices(i, buffers)?,
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(AssetError::GltfParse(format!(
                "index {bad} out of range for {} vertices",
                positions.len()
            )));
        }

        let normals = match prim.attributes.get("NORMAL") {
            Some(&acc) => {
                let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
                self.read_vec3(acc, buffers)?
                    .into_iter()
                    .map(|n| {
                        (normal_matrix * Vec3::from_array(n))
                            .normalize_or_zero()
                            .to_array()
                    })
                    .collect()
            }
            None => compute_vertex_normals(&positions, &indices),
        };
        if normals.len() != positions.len() {
            return Err(AssetError::GltfParse(format!(
                "{} normals for {} positions",
                normals.len(),
                positions.len()
            )));
        }

        let pbr = prim
            .material
            .and_then(|m| self.materials.get(m))
            .and_then(|m| m.pbr_metallic_roughness.as_ref());
        let base_color = pbr
            .and_then(|p| p.base_color_factor)
            .unwrap_or([1.0, 1.0, 1.0, 1.0]);
        let metallic = pbr.and_then(|p| p.metallic_factor).unwrap_or(1.0);
        let roughness = pbr.and_then(|p| p.roughness_factor).unwrap_or(1.0);

        Ok(Some(ModelPrimitive {
            positions,
            normals,
            indices,
            base_color,
            metallic,
            roughness,
        }))
    }

    /// Locate accessor data: returns (bytes, element stride, element count).
    fn accessor_bytes<'a>(
        &self,
        index: usize,
        buffers: &'a [Vec<u8>],
        expected_kind: &str,
        component_size: usize,
        components: usize,
    ) -> Result<Option<(&'a [u8], usize, usize)>, AssetError> {
        let acc = self
            .accessors
            .get(index)
            .ok_or_else(|| AssetError::GltfParse(format!("accessor {index} out of range")))?;
        if acc.kind != expected_kind {
            return Err(AssetError::GltfParse(format!(
                "accessor {index} is {}, expected {expected_kind}",
                acc.kind
            )));
        }
        let Some(view_index) = acc.buffer_view else {
            return Ok(None);
        };
        let view = self
            .buffer_views
            .get(view_index)
            .ok_or_else(|| AssetError::GltfParse(format!("bufferView {view_index} out of range")))?;
        let buffer = buffers
            .get(view.buffer)
            .ok_or_else(|| AssetError::GltfParse(format!("buffer {} out of range", view.buffer)))?;

        let elem_size = component_size * components;
        let stride = view.byte_stride.unwrap_or(elem_size);
        if stride < elem_size {
            return Err(AssetError::GltfParse(format!(
                "bufferView {view_index} stride {stride} is smaller than its {elem_size}-byte elements"
            )));
        }
        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| {
                AssetError::GltfParse(format!("bufferView {view_index} runs past its buffer"))
            })?;
        let past_view = || AssetError::GltfParse(format!("accessor {index} runs past its bufferView"));
        let start = view
            .byte_offset
            .checked_add(acc.byte_offset)
            .ok_or_else(past_view)?;
        let needed = if acc.count == 0 {
            0
        } else {
            stride
                .checked_mul(acc.count - 1)
                .and_then(|n| n.checked_add(elem_size))
                .ok_or_else(past_view)?
        };
        let end = start.checked_add(needed).ok_or_else(past_view)?;
        if end > view_end {
            return Err(past_view());
        }
        Ok(Some((&buffer[start..end], stride, acc.count)))
    }

    fn read_vec3(&self, index: usize, buffers: &[Vec<u8>]) -> Result<Vec<[f32; 3]>, AssetError> {
        let component_type = self.accessors.get(index).map(|a| a.component_type);
        if component_type != Some(COMPONENT_F32) {
            return Err(AssetError::GltfParse(format!(
                "accessor {index} must hold f32 components"
            )));
        }
        let count = self.accessors[index].count;
        let Some((data, stride, count)) = self.accessor_bytes(index, buffers, "VEC3", 4, 3)?
        else {
            // No bufferView means all zeros; the count is untrusted.
            if count > MAX_ZEROED_ELEMENTS {
                return Err(AssetError::GltfParse(format!(
                    "accessor {index} asks for {count} zeroed elements"
                )));
            }
            return Ok(vec![[0.0; 3]; count]);
        };
        Ok((0..count)
            .map(|i| {
                let base = i * stride;
                let f = |k: usize| {
                    let o = base + k * 4;
                    f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]])
                };
                [f(0), f(1), f(2)]
            })
            .collect())
    }

    fn read_indices(&self, index: usize, buffers: &[Vec<u8>]) -> Result<Vec<u32>, AssetError> {
        let component_type = self
            .accessors
            .get(index)
            .map(|a| a.component_type)
            .ok_or_else(|| AssetError::GltfParse(format!("accessor {index} out of range")))?;
        let size = match component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            other => {
                return Err(AssetError::GltfParse(format!(
                    "unsupported index component type {other}"
                )));
            }
        };
        let Some((data, stride, count)) = self.accessor_bytes(index, buffers, "SCALAR", size, 1)?
        else {
            return Err(AssetError::GltfParse(format!(
                "index accessor {index} has no bufferView"
            )));
        };
        Ok((0..count)
            .map(|i| {
                let o = i * stride;
                match size {
                    1 => data[o] as u32,
                    2 => u16::from_le_bytes([data[o], data[o + 1]]) as u32,
                    _ => u32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]),
                }
            })
            .collect())
    }
}

/// Area-weighted smooth normals for meshes that ship without them.
fn compute_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}
