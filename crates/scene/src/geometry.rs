use std::f32::consts::PI;

use glam::Vec3;
use starscape_assets::{ModelPrimitive, TextMesh};

/// Indexed triangle mesh in model space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// UV sphere centred on the origin.
    ///
    /// Rows run from the north pole (`v = 0`) to the south pole; each row has
    /// `width_segments + 1` vertices so the seam carries both `u = 0` and
    /// `u = 1`. Pole vertices shift their `u` by half a segment and the
    /// degenerate pole triangles are omitted.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let ws = width_segments.max(3);
        let hs = height_segments.max(2);
        let row = ws as usize + 1;
        let count = row * (hs as usize + 1);

        let mut mesh = Self {
            positions: Vec::with_capacity(count),
            normals: Vec::with_capacity(count),
            uvs: Vec::with_capacity(count),
            indices: Vec::with_capacity(ws as usize * (hs as usize - 1) * 6),
        };

        for iy in 0..=hs {
            let v = iy as f32 / hs as f32;
            let u_offset = if iy == 0 {
                0.5 / ws as f32
            } else if iy == hs {
                -0.5 / ws as f32
            } else {
                0.0
            };
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            for ix in 0..=ws {
                let u = ix as f32 / ws as f32;
                let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
                let p = Vec3::new(
                    -radius * cos_phi * sin_theta,
                    radius * cos_theta,
                    radius * sin_phi * sin_theta,
                );
                mesh.positions.push(p.to_array());
                mesh.normals.push(p.normalize_or_zero().to_array());
                mesh.uvs.push([u + u_offset, 1.0 - v]);
            }
        }

        let at = |iy: u32, ix: u32| iy * (ws + 1) + ix;
        for iy in 0..hs {
            for ix in 0..ws {
                let a = at(iy, ix + 1);
                let b = at(iy, ix);
                let c = at(iy + 1, ix);
                let d = at(iy + 1, ix + 1);
                if iy != 0 {
                    mesh.indices.extend_from_slice(&[a, b, d]);
                }
                if iy != hs - 1 {
                    mesh.indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        mesh
    }

    /// Geometry of one imported model primitive. Imported meshes have no
    /// texture coordinates, so every vertex gets `(0, 0)`.
    pub fn from_primitive(prim: &ModelPrimitive) -> Self {
        Self {
            positions: prim.positions.clone(),
            normals: prim.normals.clone(),
            uvs: vec![[0.0, 0.0]; prim.positions.len()],
            indices: prim.indices.clone(),
        }
    }

    /// Geometry of an extruded text block, with placeholder UVs.
    pub fn from_text(text: &TextMesh) -> Self {
        Self {
            positions: text.positions.clone(),
            normals: text.normals.clone(),
            uvs: vec![[0.0, 0.0]; text.positions.len()],
            indices: text.indices.clone(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
