use std::fmt::Write as _;

use starscape_scene::{MeshMaterial, NodeKind, Scene};

use crate::camera::PerspectiveCamera;

/// Renderer-agnostic frame interface.
///
/// A renderer reads the scene and camera and produces one frame. It never
/// mutates the scene. Failures are the renderer's own business: it logs or
/// recovers and reports what it did through `Output`.
pub trait Renderer {
    type Output;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Text dump of the scene, one line per node. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(out, "=== frame {} ({} nodes) ===", self.frames, scene.len());
        let (p, t) = (camera.position, camera.target);
        let _ = writeln!(
            out,
            "camera: pos=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov, camera.aspect
        );

        for (id, node) in scene.nodes() {
            let pos = node.transform.position;
            let rot = node.transform.rotation;
            let _ = write!(
                out,
                "  {id} {:<14} {:<17} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
                node.name,
                node.kind.label(),
                pos.x,
                pos.y,
                pos.z,
                rot.x,
                rot.y,
                rot.z
            );
            match &node.kind {
                NodeKind::Mesh { geometry, material } => {
                    let _ = write!(out, " tris={}", geometry.triangle_count());
                    match material {
                        MeshMaterial::Standard(m) => {
                            let _ = write!(
                                out,
                                " metalness={:.3} roughness={:.3}",
                                m.metalness, m.roughness
                            );
                        }
                        MeshMaterial::Matcap(_) => out.push_str(" matcap"),
                    }
                }
                NodeKind::Points { positions, .. } => {
                    let _ = write!(out, " points={}", positions.len());
                }
                NodeKind::PointLight(l) => {
                    let _ = write!(out, " intensity={:.3}", l.intensity);
                }
                NodeKind::DirectionalLight(l) => {
                    let _ = write!(out, " intensity={:.3}", l.intensity);
                }
                NodeKind::Group => {}
            }
            out.push('\n');
        }
        out
    }
}
