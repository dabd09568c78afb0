//! wgpu render backend.
//!
//! Draws a [`starscape_scene::Scene`] into an HDR target (PBR meshes, star
//! points, matcap text and an optional skybox), then runs bloom and ACES tone
//! mapping into the surface view.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - Textures are uploaded once per asset id; materials whose maps are not
//!   registered yet render with neutral defaults.

mod bloom;
mod error;
mod gpu;
mod mesh;
mod shaders;
mod texture;

pub use bloom::blur_coefficients;
pub use error::RenderError;
pub use gpu::WgpuRenderer;
pub use texture::{ColorSpace, HDR_FORMAT};
