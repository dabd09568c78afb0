//! Rendering front end: camera, orbit controls, viewport synchronisation and
//! the renderer-agnostic [`Renderer`] trait.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Camera aspect and every surface target's size change in the same call
//!   ([`ViewportSynchronizer::on_resize`]), so no frame sees a mismatch.

mod camera;
mod controls;
pub mod post;
mod renderer;
mod viewport;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use post::{BloomSettings, PostChain};
pub use renderer::{DebugTextRenderer, Renderer};
pub use viewport::{SurfaceTarget, ViewportSynchronizer};
