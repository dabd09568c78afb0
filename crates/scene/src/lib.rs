//! Scene graph for the starscape viewer.
//!
//! The [`Scene`] owns every node; the runtime only ever mutates the
//! transforms and material parameters of nodes it holds a [`NodeId`] for.
//!
//! [`NodeId`]: starscape_common::NodeId

pub mod builder;
pub mod config;
mod geometry;
mod light;
mod material;
mod scene;
mod starfield;

pub use builder::{SceneHandles, build_scene};
pub use config::{ConfigError, SceneConfig};
pub use geometry::MeshData;
pub use light::{DirectionalLight, PointLight};
pub use material::{MatcapMaterial, MeshMaterial, PointsMaterial, StandardMaterial};
pub use scene::{NodeKind, Scene, SceneNode};
pub use starfield::StarField;
