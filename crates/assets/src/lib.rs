//! Asset loading for the starscape scene.
//!
//! Textures and cube maps decode through `image`, models come from glTF,
//! and 3D text is laid out from typeface JSON fonts. Loads run on worker
//! threads via [`AssetLoader`]; decoded images are kept in a
//! content-addressed [`AssetStore`] that the GPU backend reads from.

mod error;
pub mod font;
pub mod gltf;
pub mod loader;
mod store;
pub mod text;
mod triangulate;
pub mod texture;

pub use error::AssetError;
pub use font::{Font, Glyph, OutlineCommand};
pub use gltf::{ModelData, ModelPrimitive};
pub use loader::{AssetLoader, AssetRequest, LoadState};
pub use store::{Asset, AssetId, AssetStore};
pub use text::{TextGeometry, TextMesh, TextOptions};
pub use texture::{CUBE_FACE_ORDER, CubeTextureData, TextureData};
