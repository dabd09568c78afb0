use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::AssetError;
use crate::texture::{CubeTextureData, TextureData};

/// Content-addressed asset ID computed from the decoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

/// An entry in the registry.
#[derive(Debug, Clone)]
pub enum Asset {
    Texture(Arc<TextureData>),
    CubeTexture(Arc<CubeTextureData>),
}

/// Content-addressed registry for image assets.
///
/// Materials reference textures by [`AssetId`]; the GPU backend looks the
/// data up here when it uploads. Registering identical pixels twice yields
/// the same id and a single entry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_texture(&mut self, texture: TextureData) -> AssetId {
        let id = Self::content_hash(&[&texture]);
        self.assets
            .entry(id)
            .or_insert_with(|| Asset::Texture(Arc::new(texture)));
        id
    }

    pub fn register_cube_texture(&mut self, cube: CubeTextureData) -> AssetId {
        let faces: Vec<&TextureData> = cube.faces.iter().collect();
        let id = Self::content_hash(&faces);
        self.assets
            .entry(id)
            .or_insert_with(|| Asset::CubeTexture(Arc::new(cube)));
        id
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn get_texture(&self, id: AssetId) -> Option<&Arc<TextureData>> {
        match self.assets.get(&id) {
            Some(Asset::Texture(t)) => Some(t),
            _ => None,
        }
    }

    pub fn get_cube_texture(&self, id: AssetId) -> Option<&Arc<CubeTextureData>> {
        match self.assets.get(&id) {
            Some(Asset::CubeTexture(c)) => Some(c),
            _ => None,
        }
    }

    /// Like [`get_cube_texture`](Self::get_cube_texture) but a missing id is an error.
    pub fn require_cube_texture(&self, id: AssetId) -> Result<Arc<CubeTextureData>, AssetError> {
        self.get_cube_texture(id)
            .cloned()
            .ok_or(AssetError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn content_hash(images: &[&TextureData]) -> AssetId {
        let mut hasher = Sha256::new();
        hasher.update((images.len() as u32).to_le_bytes());
        for img in images {
            hasher.update(img.width.to_le_bytes());
            hasher.update(img.height.to_le_bytes());
            hasher.update(&img.pixels);
        }
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        AssetId(u64::from_le_bytes(bytes))
    }
}
