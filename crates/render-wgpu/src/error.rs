use starscape_assets::AssetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("texture '{label}' is {size}px, device limit is {max}px")]
    TextureTooLarge { label: String, size: u32, max: u32 },
    #[error("cube map {0:?} has {1} faces")]
    IncompleteCube(AssetId, usize),
}
