use crate::store::AssetId;

/// Errors from asset loading and decoding.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid texture: {0}")]
    InvalidTexture(String),
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("font parse error: {0}")]
    FontParse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("asset not found: {0:?}")]
    NotFound(AssetId),
    #[error("loader for {0} exited without producing a result")]
    WorkerLost(String),
    #[error("request for {0} was already resolved")]
    AlreadyResolved(String),
}
