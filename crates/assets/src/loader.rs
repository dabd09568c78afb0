//! Background asset loading.
//!
//! Each load runs on its own worker thread and sends exactly one `Result`
//! back over a channel. The UI thread calls [`AssetRequest::poll`] once per
//! frame; workers never touch scene state.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::font::Font;
use crate::gltf::ModelData;
use crate::texture::{CubeTextureData, TextureData};
use crate::AssetError;

/// Result of polling an [`AssetRequest`].
#[derive(Debug)]
pub enum LoadState<T> {
    Pending,
    Loaded(T),
    Failed(AssetError),
}

impl<T> LoadState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }
}

/// Handle to a load running on a worker thread.
#[derive(Debug)]
pub struct AssetRequest<T> {
    label: String,
    rx: Receiver<Result<T, AssetError>>,
    finished: bool,
}

impl<T> AssetRequest<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Non-blocking check. Yields `Loaded` or `Failed` once; later polls
    /// report [`AssetError::AlreadyResolved`].
    pub fn poll(&mut self) -> LoadState<T> {
        if self.finished {
            return LoadState::Failed(AssetError::AlreadyResolved(self.label.clone()));
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                match result {
                    Ok(value) => LoadState::Loaded(value),
                    Err(e) => LoadState::Failed(e),
                }
            }
            Err(TryRecvError::Empty) => LoadState::Pending,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                LoadState::Failed(AssetError::WorkerLost(self.label.clone()))
            }
        }
    }

    /// Block until the worker finishes.
    pub fn wait(mut self) -> Result<T, AssetError> {
        if self.finished {
            return Err(AssetError::AlreadyResolved(self.label));
        }
        self.finished = true;
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(AssetError::WorkerLost(self.label)),
        }
    }

    fn failed(label: String, error: AssetError) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(Err(error));
        Self {
            label,
            rx,
            finished: false,
        }
    }
}

/// Spawns loads for files under an asset root directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a web-style path (`/textures/planet.jpg`) against the root.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    pub fn load_texture(&self, rel: &str) -> AssetRequest<TextureData> {
        let path = self.resolve(rel);
        self.spawn(rel.to_string(), move || TextureData::load(&path))
    }

    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub fn load_cube_texture(&self, faces: &[String]) -> AssetRequest<CubeTextureData> {
        let paths: Vec<PathBuf> = faces.iter().map(|f| self.resolve(f)).collect();
        let label = faces
            .first()
            .map(|f| format!("{f} (+{} faces)", faces.len().saturating_sub(1)))
            .unwrap_or_else(|| "empty cube map".into());
        self.spawn(label, move || CubeTextureData::load(&paths))
    }

    pub fn load_model(&self, rel: &str) -> AssetRequest<ModelData> {
        let path = self.resolve(rel);
        self.spawn(rel.to_string(), move || ModelData::load(&path))
    }

    pub fn load_font(&self, rel: &str) -> AssetRequest<Font> {
        let path = self.resolve(rel);
        self.spawn(rel.to_string(), move || Font::load(&path))
    }

    fn spawn<T, F>(&self, label: String, job: F) -> AssetRequest<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker_label = label.clone();
        let spawned = thread::Builder::new()
            .name(format!("asset-load:{label}"))
            .spawn(move || {
                let span = tracing::debug_span!("asset_load", asset = %worker_label);
                let _enter = span.enter();
                let result = job();
                match &result {
                    Ok(_) => tracing::debug!("loaded"),
                    Err(e) => tracing::error!(error = %e, "asset load failed"),
                }
                // The receiver may be gone if the app shut down mid-load.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => AssetRequest {
                label,
                rx,
                finished: false,
            },
            Err(e) => AssetRequest::failed(label, AssetError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::TEST_FONT;

    fn write_png(path: &Path, size: u32) {
        let img = image::RgbaImage::from_pixel(size, size, image::Rgba([255, 0, 0, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn resolve_strips_leading_slash() {
        let loader = AssetLoader::new("/srv/static");
        assert_eq!(
            loader.resolve("/textures/planet.jpg"),
            PathBuf::from("/srv/static/textures/planet.jpg")
        );
        assert_eq!(loader.resolve("a.png"), PathBuf::from("/srv/static/a.png"));
    }

    #[test]
    fn texture_load_resolves_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("textures")).unwrap();
        write_png(&dir.path().join("textures/dot.png"), 4);

        let loader = AssetLoader::new(dir.path());
        let mut req = loader.load_texture("/textures/dot.png");
        assert_eq!(req.label(), "/textures/dot.png");

        let tex = loop {
            match req.poll() {
                LoadState::Pending => std::thread::yield_now(),
                LoadState::Loaded(t) => break t,
                LoadState::Failed(e) => panic!("unexpected failure: {e}"),
            }
        };
        assert_eq!(tex.width, 4);
        assert!(matches!(
            req.poll(),
            LoadState::Failed(AssetError::AlreadyResolved(_))
        ));
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        let err = loader.load_texture("/nope.png").wait().unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn cube_and_font_loads() {
        let dir = tempfile::tempdir().unwrap();
        let faces: Vec<String> = crate::texture::CUBE_FACE_ORDER
            .iter()
            .map(|name| {
                write_png(&dir.path().join(format!("{name}.png")), 2);
                format!("/{name}.png")
            })
            .collect();
        std::fs::write(dir.path().join("font.json"), TEST_FONT).unwrap();

        let loader = AssetLoader::new(dir.path());
        let cube = loader.load_cube_texture(&faces).wait().unwrap();
        assert_eq!(cube.size, 2);
        let font = loader.load_font("/font.json").wait().unwrap();
        assert_eq!(font.family_name, "Test Sans");
    }

    #[test]
    fn bad_model_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.glb"), b"glTF\x01\0\0\0").unwrap();
        let loader = AssetLoader::new(dir.path());
        assert!(loader.load_model("broken.glb").wait().is_err());
    }
}
