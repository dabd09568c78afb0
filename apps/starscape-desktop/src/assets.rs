//! Background loads for the scene's files, polled once per frame.

use starscape_assets::{
    AssetLoader, AssetRequest, CubeTextureData, Font, LoadState, ModelData, TextureData,
};
use starscape_scene::SceneConfig;
use starscape_tools::{AssetState, AssetStatus};

/// A finished load, tagged with the role it plays in the scene.
#[derive(Debug)]
pub enum Arrival {
    StarAlpha(TextureData),
    PlanetColor(TextureData),
    PlanetNormal(TextureData),
    Environment(CubeTextureData),
    Model(ModelData),
    Font(Font),
}

struct Tracked<T> {
    label: String,
    request: Option<AssetRequest<T>>,
    state: AssetState,
}

impl<T> Tracked<T> {
    fn new(request: AssetRequest<T>) -> Self {
        Self {
            label: request.label().to_string(),
            request: Some(request),
            state: AssetState::Pending,
        }
    }

    /// Returns the value once, on the poll where it arrives.
    fn poll(&mut self) -> Option<T> {
        let request = self.request.as_mut()?;
        match request.poll() {
            LoadState::Pending => None,
            LoadState::Loaded(value) => {
                self.request = None;
                self.state = AssetState::Loaded;
                Some(value)
            }
            LoadState::Failed(e) => {
                self.request = None;
                tracing::warn!(asset = %self.label, "skipping node for failed asset");
                self.state = AssetState::Failed(e.to_string());
                None
            }
        }
    }

    fn status(&self) -> AssetStatus {
        AssetStatus::new(self.label.clone(), self.state.clone())
    }
}

/// Every request the stock scene makes at startup.
pub struct SceneAssets {
    star_alpha: Tracked<TextureData>,
    planet_color: Tracked<TextureData>,
    planet_normal: Tracked<TextureData>,
    environment: Tracked<CubeTextureData>,
    model: Tracked<ModelData>,
    font: Tracked<Font>,
}

impl SceneAssets {
    pub fn request(loader: &AssetLoader, config: &SceneConfig) -> Self {
        let paths = &config.assets;
        tracing::info!(root = %loader.root().display(), "requesting scene assets");
        Self {
            star_alpha: Tracked::new(loader.load_texture(&paths.star_alpha)),
            planet_color: Tracked::new(loader.load_texture(&paths.planet_color)),
            planet_normal: Tracked::new(loader.load_texture(&paths.planet_normal)),
            environment: Tracked::new(loader.load_cube_texture(&paths.environment)),
            model: Tracked::new(loader.load_model(&paths.model)),
            font: Tracked::new(loader.load_font(&paths.font)),
        }
    }

    pub fn poll(&mut self) -> Vec<Arrival> {
        let mut out = Vec::new();
        out.extend(self.star_alpha.poll().map(Arrival::StarAlpha));
        out.extend(self.planet_color.poll().map(Arrival::PlanetColor));
        out.extend(self.planet_normal.poll().map(Arrival::PlanetNormal));
        out.extend(self.environment.poll().map(Arrival::Environment));
        out.extend(self.model.poll().map(Arrival::Model));
        out.extend(self.font.poll().map(Arrival::Font));
        out
    }

    pub fn statuses(&self) -> Vec<AssetStatus> {
        vec![
            self.star_alpha.status(),
            self.planet_color.status(),
            self.planet_normal.status(),
            self.environment.status(),
            self.model.status(),
            self.font.status(),
        ]
    }

    pub fn is_settled(&self) -> bool {
        self.statuses()
            .iter()
            .all(|s| s.state != AssetState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn settle(assets: &mut SceneAssets) -> Vec<Arrival> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut arrivals = Vec::new();
        while !assets.is_settled() && Instant::now() < deadline {
            arrivals.extend(assets.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        arrivals
    }

    #[test]
    fn missing_files_end_failed() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());
        let mut assets = SceneAssets::request(&loader, &SceneConfig::default());
        let arrivals = settle(&mut assets);

        assert!(arrivals.is_empty());
        let statuses = assets.statuses();
        assert_eq!(statuses.len(), 6);
        assert!(
            statuses
                .iter()
                .all(|s| matches!(s.state, AssetState::Failed(_)))
        );
    }

    #[test]
    fn font_arrives_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = SceneConfig::default();
        let font_path = dir.path().join(config.assets.font.trim_start_matches('/'));
        std::fs::create_dir_all(font_path.parent().unwrap()).unwrap();
        std::fs::write(
            &font_path,
            r#"{
                "resolution": 1000,
                "boundingBox": {"xMin": 0, "xMax": 600, "yMin": 0, "yMax": 700},
                "glyphs": {"A": {"ha": 600, "o": "m 0 0 l 600 0 l 0 700"}}
            }"#,
        )
        .unwrap();

        let loader = AssetLoader::new(dir.path());
        let mut assets = SceneAssets::request(&loader, &config);
        let arrivals = settle(&mut assets);

        assert_eq!(arrivals.len(), 1);
        assert!(matches!(arrivals[0], Arrival::Font(_)));
        assert!(assets.poll().is_empty());
        let font = assets.statuses().pop().unwrap();
        assert_eq!(font.state, AssetState::Loaded);
    }
}
