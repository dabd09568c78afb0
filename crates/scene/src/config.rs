//! Scene configuration with defaults and YAML loading.
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! values it changes. The defaults describe the stock scene.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use starscape_common::{Color, ColorError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid colour in {field}: {source}")]
    Color { field: &'static str, source: ColorError },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub assets: AssetPaths,
    pub camera: CameraConfig,
    pub stars: StarsConfig,
    pub planet: PlanetConfig,
    pub model: ModelConfig,
    pub text: TextConfig,
    pub lights: LightsConfig,
    pub bloom: BloomConfig,
    pub renderer: RendererConfig,
    pub environment: EnvironmentConfig,
}

/// Asset root plus web-style paths relative to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub star_alpha: String,
    pub planet_color: String,
    pub planet_normal: String,
    /// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub environment: Vec<String>,
    pub model: String,
    pub font: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            star_alpha: "/textures/particles/5.png".into(),
            planet_color: "/textures/planet.jpg".into(),
            planet_normal: "/textures/NormalMap.png".into(),
            environment: ["px", "nx", "py", "ny", "pz", "nz"]
                .iter()
                .map(|f| format!("/textures/EnvironmentMap/{f}.png"))
                .collect(),
            model: "/lego23.glb".into(),
            font: "/fonts/droid_serif_regular.typeface.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub damping: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 4.0),
            damping: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarsConfig {
    pub count: u32,
    pub spread: f32,
    pub size: f32,
    pub seed: u64,
    /// Radians per second about Y.
    pub spin_rate: f32,
}

impl Default for StarsConfig {
    fn default() -> Self {
        Self {
            count: 200,
            spread: 20.0,
            size: 0.04,
            seed: 0,
            spin_rate: 0.02,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub color: String,
    pub metalness: f32,
    pub roughness: f32,
    pub normal_scale: f32,
    pub spin_rate: f32,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            width_segments: 32,
            height_segments: 32,
            position: Vec3::new(0.4, -6.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, PI * 0.25),
            color: "#306258".into(),
            metalness: 0.3,
            roughness: 0.5,
            normal_scale: 0.5,
            spin_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-1.5, -1.0, 0.2),
            rotation: Vec3::new(0.0, PI * 0.1, 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub content: String,
    pub size: f32,
    pub height: f32,
    pub curve_segments: u32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            content: "I N T E R A C T I V E \nE V R     F O R C E".into(),
            size: 0.4,
            height: 0.1,
            curve_segments: 12,
            position: Vec3::new(-2.5, 2.7, -4.0),
            rotation: Vec3::new(0.0, PI / 4.0, 0.0),
            color: "#78866b".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightsConfig {
    pub point: PointLightConfig,
    pub directional: DirectionalLightConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PointLightConfig {
    pub color: String,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    /// Z coordinate the pointer places the light at.
    pub depth: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".into(),
            intensity: 5.0,
            distance: 2.0,
            decay: 1.0,
            depth: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectionalLightConfig {
    pub color: String,
    pub intensity: f32,
    pub position: Vec3,
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            color: "#ffffff".into(),
            intensity: 5.0,
            position: Vec3::new(-0.25, 1.5, 3.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomConfig {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 2.0,
            radius: 0.2,
            threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Multiplier applied before ACES tone mapping.
    pub exposure: f32,
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Also use the background cube map as every standard material's
    /// reflection map.
    pub apply_to_materials: bool,
}

impl SceneConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check ranges and colours. Called once after loading and CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("assets.root is empty".into()));
        }
        if self.assets.environment.len() != 6 {
            return Err(ConfigError::Invalid(format!(
                "assets.environment needs 6 faces, got {}",
                self.assets.environment.len()
            )));
        }

        let positive = [
            ("camera.fov", self.camera.fov),
            ("camera.near", self.camera.near),
            ("stars.spread", self.stars.spread),
            ("stars.size", self.stars.size),
            ("planet.radius", self.planet.radius),
            ("text.size", self.text.size),
            ("renderer.exposure", self.renderer.exposure),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        if self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(format!(
                "camera.far ({}) must exceed camera.near ({})",
                self.camera.far, self.camera.near
            )));
        }
        if self.camera.fov >= 180.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.fov must be below 180, got {}",
                self.camera.fov
            )));
        }

        let counts = [
            ("stars.count", self.stars.count),
            ("planet.width_segments", self.planet.width_segments),
            ("planet.height_segments", self.planet.height_segments),
            ("text.curve_segments", self.text.curve_segments),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be non-zero")));
            }
        }

        self.planet_color()?;
        self.text_color()?;
        self.point_light_color()?;
        self.directional_light_color()?;
        Ok(())
    }

    pub fn planet_color(&self) -> Result<Color, ConfigError> {
        parse_color("planet.color", &self.planet.color)
    }

    pub fn text_color(&self) -> Result<Color, ConfigError> {
        parse_color("text.color", &self.text.color)
    }

    pub fn point_light_color(&self) -> Result<Color, ConfigError> {
        parse_color("lights.point.color", &self.lights.point.color)
    }

    pub fn directional_light_color(&self) -> Result<Color, ConfigError> {
        parse_color("lights.directional.color", &self.lights.directional.color)
    }
}

fn parse_color(field: &'static str, value: &str) -> Result<Color, ConfigError> {
    Color::from_hex(value).map_err(|source| ConfigError::Color { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_stock_scene() {
        let cfg = SceneConfig::default();
        assert_eq!(cfg.camera.fov, 75.0);
        assert_eq!(cfg.camera.position, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(cfg.stars.count, 200);
        assert_eq!(cfg.planet.spin_rate, 0.05);
        assert_eq!(cfg.stars.spin_rate, 0.02);
        assert_eq!(cfg.bloom.strength, 2.0);
        assert_eq!(cfg.lights.point.depth, 0.3);
        assert_eq!(cfg.assets.environment[1], "/textures/EnvironmentMap/nx.png");
        assert!(!cfg.environment.apply_to_materials);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = SceneConfig::from_yaml(
            "stars:\n  count: 50\n  seed: 9\nbloom:\n  strength: 1.5\n",
        )
        .unwrap();
        assert_eq!(cfg.stars.count, 50);
        assert_eq!(cfg.stars.seed, 9);
        assert_eq!(cfg.stars.spread, 20.0);
        assert_eq!(cfg.bloom.strength, 1.5);
        assert_eq!(cfg.bloom.radius, 0.2);
        assert_eq!(cfg.planet, PlanetConfig::default());
    }

    #[test]
    fn vectors_parse_as_sequences() {
        let cfg = SceneConfig::from_yaml("camera:\n  position: [1.0, 2.0, 3.0]\n").unwrap();
        assert_eq!(cfg.camera.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn yaml_roundtrip_and_file_load() {
        let mut cfg = SceneConfig::default();
        cfg.text.content = "HELLO".into();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(SceneConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = SceneConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = SceneConfig::default();
        cfg.stars.size = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SceneConfig::default();
        cfg.planet.width_segments = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SceneConfig::default();
        cfg.camera.far = 0.05;
        assert!(cfg.validate().is_err());

        let mut cfg = SceneConfig::default();
        cfg.assets.root = PathBuf::new();
        assert!(cfg.validate().is_err());

        let mut cfg = SceneConfig::default();
        cfg.text.color = "green".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Color { field: "text.color", .. })
        ));
    }

    #[test]
    fn nan_is_not_positive() {
        let mut cfg = SceneConfig::default();
        cfg.planet.radius = f32::NAN;
        assert!(cfg.validate().is_err());
    }
}
