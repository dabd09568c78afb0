use starscape_assets::AssetId;
use starscape_common::Color;

/// Metallic-roughness surface lit by scene lights.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub color_map: Option<AssetId>,
    pub normal_map: Option<AssetId>,
    pub normal_scale: f32,
    /// Cube map used for reflections; see `Scene::apply_environment_map`.
    pub env_map: Option<AssetId>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            color_map: None,
            normal_map: None,
            normal_scale: 1.0,
            env_map: None,
        }
    }
}

/// Screen-facing sprites drawn at each point of a point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsMaterial {
    pub color: Color,
    /// Sprite size in world units when attenuated, pixels otherwise.
    pub size: f32,
    pub size_attenuation: bool,
    pub transparent: bool,
    /// Greyscale texture whose green channel becomes sprite alpha.
    pub alpha_map: Option<AssetId>,
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            size: 1.0,
            size_attenuation: true,
            transparent: false,
            alpha_map: None,
        }
    }
}

/// Unlit material with a baked view-dependent shade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatcapMaterial {
    pub color: Color,
}

/// Surface of a triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterial {
    Standard(StandardMaterial),
    Matcap(MatcapMaterial),
}

impl MeshMaterial {
    pub fn as_standard(&self) -> Option<&StandardMaterial> {
        match self {
            MeshMaterial::Standard(m) => Some(m),
            MeshMaterial::Matcap(_) => None,
        }
    }

    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            MeshMaterial::Standard(m) => Some(m),
            MeshMaterial::Matcap(_) => None,
        }
    }
}

impl From<StandardMaterial> for MeshMaterial {
    fn from(m: StandardMaterial) -> Self {
        MeshMaterial::Standard(m)
    }
}

impl From<MatcapMaterial> for MeshMaterial {
    fn from(m: MatcapMaterial) -> Self {
        MeshMaterial::Matcap(m)
    }
}
