//! Assembles the stock scene from a [`SceneConfig`].
//!
//! [`build_scene`] adds everything that needs no file I/O. Loaded assets are
//! attached afterwards as their requests resolve; a node whose asset failed
//! to load is simply never added.

use std::sync::Arc;

use starscape_assets::{AssetId, Font, ModelData, TextGeometry, TextOptions};
use starscape_common::{Color, NodeId, Transform};

use crate::config::{ConfigError, SceneConfig};
use crate::geometry::MeshData;
use crate::light::{DirectionalLight, PointLight};
use crate::material::{MatcapMaterial, PointsMaterial, StandardMaterial};
use crate::scene::{NodeKind, Scene, SceneNode};
use crate::starfield::StarField;

pub const PLANET: &str = "planet";
pub const STARS: &str = "stars";
pub const POINT_LIGHT: &str = "pointer light";
pub const DIRECTIONAL_LIGHT: &str = "key light";
pub const MODEL: &str = "model";
pub const TEXT: &str = "title";

/// Ids of the nodes the runtime animates or the panel edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub planet: NodeId,
    pub stars: NodeId,
    pub point_light: NodeId,
    pub directional_light: NodeId,
    pub model: Option<NodeId>,
    pub text: Option<NodeId>,
}

pub fn build_scene(config: &SceneConfig) -> Result<(Scene, SceneHandles), ConfigError> {
    let mut scene = Scene::new();

    let stars = StarField {
        count: config.stars.count,
        spread: config.stars.spread,
        seed: config.stars.seed,
    };
    let stars = scene.add(SceneNode::new(
        STARS,
        NodeKind::Points {
            positions: stars.generate(),
            material: PointsMaterial {
                color: Color::WHITE,
                size: config.stars.size,
                size_attenuation: true,
                transparent: true,
                alpha_map: None,
            },
        },
    ));

    let p = &config.planet;
    let planet = scene.add(
        SceneNode::new(
            PLANET,
            NodeKind::Mesh {
                geometry: Arc::new(MeshData::sphere(p.radius, p.width_segments, p.height_segments)),
                material: StandardMaterial {
                    color: config.planet_color()?,
                    metalness: p.metalness,
                    roughness: p.roughness,
                    normal_scale: p.normal_scale,
                    ..StandardMaterial::default()
                }
                .into(),
            },
        )
        .with_transform(Transform::from_position(p.position).with_rotation(p.rotation)),
    );

    let pl = &config.lights.point;
    let point_light = scene.add(
        SceneNode::new(
            POINT_LIGHT,
            NodeKind::PointLight(PointLight {
                color: config.point_light_color()?,
                intensity: pl.intensity,
                distance: pl.distance,
                decay: pl.decay,
            }),
        )
        // Stays at the origin until the first pointer move.
        .with_transform(Transform::from_position(glam::Vec3::ZERO)),
    );

    let dl = &config.lights.directional;
    let directional_light = scene.add(
        SceneNode::new(
            DIRECTIONAL_LIGHT,
            NodeKind::DirectionalLight(DirectionalLight {
                color: config.directional_light_color()?,
                intensity: dl.intensity,
            }),
        )
        .with_transform(Transform::from_position(dl.position)),
    );

    tracing::info!(nodes = scene.len(), stars = config.stars.count, "scene built");
    Ok((
        scene,
        SceneHandles {
            planet,
            stars,
            point_light,
            directional_light,
            model: None,
            text: None,
        },
    ))
}

impl SceneHandles {
    /// Add the imported model as a group with one mesh child per primitive.
    pub fn attach_model(
        &mut self,
        scene: &mut Scene,
        config: &SceneConfig,
        model: &ModelData,
    ) -> NodeId {
        let root = scene.add(SceneNode::new(MODEL, NodeKind::Group).with_transform(
            Transform::from_position(config.model.position).with_rotation(config.model.rotation),
        ));
        for (i, prim) in model.primitives.iter().enumerate() {
            let [r, g, b, _] = prim.base_color;
            let node = SceneNode::new(
                format!("{MODEL}/{i}"),
                NodeKind::Mesh {
                    geometry: Arc::new(MeshData::from_primitive(prim)),
                    material: StandardMaterial {
                        color: Color::new(r, g, b),
                        metalness: prim.metallic,
                        roughness: prim.roughness,
                        ..StandardMaterial::default()
                    }
                    .into(),
                },
            );
            // The root was inserted just above.
            let _ = scene.add_child(root, node);
        }
        self.model = Some(root);
        root
    }

    /// Lay out, extrude, centre and add the configured text as a solid
    /// matcap-shaded mesh.
    pub fn attach_text(
        &mut self,
        scene: &mut Scene,
        config: &SceneConfig,
        font: &Font,
    ) -> Result<NodeId, ConfigError> {
        let t = &config.text;
        let mut geometry = TextGeometry::build(
            font,
            &t.content,
            TextOptions {
                size: t.size,
                height: t.height,
                curve_segments: t.curve_segments,
            },
        );
        geometry.center();
        let id = scene.add(
            SceneNode::new(
                TEXT,
                NodeKind::Mesh {
                    geometry: Arc::new(MeshData::from_text(&geometry.mesh())),
                    material: MatcapMaterial {
                        color: config.text_color()?,
                    }
                    .into(),
                },
            )
            .with_transform(Transform::from_position(t.position).with_rotation(t.rotation)),
        );
        self.text = Some(id);
        Ok(id)
    }

    pub fn set_star_alpha(&self, scene: &mut Scene, texture: AssetId) {
        if let Some(SceneNode {
            kind: NodeKind::Points { material, .. },
            ..
        }) = scene.get_mut(self.stars)
        {
            material.alpha_map = Some(texture);
        }
    }

    pub fn set_planet_color_map(&self, scene: &mut Scene, texture: AssetId) {
        if let Some(material) = scene.standard_material_mut(self.planet) {
            material.color_map = Some(texture);
        }
    }

    pub fn set_planet_normal_map(&self, scene: &mut Scene, texture: AssetId) {
        if let Some(material) = scene.standard_material_mut(self.planet) {
            material.normal_map = Some(texture);
        }
    }

    /// Use the cube map as background and, if configured, as every standard
    /// material's reflection map.
    pub fn set_environment(&self, scene: &mut Scene, config: &SceneConfig, cube_map: AssetId) {
        scene.set_background(Some(cube_map));
        if config.environment.apply_to_materials {
            scene.apply_environment_map(cube_map);
        }
    }
}
