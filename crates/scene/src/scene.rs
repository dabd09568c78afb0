use glam::{Mat4, Vec3};
use std::collections::BTreeMap;
use std::sync::Arc;

use starscape_assets::AssetId;
use starscape_common::{NodeId, Transform};

use crate::geometry::MeshData;
use crate::light::{DirectionalLight, PointLight};
use crate::material::{MeshMaterial, PointsMaterial, StandardMaterial};

/// What a node draws or emits.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure transform node; children inherit its transform.
    Group,
    Mesh {
        geometry: Arc<MeshData>,
        material: MeshMaterial,
    },
    Points {
        positions: Vec<[f32; 3]>,
        material: PointsMaterial,
    },
    PointLight(PointLight),
    DirectionalLight(DirectionalLight),
}

impl NodeKind {
    /// Short name for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh { .. } => "mesh",
            NodeKind::Points { .. } => "points",
            NodeKind::PointLight(_) => "point light",
            NodeKind::DirectionalLight(_) => "directional light",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, NodeKind::PointLight(_) | NodeKind::DirectionalLight(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            parent: None,
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// The scene graph.
///
/// Nodes live in a `BTreeMap` keyed by sequential ids, so iteration order is
/// insertion order and every parent precedes its children.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u32,
    background: Option<AssetId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root node.
    pub fn add(&mut self, mut node: SceneNode) -> NodeId {
        node.parent = None;
        self.insert(node)
    }

    /// Insert a node under `parent`. Returns `None` if the parent is unknown.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        node.parent = Some(parent);
        Some(self.insert(node))
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        tracing::trace!(%id, name = %node.name, kind = node.kind.label(), "node added");
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes()
            .filter(move |(_, node)| node.parent == Some(parent))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// Local-to-world matrix, composing every ancestor's transform.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    /// World-space position of a node's origin.
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id)
            .map(|m| m.transform_point3(Vec3::ZERO))
    }

    /// Cube map drawn behind everything.
    pub fn background(&self) -> Option<AssetId> {
        self.background
    }

    pub fn set_background(&mut self, cube_map: Option<AssetId>) {
        self.background = cube_map;
    }

    /// Assign `env_map` to every standard material in the scene. Returns the
    /// number of materials updated.
    pub fn apply_environment_map(&mut self, env_map: AssetId) -> usize {
        let mut updated = 0;
        for node in self.nodes.values_mut() {
            if let NodeKind::Mesh { material, .. } = &mut node.kind {
                if let Some(material) = material.as_standard_mut() {
                    material.env_map = Some(env_map);
                    updated += 1;
                }
            }
        }
        tracing::debug!(updated, "environment map applied");
        updated
    }

    pub fn standard_material_mut(&mut self, id: NodeId) -> Option<&mut StandardMaterial> {
        match &mut self.nodes.get_mut(&id)?.kind {
            NodeKind::Mesh { material, .. } => material.as_standard_mut(),
            _ => None,
        }
    }

    pub fn point_light_mut(&mut self, id: NodeId) -> Option<&mut PointLight> {
        match &mut self.nodes.get_mut(&id)?.kind {
            NodeKind::PointLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn directional_light_mut(&mut self, id: NodeId) -> Option<&mut DirectionalLight> {
        match &mut self.nodes.get_mut(&id)?.kind {
            NodeKind::DirectionalLight(light) => Some(light),
            _ => None,
        }
    }

    /// Node count per kind label, sorted by label.
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.kind.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn light_count(&self) -> usize {
        self.nodes.values().filter(|n| n.kind.is_light()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MatcapMaterial;
    use starscape_common::Color;

    fn mesh() -> NodeKind {
        NodeKind::Mesh {
            geometry: Arc::new(MeshData::sphere(1.0, 8, 6)),
            material: StandardMaterial::default().into(),
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut scene = Scene::new();
        let a = scene.add(SceneNode::new("a", NodeKind::Group));
        let b = scene.add(SceneNode::new("b", NodeKind::Group));
        assert_eq!((a, b), (NodeId(0), NodeId(1)));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find_by_name("b"), Some(b));
        assert_eq!(scene.find_by_name("c"), None);
    }

    #[test]
    fn child_needs_existing_parent() {
        let mut scene = Scene::new();
        assert!(scene
            .add_child(NodeId(9), SceneNode::new("orphan", NodeKind::Group))
            .is_none());
        let root = scene.add(SceneNode::new("root", NodeKind::Group));
        let child = scene
            .add_child(root, SceneNode::new("child", mesh()))
            .unwrap();
        assert_eq!(scene.children(root).map(|(id, _)| id).collect::<Vec<_>>(), vec![child]);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let root = scene.add(
            SceneNode::new("root", NodeKind::Group)
                .with_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        );
        let child = scene
            .add_child(
                root,
                SceneNode::new("child", NodeKind::Group)
                    .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let p = scene.world_position(child).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn environment_map_reaches_only_standard_materials() {
        let mut scene = Scene::new();
        let a = scene.add(SceneNode::new("a", mesh()));
        scene.add(SceneNode::new("b", mesh()));
        let text = scene.add(SceneNode::new(
            "text",
            NodeKind::Mesh {
                geometry: Arc::new(MeshData::default()),
                material: MatcapMaterial::default().into(),
            },
        ));
        scene.add(SceneNode::new(
            "stars",
            NodeKind::Points {
                positions: vec![],
                material: PointsMaterial::default(),
            },
        ));
        assert_eq!(scene.apply_environment_map(AssetId(5)), 2);
        assert_eq!(scene.standard_material_mut(a).unwrap().env_map, Some(AssetId(5)));
        assert!(scene.standard_material_mut(text).is_none());
    }

    #[test]
    fn typed_accessors_check_kind() {
        let mut scene = Scene::new();
        let light = scene.add(SceneNode::new(
            "sun",
            NodeKind::DirectionalLight(DirectionalLight {
                color: Color::WHITE,
                intensity: 5.0,
            }),
        ));
        assert!(scene.standard_material_mut(light).is_none());
        assert!(scene.point_light_mut(light).is_none());
        scene.directional_light_mut(light).unwrap().intensity = 2.0;
        assert_eq!(scene.light_count(), 1);
        assert_eq!(scene.kind_counts().get("directional light"), Some(&1));
    }
}
