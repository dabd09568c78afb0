use std::collections::BTreeMap;
use std::fmt;

use starscape_common::NodeId;
use starscape_scene::Scene;

/// Load progress of one asset, as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStatus {
    pub label: String,
    pub state: AssetState,
}

impl AssetStatus {
    pub fn new(label: impl Into<String>, state: AssetState) -> Self {
        Self {
            label: label.into(),
            state,
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            AssetState::Pending => write!(f, "{}: loading", self.label),
            AssetState::Loaded => write!(f, "{}: ok", self.label),
            AssetState::Failed(e) => write!(f, "{}: FAILED ({e})", self.label),
        }
    }
}

/// Read-only queries against the scene for the panel and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene, assets: &[AssetStatus]) -> SceneSummary {
        SceneSummary {
            node_count: scene.len(),
            kinds: scene.kind_counts(),
            light_count: scene.light_count(),
            has_background: scene.background().is_some(),
            assets: assets.to_vec(),
        }
    }

    /// One line describing a node, or `None` if it does not exist.
    pub fn describe(scene: &Scene, id: NodeId) -> Option<String> {
        let node = scene.get(id)?;
        let p = scene.world_position(id)?;
        let r = node.transform.rotation;
        Some(format!(
            "{id} {} ({}) world=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})",
            node.name,
            node.kind.label(),
            p.x,
            p.y,
            p.z,
            r.x,
            r.y,
            r.z
        ))
    }
}

#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub node_count: usize,
    pub kinds: BTreeMap<&'static str, usize>,
    pub light_count: usize,
    pub has_background: bool,
    pub assets: Vec<AssetStatus>,
}

impl SceneSummary {
    pub fn failed_assets(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| matches!(a.state, AssetState::Failed(_)))
            .count()
    }

    pub fn pending_assets(&self) -> usize {
        self.assets
            .iter()
            .filter(|a| a.state == AssetState::Pending)
            .count()
    }
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self
            .kinds
            .iter()
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect();
        write!(
            f,
            "Scene: nodes={} lights={} background={} [{}]",
            self.node_count,
            self.light_count,
            if self.has_background { "cube map" } else { "none" },
            kinds.join(", ")
        )?;
        for asset in &self.assets {
            write!(f, "\n  {asset}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starscape_scene::{SceneConfig, build_scene};

    #[test]
    fn summary_of_stock_scene() {
        let (scene, _) = build_scene(&SceneConfig::default()).unwrap();
        let summary = SceneInspector::summary(&scene, &[]);
        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.light_count, 2);
        assert_eq!(summary.kinds.get("mesh"), Some(&1));
        assert!(!summary.has_background);
        let s = summary.to_string();
        assert!(s.contains("nodes=4"));
        assert!(s.contains("background=none"));
    }

    #[test]
    fn asset_states_are_counted_and_listed() {
        let scene = Scene::new();
        let assets = [
            AssetStatus::new("/a.png", AssetState::Loaded),
            AssetStatus::new("/b.glb", AssetState::Pending),
            AssetStatus::new("/c.json", AssetState::Failed("no such file".into())),
        ];
        let summary = SceneInspector::summary(&scene, &assets);
        assert_eq!(summary.failed_assets(), 1);
        assert_eq!(summary.pending_assets(), 1);
        let s = summary.to_string();
        assert!(s.contains("/a.png: ok"));
        assert!(s.contains("/c.json: FAILED (no such file)"));
    }

    #[test]
    fn describe_node() {
        let (scene, handles) = build_scene(&SceneConfig::default()).unwrap();
        let line = SceneInspector::describe(&scene, handles.planet).unwrap();
        assert!(line.contains("planet (mesh)"));
        assert!(line.contains("world=(0.40, -6.00, 0.00)"));
        assert!(SceneInspector::describe(&scene, NodeId(99)).is_none());
    }
}
