//! Debug parameter panel.
//!
//! The panel owns a list of bounded numeric parameters. UI code calls
//! [`DebugPanel::set`]; the panel clamps and snaps the value, queues a
//! [`ParamChange`], and [`DebugPanel::dispatch`] later hands the queue to a
//! [`ParamObserver`] that applies it to the scene.

use starscape_render::BloomSettings;
use starscape_scene::{Scene, SceneConfig, SceneHandles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Param {
    /// Effective `(low, high)` bounds. A NaN bound is open on that side and
    /// reversed bounds are swapped, so a builder chain may set them in
    /// either order.
    pub fn bounds(&self) -> (f32, f32) {
        let lo = if self.min.is_nan() { f32::NEG_INFINITY } else { self.min };
        let hi = if self.max.is_nan() { f32::INFINITY } else { self.max };
        if lo <= hi { (lo, hi) } else { (hi, lo) }
    }

    /// Clamp to the bounds and snap to the nearest step above the lower
    /// bound (above zero when unbounded below).
    pub fn constrain(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.value;
        }
        let (lo, hi) = self.bounds();
        let clamped = value.clamp(lo, hi);
        if !(self.step.is_finite() && self.step > 0.0) {
            return clamped;
        }
        let origin = if lo.is_finite() { f64::from(lo) } else { 0.0 };
        let step = f64::from(self.step);
        let steps = ((f64::from(clamped) - origin) / step).round();
        ((origin + steps * step) as f32).clamp(lo, hi)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub id: ParamId,
    pub name: String,
    pub value: f32,
}

/// Receives parameter changes from the panel.
pub trait ParamObserver {
    fn on_change(&mut self, change: &ParamChange);
}

/// Chainable setup for a freshly added parameter.
#[must_use = "call .id() to keep the parameter's handle"]
pub struct ParamBuilder<'a> {
    panel: &'a mut DebugPanel,
    id: ParamId,
}

impl ParamBuilder<'_> {
    fn param(&mut self) -> &mut Param {
        &mut self.panel.params[self.id.0]
    }

    pub fn min(mut self, min: f32) -> Self {
        self.param().min = min;
        self
    }

    pub fn max(mut self, max: f32) -> Self {
        self.param().max = max;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.param().step = step;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.param().name = name.to_string();
        self
    }

    pub fn id(self) -> ParamId {
        self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    params: Vec<Param>,
    open: bool,
    pending: Vec<ParamChange>,
}

impl DebugPanel {
    /// An empty panel. Panels start closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with an initial value. It is unbounded and unsnapped
    /// until configured through the builder.
    pub fn add(&mut self, key: &str, value: f32) -> ParamBuilder<'_> {
        let id = ParamId(self.params.len());
        self.params.push(Param {
            name: key.to_string(),
            value,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
            step: 0.0,
        });
        ParamBuilder { panel: self, id }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn get(&self, id: ParamId) -> Option<&Param> {
        self.params.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<ParamId> {
        self.params.iter().position(|p| p.name == name).map(ParamId)
    }

    pub fn params(&self) -> impl Iterator<Item = (ParamId, &Param)> {
        self.params.iter().enumerate().map(|(i, p)| (ParamId(i), p))
    }

    /// Set a value, clamped and snapped. Returns the stored value, or `None`
    /// for an unknown id. A change is queued only if the value differs.
    pub fn set(&mut self, id: ParamId, value: f32) -> Option<f32> {
        let param = self.params.get_mut(id.0)?;
        let value = param.constrain(value);
        if value != param.value {
            param.value = value;
            tracing::debug!(param = %param.name, value, "panel value changed");
            self.pending.push(ParamChange {
                id,
                name: param.name.clone(),
                value,
            });
        }
        Some(value)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Deliver queued changes in order. Returns how many were delivered.
    pub fn dispatch(&mut self, observer: &mut dyn ParamObserver) -> usize {
        let changes = std::mem::take(&mut self.pending);
        for change in &changes {
            observer.on_change(change);
        }
        changes.len()
    }
}

/// Handles for the six stock parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockParams {
    pub planet_metalness: ParamId,
    pub planet_roughness: ParamId,
    pub light_intensity: ParamId,
    pub bloom_strength: ParamId,
    pub bloom_radius: ParamId,
    pub bloom_threshold: ParamId,
}

impl StockParams {
    /// Build the stock panel with initial values from the config.
    pub fn panel(config: &SceneConfig) -> (DebugPanel, Self) {
        let mut panel = DebugPanel::new();
        let planet_metalness = panel
            .add("metalness", config.planet.metalness)
            .min(0.0)
            .max(1.0)
            .step(0.001)
            .name("PlanetMetallness")
            .id();
        let planet_roughness = panel
            .add("roughness", config.planet.roughness)
            .min(0.0)
            .max(1.0)
            .step(0.001)
            .name("PlanetRoughness")
            .id();
        let light_intensity = panel
            .add("intensity", config.lights.directional.intensity)
            .min(0.0)
            .max(10.0)
            .step(0.001)
            .name("LightIntensity")
            .id();
        let bloom_strength = panel
            .add("strength", config.bloom.strength)
            .min(0.0)
            .max(8.0)
            .step(0.01)
            .name("BloomStrength")
            .id();
        let bloom_radius = panel
            .add("radius", config.bloom.radius)
            .min(0.0)
            .max(2.0)
            .step(0.001)
            .name("BloomRadius")
            .id();
        let bloom_threshold = panel
            .add("threshold", config.bloom.threshold)
            .min(0.0)
            .max(1.0)
            .step(0.001)
            .name("BloomThreshold")
            .id();
        (
            panel,
            Self {
                planet_metalness,
                planet_roughness,
                light_intensity,
                bloom_strength,
                bloom_radius,
                bloom_threshold,
            },
        )
    }
}

/// Applies stock parameter changes to the scene and bloom settings.
pub struct SceneParamTarget<'a> {
    pub params: &'a StockParams,
    pub handles: &'a SceneHandles,
    pub scene: &'a mut Scene,
    pub bloom: &'a mut BloomSettings,
}

impl ParamObserver for SceneParamTarget<'_> {
    fn on_change(&mut self, change: &ParamChange) {
        let p = self.params;
        let v = change.value;
        if change.id == p.planet_metalness {
            if let Some(m) = self.scene.standard_material_mut(self.handles.planet) {
                m.metalness = v;
            }
        } else if change.id == p.planet_roughness {
            if let Some(m) = self.scene.standard_material_mut(self.handles.planet) {
                m.roughness = v;
            }
        } else if change.id == p.light_intensity {
            if let Some(l) = self.scene.directional_light_mut(self.handles.directional_light) {
                l.intensity = v;
            }
        } else if change.id == p.bloom_strength {
            self.bloom.strength = v;
        } else if change.id == p.bloom_radius {
            self.bloom.radius = v;
        } else if change.id == p.bloom_threshold {
            self.bloom.threshold = v;
        } else {
            tracing::warn!(param = %change.name, "no target for panel parameter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starscape_scene::build_scene;

    #[derive(Default)]
    struct Recorder(Vec<(String, f32)>);

    impl ParamObserver for Recorder {
        fn on_change(&mut self, change: &ParamChange) {
            self.0.push((change.name.clone(), change.value));
        }
    }

    fn unit_param(panel: &mut DebugPanel) -> ParamId {
        panel
            .add("x", 0.5)
            .min(0.0)
            .max(1.0)
            .step(0.01)
            .name("X")
            .id()
    }

    #[test]
    fn starts_closed() {
        let mut panel = DebugPanel::new();
        assert!(!panel.is_open());
        panel.toggle();
        assert!(panel.is_open());
    }

    #[test]
    fn builder_sets_bounds_and_name() {
        let mut panel = DebugPanel::new();
        let id = unit_param(&mut panel);
        let p = panel.get(id).unwrap();
        assert_eq!((p.min, p.max, p.step), (0.0, 1.0, 0.01));
        assert_eq!(p.name, "X");
        assert_eq!(panel.find("X"), Some(id));
    }

    #[test]
    fn set_clamps_and_snaps() {
        let mut panel = DebugPanel::new();
        let id = unit_param(&mut panel);
        assert_eq!(panel.set(id, 7.0), Some(1.0));
        assert_eq!(panel.set(id, -3.0), Some(0.0));
        let v = panel.set(id, 0.123).unwrap();
        assert!((v - 0.12).abs() < 1e-6);
        assert_eq!(panel.set(id, f32::NAN), Some(v));
        assert_eq!(panel.set(ParamId(9), 0.0), None);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let mut panel = DebugPanel::new();
        let id = panel.add("x", 3.0).min(5.0).max(1.0).id();
        assert_eq!(panel.get(id).unwrap().bounds(), (1.0, 5.0));
        assert_eq!(panel.set(id, 9.0), Some(5.0));
        assert_eq!(panel.set(id, 0.0), Some(1.0));
        assert_eq!(panel.set(id, 2.5), Some(2.5));
    }

    #[test]
    fn nan_bounds_are_open() {
        let mut panel = DebugPanel::new();
        let id = panel.add("x", 0.0).min(f32::NAN).max(2.0).step(f32::NAN).id();
        assert_eq!(panel.set(id, -40.0), Some(-40.0));
        assert_eq!(panel.set(id, 7.0), Some(2.0));

        let id = panel.add("y", 0.0).max(f32::NAN).step(0.5).id();
        assert_eq!(panel.set(id, 100.2), Some(100.0));
    }

    #[test]
    fn unbounded_param_snaps_from_zero() {
        let mut panel = DebugPanel::new();
        let id = panel.add("x", 0.0).step(0.25).id();
        assert_eq!(panel.set(id, 1.3), Some(1.25));
        assert_eq!(panel.set(id, -0.6), Some(-0.5));
    }

    #[test]
    fn only_real_changes_are_dispatched() {
        let mut panel = DebugPanel::new();
        let id = unit_param(&mut panel);
        panel.set(id, 0.5);
        assert!(!panel.has_pending());
        panel.set(id, 0.25);
        panel.set(id, 0.75);

        let mut rec = Recorder::default();
        assert_eq!(panel.dispatch(&mut rec), 2);
        let values: Vec<f32> = rec.0.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0.25, 0.75]);
        assert!(rec.0.iter().all(|(name, _)| name == "X"));
        assert_eq!(panel.dispatch(&mut rec), 0);
    }

    #[test]
    fn stock_panel_ranges() {
        let (panel, ids) = StockParams::panel(&SceneConfig::default());
        assert!(!panel.is_open());
        assert_eq!(panel.params().count(), 6);
        let strength = panel.get(ids.bloom_strength).unwrap();
        assert_eq!(strength.name, "BloomStrength");
        assert_eq!((strength.max, strength.step, strength.value), (8.0, 0.01, 2.0));
        assert_eq!(panel.get(ids.light_intensity).unwrap().max, 10.0);
        assert_eq!(panel.get(ids.bloom_radius).unwrap().max, 2.0);
    }

    #[test]
    fn scene_target_applies_changes() {
        let config = SceneConfig::default();
        let (mut scene, handles) = build_scene(&config).unwrap();
        let mut bloom = BloomSettings::default();
        let (mut panel, ids) = StockParams::panel(&config);

        panel.set(ids.planet_metalness, 0.9);
        panel.set(ids.light_intensity, 12.0);
        panel.set(ids.bloom_threshold, 0.1);
        let mut target = SceneParamTarget {
            params: &ids,
            handles: &handles,
            scene: &mut scene,
            bloom: &mut bloom,
        };
        assert_eq!(panel.dispatch(&mut target), 3);

        assert!((scene.standard_material_mut(handles.planet).unwrap().metalness - 0.9).abs() < 1e-6);
        assert_eq!(
            scene.directional_light_mut(handles.directional_light).unwrap().intensity,
            10.0
        );
        assert!((bloom.threshold - 0.1).abs() < 1e-6);
    }
}
