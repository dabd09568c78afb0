//! Everything the window handlers read or change, in one context value.

use anyhow::Context as _;
use starscape_assets::{AssetId, AssetLoader, AssetStore, CubeTextureData, TextureData};
use starscape_common::Viewport;
use starscape_input::{Action, InputMapper, PointerLight};
use starscape_render::{
    BloomSettings, OrbitControls, PerspectiveCamera, PostChain, SurfaceTarget,
    ViewportSynchronizer,
};
use starscape_render_wgpu::ColorSpace;
use starscape_runtime::{CancellationToken, Clock, FrameScheduler};
use starscape_scene::{Scene, SceneConfig, SceneHandles, build_scene};
use starscape_tools::{AssetStatus, DebugPanel, SceneParamTarget, StockParams};

use crate::assets::{Arrival, SceneAssets};

/// Receives decoded textures so a backend can upload them.
pub trait TextureSink {
    fn texture(&mut self, id: AssetId, data: &TextureData, space: ColorSpace);
    fn cube(&mut self, id: AssetId, data: &CubeTextureData);
}

pub struct AppState {
    pub config: SceneConfig,
    pub scene: Scene,
    pub handles: SceneHandles,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub scheduler: FrameScheduler<Clock>,
    pub sync: ViewportSynchronizer,
    pub post: PostChain,
    pub pointer: PointerLight,
    pub input: InputMapper,
    pub panel: DebugPanel,
    pub params: StockParams,
    store: AssetStore,
    assets: SceneAssets,
}

impl AppState {
    /// Build the stock scene and start loading its assets.
    pub fn new(config: SceneConfig, viewport: Viewport) -> anyhow::Result<Self> {
        let (scene, handles) = build_scene(&config).context("building the scene")?;

        let cam = &config.camera;
        let mut camera = PerspectiveCamera::new(cam.fov, viewport.aspect(), cam.near, cam.far)
            .with_position(cam.position);
        let controls = OrbitControls::new(cam.damping);

        let mut scheduler = FrameScheduler::new(Clock::start(), CancellationToken::new());
        scheduler.add_spin(handles.planet, config.planet.spin_rate);
        scheduler.add_spin(handles.stars, config.stars.spin_rate);

        let bloom = BloomSettings {
            strength: config.bloom.strength,
            radius: config.bloom.radius,
            threshold: config.bloom.threshold,
        };
        let mut post = PostChain::new(bloom, config.renderer.exposure);
        let sync = ViewportSynchronizer::new(viewport);
        sync.sync(&mut camera, &mut [&mut post]);

        let (panel, params) = StockParams::panel(&config);
        let loader = AssetLoader::new(config.assets.root.clone());
        let assets = SceneAssets::request(&loader, &config);

        Ok(Self {
            pointer: PointerLight::new(config.lights.point.depth),
            config,
            scene,
            handles,
            camera,
            controls,
            scheduler,
            sync,
            post,
            input: InputMapper::new(),
            panel,
            params,
            store: AssetStore::new(),
            assets,
        })
    }

    pub fn token(&self) -> &CancellationToken {
        self.scheduler.token()
    }

    /// Apply one input action. `surface` is resized along with the post chain.
    pub fn apply(&mut self, action: Action, surface: &mut dyn SurfaceTarget) {
        let viewport_height = self.sync.viewport().height as f32;
        match action {
            Action::PointerMoved { x, y } => {
                let position = self.pointer.on_pointer_move(x, y, &self.sync.viewport());
                if let Some(light) = self.scene.get_mut(self.handles.point_light) {
                    light.transform.position = position;
                }
            }
            Action::Resized {
                width,
                height,
                device_pixel_ratio,
            } => {
                let mut targets: [&mut dyn SurfaceTarget; 2] = [&mut self.post, surface];
                self.sync.on_resize(
                    width,
                    height,
                    device_pixel_ratio,
                    &mut self.camera,
                    &mut targets,
                );
            }
            Action::Orbit(delta) => self.controls.rotate(delta, viewport_height),
            Action::Pan(delta) => self.controls.pan(delta, &self.camera, viewport_height),
            Action::Zoom(steps) => self.controls.dolly(steps),
            Action::TogglePanel => self.panel.toggle(),
            Action::Quit => {
                tracing::info!("quit requested");
                self.token().cancel();
            }
        }
    }

    /// Move finished loads into the scene.
    pub fn poll_assets(&mut self, sink: &mut dyn TextureSink) {
        for arrival in self.assets.poll() {
            self.integrate(arrival, sink);
        }
    }

    pub fn integrate(&mut self, arrival: Arrival, sink: &mut dyn TextureSink) {
        match arrival {
            Arrival::StarAlpha(texture) => {
                let id = self.register_texture(texture, ColorSpace::Linear, sink);
                self.handles.set_star_alpha(&mut self.scene, id);
            }
            Arrival::PlanetColor(texture) => {
                let id = self.register_texture(texture, ColorSpace::Srgb, sink);
                self.handles.set_planet_color_map(&mut self.scene, id);
            }
            Arrival::PlanetNormal(texture) => {
                let id = self.register_texture(texture, ColorSpace::Linear, sink);
                self.handles.set_planet_normal_map(&mut self.scene, id);
            }
            Arrival::Environment(cube) => {
                let id = self.store.register_cube_texture(cube);
                if let Some(data) = self.store.get_cube_texture(id) {
                    sink.cube(id, data);
                }
                self.handles
                    .set_environment(&mut self.scene, &self.config, id);
            }
            Arrival::Model(model) => {
                let id = self
                    .handles
                    .attach_model(&mut self.scene, &self.config, &model);
                tracing::info!(node = %id, primitives = model.primitives.len(), "model attached");
            }
            Arrival::Font(font) => {
                match self.handles.attach_text(&mut self.scene, &self.config, &font) {
                    Ok(id) => tracing::info!(node = %id, "text attached"),
                    Err(e) => tracing::error!(error = %e, "text not added"),
                }
            }
        }
    }

    fn register_texture(
        &mut self,
        texture: TextureData,
        space: ColorSpace,
        sink: &mut dyn TextureSink,
    ) -> AssetId {
        let id = self.store.register_texture(texture);
        if let Some(data) = self.store.get_texture(id) {
            sink.texture(id, data, space);
        }
        id
    }

    /// Deliver pending panel edits. Returns how many were applied.
    pub fn apply_panel(&mut self) -> usize {
        let mut target = SceneParamTarget {
            params: &self.params,
            handles: &self.handles,
            scene: &mut self.scene,
            bloom: &mut self.post.bloom,
        };
        self.panel.dispatch(&mut target)
    }

    pub fn asset_statuses(&self) -> Vec<AssetStatus> {
        self.assets.statuses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use starscape_render::DebugTextRenderer;
    use starscape_runtime::TickOutcome;
    use starscape_scene::NodeKind;

    #[derive(Default)]
    struct Swapchain {
        size: (u32, u32),
        pixel_ratio: f32,
    }

    impl SurfaceTarget for Swapchain {
        fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
            self.pixel_ratio = pixel_ratio;
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }
    }

    #[derive(Default)]
    struct Uploads {
        textures: Vec<(AssetId, ColorSpace)>,
        cubes: Vec<AssetId>,
    }

    impl TextureSink for Uploads {
        fn texture(&mut self, id: AssetId, _data: &TextureData, space: ColorSpace) {
            self.textures.push((id, space));
        }

        fn cube(&mut self, id: AssetId, _data: &CubeTextureData) {
            self.cubes.push(id);
        }
    }

    fn state() -> AppState {
        let mut config = SceneConfig::default();
        config.assets.root = std::env::temp_dir().join("starscape-desktop-no-assets");
        AppState::new(config, Viewport::new(800, 600, 1.0)).unwrap()
    }

    #[test]
    fn pointer_drives_the_point_light() {
        let mut s = state();
        let mut surface = Swapchain::default();
        assert_eq!(s.scene.world_position(s.handles.point_light), Some(Vec3::ZERO));
        s.apply(Action::PointerMoved { x: 800.0, y: 0.0 }, &mut surface);
        let light = s.scene.world_position(s.handles.point_light).unwrap();
        assert!(light.abs_diff_eq(Vec3::new(1.0, 1.0, 0.3), 1e-6));
    }

    #[test]
    fn resize_reaches_camera_post_and_surface() {
        let mut s = state();
        let mut surface = Swapchain::default();
        let resize = Action::Resized {
            width: 1000,
            height: 500,
            device_pixel_ratio: 3.0,
        };
        s.apply(resize, &mut surface);
        assert_eq!(s.camera.aspect, 2.0);
        assert_eq!(surface.size, (1000, 500));
        assert_eq!(surface.pixel_ratio, 2.0);
        assert_eq!(s.post.buffer_size(), (2000, 1000));

        let minimized = Action::Resized {
            width: 0,
            height: 0,
            device_pixel_ratio: 1.0,
        };
        s.apply(minimized, &mut surface);
        assert_eq!(surface.size, (1000, 500));
        assert_eq!(s.camera.aspect, 2.0);
    }

    #[test]
    fn drag_and_scroll_move_the_camera() {
        let mut s = state();
        let mut surface = Swapchain::default();
        let before = s.camera.position;
        s.apply(Action::Orbit(Vec2::new(40.0, 0.0)), &mut surface);
        s.apply(Action::Zoom(1.0), &mut surface);
        s.controls.update(&mut s.camera);
        assert_ne!(s.camera.position, before);
    }

    #[test]
    fn quit_stops_the_scheduler() {
        let mut s = state();
        let mut surface = Swapchain::default();
        s.apply(Action::Quit, &mut surface);
        assert!(s.token().is_cancelled());

        let mut renderer = DebugTextRenderer::new();
        let outcome = s
            .scheduler
            .tick(&mut s.scene, &mut s.camera, &mut s.controls, &mut renderer);
        assert_eq!(outcome, TickOutcome::Stopped);
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn toggle_opens_the_panel() {
        let mut s = state();
        let mut surface = Swapchain::default();
        assert!(!s.panel.is_open());
        s.apply(Action::TogglePanel, &mut surface);
        assert!(s.panel.is_open());
    }

    #[test]
    fn panel_edits_reach_bloom_and_material() {
        let mut s = state();
        s.panel.set(s.params.bloom_strength, 3.5);
        s.panel.set(s.params.planet_roughness, 0.25);
        assert_eq!(s.apply_panel(), 2);
        assert_eq!(s.post.bloom.strength, 3.5);
        let roughness = s
            .scene
            .standard_material_mut(s.handles.planet)
            .map(|m| m.roughness);
        assert_eq!(roughness, Some(0.25));
        assert_eq!(s.apply_panel(), 0);
    }

    #[test]
    fn textures_are_uploaded_with_their_colour_space() {
        let mut s = state();
        let mut uploads = Uploads::default();
        s.integrate(
            Arrival::PlanetColor(TextureData::solid([200, 10, 10, 255])),
            &mut uploads,
        );
        s.integrate(
            Arrival::PlanetNormal(TextureData::solid([128, 128, 255, 255])),
            &mut uploads,
        );
        assert_eq!(uploads.textures.len(), 2);
        assert_eq!(uploads.textures[0].1, ColorSpace::Srgb);
        assert_eq!(uploads.textures[1].1, ColorSpace::Linear);

        let material = s.scene.standard_material_mut(s.handles.planet).unwrap();
        assert_eq!(material.color_map, Some(uploads.textures[0].0));
        assert_eq!(material.normal_map, Some(uploads.textures[1].0));
    }

    #[test]
    fn environment_becomes_the_background() {
        let mut s = state();
        let mut uploads = Uploads::default();
        let faces = vec![TextureData::solid([0, 0, 40, 255]); 6];
        let cube = CubeTextureData::from_faces(faces).unwrap();
        s.integrate(Arrival::Environment(cube), &mut uploads);
        assert_eq!(uploads.cubes.len(), 1);
        assert_eq!(s.scene.background(), Some(uploads.cubes[0]));
    }

    #[test]
    fn star_alpha_map_is_linear() {
        let mut s = state();
        let mut uploads = Uploads::default();
        s.integrate(
            Arrival::StarAlpha(TextureData::solid([255, 255, 255, 255])),
            &mut uploads,
        );
        assert_eq!(uploads.textures[0].1, ColorSpace::Linear);
        let alpha = match &s.scene.get(s.handles.stars).unwrap().kind {
            NodeKind::Points { material, .. } => material.alpha_map,
            _ => None,
        };
        assert_eq!(alpha, Some(uploads.textures[0].0));
    }
}
