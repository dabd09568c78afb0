//! End-to-end frame loop against the headless text renderer.

use std::time::Duration;

use glam::Vec3;
use starscape_common::Viewport;
use starscape_input::PointerLight;
use starscape_render::{
    BloomSettings, DebugTextRenderer, OrbitControls, PerspectiveCamera, PostChain, SurfaceTarget,
    ViewportSynchronizer,
};
use starscape_runtime::{CancellationToken, FrameScheduler, ManualClock, TickOutcome};
use starscape_scene::{Scene, SceneConfig, SceneHandles, build_scene};

/// Stand-in for the GPU renderer's drawing buffer.
#[derive(Debug, Default)]
struct Surface {
    size: (u32, u32),
    pixel_ratio: f32,
}

impl SurfaceTarget for Surface {
    fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }
}

struct Harness {
    config: SceneConfig,
    scene: Scene,
    handles: SceneHandles,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    clock: ManualClock,
    token: CancellationToken,
    scheduler: FrameScheduler<ManualClock>,
    renderer: DebugTextRenderer,
}

impl Harness {
    fn new() -> Self {
        let config = SceneConfig::default();
        let (scene, handles) = build_scene(&config).unwrap();
        let camera = PerspectiveCamera::new(
            config.camera.fov,
            1.0,
            config.camera.near,
            config.camera.far,
        )
        .with_position(config.camera.position);
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        let mut scheduler = FrameScheduler::new(clock.clone(), token.clone());
        scheduler.add_spin(handles.planet, config.planet.spin_rate);
        scheduler.add_spin(handles.stars, config.stars.spin_rate);
        Self {
            controls: OrbitControls::new(config.camera.damping),
            config,
            scene,
            handles,
            camera,
            clock,
            token,
            scheduler,
            renderer: DebugTextRenderer::new(),
        }
    }

    fn tick(&mut self) -> TickOutcome<String> {
        self.scheduler.tick(
            &mut self.scene,
            &mut self.camera,
            &mut self.controls,
            &mut self.renderer,
        )
    }

    fn rotation_y(&self, id: starscape_common::NodeId) -> f32 {
        self.scene.get(id).unwrap().transform.rotation.y
    }
}

#[test]
fn rotations_at_ten_seconds() {
    let mut h = Harness::new();
    h.clock.set(Duration::from_secs(10));
    assert!(matches!(h.tick(), TickOutcome::Continue(_)));
    assert!((h.rotation_y(h.handles.planet) - 0.5).abs() < 1e-5);
    assert!((h.rotation_y(h.handles.stars) - 0.2).abs() < 1e-5);

    // The planet keeps its authored tilt.
    let tilt = h.scene.get(h.handles.planet).unwrap().transform.rotation.z;
    assert!((tilt - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
}

#[test]
fn rotation_is_a_function_of_time_not_tick_count() {
    let mut h = Harness::new();
    h.clock.set(Duration::from_secs(2));
    for _ in 0..5 {
        h.tick();
    }
    assert!((h.rotation_y(h.handles.planet) - 0.1).abs() < 1e-6);
}

#[test]
fn cancel_stops_the_loop() {
    let mut h = Harness::new();
    h.clock.set(Duration::from_secs(1));
    let mut frames = 0;
    while let TickOutcome::Continue(_) = h.tick() {
        frames += 1;
        h.clock.advance(Duration::from_millis(16));
        if frames == 3 {
            h.token.cancel();
        }
    }
    assert_eq!(frames, 3);
    assert_eq!(h.renderer.frames(), 3);
}

#[test]
fn resize_updates_everything_in_one_call() {
    let mut h = Harness::new();
    let mut sync = ViewportSynchronizer::new(Viewport::new(1920, 1080, 1.0));
    let mut surface = Surface::default();
    let mut post = PostChain::new(BloomSettings::default(), 1.0);
    sync.sync(&mut h.camera, &mut [&mut surface, &mut post]);
    assert!((h.camera.aspect - 1.778).abs() < 1e-3);

    assert!(sync.on_resize(1280, 720, 3.0, &mut h.camera, &mut [&mut surface, &mut post]));
    assert!((h.camera.aspect - 1.778).abs() < 1e-3);
    assert_eq!(surface.size, (1280, 720));
    assert_eq!(surface.pixel_ratio, 2.0);
    assert_eq!(post.buffer_size(), (2560, 1440));

    let camera_before = h.camera.clone();
    let viewport_before = sync.viewport();
    sync.on_resize(1280, 720, 3.0, &mut h.camera, &mut [&mut surface, &mut post]);
    assert_eq!(h.camera, camera_before);
    assert_eq!(sync.viewport(), viewport_before);
    assert_eq!(surface.size, (1280, 720));

    let out = match h.tick() {
        TickOutcome::Continue(out) => out,
        TickOutcome::Stopped => panic!("scheduler should run"),
    };
    assert!(out.contains("aspect=1.778"));
}

#[test]
fn pointer_moves_the_point_light() {
    let mut h = Harness::new();
    let viewport = Viewport::new(800, 600, 1.0);
    let mut pointer = PointerLight::new(h.config.lights.point.depth);
    assert_eq!(h.scene.world_position(h.handles.point_light), Some(Vec3::ZERO));

    let pos = pointer.on_pointer_move(400.0, 300.0, &viewport);
    h.scene
        .get_mut(h.handles.point_light)
        .unwrap()
        .transform
        .position = pos;
    assert_eq!(pos, Vec3::new(0.0, 0.0, 0.3));

    let pos = pointer.on_pointer_move(800.0, 0.0, &viewport);
    h.scene
        .get_mut(h.handles.point_light)
        .unwrap()
        .transform
        .position = pos;
    let light = h.scene.world_position(h.handles.point_light).unwrap();
    assert!(light.abs_diff_eq(Vec3::new(1.0, 1.0, 0.3), 1e-6));
}
