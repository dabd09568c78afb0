use std::hint::black_box;
use std::time::{Duration, Instant};

use starscape_render::{DebugTextRenderer, OrbitControls, PerspectiveCamera, Renderer};
use starscape_runtime::{CancellationToken, FrameScheduler, ManualClock};
use starscape_scene::{Scene, SceneConfig, build_scene};

/// Counts frames without producing output, so the tick itself is measured.
struct NullRenderer;

impl Renderer for NullRenderer {
    type Output = ();

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        black_box((scene.len(), camera.position));
    }
}

fn bench_ticks<R: Renderer>(label: &str, stars: u32, iterations: u32, renderer: &mut R) {
    let mut config = SceneConfig::default();
    config.stars.count = stars;
    let (mut scene, handles) = match build_scene(&config) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("{label}: failed to build scene: {e}");
            return;
        }
    };
    let mut camera = PerspectiveCamera::default().with_position(config.camera.position);
    let mut controls = OrbitControls::new(true);
    let clock = ManualClock::new();
    let mut scheduler = FrameScheduler::new(clock.clone(), CancellationToken::new());
    scheduler.add_spin(handles.planet, config.planet.spin_rate);
    scheduler.add_spin(handles.stars, config.stars.spin_rate);

    let start = Instant::now();
    for _ in 0..iterations {
        clock.advance(Duration::from_micros(16_667));
        black_box(scheduler.tick(&mut scene, &mut camera, &mut controls, renderer));
    }
    let elapsed = start.elapsed();
    println!(
        "{label:<24} stars={stars:<6} {iterations} ticks in {elapsed:?} ({:?}/tick)",
        elapsed / iterations
    );
}

fn main() {
    println!("=== frame tick ===");
    bench_ticks("null renderer", 200, 10_000, &mut NullRenderer);
    bench_ticks("null renderer", 20_000, 10_000, &mut NullRenderer);
    bench_ticks("text renderer", 200, 1_000, &mut DebugTextRenderer::new());
}
