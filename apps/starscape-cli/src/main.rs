use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use starscape_assets::{AssetError, AssetLoader, AssetStore};
use starscape_common::Viewport;
use starscape_render::{DebugTextRenderer, OrbitControls, PerspectiveCamera};
use starscape_runtime::{CancellationToken, FrameScheduler, ManualClock, TickOutcome};
use starscape_scene::{Scene, SceneConfig, SceneHandles, build_scene};
use starscape_tools::{AssetState, AssetStatus, SceneInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starscape-cli", about = "Headless tool for the starscape scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scene configuration (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the asset root directory
    #[arg(short, long, global = true)]
    assets: Option<PathBuf>,

    /// Override the star field seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration and a summary of the stock scene
    Info {
        /// Print the full configuration as YAML
        #[arg(long)]
        yaml: bool,
    },
    /// Run the frame loop on a manual clock and print the text render
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        ticks: u32,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Print every Nth frame; 0 prints only the last
        #[arg(long, default_value = "0")]
        every: u32,
        /// Load the model and font first and add them to the scene
        #[arg(long)]
        with_assets: bool,
    },
    /// Load every configured asset and report its status
    CheckAssets,
}

fn scene_config(cli: &Cli) -> Result<SceneConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            SceneConfig::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => SceneConfig::default(),
    };
    if let Some(root) = &cli.assets {
        config.assets.root = root.clone();
    }
    if let Some(seed) = cli.seed {
        config.stars.seed = seed;
    }
    config.validate().context("invalid scene config")?;
    Ok(config)
}

fn status<T>(label: &str, result: &Result<T, AssetError>) -> AssetStatus {
    match result {
        Ok(_) => AssetStatus::new(label, AssetState::Loaded),
        Err(e) => AssetStatus::new(label, AssetState::Failed(e.to_string())),
    }
}

/// Start every load at once, then block on each and attach what arrived.
fn load_all(
    config: &SceneConfig,
    scene: &mut Scene,
    handles: &mut SceneHandles,
) -> Vec<AssetStatus> {
    let paths = &config.assets;
    let loader = AssetLoader::new(paths.root.clone());
    let star_alpha = loader.load_texture(&paths.star_alpha);
    let planet_color = loader.load_texture(&paths.planet_color);
    let planet_normal = loader.load_texture(&paths.planet_normal);
    let environment = loader.load_cube_texture(&paths.environment);
    let model = loader.load_model(&paths.model);
    let font = loader.load_font(&paths.font);

    let mut store = AssetStore::new();
    let mut statuses = Vec::new();

    let label = star_alpha.label().to_string();
    let result = star_alpha.wait();
    statuses.push(status(&label, &result));
    if let Ok(texture) = result {
        handles.set_star_alpha(scene, store.register_texture(texture));
    }

    let label = planet_color.label().to_string();
    let result = planet_color.wait();
    statuses.push(status(&label, &result));
    if let Ok(texture) = result {
        handles.set_planet_color_map(scene, store.register_texture(texture));
    }

    let label = planet_normal.label().to_string();
    let result = planet_normal.wait();
    statuses.push(status(&label, &result));
    if let Ok(texture) = result {
        handles.set_planet_normal_map(scene, store.register_texture(texture));
    }

    let label = environment.label().to_string();
    let result = environment.wait();
    statuses.push(status(&label, &result));
    if let Ok(cube) = result {
        handles.set_environment(scene, config, store.register_cube_texture(cube));
    }

    let label = model.label().to_string();
    let result = model.wait();
    statuses.push(status(&label, &result));
    if let Ok(model) = result {
        handles.attach_model(scene, config, &model);
    }

    let label = font.label().to_string();
    let result = font.wait();
    let mut font_status = status(&label, &result);
    if let Ok(font) = result {
        if let Err(e) = handles.attach_text(scene, config, &font) {
            font_status.state = AssetState::Failed(e.to_string());
        }
    }
    statuses.push(font_status);

    tracing::debug!(stored = store.len(), "asset check finished");
    statuses
}

fn info(config: &SceneConfig, yaml: bool) -> Result<()> {
    println!("starscape-cli v{}", env!("CARGO_PKG_VERSION"));
    if yaml {
        print!("{}", config.to_yaml().context("serializing config")?);
        return Ok(());
    }
    println!("assets:  {}", config.assets.root.display());
    println!(
        "camera:  fov={} near={} far={} pos=({}, {}, {})",
        config.camera.fov,
        config.camera.near,
        config.camera.far,
        config.camera.position.x,
        config.camera.position.y,
        config.camera.position.z
    );
    println!(
        "stars:   count={} spread={} size={} seed={}",
        config.stars.count, config.stars.spread, config.stars.size, config.stars.seed
    );
    println!(
        "planet:  radius={} color={} metalness={} roughness={}",
        config.planet.radius, config.planet.color, config.planet.metalness, config.planet.roughness
    );
    println!(
        "bloom:   strength={} radius={} threshold={} exposure={}",
        config.bloom.strength, config.bloom.radius, config.bloom.threshold, config.renderer.exposure
    );

    let (scene, _) = build_scene(config).context("building the scene")?;
    println!("{}", SceneInspector::summary(&scene, &[]));
    Ok(())
}

fn simulate(config: &SceneConfig, ticks: u32, fps: u32, every: u32, with_assets: bool) -> Result<()> {
    anyhow::ensure!(fps > 0, "fps must be positive");
    let (mut scene, mut handles) = build_scene(config).context("building the scene")?;
    if with_assets {
        for status in load_all(config, &mut scene, &mut handles) {
            println!("{status}");
        }
    }

    let viewport = Viewport::default();
    let cam = &config.camera;
    let mut camera = PerspectiveCamera::new(cam.fov, viewport.aspect(), cam.near, cam.far)
        .with_position(cam.position);
    let mut controls = OrbitControls::new(cam.damping);

    let clock = ManualClock::new();
    let mut scheduler = FrameScheduler::new(clock.clone(), CancellationToken::new());
    scheduler.add_spin(handles.planet, config.planet.spin_rate);
    scheduler.add_spin(handles.stars, config.stars.spin_rate);

    let frame = Duration::from_secs(1) / fps;
    let mut renderer = DebugTextRenderer::new();
    let mut last = String::new();
    for tick in 1..=ticks {
        clock.advance(frame);
        match scheduler.tick(&mut scene, &mut camera, &mut controls, &mut renderer) {
            TickOutcome::Continue(out) => {
                if every > 0 && tick % every == 0 {
                    print!("{out}");
                }
                last = out;
            }
            TickOutcome::Stopped => break,
        }
    }
    if every == 0 {
        print!("{last}");
    }

    let timer = scheduler.timer();
    println!(
        "simulated {} frames over {:.3}s ({:.1} fps)",
        renderer.frames(),
        scheduler.elapsed_secs(),
        timer.fps()
    );
    Ok(())
}

fn check_assets(config: &SceneConfig) -> Result<()> {
    let (mut scene, mut handles) = build_scene(config).context("building the scene")?;
    let statuses = load_all(config, &mut scene, &mut handles);
    let summary = SceneInspector::summary(&scene, &statuses);
    println!("{summary}");

    let failed = summary.failed_assets();
    anyhow::ensure!(
        failed == 0,
        "{failed} of {} assets failed to load from {}",
        statuses.len(),
        config.assets.root.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = scene_config(&cli)?;
    match cli.command {
        Commands::Info { yaml } => info(&config, yaml),
        Commands::Simulate {
            ticks,
            fps,
            every,
            with_assets,
        } => simulate(&config, ticks, fps, every, with_assets),
        Commands::CheckAssets => check_assets(&config),
    }
}
