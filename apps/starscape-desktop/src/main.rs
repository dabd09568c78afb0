mod assets;
mod state;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use egui::Context as EguiContext;
use starscape_assets::{AssetId, CubeTextureData, TextureData};
use starscape_common::Viewport;
use starscape_input::{Action, DragButton};
use starscape_render::{PerspectiveCamera, PostChain, Renderer, SurfaceTarget};
use starscape_render_wgpu::{ColorSpace, WgpuRenderer};
use starscape_runtime::TickOutcome;
use starscape_scene::{Scene, SceneConfig};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::state::{AppState, TextureSink};

/// Pixels of trackpad scroll per zoom step.
const PIXELS_PER_SCROLL_STEP: f64 = 50.0;

#[derive(Parser)]
#[command(name = "starscape-desktop", about = "Interactive planet and star field viewer")]
struct Cli {
    /// Scene configuration (YAML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the asset root directory
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Override the star field seed
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scene_config(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(root) = &self.assets {
            config.assets.root = root.clone();
        }
        if let Some(seed) = self.seed {
            config.stars.seed = seed;
        }
        config.validate().context("invalid scene config")?;
        Ok(config)
    }
}

/// Swapchain settings that follow the viewport. Reconfiguring is deferred to
/// the next frame so several resize events collapse into one.
struct SwapChain {
    config: wgpu::SurfaceConfiguration,
    pixel_ratio: f32,
    dirty: bool,
}

impl SurfaceTarget for SwapChain {
    fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        let w = ((width as f32 * self.pixel_ratio).round() as u32).max(1);
        let h = ((height as f32 * self.pixel_ratio).round() as u32).max(1);
        if (w, h) != (self.config.width, self.config.height) {
            self.config.width = w;
            self.config.height = h;
            self.dirty = true;
        }
    }
}

/// Texture uploads for assets that finish loading.
struct Uploads<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl TextureSink for Uploads<'_> {
    fn texture(&mut self, id: AssetId, data: &TextureData, space: ColorSpace) {
        if let Err(e) = self
            .renderer
            .register_texture(self.device, self.queue, id, data, space)
        {
            tracing::error!(error = %e, "texture upload failed");
        }
    }

    fn cube(&mut self, id: AssetId, data: &CubeTextureData) {
        if let Err(e) = self.renderer.register_cube(self.device, self.queue, id, data) {
            tracing::error!(error = %e, "cube map upload failed");
        }
    }
}

/// One frame's render target, handed to the scheduler.
struct FrameTarget<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
    post: &'a PostChain,
}

impl Renderer for FrameTarget<'_> {
    type Output = ();

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        self.renderer
            .render(self.device, self.queue, self.view, scene, camera, self.post);
    }
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    swap_chain: SwapChain,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(window: Arc<Window>, state: &mut AppState, ctx: &EguiContext) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("creating surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("starscape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("creating device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if state.config.renderer.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let mut swap_chain = SwapChain {
            config: wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: 1,
                height: 1,
                present_mode,
                alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
            pixel_ratio: 1.0,
            dirty: true,
        };

        let size = window.inner_size().to_logical::<f64>(window.scale_factor());
        state.apply(
            Action::Resized {
                width: size.width.round() as u32,
                height: size.height.round() as u32,
                device_pixel_ratio: window.scale_factor(),
            },
            &mut swap_chain,
        );
        surface.configure(&device, &swap_chain.config);
        swap_chain.dirty = false;

        let renderer = WgpuRenderer::new(&device, &queue, format, &state.post)
            .context("creating renderer")?;

        let egui_winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        let info = adapter.get_info();
        tracing::info!(
            backend = info.backend.to_str(),
            adapter = %info.name,
            ?format,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            swap_chain,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.swap_chain.config);
        self.swap_chain.dirty = false;
        tracing::debug!(
            width = self.swap_chain.config.width,
            height = self.swap_chain.config.height,
            "surface configured"
        );
    }

    fn draw_ui(
        &mut self,
        ctx: &EguiContext,
        window: &Window,
        view: &wgpu::TextureView,
        state: &mut AppState,
    ) {
        let raw_input = self.egui_winit.take_egui_input(window);
        let full_output = ctx.run(raw_input, |ctx| ui::draw_panel(ctx, state));
        self.egui_winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        // The swapchain is sized by the clamped pixel ratio, not the native one.
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.swap_chain.config.width, self.swap_chain.config.height],
            pixels_per_point: self.swap_chain.pixel_ratio,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        let callbacks = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue
            .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct StarscapeApp {
    state: AppState,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl StarscapeApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Starscape")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);
        let gpu = Gpu::new(window.clone(), &mut self.state, &self.egui_ctx)?;
        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    /// Route a window event to the input mapper and apply the actions.
    fn handle_input(&mut self, event: &WindowEvent, scale_factor: f64) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let state = &mut self.state;
        let actions = match event {
            WindowEvent::CursorMoved { position, .. } => {
                let p = position.to_logical::<f32>(scale_factor);
                state.input.cursor_moved(p.x, p.y)
            }
            WindowEvent::CursorLeft { .. } => {
                state.input.cursor_left();
                Vec::new()
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                let pressed = *button_state == ElementState::Pressed;
                match button {
                    MouseButton::Left => state.input.button(DragButton::Primary, pressed),
                    MouseButton::Right => state.input.button(DragButton::Secondary, pressed),
                    _ => {}
                }
                Vec::new()
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_SCROLL_STEP) as f32,
                };
                state.input.scroll(steps).into_iter().collect()
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyH) => vec![Action::TogglePanel],
                    PhysicalKey::Code(KeyCode::Escape) => vec![Action::Quit],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };
        for action in actions {
            state.apply(action, &mut gpu.swap_chain);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu)) = (self.window.as_ref(), self.gpu.as_mut()) else {
            return;
        };
        let state = &mut self.state;

        state.poll_assets(&mut Uploads {
            renderer: &mut gpu.renderer,
            device: &gpu.device,
            queue: &gpu.queue,
        });
        state.apply_panel();
        if gpu.swap_chain.dirty {
            gpu.reconfigure();
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                window.request_redraw();
                return;
            }
        };
        let view = output.texture.create_view(&Default::default());

        let mut target = FrameTarget {
            renderer: &mut gpu.renderer,
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
            post: &state.post,
        };
        let outcome = state.scheduler.tick(
            &mut state.scene,
            &mut state.camera,
            &mut state.controls,
            &mut target,
        );
        if let TickOutcome::Stopped = outcome {
            tracing::info!(frames = state.scheduler.timer().total_frames(), "frame loop stopped");
            event_loop.exit();
            return;
        }

        gpu.draw_ui(&self.egui_ctx, window, &view, state);
        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for StarscapeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("window closed");
                self.state.token().cancel();
                if self.gpu.is_some() {
                    window.request_redraw();
                } else {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let scale_factor = window.scale_factor();
                let size = window.inner_size().to_logical::<f64>(scale_factor);
                if let Some(gpu) = &mut self.gpu {
                    self.state.apply(
                        Action::Resized {
                            width: size.width.round() as u32,
                            height: size.height.round() as u32,
                            device_pixel_ratio: scale_factor,
                        },
                        &mut gpu.swap_chain,
                    );
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            ref other => self.handle_input(other, window.scale_factor()),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("starscape-desktop starting");
    let config = cli.scene_config()?;
    let state = AppState::new(config, Viewport::default())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = StarscapeApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
