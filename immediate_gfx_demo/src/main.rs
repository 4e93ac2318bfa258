//! immediate_gfx demo
//!
//! Renders a spinning textured cube into an offscreen target, then draws that
//! target onto the swapchain with a fullscreen triangle.
//!
//! Usage: immediate_gfx_demo [texture.png]
//!
//! Shaders are read from `shaders/*.vspv` and `shaders/*.fspv`; build them
//! with `shaders/compile.sh`.

mod scene;

use std::path::{Path, PathBuf};
use std::time::Instant;

use immediate_gfx::igfx::log::{DefaultLogger, LogSeverity};
use immediate_gfx::igfx::{Config, Engine, Error, Renderer, Result};
use immediate_gfx::{igfx_error, igfx_info};
use immediate_gfx_renderer_vulkan::igfx::{print_validation_stats_report, VulkanGraphicsDevice};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use scene::Scene;

const SOURCE: &str = "demo";

struct DemoState {
    // Dropped before the window its surface belongs to
    renderer: Renderer,
    scene: Scene,
    start: Instant,
    window: Window,
}

struct App {
    config: Config,
    texture_path: Option<PathBuf>,
    state: Option<DemoState>,
}

impl App {
    fn new(texture_path: Option<PathBuf>) -> Self {
        Self {
            config: Config {
                app_name: "immediate_gfx_demo".to_string(),
                ..Config::default()
            },
            texture_path,
            state: None,
        }
    }

    fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<DemoState> {
        let attributes = Window::default_attributes()
            .with_title("immediate_gfx demo")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .with_resizable(false);
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| Error::InitializationFailed(format!("window: {}", e)))?;

        let device = VulkanGraphicsDevice::new(&window, &self.config)?;
        let mut renderer = Renderer::new(Box::new(device), &self.config)?;

        let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let scene = Scene::new(&mut renderer, &self.config, &shader_dir, self.texture_path.as_deref())?;

        Ok(DemoState {
            renderer,
            scene,
            start: Instant::now(),
            window,
        })
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            if let Err(e) = state.renderer.wait_idle() {
                igfx_error!(SOURCE, "wait_idle failed: {}", e);
            }
            igfx_info!(SOURCE, "Rendered {} frames", state.renderer.frame_index());
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match self.create_state(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                igfx_error!(SOURCE, "Initialization failed: {}", e);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::RedrawRequested => {
                let Some(state) = self.state.as_mut() else {
                    return;
                };
                let seconds = state.start.elapsed().as_secs_f32();
                if let Err(e) = state.scene.render(&mut state.renderer, seconds) {
                    igfx_error!(SOURCE, "Frame {} failed: {}", state.renderer.frame_index(), e);
                    self.shutdown(event_loop);
                }
            }
            _ => {}
        }
    }
}

fn main() {
    Engine::set_logger(DefaultLogger::with_min_severity(LogSeverity::Info));

    let texture_path = std::env::args().nth(1).map(PathBuf::from);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            igfx_error!(SOURCE, "Cannot create event loop: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = App::new(texture_path);
    if let Err(e) = event_loop.run_app(&mut app) {
        igfx_error!(SOURCE, "Event loop error: {}", e);
    }

    print_validation_stats_report();
}
