//! Pluvia - procedural rain-soaked tree scene

use std::path::PathBuf;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pluvia::core::logging;
use pluvia::core::rng::Rng;
use pluvia::core::time::FrameTimer;
use pluvia::render::{GpuContext, SceneRenderer};
use pluvia::scene::SceneConfig;

struct App {
    settings_path: PathBuf,
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<SceneRenderer>,
    timer: FrameTimer,
    shift_held: bool,
}

impl App {
    fn new(settings_path: PathBuf) -> Self {
        Self {
            settings_path,
            window: None,
            gpu: None,
            renderer: None,
            timer: FrameTimer::new(),
            shift_held: false,
        }
    }

    fn load_config(&self) -> SceneConfig {
        if self.settings_path.exists() {
            match SceneConfig::load(&self.settings_path) {
                Ok(config) => {
                    log::info!("loaded settings from {}", self.settings_path.display());
                    return config;
                }
                Err(e) => log::warn!("failed to load settings, using defaults: {e}"),
            }
        }
        SceneConfig::default()
    }

    fn save_config(&self) {
        if let Some(renderer) = &self.renderer {
            match renderer.config().save(&self.settings_path) {
                Ok(()) => log::info!("settings saved to {}", self.settings_path.display()),
                Err(e) => log::warn!("failed to save settings: {e}"),
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode, shift: bool, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let mut config = renderer.config().clone();
        match code {
            KeyCode::Escape => {
                event_loop.exit();
                return;
            }
            KeyCode::KeyG => {
                renderer.regrow_tree();
                log::info!("regrowing tree");
                return;
            }
            KeyCode::KeyR => {
                config.rain_enabled = !config.rain_enabled;
                log::info!("rain: {}", if config.rain_enabled { "on" } else { "off" });
            }
            KeyCode::KeyW => {
                config.rain_on_window = !config.rain_on_window;
                log::info!(
                    "window droplets: {}",
                    if config.rain_on_window { "on" } else { "off" }
                );
            }
            KeyCode::KeyC => {
                config.random_light_colors = !config.random_light_colors;
                log::info!(
                    "light colors: {}",
                    if config.random_light_colors { "random" } else { "fixed" }
                );
            }
            KeyCode::KeyL => {
                if shift {
                    config.light_count = config.light_count.saturating_sub(1);
                } else {
                    config.light_count += 1;
                }
                log::info!("light count: {}", config.light_count);
            }
            KeyCode::KeyP => {
                if shift {
                    config.rain_particle_count = (config.rain_particle_count - 500).max(1);
                } else {
                    config.rain_particle_count += 500;
                }
                log::info!("rain particles: {}", config.rain_particle_count);
            }
            KeyCode::ArrowLeft => renderer.camera.yaw -= 0.1,
            KeyCode::ArrowRight => renderer.camera.yaw += 0.1,
            KeyCode::ArrowUp => {
                renderer.camera.pitch = (renderer.camera.pitch + 0.05).min(1.4);
            }
            KeyCode::ArrowDown => {
                renderer.camera.pitch = (renderer.camera.pitch - 0.05).max(-0.2);
            }
            KeyCode::Equal => renderer.camera.distance = (renderer.camera.distance - 1.0).max(4.0),
            KeyCode::Minus => renderer.camera.distance += 1.0,
            KeyCode::F5 => {
                self.save_config();
                return;
            }
            _ => return,
        }
        renderer.apply_config(config);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Pluvia")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let gpu = pollster::block_on(GpuContext::new(window.clone()))
            .expect("Failed to create GPU context");

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        log::info!("GPU: {}", gpu.adapter.get_info().name);

        let config = self.load_config();
        let renderer = SceneRenderer::new(&gpu, config, Rng::from_entropy())
            .expect("Failed to create scene renderer");

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.save_config();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let Some(gpu) = &mut self.gpu {
                        gpu.resize(size.width, size.height);
                    }
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.state().shift_key();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        self.handle_key(code, self.shift_held, event_loop);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.timer.tick();
                let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
                    return;
                };

                match renderer.render(gpu, self.timer.elapsed_secs(), self.timer.delta_secs()) {
                    Ok(report) => {
                        if let Some(err) = report.gpu_error {
                            log::error!("frame {}: {err}", self.timer.frame_count());
                        }
                    }
                    Err(e) => log::error!("render failed: {e}"),
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    logging::init();
    log::info!("Pluvia starting...");

    let args: Vec<String> = std::env::args().collect();
    let settings_path = parse_settings_arg(&args)
        .unwrap_or_else(|| PathBuf::from("settings.json"));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new(settings_path);

    event_loop.run_app(&mut app).expect("Event loop error");
}

/// Parse --settings argument from command line
fn parse_settings_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if args[i] == "--settings" || args[i] == "-c" {
            if let Some(path) = args.get(i + 1) {
                return Some(PathBuf::from(path));
            }
        }
    }
    None
}
