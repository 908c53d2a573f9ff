use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use seashade::camera::CameraRig;
use seashade::cli::Cli;
use seashade::context::GpuContext;
use seashade::params::{default_lights, AppConfig, RecordingConfig};
use seashade::pipeline::OceanPipeline;

struct App {
    cli: Cli,
    config: AppConfig,
    window: Option<Arc<Window>>,
    state: Option<AppState>,
    frame_num: usize,
}

struct AppState {
    ctx: GpuContext,
    pipeline: OceanPipeline,
}

impl App {
    fn new(cli: Cli) -> Self {
        let config = cli.app_config();
        Self {
            cli,
            config,
            window: None,
            state: None,
            frame_num: 0,
        }
    }

    fn recording(&self) -> Option<RecordingConfig> {
        self.cli.recording()
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("seashade")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.render.window_width,
                self.config.render.window_height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let recording = self.recording();
        let ctx = match pollster::block_on(GpuContext::new(window.clone(), recording.is_some())) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("failed to initialize GPU: {e}");
                event_loop.exit();
                return;
            }
        };

        let camera = CameraRig::new(self.cli.camera_preset());
        let pipeline = match OceanPipeline::new(
            &ctx,
            self.config.clone(),
            default_lights(),
            camera,
            self.cli.env_map.as_deref(),
            recording,
        ) {
            Ok(p) => p,
            Err(e) => {
                error!("failed to build pipeline: {e}");
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.state = Some(AppState { ctx, pipeline });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(size) => {
                state
                    .pipeline
                    .resize(&mut state.ctx, size.width, size.height);
            }

            WindowEvent::RedrawRequested => {
                state.pipeline.tick(&state.ctx.queue);
                match state.pipeline.render(&state.ctx, self.frame_num) {
                    Ok(()) => {
                        self.frame_num += 1;
                        if let Some(recording) = state.pipeline.recording() {
                            if self.frame_num >= recording.total_frames() {
                                info!(
                                    "recording complete: {} frames in {}",
                                    self.frame_num,
                                    recording.frames_dir()
                                );
                                event_loop.exit();
                                return;
                            }
                        }
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (width, height) = state.ctx.viewport();
                        state.pipeline.resize(&mut state.ctx, width, height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("out of GPU memory, exiting");
                        event_loop.exit();
                        return;
                    }
                    Err(e) => warn!("frame dropped: {e}"),
                }
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(recording) = cli.recording() {
        if let Err(e) = std::fs::create_dir_all(recording.frames_dir()) {
            error!("cannot create {}: {e}", recording.frames_dir());
            std::process::exit(1);
        }
        info!(
            "recording {} frames at {} fps",
            recording.total_frames(),
            recording.fps
        );
    }

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };

    let mut app = App::new(cli);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("event loop error: {e}");
        std::process::exit(1);
    }
}
