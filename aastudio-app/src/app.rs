//! winit application: owns the window, the GPU side of the viewer and the
//! per-frame loop (input, panel, AA frame, overlay, present).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use aastudio_gpu_shared::config::ActiveModel;
use aastudio_gpu_shared::lookup::SmaaLookup;
use aastudio_wgpu::{DisplayTarget, FrameOrchestrator, GPUModel, SceneFrame, WGPUBackendState};
use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::assets;
use crate::camera::Movement;
use crate::settings::Settings;
use crate::state::ViewerState;
use crate::ui::{EguiOverlay, FrameStats, PanelView};

/// Pixels of trackpad scroll per zoom degree.
const PIXELS_PER_SCROLL_LINE: f32 = 40.0;

/// Everything that needs the window and device.
struct Viewer {
    window: Arc<Window>,
    backend: WGPUBackendState,
    frames: FrameOrchestrator,
    models: HashMap<ActiveModel, GPUModel>,
    overlay: EguiOverlay,
    adapter: String,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, settings: &Settings, state: &ViewerState) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(settings.width, settings.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let backend = WGPUBackendState::new(Arc::clone(&window), size.width, size.height)
            .context("failed to initialize wgpu")?;
        let info = backend.gpu.adapter.get_info();
        let adapter = format!("{} ({})", info.name, info.backend.to_str());

        let lookup = SmaaLookup::bundled();
        let frames = FrameOrchestrator::new(
            &backend.gpu,
            backend.surface_format(),
            backend.width,
            backend.height,
            &lookup,
            &state.config,
        )
        .context("failed to create AA pipeline")?;

        let mut models = HashMap::new();
        for model in ActiveModel::ALL {
            let data = match model {
                ActiveModel::Container => assets::load_obj(&settings.container_path())?,
                ActiveModel::Sponza => assets::load_obj(&settings.sponza_path())?,
                ActiveModel::StaticImage => assets::load_image_quad(&settings.test_image_path())?,
            };
            let gpu_model = GPUModel::upload(&backend.gpu, frames.material_layout(), &data)
                .with_context(|| format!("failed to upload {}", model.label()))?;
            models.insert(model, gpu_model);
        }

        let overlay = EguiOverlay::new(&window, &backend.gpu.device, backend.surface_format());

        Ok(Self {
            window,
            backend,
            frames,
            models,
            overlay,
            adapter,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
        self.frames.request_resize(width, height);
    }

    fn redraw(&mut self, state: &mut ViewerState, stats: &FrameStats) -> Result<()> {
        let Some(frame) = self.backend.acquire()? else {
            return Ok(());
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let panel = PanelView {
            config: &state.config,
            active_model: state.active_model,
            stats,
            adapter: &self.adapter,
        };
        let mut actions = Vec::new();
        let ui = self.overlay.build(&self.window, |ctx| actions.extend(panel.show(ctx)));
        for action in actions {
            state.apply(action);
        }

        let (width, height) = (self.backend.width, self.backend.height);
        let scene = SceneFrame {
            model: self.models.get(&state.active_model),
            view: state.camera.view_matrix(),
            projection: state.camera.projection_matrix(width, height),
            model_matrix: state.model_matrix(),
            clear_color: state.active_model.clear_color(),
        };
        let display = DisplayTarget {
            view: &view,
            format: self.backend.surface_format(),
            width,
            height,
        };
        if let Err(e) = self.frames.render(&self.backend.gpu, &mut state.config, &scene, &display) {
            log::error!("Skipping frame: {e}");
        }

        self.overlay.render(&self.backend.gpu, &ui, &view, width, height);
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

pub struct App {
    settings: Settings,
    state: ViewerState,
    viewer: Option<Viewer>,
    stats: FrameStats,

    keys_pressed: HashSet<KeyCode>,
    looking: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    last_frame: Instant,

    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let state = ViewerState::new(&settings);
        Self {
            settings,
            state,
            viewer: None,
            stats: FrameStats::default(),
            keys_pressed: HashSet::new(),
            looking: false,
            last_cursor: None,
            last_frame: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn handle_movement(&mut self, dt: f32) {
        const BINDINGS: [(KeyCode, Movement); 4] = [
            (KeyCode::KeyW, Movement::Forward),
            (KeyCode::KeyS, Movement::Backward),
            (KeyCode::KeyA, Movement::Left),
            (KeyCode::KeyD, Movement::Right),
        ];
        for (key, movement) in BINDINGS {
            if self.keys_pressed.contains(&key) {
                self.state.camera.process_keyboard(movement, dt);
            }
        }
    }

    fn handle_key_press(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyP => log::info!("{}", self.state.pose_line()),
            KeyCode::Digit1 => self.state.go_to_viewpoint(0),
            KeyCode::Digit2 => self.state.go_to_viewpoint(1),
            KeyCode::Digit3 => self.state.go_to_viewpoint(2),
            _ => {}
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        if self.looking {
            if let Some(last) = self.last_cursor {
                let dx = (position.x - last.x) as f32;
                // Window y grows downwards.
                let dy = (last.y - position.y) as f32;
                self.state.camera.process_mouse(dx, dy);
            }
        }
        self.last_cursor = Some(position);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.settings, &self.state) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
                self.last_frame = Instant::now();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let consumed = viewer.overlay.on_window_event(&viewer.window, &event);
        let pointer_on_ui = viewer.overlay.wants_pointer();
        let keyboard_on_ui = viewer.overlay.wants_keyboard();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => viewer.resize(size.width, size.height),

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match event.state {
                    ElementState::Pressed if !(consumed || keyboard_on_ui) => {
                        self.keys_pressed.insert(key);
                        if !event.repeat {
                            self.handle_key_press(event_loop, key);
                        }
                    }
                    ElementState::Released => {
                        self.keys_pressed.remove(&key);
                    }
                    _ => {}
                }
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.looking = state == ElementState::Pressed && !pointer_on_ui;
            }

            WindowEvent::CursorMoved { position, .. } => self.handle_cursor(position),

            WindowEvent::MouseWheel { delta, .. } if !pointer_on_ui => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_SCROLL_LINE,
                };
                self.state.camera.process_scroll(lines);
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;
                self.stats.record(dt);
                self.handle_movement(dt);

                let Some(viewer) = self.viewer.as_mut() else {
                    return;
                };
                if let Err(e) = viewer.redraw(&mut self.state, &self.stats) {
                    self.fail(event_loop, e);
                    return;
                }
                if self.state.exit_requested {
                    event_loop.exit();
                    return;
                }
                viewer.window.request_redraw();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU resources go before the window.
        self.viewer = None;
        log::info!("Exiting");
    }
}

/// Run the viewer until the window closes. Startup and device failures are returned.
pub fn run(settings: Settings) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
