//! egui on top of the presented frame: winit input in, one load-and-draw
//! pass over the surface texture out.

use aastudio_wgpu::GPUContext;
use winit::event::WindowEvent;
use winit::window::Window;

/// Tessellated UI for one frame.
pub struct UiFrame {
    pub textures_delta: egui::TexturesDelta,
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub pixels_per_point: f32,
}

pub struct EguiOverlay {
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl EguiOverlay {
    pub fn new(window: &Window, device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        let egui_context = egui::Context::default();
        egui_context.set_style(egui::Style::default());
        let state = egui_winit::State::new(
            egui_context,
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, output_format, None, 1, false);
        Self { state, renderer }
    }

    /// Feed a window event to egui. Returns true when egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over (or dragging) a UI area.
    pub fn wants_pointer(&self) -> bool {
        let ctx = self.state.egui_ctx();
        ctx.wants_pointer_input() || ctx.is_pointer_over_area()
    }

    pub fn wants_keyboard(&self) -> bool {
        self.state.egui_ctx().wants_keyboard_input()
    }

    pub fn build(&mut self, window: &Window, ui: impl FnMut(&egui::Context)) -> UiFrame {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.state.egui_ctx().run(raw_input, ui);
        self.state
            .handle_platform_output(window, full_output.platform_output);

        UiFrame {
            clipped_primitives: self
                .state
                .egui_ctx()
                .tessellate(full_output.shapes, full_output.pixels_per_point),
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        }
    }

    /// Draw `frame` over `output_view`, keeping what the AA pipeline wrote.
    pub fn render(
        &mut self,
        gpu: &GPUContext,
        frame: &UiFrame,
        output_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        for (id, image_delta) in &frame.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: frame.pixels_per_point,
        };

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });
        let mut command_buffers = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &frame.clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("UI Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: output_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer
                .render(&mut render_pass, &frame.clipped_primitives, &screen_descriptor);
        }
        command_buffers.push(encoder.finish());
        gpu.queue.submit(command_buffers);

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
