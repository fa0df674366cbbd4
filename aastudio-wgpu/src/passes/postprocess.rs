//! Full-screen post-process passes: FXAA, the three SMAA stages, TAA and pass-through.

use aastudio_gpu_shared::quad::QUAD_VERTEX_COUNT;

/// Draw the shared full-screen quad into `target` with `pipeline`.
/// The target is cleared first; every pass overwrites all pixels.
pub fn render_fullscreen_effect(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    quad_vbo: &wgpu::Buffer,
    label: &str,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.set_vertex_buffer(0, quad_vbo.slice(..));
    pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
}
