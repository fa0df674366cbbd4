//! Forward scene pass: clear the destination and draw the active model.

use crate::mesh::GPUModel;

/// Clear `color_view`/`depth_view` and draw every mesh of `model`.
pub fn render_forward_pass(
    encoder: &mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    scene_bg: &wgpu::BindGroup,
    model: Option<&GPUModel>,
    clear_color: wgpu::Color,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Forward Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(0),
                store: wgpu::StoreOp::Store,
            }),
        }),
        ..Default::default()
    });

    let Some(model) = model else { return };

    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, scene_bg, &[]);

    for mesh in &model.meshes {
        pass.set_bind_group(1, model.material_bind_group(mesh.material), &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, mesh.normal_buffer.slice(..));
        pass.set_vertex_buffer(2, mesh.uv_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
