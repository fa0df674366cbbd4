//! MSAA resolve pass: collapse a multisample target into a single-sample one.

use crate::backend::RenderTarget;

/// Resolve `src` into `dst` with a pass that draws nothing.
///
/// The multisample contents are loaded, and the resolve into
/// `resolve_target` happens when the pass ends.
pub fn render_resolve_pass(
    encoder: &mut wgpu::CommandEncoder,
    src: &RenderTarget,
    dst: &RenderTarget,
    label: &str,
) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &src.color_view,
            resolve_target: Some(&dst.color_view),
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
}
