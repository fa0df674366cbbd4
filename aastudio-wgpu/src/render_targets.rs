//! Render target creation and management for the AA pipeline.
//! Scene color, multisample color, resolve, SMAA edges/weights, history pair, TAA output,
//! plus the static SMAA lookup textures and the shared full-screen quad.

use std::collections::HashMap;

use aastudio_gpu_shared::config::MsaaSamples;
use aastudio_gpu_shared::lookup::{LookupKind, LookupTexture, SmaaLookup};
use aastudio_gpu_shared::quad;

use crate::backend::{GPUContext, GPUTexture, RenderTarget};
use crate::error::{RenderError, Result};
use crate::passes;
use crate::plan::Slot;

/// Color format of every viewport target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Depth-stencil format for scene passes.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Shape of one viewport target, independent of any device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDesc {
    pub slot: Slot,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub with_depth: bool,
}

impl TargetDesc {
    fn of(slot: Slot, target: &RenderTarget) -> Self {
        Self {
            slot,
            width: target.width,
            height: target.height,
            format: target.format,
            sample_count: target.sample_count,
            with_depth: target.depth_view.is_some(),
        }
    }
}

/// Descriptors for every viewport target at `width`x`height`.
pub fn target_descriptors(width: u32, height: u32, samples: MsaaSamples) -> Vec<TargetDesc> {
    Slot::TARGETS
        .iter()
        .map(|&slot| TargetDesc {
            slot,
            width,
            height,
            format: TARGET_FORMAT,
            sample_count: if slot == Slot::MsaaColor { samples.count() } else { 1 },
            with_depth: matches!(slot, Slot::SceneColor | Slot::MsaaColor),
        })
        .collect()
}

/// Check that `src` can be resolved into `dst`: multisample into
/// single-sample, same size and format.
pub fn check_resolve(src: &TargetDesc, dst: &TargetDesc) -> Result<()> {
    if src.sample_count <= 1 || dst.sample_count != 1 {
        return Err(RenderError::SampleMismatch {
            src: src.slot,
            src_samples: src.sample_count,
            dst: dst.slot,
            dst_samples: dst.sample_count,
        });
    }
    if (src.width, src.height) != (dst.width, dst.height) || src.format != dst.format {
        return Err(RenderError::Validation {
            label: "Resolve".to_string(),
            message: format!(
                "{:?} {}x{} {:?} does not match {:?} {}x{} {:?}",
                src.slot, src.width, src.height, src.format, dst.slot, dst.width, dst.height, dst.format
            ),
        });
    }
    Ok(())
}

/// Check that `src` can be copied into `dst` with `copy_texture_to_texture`.
pub fn check_copy(src: &TargetDesc, dst: &TargetDesc) -> Result<()> {
    if src.sample_count != 1 || dst.sample_count != 1 {
        return Err(RenderError::SampleMismatch {
            src: src.slot,
            src_samples: src.sample_count,
            dst: dst.slot,
            dst_samples: dst.sample_count,
        });
    }
    if (src.width, src.height) != (dst.width, dst.height) || src.format != dst.format {
        return Err(RenderError::Validation {
            label: "Copy".to_string(),
            message: format!("{:?} and {:?} differ in size or format", src.slot, dst.slot),
        });
    }
    Ok(())
}

fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    sample_count: u32,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Create a render target with a specific format and sample count.
pub fn create_render_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
    format: wgpu::TextureFormat,
    sample_count: u32,
    with_depth: bool,
) -> RenderTarget {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    // Multisample textures can only be rendered to and resolved.
    let usage = if sample_count > 1 {
        wgpu::TextureUsages::RENDER_ATTACHMENT
    } else {
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST
    };

    let color_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

    let (depth_texture, depth_view) = if with_depth {
        let (dt, dv) =
            create_depth_texture(device, width, height, sample_count, &format!("{label} Depth"));
        (Some(dt), Some(dv))
    } else {
        (None, None)
    };

    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{label} Sampler")),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    RenderTarget {
        color_texture,
        color_view,
        depth_texture,
        depth_view,
        sampler,
        format,
        sample_count,
        width,
        height,
    }
}

/// Create the target described by `desc`, checking sample support up front
/// and catching validation errors instead of letting them reach the device.
pub fn create_checked(gpu: &GPUContext, desc: &TargetDesc) -> Result<RenderTarget> {
    for format in [Some(desc.format), desc.with_depth.then_some(DEPTH_FORMAT)]
        .into_iter()
        .flatten()
    {
        if !gpu.supports_sample_count(format, desc.sample_count) {
            return Err(RenderError::UnsupportedSampleCount {
                samples: desc.sample_count,
                format,
            });
        }
    }

    gpu.validated(desc.slot.label(), |device| {
        create_render_target(
            device,
            desc.width,
            desc.height,
            desc.slot.label(),
            desc.format,
            desc.sample_count,
            desc.with_depth,
        )
    })
}

/// Depth-stencil buffer for scene passes drawn straight to the display.
pub struct DisplayDepth {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl DisplayDepth {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (texture, view) = create_depth_texture(device, width, height, 1, "Display Depth");
        Self {
            texture,
            view,
            width,
            height,
        }
    }
}

/// Every viewport-sized target, keyed by slot.
pub struct RenderTargets {
    targets: HashMap<Slot, RenderTarget>,
    display_depth: DisplayDepth,
    samples: MsaaSamples,
    width: u32,
    height: u32,
}

impl RenderTargets {
    /// Create all targets. Any failure here is a startup error.
    pub fn new(gpu: &GPUContext, width: u32, height: u32, samples: MsaaSamples) -> Result<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let targets = Self::create_all(gpu, width, height, samples)?;
        log::info!(
            "Render targets created ({}x{}, {}x MSAA)",
            width,
            height,
            samples.count()
        );
        Ok(Self {
            targets,
            display_depth: DisplayDepth::new(&gpu.device, width, height),
            samples,
            width,
            height,
        })
    }

    fn create_all(
        gpu: &GPUContext,
        width: u32,
        height: u32,
        samples: MsaaSamples,
    ) -> Result<HashMap<Slot, RenderTarget>> {
        target_descriptors(width, height, samples)
            .iter()
            .map(|desc| Ok((desc.slot, create_checked(gpu, desc)?)))
            .collect()
    }

    pub fn get(&self, slot: Slot) -> Option<&RenderTarget> {
        self.targets.get(&slot)
    }

    pub fn display_depth(&self) -> &DisplayDepth {
        &self.display_depth
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn msaa_samples(&self) -> MsaaSamples {
        self.samples
    }

    /// Recreate every viewport target at the new size.
    ///
    /// All replacements are built before any old target is dropped, so a
    /// failure leaves the previous set in place.
    pub fn resize(&mut self, gpu: &GPUContext, width: u32, height: u32) -> Result<()> {
        let width = width.max(1);
        let height = height.max(1);
        match Self::create_all(gpu, width, height, self.samples) {
            Ok(targets) => {
                self.targets = targets;
                self.display_depth = DisplayDepth::new(&gpu.device, width, height);
                self.width = width;
                self.height = height;
                log::info!("Render targets resized to {}x{}", width, height);
                Ok(())
            }
            Err(e) => {
                log::debug!("Render target resize to {}x{} failed: {}", width, height, e);
                Err(e)
            }
        }
    }

    /// Recreate the multisample color and depth-stencil attachments.
    pub fn set_msaa_samples(&mut self, gpu: &GPUContext, samples: MsaaSamples) -> Result<()> {
        if samples == self.samples {
            return Ok(());
        }
        let desc = target_descriptors(self.width, self.height, samples)
            .into_iter()
            .find(|d| d.slot == Slot::MsaaColor)
            .ok_or_else(|| RenderError::Validation {
                label: "MSAA".to_string(),
                message: "no multisample target descriptor".to_string(),
            })?;

        match create_checked(gpu, &desc) {
            Ok(target) => {
                self.targets.insert(Slot::MsaaColor, target);
                log::info!(
                    "MSAA target recreated with {} samples ({}x{})",
                    samples.count(),
                    self.width,
                    self.height
                );
                self.samples = samples;
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "{}x MSAA target creation failed, keeping {}x: {}",
                    samples.count(),
                    self.samples.count(),
                    e
                );
                Err(e)
            }
        }
    }

    fn pair(&self, src: Slot, dst: Slot) -> Result<(&RenderTarget, &RenderTarget)> {
        let lookup = |slot: Slot| {
            self.targets.get(&slot).ok_or_else(|| RenderError::Validation {
                label: slot.label().to_string(),
                message: "not an off-screen render target".to_string(),
            })
        };
        Ok((lookup(src)?, lookup(dst)?))
    }

    /// Collapse multisample `src` into single-sample `dst`.
    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder, src: Slot, dst: Slot) -> Result<()> {
        let (src_target, dst_target) = self.pair(src, dst)?;
        let checked = check_resolve(&TargetDesc::of(src, src_target), &TargetDesc::of(dst, dst_target));
        debug_assert!(checked.is_ok(), "invalid resolve {src:?} -> {dst:?}: {checked:?}");
        checked?;
        passes::resolve::render_resolve_pass(encoder, src_target, dst_target, "MSAA Resolve");
        Ok(())
    }

    /// Whole-texture copy between two single-sample targets.
    pub fn copy(&self, encoder: &mut wgpu::CommandEncoder, src: Slot, dst: Slot) -> Result<()> {
        let (src_target, dst_target) = self.pair(src, dst)?;
        check_copy(&TargetDesc::of(src, src_target), &TargetDesc::of(dst, dst_target))?;
        passes::history::copy_to_history(
            encoder,
            &src_target.color_texture,
            &dst_target.color_texture,
            self.width,
            self.height,
        );
        Ok(())
    }
}

/// Upload one SMAA lookup table. Area uses linear filtering, search uses
/// nearest; both repeat.
pub fn upload_lookup_texture(gpu: &GPUContext, lookup: &LookupTexture) -> GPUTexture {
    let (format, filter, label) = match lookup.kind {
        LookupKind::Area => (wgpu::TextureFormat::Rg8Unorm, wgpu::FilterMode::Linear, "SMAA Area Lookup"),
        LookupKind::Search => (wgpu::TextureFormat::R8Unorm, wgpu::FilterMode::Nearest, "SMAA Search Lookup"),
    };
    let size = wgpu::Extent3d {
        width: lookup.width(),
        height: lookup.height(),
        depth_or_array_layers: 1,
    };

    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    // Rows are stored top row first, which is wgpu's texture origin.
    gpu.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        lookup.bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(lookup.pitch()),
            rows_per_image: Some(lookup.height()),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{label} Sampler")),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    GPUTexture {
        texture,
        view,
        sampler,
        width: lookup.width(),
        height: lookup.height(),
        channels: lookup.kind.channels(),
    }
}

/// Area and search tables on the GPU.
pub struct LookupTextures {
    pub area: GPUTexture,
    pub search: GPUTexture,
}

impl LookupTextures {
    pub fn upload(gpu: &GPUContext, lookup: &SmaaLookup) -> Self {
        Self {
            area: upload_lookup_texture(gpu, &lookup.area),
            search: upload_lookup_texture(gpu, &lookup.search),
        }
    }
}

/// Create the fullscreen quad vertex buffer (2 triangles, pos2 + uv2).
pub fn create_fullscreen_quad_vbo(device: &wgpu::Device) -> wgpu::Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Fullscreen Quad VBO"),
        contents: bytemuck::cast_slice(&quad::FULLSCREEN_QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
