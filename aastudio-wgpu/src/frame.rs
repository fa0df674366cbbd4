//! Frame orchestrator: applies pending parameter changes, asks the active
//! AA driver for a frame plan, validates it against the history state and
//! encodes every step into one command buffer.

use aastudio_gpu_shared::config::{AaConfiguration, SmaaQuality};
use aastudio_gpu_shared::lookup::SmaaLookup;
use aastudio_gpu_shared::uniforms::{SceneUniforms, ScreenUniforms, SmaaUniforms, TaaUniforms};
use glam::{Mat4, Vec2};

use crate::backend::{GPUContext, RenderTarget};
use crate::error::{RenderError, Result};
use crate::jitter;
use crate::mesh::GPUModel;
use crate::passes;
use crate::pipeline::{EffectPipelines, ScenePipelines};
use crate::plan::{driver_for, Effect, FramePlan, FrameStep, HistoryState, Slot};
use crate::render_targets::{create_fullscreen_quad_vbo, LookupTextures, RenderTargets};

/// What the scene pass draws this frame.
pub struct SceneFrame<'a> {
    pub model: Option<&'a GPUModel>,
    pub view: Mat4,
    /// Unjittered; TAA jitter is applied here.
    pub projection: Mat4,
    pub model_matrix: Mat4,
    pub clear_color: [f64; 4],
}

/// The acquired surface texture (or a stand-in in tests).
pub struct DisplayTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub struct FrameOrchestrator {
    targets: RenderTargets,
    lookups: LookupTextures,
    scene_pipelines: ScenePipelines,
    effects: EffectPipelines,
    quad_vbo: wgpu::Buffer,

    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    screen_buffer: wgpu::Buffer,
    smaa_buffer: wgpu::Buffer,
    taa_buffer: wgpu::Buffer,

    history: HistoryState,
    smaa_quality: SmaaQuality,
    pending_size: Option<(u32, u32)>,
    /// Last size whose target creation failed; logged once.
    failed_size: Option<(u32, u32)>,
    /// Display and targets differ in size; the display is filled by scaling.
    degraded: bool,
    jitter_index: u32,
}

impl FrameOrchestrator {
    /// Create every target, pipeline and uniform block. Errors here are fatal.
    pub fn new(
        gpu: &GPUContext,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        lookup: &SmaaLookup,
        config: &AaConfiguration,
    ) -> Result<Self> {
        let targets = RenderTargets::new(gpu, width, height, config.msaa_samples())?;
        let (width, height) = targets.size();

        let lookups = LookupTextures::upload(gpu, lookup);
        let scene_pipelines = ScenePipelines::new(&gpu.device);
        let effects = EffectPipelines::new(gpu, surface_format)?;
        let quad_vbo = create_fullscreen_quad_vbo(&gpu.device);

        let scene_buffer = uniform_buffer(
            &gpu.device,
            "Scene Uniforms",
            &SceneUniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                model: Mat4::IDENTITY.to_cols_array_2d(),
            },
        );
        let scene_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniforms BG"),
            layout: &scene_pipelines.scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });
        let screen_buffer = uniform_buffer(&gpu.device, "Screen Uniforms", &ScreenUniforms::new(width, height));
        let smaa_buffer = uniform_buffer(
            &gpu.device,
            "SMAA Uniforms",
            &SmaaUniforms::new(width, height, &config.smaa_preset()),
        );
        let taa_buffer = uniform_buffer(
            &gpu.device,
            "TAA Uniforms",
            &TaaUniforms::new(width, height, [0.0, 0.0]),
        );

        Ok(Self {
            targets,
            lookups,
            scene_pipelines,
            effects,
            quad_vbo,
            scene_buffer,
            scene_bind_group,
            screen_buffer,
            smaa_buffer,
            taa_buffer,
            history: HistoryState::new(),
            smaa_quality: config.smaa_quality(),
            pending_size: None,
            failed_size: None,
            degraded: false,
            jitter_index: 0,
        })
    }

    /// Layout for model material bind groups.
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.scene_pipelines.material_bgl
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn history(&self) -> &HistoryState {
        &self.history
    }

    /// True while the display and the targets differ in size.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Record a viewport change; targets are recreated at the start of the next frame.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.pending_size = Some((width, height));
        }
    }

    /// Apply resize, sample count and SMAA preset changes before any pass runs.
    ///
    /// A size the device rejects stays queued and is retried next frame while
    /// the previous targets keep rendering. A sample count the device rejects
    /// is reverted in `config` so the panel shows the count actually in use.
    pub fn apply_pending(&mut self, gpu: &GPUContext, config: &mut AaConfiguration) {
        let mut size_changed = false;
        if let Some((width, height)) = self.pending_size.take() {
            if (width, height) != self.targets.size() {
                match self.targets.resize(gpu, width, height) {
                    Ok(()) => {
                        self.history.invalidate();
                        self.failed_size = None;
                        size_changed = true;
                    }
                    Err(e) => {
                        if self.failed_size != Some((width, height)) {
                            let (old_w, old_h) = self.targets.size();
                            log::error!(
                                "Render target resize to {}x{} failed, keeping {}x{}: {}",
                                width,
                                height,
                                old_w,
                                old_h,
                                e
                            );
                            self.failed_size = Some((width, height));
                        }
                        self.pending_size = Some((width, height));
                    }
                }
            }
        }

        if config.msaa_samples() != self.targets.msaa_samples()
            && self.targets.set_msaa_samples(gpu, config.msaa_samples()).is_err()
        {
            log::warn!(
                "Reverting MSAA selection to {}x",
                self.targets.msaa_samples().count()
            );
            config.set_msaa_samples(self.targets.msaa_samples());
        }

        if size_changed || config.smaa_quality() != self.smaa_quality {
            let (width, height) = self.targets.size();
            gpu.queue.write_buffer(
                &self.smaa_buffer,
                0,
                bytemuck::bytes_of(&SmaaUniforms::new(width, height, &config.smaa_preset())),
            );
            gpu.queue.write_buffer(
                &self.screen_buffer,
                0,
                bytemuck::bytes_of(&ScreenUniforms::new(width, height)),
            );
            if config.smaa_quality() != self.smaa_quality {
                log::debug!("SMAA quality set to {}", config.smaa_quality().label());
            }
            self.smaa_quality = config.smaa_quality();
        }
    }

    /// Render one frame into `display`.
    ///
    /// Returns the plan that was submitted. An invalid plan is reported as an
    /// error before anything is encoded, so the caller can skip the frame. A
    /// display whose size differs from the targets (a resize that has not
    /// succeeded yet) is still filled: full-screen passes scale to it and a
    /// scene drawn straight to the display goes through `SceneColor` first.
    pub fn render(
        &mut self,
        gpu: &GPUContext,
        config: &mut AaConfiguration,
        scene: &SceneFrame<'_>,
        display: &DisplayTarget<'_>,
    ) -> Result<FramePlan> {
        self.apply_pending(gpu, config);

        let (width, height) = self.targets.size();
        let degraded = (display.width, display.height) != (width, height);
        if degraded != self.degraded {
            if degraded {
                log::warn!(
                    "Display is {}x{} but targets are {}x{}, scaling until a resize succeeds",
                    display.width,
                    display.height,
                    width,
                    height
                );
            } else {
                log::info!("Display and targets match again at {}x{}", width, height);
            }
            self.degraded = degraded;
        }

        let driver = driver_for(config.technique());
        let plan = driver.plan(&self.history);
        plan.validate(&self.history)?;

        let mut projection = scene.projection;
        let mut jitter_px = Vec2::ZERO;
        if driver.jitters_projection() {
            jitter_px = jitter::halton_2_3(self.jitter_index);
            self.jitter_index = self.jitter_index.wrapping_add(1);
            projection = jitter::apply_jitter(projection, jitter_px, width, height);
        }

        gpu.queue.write_buffer(
            &self.scene_buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms {
                view_proj: (projection * scene.view).to_cols_array_2d(),
                model: scene.model_matrix.to_cols_array_2d(),
            }),
        );
        gpu.queue.write_buffer(
            &self.taa_buffer,
            0,
            bytemuck::bytes_of(&TaaUniforms::new(width, height, jitter_px.to_array())),
        );

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for step in plan.steps() {
            self.encode_step(gpu, &mut encoder, step, scene, display)?;
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.history.record(&plan);
        log::trace!("Submitted {:?} frame ({} steps)", plan.technique(), plan.steps().len());

        Ok(plan)
    }

    fn encode_step(
        &mut self,
        gpu: &GPUContext,
        encoder: &mut wgpu::CommandEncoder,
        step: &FrameStep,
        scene: &SceneFrame<'_>,
        display: &DisplayTarget<'_>,
    ) -> Result<()> {
        match *step {
            FrameStep::Scene { target: Slot::Display } if self.degraded => {
                // The display depth buffer has the target size.
                self.encode_scene(gpu, encoder, Slot::SceneColor, scene, display)?;
                self.encode_fullscreen(gpu, encoder, Effect::Blit, &[Slot::SceneColor], Slot::Display, display)
            }
            FrameStep::Scene { target } => self.encode_scene(gpu, encoder, target, scene, display),
            FrameStep::Resolve { src, dst } => self.targets.resolve(encoder, src, dst),
            FrameStep::Copy { src, dst } => self.targets.copy(encoder, src, dst),
            FrameStep::Fullscreen {
                effect,
                inputs,
                output,
            } => self.encode_fullscreen(gpu, encoder, effect, inputs, output, display),
            FrameStep::Present => Ok(()),
        }
    }

    fn encode_scene(
        &mut self,
        gpu: &GPUContext,
        encoder: &mut wgpu::CommandEncoder,
        target: Slot,
        scene: &SceneFrame<'_>,
        display: &DisplayTarget<'_>,
    ) -> Result<()> {
        let (color_view, depth_view, format, samples) = if target == Slot::Display {
            (display.view, &self.targets.display_depth().view, display.format, 1)
        } else {
            let rt = target_of(&self.targets, target)?;
            let depth = rt.depth_view.as_ref().ok_or_else(|| RenderError::Validation {
                label: target.label().to_string(),
                message: "scene target has no depth-stencil attachment".to_string(),
            })?;
            (&rt.color_view, depth, rt.format, rt.sample_count)
        };

        let pipeline = self.scene_pipelines.get_or_create(gpu, format, samples)?;
        let [r, g, b, a] = scene.clear_color;
        passes::forward::render_forward_pass(
            encoder,
            color_view,
            depth_view,
            pipeline,
            &self.scene_bind_group,
            scene.model,
            wgpu::Color { r, g, b, a },
        );
        Ok(())
    }

    fn encode_fullscreen(
        &mut self,
        gpu: &GPUContext,
        encoder: &mut wgpu::CommandEncoder,
        effect: Effect,
        inputs: &[Slot],
        output: Slot,
        display: &DisplayTarget<'_>,
    ) -> Result<()> {
        let params = match effect {
            Effect::Blit | Effect::Fxaa => &self.screen_buffer,
            Effect::SmaaEdge | Effect::SmaaWeight | Effect::SmaaBlend => &self.smaa_buffer,
            Effect::Taa => &self.taa_buffer,
        };

        let mut units = Vec::with_capacity(inputs.len());
        for &slot in inputs {
            units.push(sampled(&self.targets, &self.lookups, slot)?);
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: params.as_entire_binding(),
        }];
        for (unit, (view, sampler)) in units.into_iter().enumerate() {
            let unit = unit as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * unit,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * unit,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(effect.label()),
            layout: self.effects.layouts.get(effect),
            entries: &entries,
        });

        let (target_view, format) = if output == Slot::Display {
            (display.view, display.format)
        } else {
            let rt = target_of(&self.targets, output)?;
            (&rt.color_view, rt.format)
        };

        let pipeline = self.effects.get_or_create(gpu, effect, format)?;
        passes::postprocess::render_fullscreen_effect(
            encoder,
            target_view,
            pipeline,
            &bind_group,
            &self.quad_vbo,
            effect.label(),
        );
        Ok(())
    }
}

fn target_of(targets: &RenderTargets, slot: Slot) -> Result<&RenderTarget> {
    targets.get(slot).ok_or_else(|| RenderError::Validation {
        label: slot.label().to_string(),
        message: "not an off-screen render target".to_string(),
    })
}

/// View and sampler bound for a texture unit reading `slot`.
fn sampled<'a>(
    targets: &'a RenderTargets,
    lookups: &'a LookupTextures,
    slot: Slot,
) -> Result<(&'a wgpu::TextureView, &'a wgpu::Sampler)> {
    match slot {
        Slot::AreaLookup => Ok((&lookups.area.view, &lookups.area.sampler)),
        Slot::SearchLookup => Ok((&lookups.search.view, &lookups.search.sampler)),
        _ => {
            let rt = target_of(targets, slot)?;
            Ok((&rt.color_view, &rt.sampler))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshData, ModelData};
    use crate::test_support;
    use aastudio_gpu_shared::config::{MsaaSamples, Technique};

    const W: u32 = 64;
    const H: u32 = 48;
    const DISPLAY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// A white triangle in clip space, drawn with identity matrices.
    fn triangle() -> ModelData {
        ModelData {
            name: "triangle".to_string(),
            meshes: vec![MeshData {
                positions: vec![-0.5, -0.5, 0.5, 0.5, -0.5, 0.5, 0.0, 0.5, 0.5],
                indices: vec![0, 1, 2],
                ..Default::default()
            }],
            materials: vec![],
        }
    }

    fn display_texture(gpu: &GPUContext, width: u32, height: u32) -> wgpu::Texture {
        gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Display"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DISPLAY_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    struct Harness {
        gpu: GPUContext,
        frames: FrameOrchestrator,
        model: GPUModel,
        display: wgpu::Texture,
        display_view: wgpu::TextureView,
    }

    impl Harness {
        fn new(config: &AaConfiguration) -> Option<Self> {
            let gpu = test_support::gpu()?;
            let frames =
                FrameOrchestrator::new(&gpu, DISPLAY_FORMAT, W, H, &SmaaLookup::bundled(), config).unwrap();
            let model = GPUModel::upload(&gpu, frames.material_layout(), &triangle()).unwrap();
            let display = display_texture(&gpu, W, H);
            let display_view = display.create_view(&wgpu::TextureViewDescriptor::default());
            Some(Self {
                gpu,
                frames,
                model,
                display,
                display_view,
            })
        }

        fn frame(&mut self, config: &mut AaConfiguration) -> Result<FramePlan> {
            self.frame_into(config, None, W, H)
        }

        /// Render into `display` (or the harness display when `None`).
        fn frame_into(
            &mut self,
            config: &mut AaConfiguration,
            display: Option<&wgpu::Texture>,
            width: u32,
            height: u32,
        ) -> Result<FramePlan> {
            let scene = SceneFrame {
                model: Some(&self.model),
                view: Mat4::IDENTITY,
                projection: Mat4::IDENTITY,
                model_matrix: Mat4::IDENTITY,
                clear_color: [0.5, 0.5, 0.5, 1.0],
            };
            let other_view = display.map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
            let display = DisplayTarget {
                view: other_view.as_ref().unwrap_or(&self.display_view),
                format: DISPLAY_FORMAT,
                width,
                height,
            };
            self.frames.render(&self.gpu, config, &scene, &display)
        }

        fn read(&self, slot: Slot) -> Vec<u8> {
            if slot == Slot::Display {
                return self.read_display();
            }
            let texture = &self.frames.targets().get(slot).unwrap().color_texture;
            let (width, height) = self.frames.targets().size();
            test_support::read_rgba8(&self.gpu, texture, width, height)
        }

        fn read_display(&self) -> Vec<u8> {
            test_support::read_rgba8(&self.gpu, &self.display, W, H)
        }
    }

    fn pixel(data: &[u8], x: u32, y: u32) -> &[u8] {
        pixel_in(data, W, x, y)
    }

    fn pixel_in(data: &[u8], width: u32, x: u32, y: u32) -> &[u8] {
        let i = ((y * width + x) * 4) as usize;
        &data[i..i + 4]
    }

    fn nonzero_pixels(data: &[u8]) -> usize {
        data.chunks(4).filter(|p| p.iter().any(|&c| c > 0)).count()
    }

    /// Pixels whose color differs between two frames.
    fn differing_pixels(a: &[u8], b: &[u8]) -> Vec<(u32, u32)> {
        a.chunks(4)
            .zip(b.chunks(4))
            .enumerate()
            .filter(|(_, (pa, pb))| pa != pb)
            .map(|(i, _)| (i as u32 % W, i as u32 / W))
            .collect()
    }

    /// True when the pixel touches one of a different color.
    fn is_edge_pixel(frame: &[u8], x: u32, y: u32) -> bool {
        let here = pixel(frame, x, y);
        let (x0, x1) = (x.saturating_sub(1), (x + 1).min(W - 1));
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(H - 1));
        (y0..=y1).any(|ny| (x0..=x1).any(|nx| pixel(frame, nx, ny) != here))
    }

    #[test]
    fn test_no_aa_draws_scene_to_display() {
        let mut config = AaConfiguration::default();
        let Some(mut h) = Harness::new(&config) else { return };

        let plan = h.frame(&mut config).unwrap();
        assert_eq!(plan.scene_target(), Some(Slot::Display));

        let display = h.read(Slot::Display);
        assert_eq!(pixel(&display, W / 2, H / 2), [255, 255, 255, 255]);
        let corner = pixel(&display, 0, 0);
        assert!((127..=128).contains(&corner[0]), "{corner:?}");
    }

    #[test]
    fn test_fxaa_history_previous_matches_scene_color() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Fxaa);
        let Some(mut h) = Harness::new(&config) else { return };

        h.frame(&mut config).unwrap();

        let scene = h.read(Slot::SceneColor);
        assert_eq!(h.read(Slot::HistoryPrevious), scene);
        assert_eq!(h.read(Slot::HistoryCurrent), scene);
        assert!(h.frames.history().is_written(Slot::HistoryPrevious));
    }

    #[test]
    fn test_taa_bootstraps_then_accumulates() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Taa);
        let Some(mut h) = Harness::new(&config) else { return };

        let first = h.frame(&mut config).unwrap();
        assert!(first.steps().contains(&FrameStep::Copy {
            src: Slot::HistoryCurrent,
            dst: Slot::HistoryPrevious
        }));

        let second = h.frame(&mut config).unwrap();
        assert!(!second.steps().contains(&FrameStep::Copy {
            src: Slot::HistoryCurrent,
            dst: Slot::HistoryPrevious
        }));
        assert_eq!(h.read(Slot::HistoryPrevious), h.read(Slot::TaaOutput));
    }

    #[test]
    fn test_every_technique_renders_interior_white() {
        let mut config = AaConfiguration::default();
        let Some(mut h) = Harness::new(&config) else { return };

        for technique in [Technique::Msaa, Technique::Fxaa, Technique::Smaa, Technique::None] {
            config.select(technique);
            h.frame(&mut config).unwrap();
            let display = h.read(Slot::Display);
            assert_eq!(pixel(&display, W / 2, H / 2), [255, 255, 255, 255], "{technique:?}");
        }
    }

    #[test]
    fn test_resize_applies_at_frame_start_and_invalidates_history() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Fxaa);
        let Some(mut h) = Harness::new(&config) else { return };

        h.frame(&mut config).unwrap();
        assert!(h.frames.history().is_written(Slot::HistoryPrevious));

        h.frames.request_resize(W * 2, H);
        assert_eq!(h.frames.targets().size(), (W, H));
        h.frames.apply_pending(&h.gpu, &mut config);
        assert_eq!(h.frames.targets().size(), (W * 2, H));
        assert_eq!(*h.frames.history(), HistoryState::new());

        // The old display no longer matches; it is still filled by scaling.
        h.frame(&mut config).unwrap();
        assert!(h.frames.is_degraded());
        assert_eq!(pixel(&h.read_display(), W / 2, H / 2), [255, 255, 255, 255]);
    }

    #[test]
    fn test_failed_resize_keeps_targets_and_keeps_rendering() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Fxaa);
        let Some(mut h) = Harness::new(&config) else { return };
        h.frame(&mut config).unwrap();

        let too_wide = h.gpu.device.limits().max_texture_dimension_2d + 1;
        h.frames.request_resize(too_wide, H);
        for _ in 0..3 {
            h.frame(&mut config).unwrap();
            assert_eq!(h.frames.targets().size(), (W, H));
            // Still queued for the next frame.
            assert_eq!(h.frames.pending_size, Some((too_wide, H)));
            assert_eq!(h.frames.failed_size, Some((too_wide, H)));
        }
        assert!(h.frames.history().is_written(Slot::HistoryPrevious));
        assert_eq!(pixel(&h.read_display(), W / 2, H / 2), [255, 255, 255, 255]);

        // A later valid size replaces the failed request.
        h.frames.request_resize(W * 2, H);
        h.frames.apply_pending(&h.gpu, &mut config);
        assert_eq!(h.frames.targets().size(), (W * 2, H));
        assert_eq!(h.frames.pending_size, None);
        assert_eq!(h.frames.failed_size, None);
    }

    #[test]
    fn test_mismatched_display_is_filled_for_every_technique() {
        let mut config = AaConfiguration::default();
        let Some(mut h) = Harness::new(&config) else { return };
        let (big_w, big_h) = (W * 2, H * 2);
        let big = display_texture(&h.gpu, big_w, big_h);

        for technique in [Technique::None, Technique::Msaa, Technique::Fxaa, Technique::Smaa, Technique::Taa] {
            config.select(technique);
            h.frame_into(&mut config, Some(&big), big_w, big_h).unwrap();
            assert!(h.frames.is_degraded(), "{technique:?}");
            let data = test_support::read_rgba8(&h.gpu, &big, big_w, big_h);
            assert_eq!(pixel_in(&data, big_w, big_w / 2, big_h / 2), [255, 255, 255, 255], "{technique:?}");
            let corner = pixel_in(&data, big_w, 0, 0);
            assert!((127..=128).contains(&corner[0]), "{technique:?}: {corner:?}");
        }

        h.frame(&mut config).unwrap();
        assert!(!h.frames.is_degraded());
    }

    #[test]
    fn test_smaa_finds_edges_and_blend_weights() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Smaa);
        let Some(mut h) = Harness::new(&config) else { return };

        h.frame(&mut config).unwrap();

        let edges = h.read(Slot::Edges);
        let weights = h.read(Slot::BlendWeights);
        assert!(nonzero_pixels(&edges) > 0);
        assert!(nonzero_pixels(&weights) > 0);
        // Both stay on the triangle border.
        for (i, p) in weights.chunks(4).enumerate() {
            if p.iter().any(|&c| c > 0) {
                let (x, y) = (i as u32 % W, i as u32 / W);
                assert!(x > 0 && y > 0 && x < W - 1 && y < H - 1, "weight at ({x}, {y})");
            }
        }
        assert_eq!(pixel(&edges, W / 2, H / 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&weights, W / 2, H / 2), [0, 0, 0, 0]);
    }

    #[test]
    fn test_every_technique_changes_edge_pixels_only() {
        let mut config = AaConfiguration::default();
        let Some(mut h) = Harness::new(&config) else { return };

        h.frame(&mut config).unwrap();
        let aliased = h.read_display();

        for technique in [Technique::Msaa, Technique::Fxaa, Technique::Smaa, Technique::Taa] {
            config.select(technique);
            // TAA needs a few jittered frames to accumulate coverage.
            for _ in 0..4 {
                h.frame(&mut config).unwrap();
            }
            let display = h.read_display();
            let changed = differing_pixels(&aliased, &display);
            assert!(!changed.is_empty(), "{technique:?} left the frame untouched");
            for &(x, y) in &changed {
                // Jitter can move an edge by up to one pixel.
                let near_edge = (x.saturating_sub(1)..=(x + 1).min(W - 1))
                    .any(|nx| is_edge_pixel(&aliased, nx, y));
                assert!(near_edge, "{technique:?} changed interior pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_msaa_history_previous_matches_resolve() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Msaa);
        let Some(mut h) = Harness::new(&config) else { return };

        h.frame(&mut config).unwrap();

        let resolved = h.read(Slot::Resolve);
        assert_eq!(h.read(Slot::HistoryPrevious), resolved);
        // Resolved edges carry partial coverage.
        assert!(resolved
            .chunks(4)
            .any(|p| p[0] > 128 && p[0] < 255));
    }

    #[test]
    fn test_sample_count_change_applies_before_scene() {
        let mut config = AaConfiguration::default();
        config.select(Technique::Msaa);
        let Some(mut h) = Harness::new(&config) else { return };

        for samples in MsaaSamples::ALL {
            config.set_msaa_samples(samples);
            h.frame(&mut config).unwrap();
            let in_use = h.frames.targets().msaa_samples();
            // Either the change was applied, or it was rejected and reverted.
            assert_eq!(config.msaa_samples(), in_use);
            assert_eq!(
                h.frames.targets().get(Slot::MsaaColor).unwrap().sample_count,
                in_use.count()
            );
        }
    }
}
