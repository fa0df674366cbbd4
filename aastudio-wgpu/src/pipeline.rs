//! Render pipeline creation for the scene pass and the full-screen AA passes.
//! Each function creates a wgpu::RenderPipeline with appropriate shader, bind group layouts,
//! and vertex buffer layouts.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use aastudio_gpu_shared::quad::QUAD_STRIDE;
use aastudio_gpu_shared::shaders;

use crate::backend::GPUContext;
use crate::error::Result;
use crate::plan::Effect;
use crate::render_targets::{DEPTH_FORMAT, TARGET_FORMAT};

/// location 0: position vec2, location 1: uv vec2.
const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

static QUAD_BUFFERS: [wgpu::VertexBufferLayout<'static>; 1] = [wgpu::VertexBufferLayout {
    array_stride: QUAD_STRIDE,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &QUAD_ATTRIBUTES,
}];

/// Shared fullscreen quad vertex state (reads the quad VBO).
fn fullscreen_vertex_state(module: &wgpu::ShaderModule) -> wgpu::VertexState<'_> {
    wgpu::VertexState {
        module,
        entry_point: Some("vs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        buffers: &QUAD_BUFFERS,
    }
}

/// Standard depth stencil state for the scene pass.
fn depth_stencil_rw() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

// ============================================================
// Scene Pipeline
// ============================================================

/// Group 0: view/projection and model matrices.
pub fn create_scene_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Scene Uniforms BGL"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Group 1: diffuse texture + sampler.
pub fn create_material_bgl(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn create_scene_pipeline(
    device: &wgpu::Device,
    scene_bgl: &wgpu::BindGroupLayout,
    material_bgl: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[scene_bgl, material_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Scene Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[
                // location 0: position vec3
                wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                },
                // location 1: normal vec3
                wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    }],
                },
                // location 2: uv vec2
                wgpu::VertexBufferLayout {
                    array_stride: 8,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 2,
                    }],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Sponza foliage and the image quad are single-sided geometry.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

/// Scene pipelines keyed by (color format, sample count). The display, the
/// single-sample scene target and each MSAA sample count need their own.
pub struct ScenePipelines {
    pub scene_bgl: wgpu::BindGroupLayout,
    pub material_bgl: wgpu::BindGroupLayout,
    pipelines: HashMap<(wgpu::TextureFormat, u32), wgpu::RenderPipeline>,
}

impl ScenePipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            scene_bgl: create_scene_bgl(device),
            material_bgl: create_material_bgl(device),
            pipelines: HashMap::new(),
        }
    }

    pub fn get_or_create(
        &mut self,
        gpu: &GPUContext,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<&wgpu::RenderPipeline> {
        match self.pipelines.entry((format, sample_count)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                log::info!("Creating scene pipeline ({:?}, {}x)...", format, sample_count);
                let pipeline = gpu.validated("Scene Pipeline", |device| {
                    create_scene_pipeline(device, &self.scene_bgl, &self.material_bgl, format, sample_count)
                })?;
                Ok(e.insert(pipeline))
            }
        }
    }

    pub fn cached(&self) -> usize {
        self.pipelines.len()
    }
}

// ============================================================
// Full-Screen Effect Pipelines
// ============================================================

/// Bind group layout for a full-screen effect pass.
/// Binding 0 is the params uniform; texture unit `i` is the texture at
/// `1 + 2i` followed by its sampler at `2 + 2i`.
pub fn create_effect_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    num_units: u32,
) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        // binding 0: params uniform
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ];

    for unit in 0..num_units {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1 + 2 * unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2 + 2 * unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

/// Create a fullscreen effect pipeline with a given fragment shader and output format.
pub fn create_fullscreen_effect_pipeline(
    device: &wgpu::Device,
    label: &str,
    frag_source: &str,
    frag_entry: &str,
    bgl: &wgpu::BindGroupLayout,
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Fullscreen Vert"),
        source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_QUAD_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(frag_source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: fullscreen_vertex_state(&vert_module),
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some(frag_entry),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: output_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn effect_source(effect: Effect) -> &'static str {
    match effect {
        Effect::Blit => shaders::BLIT_FRAG,
        Effect::Fxaa => shaders::FXAA_FRAG,
        Effect::SmaaEdge => shaders::SMAA_EDGE_FRAG,
        Effect::SmaaWeight => shaders::SMAA_WEIGHT_FRAG,
        Effect::SmaaBlend => shaders::SMAA_BLEND_FRAG,
        Effect::Taa => shaders::TAA_FRAG,
    }
}

/// Format each effect writes in the built-in plans: display-facing passes
/// write the surface, intermediate ones an off-screen target.
pub fn default_output_format(effect: Effect, surface_format: wgpu::TextureFormat) -> wgpu::TextureFormat {
    match effect {
        Effect::Blit | Effect::Fxaa | Effect::SmaaBlend => surface_format,
        Effect::SmaaEdge | Effect::SmaaWeight | Effect::Taa => TARGET_FORMAT,
    }
}

/// One bind group layout per effect.
pub struct EffectLayouts {
    pub blit: wgpu::BindGroupLayout,
    pub fxaa: wgpu::BindGroupLayout,
    pub smaa_edge: wgpu::BindGroupLayout,
    pub smaa_weight: wgpu::BindGroupLayout,
    pub smaa_blend: wgpu::BindGroupLayout,
    pub taa: wgpu::BindGroupLayout,
}

impl EffectLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let bgl = |effect: Effect| {
            create_effect_bind_group_layout(
                device,
                &format!("{} BGL", effect.label()),
                effect.texture_units() as u32,
            )
        };
        Self {
            blit: bgl(Effect::Blit),
            fxaa: bgl(Effect::Fxaa),
            smaa_edge: bgl(Effect::SmaaEdge),
            smaa_weight: bgl(Effect::SmaaWeight),
            smaa_blend: bgl(Effect::SmaaBlend),
            taa: bgl(Effect::Taa),
        }
    }

    pub fn get(&self, effect: Effect) -> &wgpu::BindGroupLayout {
        match effect {
            Effect::Blit => &self.blit,
            Effect::Fxaa => &self.fxaa,
            Effect::SmaaEdge => &self.smaa_edge,
            Effect::SmaaWeight => &self.smaa_weight,
            Effect::SmaaBlend => &self.smaa_blend,
            Effect::Taa => &self.taa,
        }
    }
}

/// Full-screen pipelines keyed by (effect, output format).
pub struct EffectPipelines {
    pub layouts: EffectLayouts,
    pipelines: HashMap<(Effect, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

impl EffectPipelines {
    /// Build every pipeline the built-in plans use. Shader or pipeline
    /// errors surface here, at startup.
    pub fn new(gpu: &GPUContext, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let mut pipelines = Self {
            layouts: EffectLayouts::new(&gpu.device),
            pipelines: HashMap::new(),
        };
        for effect in Effect::ALL {
            pipelines.get_or_create(gpu, effect, default_output_format(effect, surface_format))?;
        }
        log::info!("All AA pipelines created successfully.");
        Ok(pipelines)
    }

    pub fn get_or_create(
        &mut self,
        gpu: &GPUContext,
        effect: Effect,
        format: wgpu::TextureFormat,
    ) -> Result<&wgpu::RenderPipeline> {
        match self.pipelines.entry((effect, format)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                log::info!("Creating {} pipeline ({:?})...", effect.label(), format);
                let bgl = self.layouts.get(effect);
                let pipeline = gpu.validated(effect.label(), |device| {
                    create_fullscreen_effect_pipeline(
                        device,
                        effect.label(),
                        effect_source(effect),
                        "fs_main",
                        bgl,
                        format,
                    )
                })?;
                Ok(e.insert(pipeline))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_quad_layout_matches_shared_vertices() {
        assert_eq!(QUAD_ATTRIBUTES[0].shader_location, 0);
        assert_eq!(QUAD_ATTRIBUTES[1].shader_location, 1);
        assert_eq!(QUAD_ATTRIBUTES[1].offset, 8);
        assert_eq!(QUAD_STRIDE, 16);
    }

    #[test]
    fn test_display_facing_effects_use_surface_format() {
        let surface = wgpu::TextureFormat::Bgra8Unorm;
        assert_eq!(default_output_format(Effect::Fxaa, surface), surface);
        assert_eq!(default_output_format(Effect::SmaaBlend, surface), surface);
        assert_eq!(default_output_format(Effect::Blit, surface), surface);
        assert_eq!(default_output_format(Effect::SmaaEdge, surface), TARGET_FORMAT);
        assert_eq!(default_output_format(Effect::SmaaWeight, surface), TARGET_FORMAT);
        assert_eq!(default_output_format(Effect::Taa, surface), TARGET_FORMAT);
    }

    #[test]
    fn test_all_effect_shaders_compile() {
        let Some(gpu) = test_support::gpu() else { return };
        let pipelines = EffectPipelines::new(&gpu, wgpu::TextureFormat::Rgba8Unorm);
        assert!(pipelines.is_ok(), "{:?}", pipelines.err());
    }

    #[test]
    fn test_scene_pipeline_cache_per_format_and_samples() {
        let Some(gpu) = test_support::gpu() else { return };
        let mut scene = ScenePipelines::new(&gpu.device);
        scene.get_or_create(&gpu, TARGET_FORMAT, 1).unwrap();
        scene.get_or_create(&gpu, TARGET_FORMAT, 4).unwrap();
        scene.get_or_create(&gpu, TARGET_FORMAT, 1).unwrap();
        assert_eq!(scene.cached(), 2);
    }
}
