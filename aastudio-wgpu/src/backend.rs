use crate::error::{RenderError, Result};

/// GPU texture with associated view and sampler.
pub struct GPUTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

/// Off-screen color attachment with optional depth-stencil and its sampler.
pub struct RenderTarget {
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_texture: Option<wgpu::Texture>,
    pub depth_view: Option<wgpu::TextureView>,
    pub sampler: wgpu::Sampler,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Adapter, device and queue. Shared by the windowed backend and headless tests.
pub struct GPUContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GPUContext {
    /// Request an adapter (compatible with `surface` when given) and a device.
    ///
    /// Adapter-specific format features are enabled when available so that
    /// 2x, 8x and 16x multisampling can be used where the hardware allows it.
    pub fn request(instance: wgpu::Instance, surface: Option<&wgpu::Surface<'_>>) -> Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let required_features =
            adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("AA Studio Device"),
                required_features,
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))?;

        log::info!(
            "wgpu backend initialized: {} ({})",
            adapter.get_info().name,
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Device without a surface, for off-screen rendering.
    pub fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        Self::request(instance, None)
    }

    /// Whether `format` can be created with `samples` samples on this device.
    pub fn supports_sample_count(&self, format: wgpu::TextureFormat, samples: u32) -> bool {
        if samples == 1 {
            return true;
        }
        let adapter_specific = self
            .device
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
        if adapter_specific {
            self.adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(samples)
        } else {
            // Guaranteed WebGPU counts for renderable formats.
            samples == 4
        }
    }

    /// Run `create` inside a validation error scope and turn a captured
    /// validation error into `RenderError::Validation`.
    pub fn validated<T>(&self, label: &str, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(err) => Err(RenderError::Validation {
                label: label.to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// Upload RGBA8 pixels as an `Rgba8Unorm` texture with a repeating linear sampler.
    pub fn upload_texture(&self, label: &str, pixels: &[u8], width: u32, height: u32) -> Result<GPUTexture> {
        let expected = 4 * width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RenderError::Validation {
                label: label.to_string(),
                message: format!("expected {expected} bytes of RGBA8 data, got {}", pixels.len()),
            });
        }

        let texture_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(GPUTexture {
            texture,
            view,
            sampler,
            width,
            height,
            channels: 4,
        })
    }
}

/// Windowed backend: device plus the configured surface.
pub struct WGPUBackendState {
    pub gpu: GPUContext,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub width: u32,
    pub height: u32,
}

impl WGPUBackendState {
    /// Create the surface for `window` and a device that can present to it.
    pub fn new(
        window: impl raw_window_handle::HasWindowHandle + raw_window_handle::HasDisplayHandle + Send + Sync + 'static,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;
        let gpu = GPUContext::request(instance, Some(&surface))?;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        // Targets and textures are all linear Rgba8Unorm; a non-sRGB surface
        // keeps the displayed bytes identical to the off-screen ones.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Validation {
                label: "Surface".to_string(),
                message: "adapter reports no supported surface formats".to_string(),
            })?;

        let width = width.max(1);
        let height = height.max(1);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);
        log::info!("Surface configured: {:?} {}x{}", surface_format, width, height);

        Ok(Self {
            gpu,
            surface,
            surface_config,
            width,
            height,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Resize the surface. Zero-sized requests (minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.gpu.device, &self.surface_config);
        }
    }

    /// Acquire the next surface texture.
    ///
    /// `Ok(None)` means the frame should be skipped: the surface was lost or
    /// outdated (it is reconfigured here) or acquisition timed out. Running
    /// out of memory is returned as an error.
    pub fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.gpu.device, &self.surface_config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface acquire timed out, skipping frame");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
