use thiserror::Error;

use crate::plan::{PlanError, Slot};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("{label}: {message}")]
    Validation { label: String, message: String },

    #[error("{samples}x multisampling is not supported for {format:?}")]
    UnsupportedSampleCount {
        samples: u32,
        format: wgpu::TextureFormat,
    },

    #[error("cannot resolve {src:?} ({src_samples} samples) into {dst:?} ({dst_samples} samples)")]
    SampleMismatch {
        src: Slot,
        src_samples: u32,
        dst: Slot,
        dst_samples: u32,
    },

    #[error("invalid frame plan: {0}")]
    Plan(#[from] PlanError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
