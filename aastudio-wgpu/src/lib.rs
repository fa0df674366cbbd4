//! AA Studio wgpu backend.
//!
//! Owns everything that touches the GPU: device bring-up, the viewport render
//! targets, scene and full-screen pipelines, and the frame orchestrator that
//! runs one anti-aliasing technique per frame from a validated frame plan.

pub mod backend;
pub mod error;
pub mod frame;
pub mod jitter;
pub mod mesh;
pub mod passes;
pub mod pipeline;
pub mod plan;
pub mod render_targets;

#[cfg(test)]
mod test_support;

pub use backend::{GPUContext, WGPUBackendState};
pub use error::{RenderError, Result};
pub use frame::{DisplayTarget, FrameOrchestrator, SceneFrame};
pub use mesh::{GPUModel, MeshData, ModelData, TextureData};
