//! GPU-independent data for the AA Studio renderer.
//! Shared between the wgpu backend and the viewer application.

pub mod config;
pub mod lookup;
pub mod quad;
pub mod shaders;
pub mod uniforms;
