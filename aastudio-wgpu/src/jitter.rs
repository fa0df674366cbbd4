//! Sub-pixel projection jitter for TAA.
//!
//! Halton(2,3) offsets in pixel units, centred on the pixel. Index 0 of the
//! Halton sequence is (0,0), so the sequence starts at 1.

use glam::{Mat4, Vec2, Vec3};

/// Frames before the jitter sequence repeats.
pub const JITTER_SEQUENCE_LENGTH: u32 = 8;

pub fn halton(index: u32, base: u32) -> f32 {
    let mut result = 0.0f32;
    let mut f = 1.0f32;
    let mut i = index;

    while i > 0 {
        f /= base as f32;
        result += f * (i % base) as f32;
        i /= base;
    }

    result
}

/// Jitter for `frame_index`, in [-0.5, 0.5) pixels.
pub fn halton_2_3(frame_index: u32) -> Vec2 {
    let index = (frame_index % JITTER_SEQUENCE_LENGTH) + 1;
    Vec2::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5)
}

/// Shift `proj` by `jitter` pixels on a `width`x`height` target.
///
/// The offset is applied in clip space scaled by w, so it is a constant NDC
/// shift regardless of depth.
pub fn apply_jitter(proj: Mat4, jitter: Vec2, width: u32, height: u32) -> Mat4 {
    let offset = Vec3::new(
        2.0 * jitter.x / width.max(1) as f32,
        2.0 * jitter.y / height.max(1) as f32,
        0.0,
    );
    Mat4::from_translation(offset) * proj
}
