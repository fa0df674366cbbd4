use bytemuck::{Pod, Zeroable};

use crate::config::SmaaPreset;

/// Scene pass uniforms, group 0 binding 0 in scene.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

/// (1/w, 1/h, w, h). Used by FXAA and the pass-through blit.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenUniforms {
    pub screen_size: [f32; 4],
}

impl ScreenUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen_size: screen_size(width, height),
        }
    }
}

/// Shared by the three SMAA passes. Matches `SmaaParams` in smaa_*.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SmaaUniforms {
    pub screen_size: [f32; 4],
    pub threshold: f32,
    pub depth_threshold: f32,
    pub max_search_steps: f32,
    pub max_search_steps_diag: f32,
    /// Percent, converted to a factor in the shader.
    pub corner_rounding: f32,
    pub _pad1: f32,
    pub _pad2: f32,
    pub _pad3: f32,
}

impl SmaaUniforms {
    pub fn new(width: u32, height: u32, preset: &SmaaPreset) -> Self {
        Self {
            screen_size: screen_size(width, height),
            threshold: preset.edge_threshold,
            depth_threshold: preset.depth_threshold,
            max_search_steps: preset.max_search_steps as f32,
            max_search_steps_diag: preset.max_search_steps_diag as f32,
            corner_rounding: preset.corner_rounding as f32,
            _pad1: 0.0,
            _pad2: 0.0,
            _pad3: 0.0,
        }
    }
}

/// TAA resolve uniforms. Matches `TaaParams` in taa.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TaaUniforms {
    pub screen_size: [f32; 4],
    /// Current jitter in pixels.
    pub jitter: [f32; 2],
    /// Weight of the clamped history, 0..1.
    pub feedback: f32,
    pub _pad: f32,
}

impl TaaUniforms {
    pub const DEFAULT_FEEDBACK: f32 = 0.9;

    pub fn new(width: u32, height: u32, jitter: [f32; 2]) -> Self {
        Self {
            screen_size: screen_size(width, height),
            jitter,
            feedback: Self::DEFAULT_FEEDBACK,
            _pad: 0.0,
        }
    }
}

fn screen_size(width: u32, height: u32) -> [f32; 4] {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    [1.0 / w, 1.0 / h, w, h]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmaaQuality;

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 128);
        assert_eq!(std::mem::size_of::<ScreenUniforms>(), 16);
        assert_eq!(std::mem::size_of::<SmaaUniforms>(), 48);
        assert_eq!(std::mem::size_of::<TaaUniforms>(), 32);
    }

    #[test]
    fn test_screen_size_layout() {
        let u = ScreenUniforms::new(1200, 900);
        assert_eq!(u.screen_size, [1.0 / 1200.0, 1.0 / 900.0, 1200.0, 900.0]);
    }

    #[test]
    fn test_smaa_uniforms_carry_preset() {
        for quality in SmaaQuality::ALL {
            let preset = quality.preset();
            let u = SmaaUniforms::new(640, 480, &preset);
            assert_eq!(u.threshold, preset.edge_threshold);
            assert_eq!(u.depth_threshold, preset.depth_threshold);
            assert_eq!(u.max_search_steps, preset.max_search_steps as f32);
            assert_eq!(u.max_search_steps_diag, preset.max_search_steps_diag as f32);
            assert_eq!(u.corner_rounding, 25.0);
        }
    }

    #[test]
    fn test_smaa_uniforms_depth_threshold_literals() {
        let depths: Vec<f32> = SmaaQuality::ALL
            .iter()
            .map(|q| SmaaUniforms::new(640, 480, &q.preset()).depth_threshold)
            .collect();
        assert_eq!(depths, vec![0.015, 0.010, 0.010, 0.005]);
    }

    #[test]
    fn test_zero_size_does_not_divide_by_zero() {
        let u = ScreenUniforms::new(0, 0);
        assert!(u.screen_size.iter().all(|v| v.is_finite()));
    }
}
