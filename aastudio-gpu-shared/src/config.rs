//! Anti-aliasing configuration and scene selection.
//!
//! `AaConfiguration` is the single value the control panel mutates and the
//! frame orchestrator reads. All mutation goes through setters so the
//! technique selection can never drift out of sync with the `enabled` flag.

/// Anti-aliasing technique. At most one is active per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Technique {
    #[default]
    None,
    Msaa,
    Fxaa,
    Smaa,
    Taa,
}

impl Technique {
    /// Techniques the user can pick, in control-panel order.
    pub const SELECTABLE: [Technique; 4] = [
        Technique::Fxaa,
        Technique::Smaa,
        Technique::Msaa,
        Technique::Taa,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Technique::None => "None",
            Technique::Msaa => "MSAA",
            Technique::Fxaa => "FXAA",
            Technique::Smaa => "SMAA",
            Technique::Taa => "TAA",
        }
    }
}

/// Multisample count for the MSAA path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MsaaSamples {
    X2,
    #[default]
    X4,
    X8,
    X16,
}

impl MsaaSamples {
    pub const ALL: [MsaaSamples; 4] = [
        MsaaSamples::X2,
        MsaaSamples::X4,
        MsaaSamples::X8,
        MsaaSamples::X16,
    ];

    pub fn count(self) -> u32 {
        match self {
            MsaaSamples::X2 => 2,
            MsaaSamples::X4 => 4,
            MsaaSamples::X8 => 8,
            MsaaSamples::X16 => 16,
        }
    }

    pub fn from_count(count: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.count() == count)
    }
}

/// SMAA quality level. Each level maps to a fixed `SmaaPreset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SmaaQuality {
    Low,
    Medium,
    High,
    #[default]
    Ultra,
}

impl SmaaQuality {
    pub const ALL: [SmaaQuality; 4] = [
        SmaaQuality::Low,
        SmaaQuality::Medium,
        SmaaQuality::High,
        SmaaQuality::Ultra,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SmaaQuality::Low => "Low",
            SmaaQuality::Medium => "Medium",
            SmaaQuality::High => "High",
            SmaaQuality::Ultra => "Ultra",
        }
    }

    pub fn preset(self) -> SmaaPreset {
        match self {
            SmaaQuality::Low => SmaaPreset {
                edge_threshold: 0.15,
                depth_threshold: 0.015,
                max_search_steps: 1,
                max_search_steps_diag: 8,
                corner_rounding: 25,
            },
            SmaaQuality::Medium => SmaaPreset {
                edge_threshold: 0.10,
                depth_threshold: 0.010,
                max_search_steps: 1,
                max_search_steps_diag: 8,
                corner_rounding: 25,
            },
            SmaaQuality::High => SmaaPreset {
                edge_threshold: 0.10,
                depth_threshold: 0.010,
                max_search_steps: 16,
                max_search_steps_diag: 8,
                corner_rounding: 25,
            },
            SmaaQuality::Ultra => SmaaPreset {
                edge_threshold: 0.05,
                depth_threshold: 0.005,
                max_search_steps: 32,
                max_search_steps_diag: 16,
                corner_rounding: 25,
            },
        }
    }
}

/// Edge and weight pass parameters for one SMAA quality level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaaPreset {
    pub edge_threshold: f32,
    pub depth_threshold: f32,
    pub max_search_steps: u32,
    pub max_search_steps_diag: u32,
    /// Percent, 0..=100.
    pub corner_rounding: u32,
}

/// Runtime AA state edited by the control panel.
///
/// Invariant: `enabled() == (technique() != Technique::None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AaConfiguration {
    enabled: bool,
    technique: Technique,
    /// Re-engaged when AA is switched back on. Never `Technique::None`.
    remembered: Technique,
    msaa_samples: MsaaSamples,
    smaa_quality: SmaaQuality,
}

impl Default for AaConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            technique: Technique::None,
            remembered: Technique::Fxaa,
            msaa_samples: MsaaSamples::default(),
            smaa_quality: SmaaQuality::default(),
        }
    }
}

impl AaConfiguration {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn remembered(&self) -> Technique {
        self.remembered
    }

    pub fn msaa_samples(&self) -> MsaaSamples {
        self.msaa_samples
    }

    pub fn smaa_quality(&self) -> SmaaQuality {
        self.smaa_quality
    }

    pub fn smaa_preset(&self) -> SmaaPreset {
        self.smaa_quality.preset()
    }

    pub fn is_active(&self, technique: Technique) -> bool {
        technique != Technique::None && self.technique == technique
    }

    /// Checkbox view of the selectable techniques, in `Technique::SELECTABLE` order.
    pub fn flags(&self) -> [bool; 4] {
        Technique::SELECTABLE.map(|t| self.is_active(t))
    }

    /// "AA On" checkbox. Turning it on re-engages the last selected technique.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.technique = if enabled { self.remembered } else { Technique::None };
    }

    /// Make `technique` the only active one. `Technique::None` disables AA.
    pub fn select(&mut self, technique: Technique) {
        if technique == Technique::None {
            self.set_enabled(false);
            return;
        }
        self.remembered = technique;
        self.technique = technique;
        self.enabled = true;
    }

    /// Per-technique checkbox. Checking selects it; un-checking the active
    /// technique turns AA off but keeps it remembered.
    pub fn set_checked(&mut self, technique: Technique, checked: bool) {
        if checked {
            self.select(technique);
        } else if self.is_active(technique) {
            self.set_enabled(false);
        }
    }

    pub fn set_msaa_samples(&mut self, samples: MsaaSamples) {
        self.msaa_samples = samples;
    }

    pub fn set_smaa_quality(&mut self, quality: SmaaQuality) {
        self.smaa_quality = quality;
    }
}

/// Scene drawn by the scene pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActiveModel {
    #[default]
    Container,
    Sponza,
    StaticImage,
}

impl ActiveModel {
    pub const ALL: [ActiveModel; 3] = [
        ActiveModel::Container,
        ActiveModel::Sponza,
        ActiveModel::StaticImage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActiveModel::Container => "Container",
            ActiveModel::Sponza => "Sponza",
            ActiveModel::StaticImage => "Static Image",
        }
    }

    /// Scene clear color. The test image sits on white.
    pub fn clear_color(self) -> [f64; 4] {
        match self {
            ActiveModel::StaticImage => [1.0, 1.0, 1.0, 1.0],
            _ => [0.5, 0.5, 0.5, 1.0],
        }
    }

    /// Pose forced onto the camera when this scene is selected.
    pub fn fixed_pose(self) -> Option<CameraPose> {
        match self {
            ActiveModel::StaticImage => Some(STATIC_IMAGE_POSE),
            _ => None,
        }
    }
}

/// Camera position and orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
}

/// Viewpoint buttons 1..=3. The first one is also the start pose.
pub const VIEWPOINTS: [CameraPose; 3] = [
    CameraPose { position: [-35.0, 10.0, 0.0], yaw: -360.0, pitch: -0.5 },
    CameraPose { position: [-1.70, 7.44, -7.60], yaw: 111.90, pitch: -6.60 },
    CameraPose { position: [-10.09, 7.89, -6.09], yaw: -40.60, pitch: 33.30 },
];

/// Looks down -Z at the unit image quad from far enough to frame it at 45 degrees.
pub const STATIC_IMAGE_POSE: CameraPose = CameraPose {
    position: [0.0, 0.0, 2.5],
    yaw: -90.0,
    pitch: 0.0,
};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_consistent(cfg: &AaConfiguration) {
        let active = cfg.flags().iter().filter(|f| **f).count();
        assert!(active <= 1, "more than one technique active: {cfg:?}");
        assert_eq!(cfg.enabled(), cfg.technique() != Technique::None, "{cfg:?}");
        assert_eq!(active == 1, cfg.enabled(), "{cfg:?}");
        assert_ne!(cfg.remembered(), Technique::None);
    }

    #[test]
    fn test_default_is_disabled_and_remembers_fxaa() {
        let cfg = AaConfiguration::default();
        assert!(!cfg.enabled());
        assert_eq!(cfg.technique(), Technique::None);
        assert_eq!(cfg.remembered(), Technique::Fxaa);
        assert_eq!(cfg.msaa_samples(), MsaaSamples::X4);
        assert_eq!(cfg.smaa_quality(), SmaaQuality::Ultra);
    }

    #[test]
    fn test_enable_reengages_last_technique() {
        let mut cfg = AaConfiguration::default();
        cfg.set_enabled(true);
        assert_eq!(cfg.technique(), Technique::Fxaa);

        cfg.select(Technique::Smaa);
        cfg.set_enabled(false);
        assert_eq!(cfg.technique(), Technique::None);
        cfg.set_enabled(true);
        assert_eq!(cfg.technique(), Technique::Smaa);
    }

    #[test]
    fn test_select_clears_other_techniques() {
        let mut cfg = AaConfiguration::default();
        cfg.select(Technique::Taa);
        assert_eq!(cfg.flags(), [false, false, false, true]);
        cfg.set_checked(Technique::Fxaa, true);
        assert_eq!(cfg.flags(), [true, false, false, false]);
        assert!(cfg.enabled());
    }

    #[test]
    fn test_uncheck_active_disables_aa() {
        let mut cfg = AaConfiguration::default();
        cfg.select(Technique::Msaa);
        cfg.set_checked(Technique::Msaa, false);
        assert!(!cfg.enabled());
        assert_eq!(cfg.remembered(), Technique::Msaa);
    }

    #[test]
    fn test_uncheck_inactive_is_noop() {
        let mut cfg = AaConfiguration::default();
        cfg.select(Technique::Smaa);
        let before = cfg;
        cfg.set_checked(Technique::Taa, false);
        assert_eq!(cfg, before);
    }

    #[test]
    fn test_select_none_disables() {
        let mut cfg = AaConfiguration::default();
        cfg.select(Technique::Fxaa);
        cfg.select(Technique::None);
        assert!(!cfg.enabled());
        assert_eq!(cfg.remembered(), Technique::Fxaa);
    }

    #[test]
    fn test_random_edit_sequences_keep_mutual_exclusion() {
        let mut rng = StdRng::seed_from_u64(0x5EED_AA);
        let all = [
            Technique::None,
            Technique::Msaa,
            Technique::Fxaa,
            Technique::Smaa,
            Technique::Taa,
        ];
        for _ in 0..200 {
            let mut cfg = AaConfiguration::default();
            for _ in 0..64 {
                match rng.gen_range(0..5) {
                    0 => cfg.set_enabled(rng.gen()),
                    1 => cfg.select(all[rng.gen_range(0..all.len())]),
                    2 => cfg.set_checked(all[rng.gen_range(1..all.len())], rng.gen()),
                    3 => cfg.set_msaa_samples(MsaaSamples::ALL[rng.gen_range(0..4)]),
                    _ => cfg.set_smaa_quality(SmaaQuality::ALL[rng.gen_range(0..4)]),
                }
                assert_consistent(&cfg);
            }
        }
    }

    #[test]
    fn test_smaa_preset_table() {
        let expect = [
            (SmaaQuality::Low, 0.15, 0.015, 1, 8, 25),
            (SmaaQuality::Medium, 0.10, 0.010, 1, 8, 25),
            (SmaaQuality::High, 0.10, 0.010, 16, 8, 25),
            (SmaaQuality::Ultra, 0.05, 0.005, 32, 16, 25),
        ];
        for (quality, threshold, depth, steps, diag, corner) in expect {
            let p = quality.preset();
            assert_eq!(p.edge_threshold, threshold, "{quality:?}");
            assert_eq!(p.depth_threshold, depth, "{quality:?}");
            assert_eq!(p.max_search_steps, steps, "{quality:?}");
            assert_eq!(p.max_search_steps_diag, diag, "{quality:?}");
            assert_eq!(p.corner_rounding, corner, "{quality:?}");
        }
    }

    #[test]
    fn test_msaa_sample_counts() {
        let counts: Vec<u32> = MsaaSamples::ALL.iter().map(|s| s.count()).collect();
        assert_eq!(counts, vec![2, 4, 8, 16]);
        assert_eq!(MsaaSamples::from_count(8), Some(MsaaSamples::X8));
        assert_eq!(MsaaSamples::from_count(3), None);
    }

    #[test]
    fn test_static_image_pose_and_clear() {
        assert_eq!(ActiveModel::StaticImage.clear_color(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(ActiveModel::StaticImage.fixed_pose(), Some(STATIC_IMAGE_POSE));
        assert!(ActiveModel::Sponza.fixed_pose().is_none());
        assert_eq!(ActiveModel::Container.clear_color(), [0.5, 0.5, 0.5, 1.0]);
    }
}
