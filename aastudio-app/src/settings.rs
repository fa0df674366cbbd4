//! Startup settings. Runtime AA state lives in `AaConfiguration`; these are
//! the fixed values the viewer is launched with.

use std::path::PathBuf;

pub const ASSETS_ENV: &str = "AASTUDIO_ASSETS";
const DEFAULT_ASSET_ROOT: &str = "assets";

// ─── Camera ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse drag.
    pub sensitivity: f32,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub max_pitch: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 2.5,
            sensitivity: 0.1,
            zoom: 45.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
            max_pitch: 89.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

// ─── Settings ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub asset_root: PathBuf,
    /// Uniform scale applied to loaded models.
    pub model_scale: f32,
    pub camera: CameraSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "AA Studio".to_string(),
            width: 1200,
            height: 900,
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            model_scale: 0.05,
            camera: CameraSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults with the asset root taken from `AASTUDIO_ASSETS` when set.
    pub fn from_env() -> Self {
        Self::with_asset_override(std::env::var_os(ASSETS_ENV).map(PathBuf::from))
    }

    fn with_asset_override(asset_root: Option<PathBuf>) -> Self {
        let mut settings = Self::default();
        if let Some(root) = asset_root.filter(|p| !p.as_os_str().is_empty()) {
            settings.asset_root = root;
        }
        settings
    }

    pub fn container_path(&self) -> PathBuf {
        self.asset_root.join("models").join("container").join("container.obj")
    }

    pub fn sponza_path(&self) -> PathBuf {
        self.asset_root.join("models").join("sponza").join("sponza.obj")
    }

    pub fn test_image_path(&self) -> PathBuf {
        self.asset_root.join("images").join("test.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!((settings.width, settings.height), (1200, 900));
        assert_eq!(settings.model_scale, 0.05);
        assert_eq!(settings.camera.speed, 2.5);
        assert_eq!(settings.camera.sensitivity, 0.1);
        assert_eq!((settings.camera.min_zoom, settings.camera.max_zoom), (1.0, 45.0));
        assert_eq!((settings.camera.near, settings.camera.far), (0.1, 10_000.0));
    }

    #[test]
    fn test_asset_override() {
        let settings = Settings::with_asset_override(Some(PathBuf::from("/data/aa")));
        assert_eq!(settings.asset_root, PathBuf::from("/data/aa"));
        assert_eq!(
            settings.sponza_path(),
            PathBuf::from("/data/aa/models/sponza/sponza.obj")
        );
    }

    #[test]
    fn test_empty_override_keeps_default() {
        let settings = Settings::with_asset_override(Some(PathBuf::new()));
        assert_eq!(settings.asset_root, PathBuf::from("assets"));
        assert_eq!(settings.test_image_path(), PathBuf::from("assets/images/test.png"));
    }
}
