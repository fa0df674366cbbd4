//! Viewer state that outlives the GPU: AA configuration, scene selection,
//! camera. Panel and keyboard edits land here.

use aastudio_gpu_shared::config::{AaConfiguration, ActiveModel, VIEWPOINTS};
use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::settings::Settings;
use crate::ui::PanelAction;

pub struct ViewerState {
    pub config: AaConfiguration,
    pub active_model: ActiveModel,
    pub camera: Camera,
    pub exit_requested: bool,
    model_scale: f32,
}

impl ViewerState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            config: AaConfiguration::default(),
            active_model: ActiveModel::default(),
            camera: Camera::new(VIEWPOINTS[0], settings.camera),
            exit_requested: false,
            model_scale: settings.model_scale,
        }
    }

    pub fn apply(&mut self, action: PanelAction) {
        match action {
            PanelAction::SetEnabled(enabled) => self.config.set_enabled(enabled),
            PanelAction::SetChecked(technique, checked) => self.config.set_checked(technique, checked),
            PanelAction::MsaaSamples(samples) => self.config.set_msaa_samples(samples),
            PanelAction::SmaaQuality(quality) => self.config.set_smaa_quality(quality),
            PanelAction::Viewpoint(index) => self.go_to_viewpoint(index),
            PanelAction::Scene(model) => self.select_model(model),
            PanelAction::Exit => self.exit_requested = true,
        }
    }

    pub fn go_to_viewpoint(&mut self, index: usize) {
        if let Some(pose) = VIEWPOINTS.get(index) {
            self.camera.set_pose(*pose);
        }
    }

    pub fn select_model(&mut self, model: ActiveModel) {
        if model == self.active_model {
            return;
        }
        log::info!("Scene: {}", model.label());
        self.active_model = model;
        if let Some(pose) = model.fixed_pose() {
            self.camera.set_pose(pose);
        }
    }

    /// Models are scaled down; the test image quad is drawn as is.
    pub fn model_matrix(&self) -> Mat4 {
        match self.active_model {
            ActiveModel::StaticImage => Mat4::IDENTITY,
            _ => Mat4::from_scale(Vec3::splat(self.model_scale)),
        }
    }

    /// `Pos: (x, y, z), POV: (yaw, pitch)`.
    pub fn pose_line(&self) -> String {
        let pose = self.camera.pose();
        let [x, y, z] = pose.position;
        format!("Pos: ({x:.2}, {y:.2}, {z:.2}), POV: ({:.2}, {:.2})", pose.yaw, pose.pitch)
    }
}
