//! Free-fly camera: yaw/pitch in degrees, field of view doubling as zoom.

use aastudio_gpu_shared::config::CameraPose;
use glam::{Mat4, Vec3};

use crate::settings::CameraSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    settings: CameraSettings,
}

impl Camera {
    pub fn new(pose: CameraPose, settings: CameraSettings) -> Self {
        let mut camera = Self {
            position: Vec3::from_array(pose.position),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: pose.yaw,
            pitch: pose.pitch,
            zoom: settings.zoom,
            settings,
        };
        camera.set_pose(pose);
        camera
    }

    /// Jump to `pose`. Zoom is left alone.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = Vec3::from_array(pose.position);
        self.yaw = pose.yaw;
        self.pitch = pose.pitch.clamp(-self.settings.max_pitch, self.settings.max_pitch);
        self.update_vectors();
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position.to_array(),
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    /// Vertical field of view in degrees.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.front, self.up)
    }

    /// Unjittered perspective projection with 0..1 depth.
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(
            self.zoom.to_radians(),
            aspect,
            self.settings.near,
            self.settings.far,
        )
    }

    pub fn process_keyboard(&mut self, direction: Movement, dt: f32) {
        let velocity = self.settings.speed * dt;
        match direction {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
        }
    }

    /// Mouse delta in pixels; positive `dy` means the cursor moved up.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.settings.sensitivity;
        self.pitch = (self.pitch + dy * self.settings.sensitivity)
            .clamp(-self.settings.max_pitch, self.settings.max_pitch);
        self.update_vectors();
    }

    pub fn process_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(self.settings.min_zoom, self.settings.max_zoom);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aastudio_gpu_shared::config::{STATIC_IMAGE_POSE, VIEWPOINTS};

    fn camera(pose: CameraPose) -> Camera {
        Camera::new(pose, CameraSettings::default())
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_start_pose_looks_down_x() {
        let cam = camera(VIEWPOINTS[0]);
        assert_vec_eq(cam.position(), Vec3::new(-35.0, 10.0, 0.0));
        // yaw -360 is a full turn: facing +X, tilted slightly down.
        assert!(cam.front().x > 0.99);
        assert!(cam.front().y < 0.0);
    }

    #[test]
    fn test_static_image_pose_faces_negative_z() {
        let cam = camera(STATIC_IMAGE_POSE);
        assert_vec_eq(cam.front(), Vec3::NEG_Z);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut cam = camera(STATIC_IMAGE_POSE);
        cam.process_mouse(0.0, 10_000.0);
        assert_eq!(cam.pose().pitch, 89.0);
        cam.process_mouse(0.0, -20_000.0);
        assert_eq!(cam.pose().pitch, -89.0);
    }

    #[test]
    fn test_mouse_sensitivity() {
        let mut cam = camera(STATIC_IMAGE_POSE);
        cam.process_mouse(100.0, 50.0);
        let pose = cam.pose();
        assert!((pose.yaw - -80.0).abs() < 1e-4);
        assert!((pose.pitch - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut cam = camera(STATIC_IMAGE_POSE);
        cam.process_scroll(-10.0);
        assert_eq!(cam.zoom(), 45.0);
        cam.process_scroll(100.0);
        assert_eq!(cam.zoom(), 1.0);
        cam.process_scroll(-4.0);
        assert_eq!(cam.zoom(), 5.0);
    }

    #[test]
    fn test_keyboard_moves_at_speed() {
        let mut cam = camera(STATIC_IMAGE_POSE);
        cam.process_keyboard(Movement::Forward, 2.0);
        assert_vec_eq(cam.position(), Vec3::new(0.0, 0.0, -2.5));
        cam.process_keyboard(Movement::Right, 1.0);
        assert_vec_eq(cam.position(), Vec3::new(2.5, 0.0, -2.5));
        cam.process_keyboard(Movement::Left, 1.0);
        cam.process_keyboard(Movement::Backward, 2.0);
        assert_vec_eq(cam.position(), Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn test_set_pose_keeps_zoom() {
        let mut cam = camera(VIEWPOINTS[0]);
        cam.process_scroll(15.0);
        cam.set_pose(VIEWPOINTS[2]);
        assert_eq!(cam.pose(), VIEWPOINTS[2]);
        assert_eq!(cam.zoom(), 30.0);
    }

    #[test]
    fn test_view_projection_centers_target() {
        let cam = camera(STATIC_IMAGE_POSE);
        let clip = cam.projection_matrix(1200, 900) * cam.view_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
