use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Pitch limit, slightly less than π/2 so the view never flips
pub const MAX_PITCH: f32 = 1.5533;

pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_config(&CameraConfig::default(), width, height)
    }

    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            eye: config.position,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: config.fov_y_deg.to_radians(),
            aspect: 1.0,
            z_near: config.z_near,
            z_far: config.z_far,
        };
        camera.set_aspect(width, height);
        camera.set_look_at(config.look_at);
        camera
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    /// View direction projected onto the ground plane
    pub fn forward_horizontal(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Horizontal right vector; the camera never rolls
    pub fn right(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin().clamp(-MAX_PITCH, MAX_PITCH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_camera_faces_negative_z() {
        let cam = Camera::new(800, 600);
        assert_eq!(cam.eye, Vec3::new(2.0, 4.0, 10.0));
        assert!(approx(cam.forward(), Vec3::NEG_Z));
        assert!(approx(cam.right(), Vec3::X));
        assert!((cam.fov_y - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn horizontal_forward_ignores_pitch() {
        let mut cam = Camera::new(800, 600);
        cam.pitch = 1.2;
        let f = cam.forward_horizontal();
        assert_eq!(f.y, 0.0);
        assert!(approx(f, Vec3::NEG_Z));
        assert!(f.dot(cam.right()).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_surface_keeps_aspect() {
        let mut cam = Camera::new(800, 400);
        cam.set_aspect(0, 300);
        assert_eq!(cam.aspect, 2.0);
    }
}
