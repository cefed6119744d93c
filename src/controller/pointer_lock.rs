use crate::model::camera::MAX_PITCH;
use crate::model::Camera;
use super::frame_loop::CameraControls;
use super::input::InputEvent;

/// Radians of rotation per pixel of mouse motion at pointer speed 1
const LOOK_SENSITIVITY: f32 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

/// Reported only when the lock state actually changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    Locked,
    Unlocked,
}

/// First-person controls: owns the camera, moves it on the ground plane and
/// turns it with mouse motion while the pointer is locked.
pub struct PointerLockControls {
    camera: Camera,
    state: LockState,
    pub pointer_speed: f32,
}

impl PointerLockControls {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            state: LockState::Unlocked,
            pointer_speed: 1.0,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn lock(&mut self) -> Option<LockTransition> {
        if self.state == LockState::Locked {
            return None;
        }
        self.state = LockState::Locked;
        tracing::debug!("pointer locked");
        Some(LockTransition::Locked)
    }

    pub fn unlock(&mut self) -> Option<LockTransition> {
        if self.state == LockState::Unlocked {
            return None;
        }
        self.state = LockState::Unlocked;
        tracing::debug!("pointer unlocked");
        Some(LockTransition::Unlocked)
    }

    pub fn set_locked(&mut self, locked: bool) -> Option<LockTransition> {
        if locked { self.lock() } else { self.unlock() }
    }

    /// Mouse look; no-op unless locked
    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        if self.state != LockState::Locked {
            return;
        }
        let sens = LOOK_SENSITIVITY * self.pointer_speed;
        self.camera.yaw += dx * sens;
        self.camera.pitch = (self.camera.pitch - dy * sens).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Handles mouse motion and lock changes; key events belong to `InputState`
    pub fn process_event(&mut self, event: &InputEvent) -> Option<LockTransition> {
        match event {
            InputEvent::MouseMove { dx, dy } => {
                self.apply_look(*dx, *dy);
                None
            }
            InputEvent::PointerLockChanged { locked } => self.set_locked(*locked),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

impl CameraControls for PointerLockControls {
    fn is_locked(&self) -> bool {
        self.state == LockState::Locked
    }

    fn move_forward(&mut self, distance: f32) {
        let dir = self.camera.forward_horizontal();
        self.camera.eye += dir * distance;
    }

    fn move_right(&mut self, distance: f32) {
        let dir = self.camera.right();
        self.camera.eye += dir * distance;
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn controls() -> PointerLockControls {
        PointerLockControls::new(Camera::new(800, 600))
    }

    #[test]
    fn starts_unlocked() {
        let c = controls();
        assert_eq!(c.state(), LockState::Unlocked);
        assert!(!c.is_locked());
    }

    #[test]
    fn transitions_fire_only_on_change() {
        let mut c = controls();
        assert_eq!(c.lock(), Some(LockTransition::Locked));
        assert_eq!(c.lock(), None);
        assert!(c.is_locked());
        assert_eq!(c.set_locked(false), Some(LockTransition::Unlocked));
        assert_eq!(c.unlock(), None);
        assert!(!c.is_locked());
    }

    #[test]
    fn lock_change_events_drive_state() {
        let mut c = controls();
        let t = c.process_event(&InputEvent::PointerLockChanged { locked: true });
        assert_eq!(t, Some(LockTransition::Locked));
        let t = c.process_event(&InputEvent::PointerLockChanged { locked: false });
        assert_eq!(t, Some(LockTransition::Unlocked));
    }

    #[test]
    fn mouse_look_only_while_locked() {
        let mut c = controls();
        let yaw = c.camera().yaw;
        c.process_event(&InputEvent::MouseMove { dx: 100.0, dy: 0.0 });
        assert_eq!(c.camera().yaw, yaw);

        c.lock();
        c.process_event(&InputEvent::MouseMove { dx: 100.0, dy: 0.0 });
        assert!((c.camera().yaw - (yaw + 0.2)).abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut c = controls();
        c.lock();
        c.apply_look(0.0, -100_000.0);
        assert!(c.camera().pitch <= MAX_PITCH);
        c.apply_look(0.0, 100_000.0);
        assert!(c.camera().pitch >= -MAX_PITCH);
    }

    #[test]
    fn moves_stay_on_the_ground_plane() {
        let mut c = controls();
        c.camera_mut().pitch = 0.8;
        let start = c.camera().eye;

        c.move_forward(1.0);
        let after_forward = c.camera().eye;
        assert_eq!(after_forward.y, start.y);
        assert!((after_forward - (start + Vec3::NEG_Z)).length() < 1e-5);

        c.move_right(-2.0);
        let after_right = c.camera().eye;
        assert!((after_right - (after_forward - Vec3::X * 2.0)).length() < 1e-5);
    }
}
