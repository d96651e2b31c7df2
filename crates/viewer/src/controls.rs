use std::time::Duration;

use blockworld_common::Transform;
use blockworld_input::ControlGate;
use blockworld_render::PerspectiveCamera;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{CameraConfig, ControlsConfig};

/// The camera-control collaborator driven once per frame.
pub trait CameraRig: ControlGate {
    /// Advance by `delta`. While disabled this must leave the camera untouched.
    fn update(&mut self, delta: Duration, camera: &mut PerspectiveCamera);

    /// Pose of the rig's scene-side representation.
    fn anchor_transform(&self) -> Transform;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveKey {
    const fn index(self) -> usize {
        match self {
            MoveKey::Forward => 0,
            MoveKey::Backward => 1,
            MoveKey::Left => 2,
            MoveKey::Right => 3,
            MoveKey::Up => 4,
            MoveKey::Down => 5,
        }
    }
}

const KEY_COUNT: usize = 6;

/// First-person mouse-look and walk controls, active only while the pointer
/// is captured.
#[derive(Debug, Clone)]
pub struct PointerLockControls {
    enabled: bool,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    pending_look: Vec2,
    held: [bool; KEY_COUNT],
    sensitivity: f32,
    speed: f32,
}

impl PointerLockControls {
    pub fn new(camera: &CameraConfig, controls: &ControlsConfig) -> Self {
        Self {
            enabled: false,
            position: Vec3::new(0.0, camera.eye_height, 0.0),
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            pending_look: Vec2::ZERO,
            held: [false; KEY_COUNT],
            sensitivity: controls.mouse_sensitivity,
            speed: controls.move_speed,
        }
    }

    /// Accumulate pointer motion for the next update. Dropped while disabled.
    pub fn on_pointer_motion(&mut self, dx: f32, dy: f32) {
        if self.enabled {
            self.pending_look += Vec2::new(dx, dy);
        }
    }

    pub fn set_key(&mut self, key: MoveKey, pressed: bool) {
        self.held[key.index()] = pressed && self.enabled;
    }

    pub fn is_held(&self, key: MoveKey) -> bool {
        self.held[key.index()]
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Write the rig pose into `camera` without advancing time.
    pub fn sync_camera(&self, camera: &mut PerspectiveCamera) {
        camera.position = self.position;
        camera.yaw = self.yaw;
        camera.pitch = self.pitch;
    }

    fn walk_direction(&self) -> Vec3 {
        // Walking stays on the floor plane regardless of pitch.
        let forward = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right = forward.cross(Vec3::Y);
        let axis = |pos: MoveKey, neg: MoveKey| {
            (self.is_held(pos) as i32 - self.is_held(neg) as i32) as f32
        };

        let planar = forward * axis(MoveKey::Forward, MoveKey::Backward)
            + right * axis(MoveKey::Right, MoveKey::Left);
        planar.normalize_or_zero() + Vec3::Y * axis(MoveKey::Up, MoveKey::Down)
    }
}

impl ControlGate for PointerLockControls {
    fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.pending_look = Vec2::ZERO;
            self.held = [false; KEY_COUNT];
        }
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl CameraRig for PointerLockControls {
    fn update(&mut self, delta: Duration, camera: &mut PerspectiveCamera) {
        if !self.enabled {
            return;
        }

        let look = std::mem::take(&mut self.pending_look);
        self.yaw += look.x * self.sensitivity;
        self.pitch = (self.pitch - look.y * self.sensitivity)
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());

        self.position += self.walk_direction() * self.speed * delta.as_secs_f32();
        self.sync_camera(camera);
    }

    fn anchor_transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: Quat::from_rotation_y(-self.yaw - 90.0_f32.to_radians()),
            ..Transform::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (PointerLockControls, PerspectiveCamera) {
        let controls =
            PointerLockControls::new(&CameraConfig::default(), &ControlsConfig::default());
        let mut camera = PerspectiveCamera::default();
        controls.sync_camera(&mut camera);
        (controls, camera)
    }

    #[test]
    fn starts_disabled_at_eye_height() {
        let (c, camera) = rig();
        assert!(!c.is_enabled());
        assert_eq!(camera.position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn disabled_rig_leaves_camera_alone() {
        let (mut c, mut camera) = rig();
        c.on_pointer_motion(100.0, 50.0);
        c.set_key(MoveKey::Forward, true);
        let before = camera;
        c.update(Duration::from_millis(500), &mut camera);
        assert_eq!(camera, before);
    }

    #[test]
    fn enabled_rig_walks_forward() {
        let (mut c, mut camera) = rig();
        c.set_enabled(true);
        c.set_key(MoveKey::Forward, true);
        c.update(Duration::from_secs(1), &mut camera);
        // Default yaw looks down -Z; speed 100 units/s.
        assert!((camera.position - Vec3::new(0.0, 10.0, -100.0)).length() < 1e-3);
    }

    #[test]
    fn zero_delta_does_not_move() {
        let (mut c, mut camera) = rig();
        c.set_enabled(true);
        c.set_key(MoveKey::Left, true);
        c.update(Duration::ZERO, &mut camera);
        assert_eq!(camera.position, Vec3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn pointer_motion_turns_and_pitch_is_clamped() {
        let (mut c, mut camera) = rig();
        c.set_enabled(true);
        c.on_pointer_motion(50.0, -1_000_000.0);
        c.update(Duration::from_millis(16), &mut camera);
        assert!((camera.yaw - (-90.0_f32.to_radians() + 0.1)).abs() < 1e-5);
        assert!((camera.pitch - 89.0_f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn disabling_drops_held_keys_and_motion() {
        let (mut c, mut camera) = rig();
        c.set_enabled(true);
        c.set_key(MoveKey::Forward, true);
        c.on_pointer_motion(10.0, 0.0);
        c.set_enabled(false);
        c.set_enabled(true);
        let before = camera;
        c.update(Duration::from_secs(1), &mut camera);
        assert_eq!(camera.position, before.position);
        assert_eq!(camera.yaw, before.yaw);
    }

    #[test]
    fn anchor_follows_position() {
        let (mut c, mut camera) = rig();
        c.set_enabled(true);
        c.set_key(MoveKey::Up, true);
        c.update(Duration::from_millis(100), &mut camera);
        assert!((c.anchor_transform().position.y - 20.0).abs() < 1e-3);
    }
}
