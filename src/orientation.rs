//! Orientation fusion: pointer/touch look accumulation and device-orientation composition.

use crate::sensor::DeviceOrientation;
use crate::wrap_angle;
use glam::{EulerRot, Quat};
use std::f32::consts::FRAC_PI_2;

/// Pitch limit of the look accumulator, just inside straight up/down.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
/// Pitch limit of the gyro look offset (60 degrees).
pub const OFFSET_PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_3;

/// Yaw/pitch driven by mouse and touch deltas while the gyro is off.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookAccumulator {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookAccumulator {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw: wrap_angle(yaw), pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT) }
    }

    /// Folds a pixel delta into the accumulator. Moving right turns right, moving down looks down.
    pub fn apply_delta(&mut self, dx: f32, dy: f32, scale: f32) {
        let Some((yaw_step, pitch_step)) = scaled_delta(dx, dy, scale) else {
            return;
        };
        self.yaw = wrap_angle(self.yaw - yaw_step);
        self.pitch = (self.pitch - pitch_step).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Re-captures yaw/pitch from an existing rotation so switching sources does not snap.
    pub fn sync_from(&mut self, rotation: Quat) {
        let (yaw, pitch, _roll) = rotation.to_euler(EulerRot::YXZ);
        *self = Self::new(yaw, pitch);
    }

    /// Yaw outermost, pitch innermost, no roll.
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Touch-applied correction layered on top of the sensor rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookOffset {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookOffset {
    pub fn apply_delta(&mut self, dx: f32, dy: f32, scale: f32) {
        let Some((yaw_step, pitch_step)) = scaled_delta(dx, dy, scale) else {
            return;
        };
        self.yaw = wrap_angle(self.yaw - yaw_step);
        self.pitch = (self.pitch - pitch_step).clamp(-OFFSET_PITCH_LIMIT, OFFSET_PITCH_LIMIT);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pixel delta scaled to radians; `None` when either component is not finite.
fn scaled_delta(dx: f32, dy: f32, scale: f32) -> Option<(f32, f32)> {
    let (yaw_step, pitch_step) = (dx * scale, dy * scale);
    (yaw_step.is_finite() && pitch_step.is_finite()).then_some((yaw_step, pitch_step))
}

/// Converts a device-orientation reading into a screen-relative camera rotation.
///
/// The sensor angles are device relative: Euler (beta, alpha, -gamma) in YXZ order, then a
/// -90 degree turn about X maps the device frame onto the world, then the screen rotation is
/// undone about the view axis.
pub fn device_rotation(alpha: f32, beta: f32, gamma: f32, screen_degrees: f32) -> Quat {
    let (alpha, beta, gamma) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
    let screen = screen_degrees.to_radians();
    Quat::from_euler(EulerRot::YXZ, alpha, beta, -gamma)
        * Quat::from_rotation_x(-FRAC_PI_2)
        * Quat::from_rotation_z(-screen)
}

/// Full gyro-driven rotation for one frame, or `None` when the reading is incomplete.
pub fn fuse_gyro(reading: &DeviceOrientation, screen_degrees: f32, offset: &LookOffset) -> Option<Quat> {
    let (alpha, beta, gamma) = reading.angles()?;
    let base = device_rotation(alpha, beta, gamma, screen_degrees);
    Some((Quat::from_rotation_y(offset.yaw) * base * Quat::from_rotation_x(offset.pitch)).normalize())
}
