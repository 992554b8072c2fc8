use bitflags::bitflags;
use glam::{Quat, Vec2, Vec3};

const FLAT_EPSILON: f32 = 1e-6;

bitflags! {
    /// Digital movement keys currently held. Set and cleared on press/release edges.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct MoveKeys: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
    }
}

/// Movement input from every source. Digital keys and the analog stick are summed, never
/// treated as mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementAxes {
    pub keys: MoveKeys,
    /// Movement joystick displacement: x right, y toward the bottom of the screen.
    pub stick: Vec2,
}

impl MovementAxes {
    pub fn set_key(&mut self, key: MoveKeys, pressed: bool) {
        self.keys.set(key, pressed);
    }

    /// Sum of the active contributions as (strafe, vertical, forward), before any clamping.
    pub fn local_vector(&self) -> Vec3 {
        let axis = |pos: MoveKeys, neg: MoveKeys| {
            (self.keys.contains(pos) as i32 - self.keys.contains(neg) as i32) as f32
        };
        Vec3::new(
            axis(MoveKeys::RIGHT, MoveKeys::LEFT) + self.stick.x,
            axis(MoveKeys::UP, MoveKeys::DOWN),
            axis(MoveKeys::FORWARD, MoveKeys::BACKWARD) - self.stick.y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveMode {
    Fly,
    Walk { height: f32 },
}

/// Forward and right vectors used to map local input onto the world.
pub fn movement_basis(rotation: Quat, mode: MoveMode) -> (Vec3, Vec3) {
    let forward = rotation * Vec3::NEG_Z;
    let right = rotation * Vec3::X;
    match mode {
        MoveMode::Fly => (forward, right),
        MoveMode::Walk { .. } => {
            let flat_right = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();
            let flat = Vec3::new(forward.x, 0.0, forward.z);
            let flat_forward = if flat.length_squared() > FLAT_EPSILON {
                flat.normalize()
            } else {
                // looking straight up or down: recover the heading from the right vector
                Vec3::Y.cross(flat_right)
            };
            (flat_forward, flat_right)
        }
    }
}

/// Advances `position` by one frame of input and returns the candidate position.
///
/// The world-space direction is clamped to unit length before scaling by `speed * delta`,
/// so diagonal input never moves faster than a single axis. Walk mode ignores vertical input
/// and pins the result to the walk height.
pub fn integrate(
    position: Vec3,
    rotation: Quat,
    axes: &MovementAxes,
    mode: MoveMode,
    speed: f32,
    delta: f32,
) -> Vec3 {
    let delta = if delta.is_finite() { delta } else { 0.0 };
    let local = axes.local_vector();
    let (forward, right) = movement_basis(rotation, mode);
    let mut direction = right * local.x + forward * local.z;
    if mode == MoveMode::Fly {
        direction += Vec3::Y * local.y;
    }
    let direction = direction.clamp_length_max(1.0);
    let mut next = position + direction * speed * delta;
    if let MoveMode::Walk { height } = mode {
        next.y = height;
    }
    next
}
