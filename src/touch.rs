//! On-screen virtual joysticks for coarse-pointer (touch) devices.
//!
//! The movement stick yields a normalized displacement; the look stick yields raw pixel deltas.
//! Both track a single pointer each, so two thumbs can drive them independently.

use glam::Vec2;

/// Pad center and radius as laid out on screen when the pointer went down. Pads may move
/// between sessions, so the geometry is captured per press rather than at mount time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadGeometry {
    pub center: Vec2,
    pub radius: f32,
}

impl PadGeometry {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stick {
    Move,
    Look,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Pointer activity on one of the two joystick pads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickEvent {
    pub stick: Stick,
    pub phase: StickPhase,
    pub pointer_id: u64,
    pub position: Vec2,
    /// Current pad layout; only read on `Down`.
    pub pad: PadGeometry,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveStick {
    pointer: Option<u64>,
    pad: Option<PadGeometry>,
    value: Vec2,
}

impl MoveStick {
    pub fn value(&self) -> Vec2 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }

    /// Applies an event and returns the new displacement, each axis in [-1, 1].
    pub fn handle(&mut self, phase: StickPhase, pointer_id: u64, position: Vec2, pad: PadGeometry) -> Vec2 {
        match phase {
            StickPhase::Down => {
                if self.pointer.is_none() {
                    self.pointer = Some(pointer_id);
                    self.pad = Some(pad);
                    self.value = self.displacement(position);
                }
            }
            StickPhase::Move => {
                if self.pointer == Some(pointer_id) {
                    self.value = self.displacement(position);
                }
            }
            StickPhase::Up | StickPhase::Cancel => {
                if self.pointer == Some(pointer_id) {
                    self.release();
                }
            }
        }
        self.value
    }

    pub fn release(&mut self) {
        self.pointer = None;
        self.pad = None;
        self.value = Vec2::ZERO;
    }

    fn displacement(&self, position: Vec2) -> Vec2 {
        match self.pad {
            Some(pad) if pad.radius > 0.0 => ((position - pad.center) / pad.radius).clamp(Vec2::NEG_ONE, Vec2::ONE),
            _ => Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookStick {
    pointer: Option<u64>,
    last: Vec2,
}

impl LookStick {
    pub fn is_active(&self) -> bool {
        self.pointer.is_some()
    }

    /// Applies an event and returns the pixel delta since the previous position of the
    /// tracked pointer.
    pub fn handle(&mut self, phase: StickPhase, pointer_id: u64, position: Vec2) -> Vec2 {
        match phase {
            StickPhase::Down => {
                if self.pointer.is_none() {
                    self.pointer = Some(pointer_id);
                    self.last = position;
                }
                Vec2::ZERO
            }
            StickPhase::Move => {
                if self.pointer != Some(pointer_id) {
                    return Vec2::ZERO;
                }
                let delta = position - self.last;
                self.last = position;
                delta
            }
            StickPhase::Up | StickPhase::Cancel => {
                if self.pointer == Some(pointer_id) {
                    self.release();
                }
                Vec2::ZERO
            }
        }
    }

    pub fn release(&mut self) {
        self.pointer = None;
    }
}
