use crate::host::{Channel, ControlId, ControlKind, HostError, InputHost, ListenerId};
use crate::input::NavEvent;
use crate::sensor::{PermissionFuture, PermissionStatus, SensorSupport};
use crate::touch::{JoystickEvent, PadGeometry, Stick, StickPhase};
use glam::Vec2;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::TouchPhase;
use winit::window::{CursorGrabMode, Window};

/// Joystick pads sit in the lower corners, sized relative to the shorter window edge.
const PAD_RADIUS_FRACTION: f32 = 0.12;

/// [`InputHost`] backed by a winit window. Pointer lock maps to a cursor grab; touch points
/// are split between the two joystick pads by screen half. Desktop windows expose no
/// orientation sensor.
pub struct WinitHost {
    window: Option<Arc<Window>>,
    size: PhysicalSize<u32>,
    touch_controls: bool,
    next_id: u64,
    listeners: BTreeMap<ListenerId, Channel>,
    controls: BTreeMap<ControlId, ControlKind>,
    touches: HashMap<u64, Stick>,
    outbox: Vec<NavEvent>,
}

impl WinitHost {
    pub fn new(size: PhysicalSize<u32>, touch_controls: bool) -> Self {
        Self {
            window: None,
            size,
            touch_controls,
            next_id: 0,
            listeners: BTreeMap::new(),
            controls: BTreeMap::new(),
            touches: HashMap::new(),
            outbox: Vec::new(),
        }
    }

    pub fn attach(&mut self, window: Arc<Window>) {
        self.size = window.inner_size();
        self.window = Some(window);
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    pub fn is_listening(&self, channel: Channel) -> bool {
        self.listeners.values().any(|active| *active == channel)
    }

    /// Host-originated events (pointer lock confirmations) waiting to be fed to the controller.
    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Current pad layout: movement pad bottom-left, look pad bottom-right.
    pub fn pad_layout(&self) -> (PadGeometry, PadGeometry) {
        let width = self.size.width as f32;
        let height = self.size.height as f32;
        let radius = width.min(height) * PAD_RADIUS_FRACTION;
        let inset = radius * 1.5;
        let move_pad = PadGeometry::new(Vec2::new(inset, height - inset), radius);
        let look_pad = PadGeometry::new(Vec2::new(width - inset, height - inset), radius);
        (move_pad, look_pad)
    }

    /// Routes a touch point to the pad owning its screen half. The half is decided when the
    /// finger goes down and kept until it lifts.
    pub fn translate_touch(&mut self, id: u64, phase: TouchPhase, location: PhysicalPosition<f64>) -> Option<NavEvent> {
        if !self.touch_controls {
            return None;
        }
        let position = Vec2::new(location.x as f32, location.y as f32);
        let stick = match phase {
            TouchPhase::Started => {
                let stick = if position.x < self.size.width as f32 * 0.5 { Stick::Move } else { Stick::Look };
                self.touches.insert(id, stick);
                stick
            }
            TouchPhase::Moved => *self.touches.get(&id)?,
            TouchPhase::Ended | TouchPhase::Cancelled => self.touches.remove(&id)?,
        };
        let phase = match phase {
            TouchPhase::Started => StickPhase::Down,
            TouchPhase::Moved => StickPhase::Move,
            TouchPhase::Ended => StickPhase::Up,
            TouchPhase::Cancelled => StickPhase::Cancel,
        };
        let (move_pad, look_pad) = self.pad_layout();
        let pad = match stick {
            Stick::Move => move_pad,
            Stick::Look => look_pad,
        };
        Some(NavEvent::Joystick(JoystickEvent { stick, phase, pointer_id: id, position, pad }))
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl InputHost for WinitHost {
    fn add_listener(&mut self, channel: Channel) -> Result<ListenerId, HostError> {
        if matches!(channel, Channel::DeviceOrientation | Channel::ScreenOrientation) {
            return Err(HostError::ListenerRejected(channel));
        }
        let id = ListenerId(self.next_id());
        self.listeners.insert(id, channel);
        tracing::debug!(target: "host", channel = channel.label(), "listener added");
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        if let Some(channel) = self.listeners.remove(&id) {
            tracing::debug!(target: "host", channel = channel.label(), "listener removed");
        }
    }

    fn mount_control(&mut self, kind: ControlKind) -> Result<ControlId, HostError> {
        if !self.touch_controls {
            return Err(HostError::ControlRejected(kind));
        }
        let id = ControlId(self.next_id());
        self.controls.insert(id, kind);
        Ok(id)
    }

    fn unmount_control(&mut self, id: ControlId) {
        self.controls.remove(&id);
    }

    fn coarse_pointer(&self) -> bool {
        self.touch_controls
    }

    fn request_pointer_lock(&mut self) -> Result<(), HostError> {
        let window = self.window.as_ref().ok_or_else(|| HostError::PointerLockUnavailable("no window".into()))?;
        window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
            .map_err(|err| HostError::PointerLockUnavailable(err.to_string()))?;
        window.set_cursor_visible(false);
        self.outbox.push(NavEvent::PointerLockChanged(true));
        Ok(())
    }

    fn release_pointer_lock(&mut self) {
        if let Some(window) = self.window.as_ref() {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!(target: "host", "cursor release failed: {err}");
            }
            window.set_cursor_visible(true);
        }
        self.outbox.push(NavEvent::PointerLockChanged(false));
    }

    fn orientation_support(&self) -> SensorSupport {
        SensorSupport::Unsupported
    }

    fn request_orientation_permission(&mut self) -> PermissionFuture {
        Box::pin(async { PermissionStatus::Unsupported })
    }

    fn screen_rotation_degrees(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch_host() -> WinitHost {
        WinitHost::new(PhysicalSize::new(1000, 600), true)
    }

    #[test]
    fn touches_split_by_screen_half() {
        let mut host = touch_host();
        let left = host.translate_touch(1, TouchPhase::Started, PhysicalPosition::new(100.0, 500.0));
        let right = host.translate_touch(2, TouchPhase::Started, PhysicalPosition::new(900.0, 500.0));
        match (left, right) {
            (Some(NavEvent::Joystick(left)), Some(NavEvent::Joystick(right))) => {
                assert_eq!(left.stick, Stick::Move);
                assert_eq!(left.phase, StickPhase::Down);
                assert_eq!(right.stick, Stick::Look);
            }
            other => panic!("unexpected translation {other:?}"),
        }
    }

    #[test]
    fn touch_keeps_its_stick_until_lifted() {
        let mut host = touch_host();
        host.translate_touch(4, TouchPhase::Started, PhysicalPosition::new(100.0, 500.0));
        let moved = host.translate_touch(4, TouchPhase::Moved, PhysicalPosition::new(800.0, 500.0));
        assert!(matches!(moved, Some(NavEvent::Joystick(JoystickEvent { stick: Stick::Move, .. }))));
        let ended = host.translate_touch(4, TouchPhase::Ended, PhysicalPosition::new(800.0, 500.0));
        assert!(matches!(ended, Some(NavEvent::Joystick(JoystickEvent { phase: StickPhase::Up, .. }))));
        assert!(host.translate_touch(4, TouchPhase::Moved, PhysicalPosition::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn desktop_host_has_no_touch_or_orientation() {
        let mut host = WinitHost::new(PhysicalSize::new(800, 600), false);
        assert!(!host.coarse_pointer());
        assert!(host.translate_touch(1, TouchPhase::Started, PhysicalPosition::new(10.0, 10.0)).is_none());
        assert!(host.mount_control(ControlKind::MoveJoystick).is_err());
        assert!(host.add_listener(Channel::DeviceOrientation).is_err());
        let id = host.add_listener(Channel::Keyboard).expect("keyboard");
        assert!(host.is_listening(Channel::Keyboard));
        host.remove_listener(id);
        assert!(!host.is_listening(Channel::Keyboard));
        assert_eq!(host.orientation_support(), SensorSupport::Unsupported);
    }

    #[test]
    fn pointer_lock_without_window_fails_cleanly() {
        let mut host = touch_host();
        assert!(matches!(host.request_pointer_lock(), Err(HostError::PointerLockUnavailable(_))));
        assert!(host.drain_events().is_empty());
        host.release_pointer_lock();
        assert_eq!(host.drain_events(), vec![NavEvent::PointerLockChanged(false)]);
    }

    #[test]
    fn pads_sit_in_lower_corners() {
        let host = touch_host();
        let (move_pad, look_pad) = host.pad_layout();
        assert!((move_pad.radius - 72.0).abs() < 1e-4);
        assert!(move_pad.center.x < 500.0 && look_pad.center.x > 500.0);
        assert_eq!(move_pad.center.y, look_pad.center.y);
    }
}
