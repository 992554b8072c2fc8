//! Platform seam: whatever owns the render surface (a desktop window, a browser canvas)
//! implements [`InputHost`] so the navigation controller can subscribe to input, mount its
//! touch controls and negotiate sensor access without touching globals.

use crate::sensor::{PermissionFuture, SensorSupport};
use std::collections::BTreeMap;
use thiserror::Error;

/// Event streams the controller can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Keyboard,
    PointerButton,
    PointerMotion,
    PointerLock,
    Touch,
    DeviceOrientation,
    ScreenOrientation,
}

impl Channel {
    pub fn label(self) -> &'static str {
        match self {
            Channel::Keyboard => "keyboard",
            Channel::PointerButton => "pointer-button",
            Channel::PointerMotion => "pointer-motion",
            Channel::PointerLock => "pointer-lock",
            Channel::Touch => "touch",
            Channel::DeviceOrientation => "device-orientation",
            Channel::ScreenOrientation => "screen-orientation",
        }
    }
}

/// On-screen elements the controller may add to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    MoveJoystick,
    LookJoystick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub u64);

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host refused a {} listener", .0.label())]
    ListenerRejected(Channel),
    #[error("host could not mount control {0:?}")]
    ControlRejected(ControlKind),
    #[error("pointer lock unavailable: {0}")]
    PointerLockUnavailable(String),
}

pub trait InputHost {
    fn add_listener(&mut self, channel: Channel) -> Result<ListenerId, HostError>;

    fn remove_listener(&mut self, id: ListenerId);

    fn mount_control(&mut self, kind: ControlKind) -> Result<ControlId, HostError>;

    fn unmount_control(&mut self, id: ControlId);

    /// True when the primary pointer is coarse (touch screen), which enables the joysticks.
    fn coarse_pointer(&self) -> bool;

    /// Asks for pointer lock on the render surface. The host confirms with a
    /// `PointerLockChanged` event.
    fn request_pointer_lock(&mut self) -> Result<(), HostError>;

    fn release_pointer_lock(&mut self);

    fn orientation_support(&self) -> SensorSupport;

    /// Starts the platform permission prompt. Only called when support is
    /// [`SensorSupport::RequiresPermission`].
    fn request_orientation_permission(&mut self) -> PermissionFuture;

    /// Current rotation of the screen relative to the device's natural orientation.
    fn screen_rotation_degrees(&self) -> f32;
}

/// Listener and control bookkeeping so teardown can release exactly what was registered.
#[derive(Debug, Default)]
pub struct Subscriptions {
    listeners: BTreeMap<Channel, ListenerId>,
    controls: BTreeMap<ControlId, ControlKind>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener unless one is already active for the channel.
    pub fn subscribe<H: InputHost + ?Sized>(&mut self, host: &mut H, channel: Channel) -> Result<(), HostError> {
        if self.listeners.contains_key(&channel) {
            return Ok(());
        }
        let id = host.add_listener(channel)?;
        self.listeners.insert(channel, id);
        Ok(())
    }

    /// Removes the channel's listener. No-op if none is registered.
    pub fn unsubscribe<H: InputHost + ?Sized>(&mut self, host: &mut H, channel: Channel) {
        if let Some(id) = self.listeners.remove(&channel) {
            host.remove_listener(id);
        }
    }

    pub fn mount<H: InputHost + ?Sized>(&mut self, host: &mut H, kind: ControlKind) -> Result<ControlId, HostError> {
        let id = host.mount_control(kind)?;
        self.controls.insert(id, kind);
        Ok(id)
    }

    pub fn is_active(&self, channel: Channel) -> bool {
        self.listeners.contains_key(&channel)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Removes every listener and unmounts every control. A second call finds nothing to release.
    pub fn release_all<H: InputHost + ?Sized>(&mut self, host: &mut H) {
        for (_, id) in std::mem::take(&mut self.listeners) {
            host.remove_listener(id);
        }
        for (id, _) in std::mem::take(&mut self.controls) {
            host.unmount_control(id);
        }
    }
}
