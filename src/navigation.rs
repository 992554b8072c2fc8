//! First-person navigation: fuses keyboard/mouse, touch joysticks and device orientation into
//! one camera transform, then guards each step against the registered colliders.

use crate::camera::Camera;
use crate::collision::{Collider, CollisionGuard};
use crate::config::NavigationConfig;
use crate::host::{Channel, ControlKind, InputHost, Subscriptions};
use crate::input::{KeyboardAdapter, NavEvent};
use crate::movement::{self, MoveMode, MovementAxes};
use crate::orientation::{self, LookAccumulator, LookOffset};
use crate::sensor::{DeviceOrientation, GyroRequest, PermissionStatus, SensorSupport};
use crate::touch::{JoystickEvent, LookStick, MoveStick, Stick};
use serde::Serialize;
use winit::event::MouseButton;

/// Navigation settings visible to the control panel. Always handed out by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationState {
    pub fly_mode: bool,
    pub speed: f32,
    pub look_speed: f32,
    pub walk_height: f32,
    pub gyro_enabled: bool,
    pub gyro_available: bool,
}

const BASE_CHANNELS: [Channel; 4] =
    [Channel::Keyboard, Channel::PointerButton, Channel::PointerMotion, Channel::PointerLock];
const GYRO_CHANNELS: [Channel; 2] = [Channel::DeviceOrientation, Channel::ScreenOrientation];

pub struct NavigationController<H: InputHost> {
    host: H,
    camera: Camera,
    state: NavigationState,
    keyboard: KeyboardAdapter,
    axes: MovementAxes,
    look: LookAccumulator,
    offset: LookOffset,
    move_stick: MoveStick,
    look_stick: LookStick,
    guard: CollisionGuard,
    subscriptions: Subscriptions,
    mouse_sensitivity: f32,
    touch_look_sensitivity: f32,
    pointer_locked: bool,
    reading: Option<DeviceOrientation>,
    screen_rotation: f32,
    disposed: bool,
}

impl<H: InputHost> NavigationController<H> {
    /// Wires the controller to `host`. Listener or control failures are logged and leave the
    /// affected input inactive.
    pub fn new(mut host: H, camera: Camera, config: &NavigationConfig, keyboard: KeyboardAdapter) -> Self {
        let gyro_available = host.orientation_support() != SensorSupport::Unsupported;
        let mut subscriptions = Subscriptions::new();
        for channel in BASE_CHANNELS {
            if let Err(err) = subscriptions.subscribe(&mut host, channel) {
                tracing::warn!(target: "navigation", "{err}");
            }
        }
        if host.coarse_pointer() {
            if let Err(err) = subscriptions.subscribe(&mut host, Channel::Touch) {
                tracing::warn!(target: "navigation", "{err}");
            }
            for kind in [ControlKind::MoveJoystick, ControlKind::LookJoystick] {
                if let Err(err) = subscriptions.mount(&mut host, kind) {
                    tracing::warn!(target: "navigation", "{err}");
                }
            }
        }

        let mut look = LookAccumulator::default();
        look.sync_from(camera.rotation);
        let mut controller = Self {
            host,
            camera,
            state: NavigationState {
                fly_mode: config.fly_mode,
                speed: config.speed,
                look_speed: config.look_speed,
                walk_height: config.walk_height,
                gyro_enabled: false,
                gyro_available,
            },
            keyboard,
            axes: MovementAxes::default(),
            look,
            offset: LookOffset::default(),
            move_stick: MoveStick::default(),
            look_stick: LookStick::default(),
            guard: CollisionGuard::new(config.collider_radius),
            subscriptions,
            mouse_sensitivity: config.mouse_sensitivity,
            touch_look_sensitivity: config.touch_look_sensitivity,
            pointer_locked: false,
            reading: None,
            screen_rotation: 0.0,
            disposed: false,
        };
        if !controller.state.fly_mode {
            controller.camera.position.y = controller.state.walk_height;
        }
        controller
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Direct camera access for spawn placement before the frame loop starts.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn look(&self) -> LookAccumulator {
        self.look
    }

    pub fn look_offset(&self) -> LookOffset {
        self.offset
    }

    pub fn axes(&self) -> MovementAxes {
        self.axes
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn collider_radius(&self) -> f32 {
        self.guard.radius()
    }

    pub fn colliders(&self) -> &[Collider] {
        self.guard.colliders()
    }

    /// Folds one input event into the navigation state. Events on channels without a live
    /// listener are dropped, as is everything after [`dispose`](Self::dispose).
    pub fn handle_event(&mut self, event: NavEvent) {
        let Some(channel) = event.channel() else {
            return;
        };
        if self.disposed || !self.subscriptions.is_active(channel) {
            tracing::trace!(target: "navigation", channel = channel.label(), "event ignored");
            return;
        }
        match event {
            NavEvent::Key { key, pressed } => {
                let flags = self.keyboard.flags_for(&key);
                if !flags.is_empty() {
                    self.axes.set_key(flags, pressed);
                }
            }
            NavEvent::PointerMotion { dx, dy } => {
                if self.pointer_locked && !self.state.gyro_enabled {
                    self.look.apply_delta(dx, dy, self.mouse_sensitivity * self.state.look_speed);
                }
            }
            NavEvent::PointerButton { button: MouseButton::Left, pressed: true } => {
                if !self.pointer_locked && !self.state.gyro_enabled && !self.host.coarse_pointer() {
                    if let Err(err) = self.host.request_pointer_lock() {
                        tracing::warn!(target: "navigation", "{err}");
                    }
                }
            }
            NavEvent::PointerButton { .. } => {}
            NavEvent::PointerLockChanged(locked) => {
                self.pointer_locked = locked;
            }
            NavEvent::Joystick(joystick) => self.handle_joystick(joystick),
            NavEvent::DeviceOrientation(reading) => {
                if self.state.gyro_enabled {
                    self.reading = Some(reading);
                }
            }
            NavEvent::ScreenRotation(degrees) => {
                self.screen_rotation = degrees;
            }
            NavEvent::Other => {}
        }
    }

    fn handle_joystick(&mut self, event: JoystickEvent) {
        match event.stick {
            Stick::Move => {
                self.axes.stick = self.move_stick.handle(event.phase, event.pointer_id, event.position, event.pad);
            }
            Stick::Look => {
                let delta = self.look_stick.handle(event.phase, event.pointer_id, event.position);
                if delta == glam::Vec2::ZERO {
                    return;
                }
                let scale = self.touch_look_sensitivity * self.state.look_speed;
                if self.state.gyro_enabled {
                    self.offset.apply_delta(delta.x, delta.y, scale);
                } else {
                    self.look.apply_delta(delta.x, delta.y, scale);
                }
            }
        }
    }

    /// Drops held keys and both joystick sessions, e.g. when the surface loses focus and the
    /// matching releases will never be delivered.
    pub fn release_inputs(&mut self) {
        self.axes = MovementAxes::default();
        self.move_stick.release();
        self.look_stick.release();
    }

    /// Advances orientation and position by one frame of `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        if self.state.gyro_enabled {
            if let Some(rotation) = self
                .reading
                .as_ref()
                .and_then(|reading| orientation::fuse_gyro(reading, self.screen_rotation, &self.offset))
            {
                self.camera.rotation = rotation;
            }
        } else {
            self.camera.rotation = self.look.rotation();
        }

        let mode = self.move_mode();
        let from = self.camera.position;
        let candidate =
            movement::integrate(from, self.camera.rotation, &self.axes, mode, self.state.speed, delta);
        let mut accepted = self.guard.resolve(from, candidate);
        if let MoveMode::Walk { height } = mode {
            accepted.y = height;
        }
        self.camera.position = accepted;
        tracing::trace!(target: "navigation", position = ?accepted, "frame");
    }

    fn move_mode(&self) -> MoveMode {
        if self.state.fly_mode {
            MoveMode::Fly
        } else {
            MoveMode::Walk { height: self.state.walk_height }
        }
    }

    /// Leaving fly mode snaps the camera to the walk height immediately.
    pub fn set_fly_mode(&mut self, enabled: bool) {
        if self.state.fly_mode != enabled {
            tracing::info!(target: "navigation", "{} mode", if enabled { "fly" } else { "walk" });
        }
        self.state.fly_mode = enabled;
        if !enabled {
            self.camera.position.y = self.state.walk_height;
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.state.speed = speed;
    }

    pub fn set_look_speed(&mut self, look_speed: f32) {
        self.state.look_speed = look_speed;
    }

    /// Takes effect on the next walk-mode frame.
    pub fn set_walk_height(&mut self, height: f32) {
        self.state.walk_height = height;
    }

    pub fn set_colliders(&mut self, colliders: Vec<Collider>) {
        tracing::info!(target: "navigation", count = colliders.len(), "colliders replaced");
        self.guard.set_colliders(colliders);
    }

    pub fn set_collider_radius(&mut self, radius: f32) {
        self.guard.set_radius(radius);
    }

    /// Starts a gyro toggle. Disabling, and enabling where no prompt is needed, resolve
    /// immediately; otherwise the request waits on the host's permission prompt while the
    /// controller keeps running in its current mode. Pass the outcome to
    /// [`complete_gyro`](Self::complete_gyro).
    pub fn request_gyro(&mut self, enabled: bool) -> GyroRequest {
        if !enabled {
            return GyroRequest::ready(false, PermissionStatus::Granted);
        }
        if self.disposed {
            return GyroRequest::ready(true, PermissionStatus::Unsupported);
        }
        if self.state.gyro_enabled {
            return GyroRequest::ready(true, PermissionStatus::Granted);
        }
        match self.host.orientation_support() {
            SensorSupport::Unsupported => GyroRequest::ready(true, PermissionStatus::Unsupported),
            SensorSupport::Available => GyroRequest::ready(true, PermissionStatus::Granted),
            SensorSupport::RequiresPermission => GyroRequest::pending(self.host.request_orientation_permission()),
        }
    }

    /// Applies the outcome of a [`GyroRequest`] and returns the gyro state actually reached.
    pub fn complete_gyro(&mut self, request: &GyroRequest, status: PermissionStatus) -> bool {
        if request.enables() {
            self.enable_gyro(status)
        } else {
            self.disable_gyro();
            false
        }
    }

    /// Turns gyro-driven orientation on or off; resolves to the state actually reached, which
    /// may be `false` after a `true` request on denial or missing hardware. Callers must not
    /// overlap two calls.
    pub async fn set_gyro_enabled(&mut self, enabled: bool) -> bool {
        let mut request = self.request_gyro(enabled);
        let status = (&mut request).await;
        self.complete_gyro(&request, status)
    }

    fn enable_gyro(&mut self, status: PermissionStatus) -> bool {
        if self.state.gyro_enabled {
            return true;
        }
        if self.disposed || status != PermissionStatus::Granted {
            tracing::warn!(target: "navigation", %status, "gyro unavailable, keeping pointer look");
            return false;
        }
        for channel in GYRO_CHANNELS {
            if let Err(err) = self.subscriptions.subscribe(&mut self.host, channel) {
                tracing::warn!(target: "navigation", "{err}");
                for channel in GYRO_CHANNELS {
                    self.subscriptions.unsubscribe(&mut self.host, channel);
                }
                return false;
            }
        }
        self.screen_rotation = self.host.screen_rotation_degrees();
        self.look.sync_from(self.camera.rotation);
        self.offset.reset();
        self.reading = None;
        self.state.gyro_enabled = true;
        tracing::info!(target: "navigation", "gyro enabled");
        true
    }

    fn disable_gyro(&mut self) {
        for channel in GYRO_CHANNELS {
            self.subscriptions.unsubscribe(&mut self.host, channel);
        }
        if self.state.gyro_enabled {
            self.state.gyro_enabled = false;
            self.look.sync_from(self.camera.rotation);
            self.offset.reset();
            self.reading = None;
            tracing::info!(target: "navigation", "gyro disabled");
        }
    }

    /// Removes every listener and on-screen control. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let listeners = self.subscriptions.listener_count();
        if self.pointer_locked {
            self.host.release_pointer_lock();
            self.pointer_locked = false;
        }
        self.subscriptions.release_all(&mut self.host);
        self.release_inputs();
        self.reading = None;
        self.state.gyro_enabled = false;
        tracing::info!(target: "navigation", listeners, "navigation disposed");
    }
}

impl<H: InputHost> Drop for NavigationController<H> {
    fn drop(&mut self) {
        self.dispose();
    }
}
