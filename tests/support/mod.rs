#![allow(dead_code)]

use futures::channel::oneshot;
use glam::Vec3;
use scene_walker::camera::Camera;
use scene_walker::config::NavigationConfig;
use scene_walker::host::{Channel, ControlId, ControlKind, HostError, InputHost, ListenerId};
use scene_walker::input::{KeyboardAdapter, NavEvent};
use scene_walker::sensor::{PermissionFuture, PermissionStatus, SensorSupport};
use scene_walker::NavigationController;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use winit::keyboard::{Key, NamedKey};

/// Everything the controller asked of the host, shared so it survives the controller's drop.
#[derive(Debug, Default)]
pub struct HostLog {
    next_id: u64,
    pub live: BTreeMap<ListenerId, Channel>,
    pub added: Vec<Channel>,
    pub removed: Vec<ListenerId>,
    pub mounted: Vec<ControlKind>,
    pub unmounted: Vec<ControlId>,
    pub lock_requests: usize,
    pub lock_releases: usize,
    pub permission_prompts: usize,
}

impl HostLog {
    pub fn is_listening(&self, channel: Channel) -> bool {
        self.live.values().any(|active| *active == channel)
    }
}

pub struct MockHost {
    pub log: Rc<RefCell<HostLog>>,
    pub coarse: bool,
    pub support: SensorSupport,
    pub screen_rotation: f32,
    pub reject: Vec<Channel>,
    pub permission: Option<oneshot::Receiver<PermissionStatus>>,
}

impl MockHost {
    pub fn desktop() -> Self {
        Self {
            log: Rc::new(RefCell::new(HostLog::default())),
            coarse: false,
            support: SensorSupport::Unsupported,
            screen_rotation: 0.0,
            reject: Vec::new(),
            permission: None,
        }
    }

    pub fn touch() -> Self {
        Self { coarse: true, ..Self::desktop() }
    }

    pub fn with_support(mut self, support: SensorSupport) -> Self {
        self.support = support;
        self
    }

    /// Gives the host a pending permission prompt; the returned sender answers it.
    pub fn with_prompt(mut self) -> (Self, oneshot::Sender<PermissionStatus>) {
        let (tx, rx) = oneshot::channel();
        self.support = SensorSupport::RequiresPermission;
        self.permission = Some(rx);
        (self, tx)
    }

    pub fn rejecting(mut self, channel: Channel) -> Self {
        self.reject.push(channel);
        self
    }

    pub fn log(&self) -> Rc<RefCell<HostLog>> {
        Rc::clone(&self.log)
    }
}

impl InputHost for MockHost {
    fn add_listener(&mut self, channel: Channel) -> Result<ListenerId, HostError> {
        if self.reject.contains(&channel) {
            return Err(HostError::ListenerRejected(channel));
        }
        let mut log = self.log.borrow_mut();
        log.next_id += 1;
        let id = ListenerId(log.next_id);
        log.live.insert(id, channel);
        log.added.push(channel);
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) {
        let mut log = self.log.borrow_mut();
        log.live.remove(&id);
        log.removed.push(id);
    }

    fn mount_control(&mut self, kind: ControlKind) -> Result<ControlId, HostError> {
        let mut log = self.log.borrow_mut();
        log.next_id += 1;
        log.mounted.push(kind);
        Ok(ControlId(log.next_id))
    }

    fn unmount_control(&mut self, id: ControlId) {
        self.log.borrow_mut().unmounted.push(id);
    }

    fn coarse_pointer(&self) -> bool {
        self.coarse
    }

    fn request_pointer_lock(&mut self) -> Result<(), HostError> {
        self.log.borrow_mut().lock_requests += 1;
        Ok(())
    }

    fn release_pointer_lock(&mut self) {
        self.log.borrow_mut().lock_releases += 1;
    }

    fn orientation_support(&self) -> SensorSupport {
        self.support
    }

    fn request_orientation_permission(&mut self) -> PermissionFuture {
        self.log.borrow_mut().permission_prompts += 1;
        match self.permission.take() {
            Some(rx) => Box::pin(async move { rx.await.unwrap_or(PermissionStatus::Denied) }),
            None => Box::pin(async { PermissionStatus::Denied }),
        }
    }

    fn screen_rotation_degrees(&self) -> f32 {
        self.screen_rotation
    }
}

pub const EPS: f32 = 1e-4;

pub fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPS
}

pub fn controller_at(host: MockHost, position: Vec3, config: &NavigationConfig) -> NavigationController<MockHost> {
    NavigationController::new(host, Camera::new(position), config, KeyboardAdapter::default())
}

pub fn walker(host: MockHost) -> NavigationController<MockHost> {
    controller_at(host, Vec3::new(0.0, 1.6, 0.0), &NavigationConfig::default())
}

pub fn flyer(host: MockHost) -> NavigationController<MockHost> {
    let config = NavigationConfig { fly_mode: true, ..NavigationConfig::default() };
    controller_at(host, Vec3::new(0.0, 1.6, 0.0), &config)
}

pub fn key(ch: &str, pressed: bool) -> NavEvent {
    NavEvent::Key { key: Key::Character(ch.into()), pressed }
}

pub fn named(named: NamedKey, pressed: bool) -> NavEvent {
    NavEvent::Key { key: Key::Named(named), pressed }
}
