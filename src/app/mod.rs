mod winit_host;

pub use winit_host::WinitHost;

use crate::camera::Camera;
use crate::config::{ViewerConfig, ViewerConfigOverrides, DEFAULT_BINDINGS_PATH};
use crate::host::InputHost;
use crate::input::{KeyboardAdapter, NavEvent};
use crate::navigation::NavigationController;
use crate::scene::SceneNode;
use crate::sensor::GyroRequest;
use crate::time::FrameClock;
use anyhow::{Context, Result};
use glam::Vec3;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

pub async fn run_with_overrides(overrides: ViewerConfigOverrides) -> Result<()> {
    let mut config = ViewerConfig::load_or_default(overrides.config_path());
    if !overrides.applied_fields().is_empty() {
        tracing::info!(target: "app", fields = ?overrides.applied_fields(), "command-line overrides applied");
    }
    config.apply_overrides(&overrides);
    let event_loop = EventLoop::new().context("Failed to create winit event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    Ok(())
}

pub struct App {
    config: ViewerConfig,
    controller: NavigationController<WinitHost>,
    clock: FrameClock,
    gyro_request: Option<GyroRequest>,
    title: String,
    should_close: bool,
}

impl App {
    pub fn new(config: ViewerConfig) -> Self {
        let size = PhysicalSize::new(config.window.width, config.window.height);
        let host = WinitHost::new(size, config.navigation.touch_controls);
        let camera = Camera::new(Vec3::from_array(config.scene.spawn));
        let keyboard = KeyboardAdapter::from_config(DEFAULT_BINDINGS_PATH);
        let mut controller = NavigationController::new(host, camera, &config.navigation, keyboard);

        if let Some(path) = config.scene.path.as_ref() {
            match SceneNode::load_gltf(path) {
                Ok(scene) => controller.set_colliders(scene.collect_colliders(&config.scene.collider_tag)),
                Err(err) => tracing::warn!(target: "app", "Scene load failed: {err:#}. Walking without colliders."),
            }
        }

        Self {
            config,
            controller,
            clock: FrameClock::new(),
            gyro_request: None,
            title: String::new(),
            should_close: false,
        }
    }

    fn window(&self) -> Option<Arc<Window>> {
        self.controller.host().window().cloned()
    }

    fn dispatch(&mut self, event: NavEvent) {
        self.controller.handle_event(event);
        for event in self.controller.host_mut().drain_events() {
            self.controller.handle_event(event);
        }
    }

    /// Viewer hotkeys. Returns true when the key was consumed.
    fn handle_hotkey(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed || event.repeat {
            return false;
        }
        match &event.logical_key {
            Key::Character(ch) if ch.eq_ignore_ascii_case("f") => {
                let fly = !self.controller.state().fly_mode;
                self.controller.set_fly_mode(fly);
                true
            }
            Key::Character(ch) if ch.eq_ignore_ascii_case("g") => {
                self.toggle_gyro();
                true
            }
            Key::Named(NamedKey::Escape) => {
                if self.controller.pointer_locked() {
                    self.controller.host_mut().release_pointer_lock();
                    for event in self.controller.host_mut().drain_events() {
                        self.controller.handle_event(event);
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn toggle_gyro(&mut self) {
        if self.gyro_request.is_some() {
            tracing::debug!(target: "app", "gyro request already in flight");
            return;
        }
        let enable = !self.controller.state().gyro_enabled;
        self.gyro_request = Some(self.controller.request_gyro(enable));
        self.poll_gyro();
    }

    fn poll_gyro(&mut self) {
        let Some(status) = self.gyro_request.as_mut().and_then(GyroRequest::poll_now) else {
            return;
        };
        if let Some(request) = self.gyro_request.take() {
            let enabled = self.controller.complete_gyro(&request, status);
            if request.enables() && !enabled {
                tracing::info!(target: "app", %status, "gyro stays off");
            }
        }
    }

    fn frame(&mut self) {
        self.clock.tick();
        self.poll_gyro();
        self.controller.update(self.clock.delta_seconds());
        self.refresh_title();
    }

    fn refresh_title(&mut self) {
        let state = self.controller.state();
        let position = self.controller.camera().position;
        let (yaw, pitch) = self.controller.camera().yaw_pitch();
        let title = format!(
            "{} | {} {:.1} m/s | gyro {} | pos {:.1} {:.1} {:.1} | yaw {:.0} pitch {:.0}",
            self.config.window.title,
            if state.fly_mode { "fly" } else { "walk" },
            state.speed,
            if state.gyro_enabled { "on" } else { "off" },
            position.x,
            position.y,
            position.z,
            yaw.to_degrees(),
            pitch.to_degrees(),
        );
        if title != self.title {
            if let Some(window) = self.window() {
                window.set_title(&title);
            }
            self.title = title;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window().is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.window.width, self.config.window.height));
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.controller.host_mut().attach(window.clone());
                self.clock.reset();
                window.request_redraw();
                tracing::info!(target: "app", "window ready; click to capture the pointer, F fly, G gyro");
            }
            Err(err) => {
                tracing::error!(target: "app", "Failed to create window: {err}");
                self.should_close = true;
            }
        }
    }

    fn window_event(&mut self, _el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                self.should_close = true;
                return;
            }
            WindowEvent::Resized(size) => self.controller.host_mut().resize(*size),
            WindowEvent::Focused(false) => {
                if self.controller.pointer_locked() {
                    self.controller.host_mut().release_pointer_lock();
                }
                // Releases that happen while unfocused never arrive.
                self.controller.release_inputs();
                self.clock.reset();
            }
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if self.handle_hotkey(key_event) {
                    return;
                }
            }
            WindowEvent::Touch(touch) => {
                if let Some(nav) = self.controller.host_mut().translate_touch(touch.id, touch.phase, touch.location) {
                    self.dispatch(nav);
                }
                return;
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = self.window() {
                    window.request_redraw();
                }
                return;
            }
            _ => {}
        }
        self.dispatch(NavEvent::from_window_event(&event));
    }

    fn device_event(&mut self, _e: &ActiveEventLoop, _dev: DeviceId, ev: DeviceEvent) {
        self.dispatch(NavEvent::from_device_event(&ev));
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_close {
            self.controller.dispose();
            event_loop.exit();
        }
    }
}
