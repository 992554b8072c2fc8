use crate::host::Channel;
use crate::movement::MoveKeys;
use crate::sensor::DeviceOrientation;
use crate::touch::JoystickEvent;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{DeviceEvent, ElementState, MouseButton, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Host-neutral input vocabulary consumed by the navigation controller.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Key { key: Key, pressed: bool },
    /// Relative pointer movement in pixels, as reported while the pointer is locked.
    PointerMotion { dx: f32, dy: f32 },
    PointerButton { button: MouseButton, pressed: bool },
    PointerLockChanged(bool),
    Joystick(JoystickEvent),
    DeviceOrientation(DeviceOrientation),
    /// Screen rotation angle in degrees (0, 90, 180, 270 or -90).
    ScreenRotation(f32),
    Other,
}

impl NavEvent {
    pub fn channel(&self) -> Option<Channel> {
        match self {
            NavEvent::Key { .. } => Some(Channel::Keyboard),
            NavEvent::PointerMotion { .. } => Some(Channel::PointerMotion),
            NavEvent::PointerButton { .. } => Some(Channel::PointerButton),
            NavEvent::PointerLockChanged(_) => Some(Channel::PointerLock),
            NavEvent::Joystick(_) => Some(Channel::Touch),
            NavEvent::DeviceOrientation(_) => Some(Channel::DeviceOrientation),
            NavEvent::ScreenRotation(_) => Some(Channel::ScreenOrientation),
            NavEvent::Other => None,
        }
    }

    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseInput { state, button, .. } => {
                NavEvent::PointerButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } if !event.repeat => NavEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => NavEvent::Other,
        }
    }

    pub fn from_device_event(ev: &DeviceEvent) -> Self {
        match ev {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                NavEvent::PointerMotion { dx: *dx as f32, dy: *dy as f32 }
            }
            _ => NavEvent::Other,
        }
    }
}

/// Maps key events onto movement flags using the configured bindings.
#[derive(Debug, Clone, Default)]
pub struct KeyboardAdapter {
    bindings: KeyBindings,
}

impl KeyboardAdapter {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::new(KeyBindings::load_or_default(path))
    }

    /// Movement flags driven by `key`; empty for keys outside the table.
    pub fn flags_for(&self, key: &Key) -> MoveKeys {
        InputKeyBinding::from_event_key(key)
            .map(|binding| self.bindings.actions_for_key(&binding).fold(MoveKeys::empty(), |acc, a| acc | a.flag()))
            .unwrap_or_else(MoveKeys::empty)
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<MoveAction>>,
}

impl KeyBindings {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents, &path.display().to_string()),
            Err(err) => {
                tracing::warn!(
                    target: "input",
                    "Failed to read {}: {err}. Falling back to default bindings.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Parses a bindings document; invalid JSON falls back to the defaults.
    pub fn from_json(contents: &str, origin: &str) -> Self {
        match serde_json::from_str::<InputConfigFile>(contents) {
            Ok(config) => Self::with_overrides(config.into_overrides(origin)),
            Err(err) => {
                tracing::warn!(target: "input", "Failed to parse {origin}: {err}. Falling back to default bindings.");
                Self::default()
            }
        }
    }

    fn with_overrides(overrides: HashMap<MoveAction, Vec<InputKeyBinding>>) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<MoveAction, Vec<InputKeyBinding>> {
        use MoveAction::*;
        let mut map = HashMap::new();
        map.insert(Forward, vec![InputKeyBinding::character("w"), InputKeyBinding::named(NamedKeyCode::ArrowUp)]);
        map.insert(Backward, vec![InputKeyBinding::character("s"), InputKeyBinding::named(NamedKeyCode::ArrowDown)]);
        map.insert(Left, vec![InputKeyBinding::character("a"), InputKeyBinding::named(NamedKeyCode::ArrowLeft)]);
        map.insert(Right, vec![InputKeyBinding::character("d"), InputKeyBinding::named(NamedKeyCode::ArrowRight)]);
        map.insert(Up, vec![InputKeyBinding::named(NamedKeyCode::Space)]);
        map.insert(Down, vec![InputKeyBinding::named(NamedKeyCode::Shift)]);
        map
    }

    fn from_action_map(action_map: HashMap<MoveAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<MoveAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = MoveAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => {
                let s = ch.to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Character(s.to_lowercase()))
                }
            }
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Some(Self::Named(named));
        }
        if normalized.chars().count() == 1 {
            return Some(Self::Character(normalized));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Space,
    Shift,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Space => Some(Self::Space),
            NamedKey::Shift => Some(Self::Shift),
            NamedKey::ArrowUp => Some(Self::ArrowUp),
            NamedKey::ArrowDown => Some(Self::ArrowDown),
            NamedKey::ArrowLeft => Some(Self::ArrowLeft),
            NamedKey::ArrowRight => Some(Self::ArrowRight),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "space" => Some(Self::Space),
            "shift" | "left_shift" | "right_shift" => Some(Self::Shift),
            "arrow_up" | "up" => Some(Self::ArrowUp),
            "arrow_down" | "down" => Some(Self::ArrowDown),
            "arrow_left" | "left" => Some(Self::ArrowLeft),
            "arrow_right" | "right" => Some(Self::ArrowRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MoveAction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl MoveAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "forward" => Some(Self::Forward),
            "backward" => Some(Self::Backward),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    fn flag(self) -> MoveKeys {
        match self {
            MoveAction::Forward => MoveKeys::FORWARD,
            MoveAction::Backward => MoveKeys::BACKWARD,
            MoveAction::Left => MoveKeys::LEFT,
            MoveAction::Right => MoveKeys::RIGHT,
            MoveAction::Up => MoveKeys::UP,
            MoveAction::Down => MoveKeys::DOWN,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<MoveAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            let Some(action) = MoveAction::from_str(&action_key) else {
                tracing::warn!(target: "input", "{origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let mut parsed = Vec::new();
            for key in keys {
                match InputKeyBinding::from_config_value(&key) {
                    Some(binding) => parsed.push(binding),
                    None => tracing::warn!(
                        target: "input",
                        "{origin}: unknown key '{key}' for action '{action_name}', ignoring."
                    ),
                }
            }
            if parsed.is_empty() {
                tracing::warn!(target: "input", "{origin}: action '{action_name}' has no valid keys, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}
