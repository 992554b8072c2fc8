use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/viewer.json";
pub const DEFAULT_BINDINGS_PATH: &str = "config/input.json";

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "WindowConfig::default_title")]
    pub title: String,
    #[serde(default = "WindowConfig::default_width")]
    pub width: u32,
    #[serde(default = "WindowConfig::default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub fly_mode: bool,
    #[serde(default = "NavigationConfig::default_speed")]
    pub speed: f32,
    #[serde(default = "NavigationConfig::default_look_speed")]
    pub look_speed: f32,
    #[serde(default = "NavigationConfig::default_walk_height")]
    pub walk_height: f32,
    #[serde(default = "NavigationConfig::default_collider_radius")]
    pub collider_radius: f32,
    /// Radians of rotation per pixel of locked-pointer movement, before `look_speed`.
    #[serde(default = "NavigationConfig::default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    /// Radians per pixel of look-joystick travel; higher than the mouse to offset short thumb travel.
    #[serde(default = "NavigationConfig::default_touch_look_sensitivity")]
    pub touch_look_sensitivity: f32,
    /// Forces the on-screen joysticks even when the host reports a fine pointer.
    #[serde(default)]
    pub touch_controls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "SceneConfig::default_collider_tag")]
    pub collider_tag: String,
    #[serde(default = "SceneConfig::default_spawn")]
    pub spawn: [f32; 3],
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fly_mode: Option<bool>,
    pub speed: Option<f32>,
    pub scene_path: Option<PathBuf>,
}

impl WindowConfig {
    fn default_title() -> String {
        "Scene Walker".to_string()
    }

    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: Self::default_title(), width: Self::default_width(), height: Self::default_height() }
    }
}

impl NavigationConfig {
    const fn default_speed() -> f32 {
        3.0
    }

    const fn default_look_speed() -> f32 {
        1.0
    }

    const fn default_walk_height() -> f32 {
        1.6
    }

    const fn default_collider_radius() -> f32 {
        crate::collision::DEFAULT_CLEARANCE_RADIUS
    }

    const fn default_mouse_sensitivity() -> f32 {
        0.002
    }

    const fn default_touch_look_sensitivity() -> f32 {
        0.005
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            fly_mode: false,
            speed: Self::default_speed(),
            look_speed: Self::default_look_speed(),
            walk_height: Self::default_walk_height(),
            collider_radius: Self::default_collider_radius(),
            mouse_sensitivity: Self::default_mouse_sensitivity(),
            touch_look_sensitivity: Self::default_touch_look_sensitivity(),
            touch_controls: false,
        }
    }
}

impl SceneConfig {
    fn default_collider_tag() -> String {
        "collider".to_string()
    }

    const fn default_spawn() -> [f32; 3] {
        [0.0, 1.6, 5.0]
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self { path: None, collider_tag: Self::default_collider_tag(), spawn: Self::default_spawn() }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(target: "config", "Config load error: {err:#}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ViewerConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(fly_mode) = overrides.fly_mode {
            self.navigation.fly_mode = fly_mode;
        }
        if let Some(speed) = overrides.speed {
            self.navigation.speed = speed;
        }
        if let Some(path) = overrides.scene_path.as_ref() {
            self.scene.path = Some(path.clone());
        }
    }
}

impl ViewerConfigOverrides {
    pub fn config_path(&self) -> &Path {
        self.config_path.as_deref().unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty() && self.config_path.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.fly_mode.is_some() {
            fields.push("fly");
        }
        if self.speed.is_some() {
            fields.push("speed");
        }
        if self.scene_path.is_some() {
            fields.push("scene");
        }
        fields
    }
}
