pub mod app;
pub mod camera;
pub mod cli;
pub mod collision;
pub mod config;
pub mod host;
pub mod input;
pub mod movement;
pub mod navigation;
pub mod orientation;
pub mod scene;
pub mod sensor;
pub mod time;
pub mod touch;

pub use app::{run_with_overrides, App};
pub use navigation::{NavigationController, NavigationState};

/// Wraps an angle into [-PI, PI). Non-finite input collapses to zero.
pub(crate) fn wrap_angle(radians: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !radians.is_finite() {
        return 0.0;
    }
    (radians + PI).rem_euclid(TAU) - PI
}
