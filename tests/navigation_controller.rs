mod support;

use glam::{Mat4, Vec2, Vec3};
use scene_walker::collision::Collider;
use scene_walker::config::NavigationConfig;
use scene_walker::host::{Channel, ControlKind};
use scene_walker::input::NavEvent;
use scene_walker::orientation::PITCH_LIMIT;
use scene_walker::sensor::{DeviceOrientation, PermissionStatus, SensorSupport};
use scene_walker::touch::{JoystickEvent, PadGeometry, Stick, StickPhase};
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};
use support::{approx, controller_at, flyer, key, named, walker, MockHost, EPS};
use winit::event::MouseButton;
use winit::keyboard::NamedKey;

fn pad() -> PadGeometry {
    PadGeometry::new(Vec2::new(100.0, 500.0), 50.0)
}

fn stick(stick: Stick, phase: StickPhase, pointer_id: u64, x: f32, y: f32) -> NavEvent {
    NavEvent::Joystick(JoystickEvent { stick, phase, pointer_id, position: Vec2::new(x, y), pad: pad() })
}

fn wall_ahead() -> Collider {
    Collider::quad("wall", Mat4::from_translation(Vec3::new(0.0, 1.6, -1.0)), 5.0, 5.0)
}

#[test]
fn diagonal_keys_move_at_configured_speed() {
    let mut nav = walker(MockHost::desktop());
    nav.handle_event(key("w", true));
    nav.handle_event(key("d", true));
    nav.update(1.0);
    let pos = nav.camera().position;
    assert!(approx(pos, Vec3::new(3.0 * FRAC_1_SQRT_2, 1.6, -3.0 * FRAC_1_SQRT_2)), "got {pos:?}");

    nav.handle_event(key("d", false));
    nav.handle_event(key("w", false));
    nav.update(1.0);
    assert!(approx(nav.camera().position, pos), "releasing keys stops movement");
}

#[test]
fn keys_and_stick_are_summed_then_clamped() {
    let mut nav = walker(MockHost::touch());
    nav.handle_event(key("w", true));
    nav.handle_event(stick(Stick::Move, StickPhase::Down, 1, 100.0, 450.0));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, -3.0)));

    nav.handle_event(key("s", true));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, -6.0)), "opposing keys cancel, stick remains");
}

#[test]
fn move_stick_release_stops_movement() {
    let mut nav = walker(MockHost::touch());
    nav.handle_event(stick(Stick::Move, StickPhase::Down, 3, 125.0, 500.0));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(1.5, 1.6, 0.0)));
    nav.handle_event(stick(Stick::Move, StickPhase::Up, 3, 125.0, 500.0));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(1.5, 1.6, 0.0)));
    assert_eq!(nav.axes().stick, Vec2::ZERO);
}

#[test]
fn joysticks_are_inactive_on_fine_pointer_hosts() {
    let host = MockHost::desktop();
    let log = host.log();
    let mut nav = walker(host);
    assert!(log.borrow().mounted.is_empty());
    assert!(!log.borrow().is_listening(Channel::Touch));
    nav.handle_event(stick(Stick::Move, StickPhase::Down, 1, 100.0, 450.0));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, 0.0)));
}

#[test]
fn pitch_never_reaches_the_poles() {
    let mut nav = walker(MockHost::desktop());
    nav.handle_event(NavEvent::PointerLockChanged(true));
    nav.handle_event(NavEvent::PointerMotion { dx: 0.0, dy: -1.0e6 });
    nav.update(0.016);
    let (_, pitch) = nav.camera().yaw_pitch();
    assert!(pitch.abs() < FRAC_PI_2);
    assert!((nav.look().pitch - PITCH_LIMIT).abs() < EPS);

    nav.handle_event(NavEvent::PointerMotion { dx: 0.0, dy: 2.0e6 });
    nav.update(0.016);
    let (_, pitch) = nav.camera().yaw_pitch();
    assert!(pitch.abs() < FRAC_PI_2);
    assert!((nav.look().pitch + PITCH_LIMIT).abs() < EPS);
}

#[test]
fn mouse_look_requires_pointer_lock() {
    let host = MockHost::desktop();
    let log = host.log();
    let mut nav = walker(host);
    nav.handle_event(NavEvent::PointerMotion { dx: 50.0, dy: 10.0 });
    assert_eq!(nav.look().yaw, 0.0);

    nav.handle_event(NavEvent::PointerButton { button: MouseButton::Left, pressed: true });
    assert_eq!(log.borrow().lock_requests, 1);
    nav.handle_event(NavEvent::PointerLockChanged(true));
    nav.handle_event(NavEvent::PointerButton { button: MouseButton::Left, pressed: true });
    assert_eq!(log.borrow().lock_requests, 1, "no request while already locked");

    nav.handle_event(NavEvent::PointerMotion { dx: 50.0, dy: 0.0 });
    assert!((nav.look().yaw + 0.1).abs() < EPS, "moving right turns right");
}

#[test]
fn touch_hosts_never_request_pointer_lock() {
    let host = MockHost::touch();
    let log = host.log();
    let mut nav = walker(host);
    nav.handle_event(NavEvent::PointerButton { button: MouseButton::Left, pressed: true });
    assert_eq!(log.borrow().lock_requests, 0);
}

#[test]
fn walk_mode_pins_height_regardless_of_pitch() {
    let mut nav = walker(MockHost::desktop());
    nav.handle_event(NavEvent::PointerLockChanged(true));
    nav.handle_event(NavEvent::PointerMotion { dx: 0.0, dy: -300.0 });
    nav.handle_event(key("w", true));
    nav.handle_event(named(NamedKey::Space, true));
    nav.update(1.0);
    let pos = nav.camera().position;
    assert_eq!(pos.y, 1.6);
    assert!((Vec2::new(pos.x, pos.z).length() - 3.0).abs() < EPS);
}

#[test]
fn fly_mode_moves_vertically_along_world_up() {
    let mut nav = flyer(MockHost::desktop());
    nav.handle_event(named(NamedKey::Space, true));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 4.6, 0.0)));
    nav.handle_event(named(NamedKey::Space, false));
    nav.handle_event(named(NamedKey::Shift, true));
    nav.update(0.5);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 3.1, 0.0)));
}

#[test]
fn leaving_fly_mode_snaps_to_walk_height() {
    let config = NavigationConfig { fly_mode: true, ..NavigationConfig::default() };
    let mut nav = controller_at(MockHost::desktop(), Vec3::new(2.0, 7.0, 0.0), &config);
    assert_eq!(nav.camera().position.y, 7.0);
    nav.set_fly_mode(false);
    assert_eq!(nav.camera().position.y, 1.6);
    assert!(!nav.state().fly_mode);

    nav.set_walk_height(2.0);
    nav.update(0.016);
    assert_eq!(nav.camera().position.y, 2.0);
}

#[test]
fn step_within_clearance_is_rejected_whole() {
    let mut nav = walker(MockHost::desktop());
    nav.set_colliders(vec![wall_ahead()]);
    nav.handle_event(key("w", true));

    nav.set_speed(0.9);
    nav.update(1.0);
    assert_eq!(nav.camera().position, Vec3::new(0.0, 1.6, 0.0), "0.9 + 0.35 reaches the wall");

    nav.set_speed(0.5);
    nav.set_collider_radius(0.6);
    nav.update(1.0);
    assert_eq!(nav.camera().position, Vec3::new(0.0, 1.6, 0.0), "wider radius rejects the shorter step");

    nav.set_collider_radius(0.35);
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, -0.5)));
}

#[test]
fn clearing_colliders_disables_collision() {
    let mut nav = walker(MockHost::desktop());
    nav.set_colliders(vec![wall_ahead()]);
    nav.set_colliders(Vec::new());
    nav.handle_event(key("w", true));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, -3.0)));
}

#[test]
fn non_finite_delta_does_not_move() {
    let mut nav = walker(MockHost::desktop());
    nav.handle_event(key("w", true));
    nav.update(f32::NAN);
    assert_eq!(nav.camera().position, Vec3::new(0.0, 1.6, 0.0));
}

#[test]
fn rejected_listener_leaves_other_inputs_working() {
    let host = MockHost::desktop().rejecting(Channel::Keyboard);
    let log = host.log();
    let mut nav = walker(host);
    nav.handle_event(key("w", true));
    nav.update(1.0);
    assert_eq!(nav.camera().position, Vec3::new(0.0, 1.6, 0.0));
    nav.handle_event(NavEvent::PointerButton { button: MouseButton::Left, pressed: true });
    assert_eq!(log.borrow().lock_requests, 1);
}

#[test]
fn gyro_round_trip_keeps_the_view() {
    let host = MockHost::desktop().with_support(SensorSupport::Available);
    let log = host.log();
    let mut nav = walker(host);
    assert!(nav.state().gyro_available);

    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    assert!(nav.state().gyro_enabled);
    assert!(log.borrow().is_listening(Channel::DeviceOrientation));
    assert!(log.borrow().is_listening(Channel::ScreenOrientation));
    assert_eq!(log.borrow().permission_prompts, 0);

    nav.handle_event(NavEvent::DeviceOrientation(DeviceOrientation::new(90.0, 90.0, 0.0)));
    nav.update(0.016);
    assert!(approx(nav.camera().forward(), Vec3::NEG_X), "forward {:?}", nav.camera().forward());

    assert!(!pollster::block_on(nav.set_gyro_enabled(false)));
    assert!(!log.borrow().is_listening(Channel::DeviceOrientation));
    assert!(!log.borrow().is_listening(Channel::ScreenOrientation));
    assert!((nav.look().yaw - FRAC_PI_2).abs() < 1e-3);

    nav.update(0.016);
    assert!(approx(nav.camera().forward(), Vec3::NEG_X), "no snap after switching back");
}

#[test]
fn unsupported_gyro_resolves_false() {
    let host = MockHost::desktop();
    let log = host.log();
    let mut nav = walker(host);
    assert!(!nav.state().gyro_available);
    assert!(!pollster::block_on(nav.set_gyro_enabled(true)));
    assert!(!nav.state().gyro_enabled);
    assert!(!log.borrow().is_listening(Channel::DeviceOrientation));
    assert_eq!(log.borrow().permission_prompts, 0);
}

#[test]
fn pending_permission_keeps_navigation_running() {
    let (host, answer) = MockHost::desktop().with_prompt();
    let log = host.log();
    let mut nav = walker(host);

    let mut request = nav.request_gyro(true);
    assert!(request.is_pending());
    assert_eq!(request.poll_now(), None);

    nav.handle_event(key("w", true));
    nav.update(1.0);
    assert!(approx(nav.camera().position, Vec3::new(0.0, 1.6, -3.0)));
    assert!(!nav.state().gyro_enabled);

    answer.send(PermissionStatus::Granted).expect("prompt still open");
    let status = request.poll_now().expect("answered");
    assert_eq!(status, PermissionStatus::Granted);
    assert!(nav.complete_gyro(&request, status));
    assert!(log.borrow().is_listening(Channel::DeviceOrientation));
}

#[test]
fn denied_permission_leaves_gyro_off_and_asks_again() {
    let (host, answer) = MockHost::desktop().with_prompt();
    let log = host.log();
    let mut nav = walker(host);

    let mut request = nav.request_gyro(true);
    answer.send(PermissionStatus::Denied).expect("prompt still open");
    let status = request.poll_now().expect("answered");
    assert!(!nav.complete_gyro(&request, status));
    assert!(!nav.state().gyro_enabled);
    assert!(!log.borrow().is_listening(Channel::DeviceOrientation));

    assert!(!pollster::block_on(nav.set_gyro_enabled(true)));
    assert_eq!(log.borrow().permission_prompts, 2);
}

#[test]
fn rejected_sensor_listener_rolls_back() {
    let host = MockHost::desktop().with_support(SensorSupport::Available).rejecting(Channel::DeviceOrientation);
    let log = host.log();
    let mut nav = walker(host);
    assert!(!pollster::block_on(nav.set_gyro_enabled(true)));
    assert!(!log.borrow().is_listening(Channel::ScreenOrientation));
}

#[test]
fn mouse_look_is_ignored_while_gyro_drives() {
    let mut nav = walker(MockHost::desktop().with_support(SensorSupport::Available));
    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    nav.handle_event(NavEvent::PointerLockChanged(true));
    nav.handle_event(NavEvent::PointerMotion { dx: 300.0, dy: 100.0 });
    assert_eq!(nav.look().yaw, 0.0);
    assert_eq!(nav.look().pitch, 0.0);
}

#[test]
fn touch_look_targets_offset_only_in_gyro_mode() {
    let mut nav = walker(MockHost::touch().with_support(SensorSupport::Available));
    nav.handle_event(stick(Stick::Look, StickPhase::Down, 9, 500.0, 500.0));
    nav.handle_event(stick(Stick::Look, StickPhase::Move, 9, 510.0, 500.0));
    assert!((nav.look().yaw + 0.05).abs() < EPS);
    assert_eq!(nav.look_offset().yaw, 0.0);
    nav.handle_event(stick(Stick::Look, StickPhase::Up, 9, 510.0, 500.0));

    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    nav.handle_event(stick(Stick::Look, StickPhase::Down, 9, 500.0, 500.0));
    nav.handle_event(stick(Stick::Look, StickPhase::Move, 9, 510.0, 500.0));
    assert!((nav.look_offset().yaw + 0.05).abs() < EPS);
}

#[test]
fn screen_rotation_rolls_the_view() {
    let mut nav = walker(MockHost::desktop().with_support(SensorSupport::Available));
    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    nav.handle_event(NavEvent::ScreenRotation(90.0));
    nav.handle_event(NavEvent::DeviceOrientation(DeviceOrientation::new(0.0, 90.0, 0.0)));
    nav.update(0.016);
    assert!(approx(nav.camera().forward(), Vec3::NEG_Z));
    assert!(approx(nav.camera().up(), Vec3::X));
}

#[test]
fn incomplete_reading_keeps_previous_rotation() {
    let mut nav = walker(MockHost::desktop().with_support(SensorSupport::Available));
    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    nav.handle_event(NavEvent::DeviceOrientation(DeviceOrientation { alpha: None, beta: Some(10.0), gamma: None }));
    nav.update(0.016);
    assert!(approx(nav.camera().forward(), Vec3::NEG_Z));
}

#[test]
fn dispose_is_idempotent() {
    let host = MockHost::touch().with_support(SensorSupport::Available);
    let log = host.log();
    let mut nav = walker(host);
    assert!(pollster::block_on(nav.set_gyro_enabled(true)));
    nav.handle_event(NavEvent::PointerLockChanged(true));
    assert_eq!(log.borrow().added.len(), 7);
    assert_eq!(log.borrow().mounted, vec![ControlKind::MoveJoystick, ControlKind::LookJoystick]);

    nav.dispose();
    nav.dispose();
    {
        let log = log.borrow();
        assert!(log.live.is_empty());
        assert_eq!(log.removed.len(), 7, "each listener removed exactly once");
        assert_eq!(log.unmounted.len(), 2);
        assert_eq!(log.lock_releases, 1);
    }
    assert!(nav.is_disposed());
    assert!(!nav.state().gyro_enabled);

    nav.handle_event(key("w", true));
    nav.update(1.0);
    assert_eq!(nav.camera().position, Vec3::new(0.0, 1.6, 0.0), "no input after dispose");
    assert!(!pollster::block_on(nav.set_gyro_enabled(true)));
    assert_eq!(log.borrow().removed.len(), 7);
}

#[test]
fn dropping_the_controller_releases_the_host() {
    let host = MockHost::desktop();
    let log = host.log();
    {
        let _nav = walker(host);
        assert_eq!(log.borrow().live.len(), 4);
    }
    assert!(log.borrow().live.is_empty());
    assert_eq!(log.borrow().removed.len(), 4);

    let host = MockHost::desktop();
    let log = host.log();
    let mut nav = walker(host);
    nav.dispose();
    drop(nav);
    assert_eq!(log.borrow().removed.len(), 4, "drop after dispose releases nothing twice");
}

#[test]
fn extreme_look_speeds_keep_orientation_bounded() {
    for look_speed in [f32::INFINITY, 1.0e30, f32::NAN, f32::NEG_INFINITY] {
        let mut nav = walker(MockHost::desktop());
        nav.set_look_speed(look_speed);
        nav.handle_event(NavEvent::PointerLockChanged(true));
        nav.handle_event(NavEvent::PointerMotion { dx: 1.0, dy: -1.0 });
        nav.update(0.016);

        let look = nav.look();
        assert!(look.yaw.is_finite() && look.pitch.is_finite(), "look speed {look_speed}: {look:?}");
        assert!(look.pitch.abs() <= PITCH_LIMIT);
        let (_, pitch) = nav.camera().yaw_pitch();
        assert!(pitch.is_finite() && pitch.abs() < FRAC_PI_2, "look speed {look_speed}: pitch {pitch}");
        assert!(nav.camera().rotation.is_finite());
    }
}

#[test]
fn releasing_inputs_stops_held_movement() {
    let mut nav = walker(MockHost::touch());
    nav.handle_event(key("w", true));
    nav.handle_event(stick(Stick::Move, StickPhase::Down, 5, 125.0, 500.0));
    nav.update(0.5);
    let held = nav.camera().position;
    assert!(!approx(held, Vec3::new(0.0, 1.6, 0.0)));

    nav.release_inputs();
    assert_eq!(nav.axes(), Default::default());
    nav.update(1.0);
    assert!(approx(nav.camera().position, held), "no movement once inputs are released");

    // The old touch session is gone; a fresh press starts a new one.
    nav.handle_event(stick(Stick::Move, StickPhase::Move, 5, 150.0, 500.0));
    assert_eq!(nav.axes().stick, Vec2::ZERO);
    nav.handle_event(stick(Stick::Move, StickPhase::Down, 6, 150.0, 500.0));
    assert_eq!(nav.axes().stick, Vec2::new(1.0, 0.0));
}
