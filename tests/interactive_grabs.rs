mod common;

use common::{TestEnv, TestResult};
use tether::{
    error::{GrabError, TetherError},
    event::{ClientEvent, SeatEvent, ShellEvent},
    input::{InputRoute, SeatId},
    shell::{ResizeEdge, WindowState},
    surface::SurfaceId,
};
use smithay::utils::{Logical, Rectangle, Size};

fn configures_for(env: &mut TestEnv, surface: SurfaceId) -> Vec<Option<Size<i32, Logical>>> {
    env.drain();
    env.log
        .iter()
        .filter_map(|e| match e {
            ShellEvent::Client(ClientEvent::Configure { surface: s, size, .. }) if *s == surface => {
                Some(*size)
            }
            _ => None,
        })
        .collect()
}

fn seat_named(env: &TestEnv, name: &str) -> TestResult<SeatId> {
    Ok(env
        .state
        .seats()
        .by_name(name)
        .ok_or_else(|| format!("no seat {name}"))?
        .id)
}

#[test]
fn test_move_follows_the_pointer() -> TestResult {
    let mut env = TestEnv::new("grab-move");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    assert_eq!(
        env.geometry(window),
        Some(Rectangle::new((760, 390).into(), (400, 300).into()))
    );

    let (serial, _) = env.press(800.0, 400.0)?;
    env.state.begin_move(client, env.seat, window, serial)?;

    println!("\n=== Dragging by (120, -40) ===");
    assert_eq!(env.motion(920.0, 360.0)?, InputRoute::Grabbed);
    assert_eq!(
        env.geometry(window),
        Some(Rectangle::new((880, 350).into(), (400, 300).into()))
    );

    assert_eq!(env.release(920.0, 360.0)?, InputRoute::Grabbed);
    assert!(!env.state.grabs().is_grabbed(env.seat));
    assert_eq!(env.motion(0.0, 0.0)?, InputRoute::Normal);
    assert_eq!(
        env.geometry(window),
        Some(Rectangle::new((880, 350).into(), (400, 300).into()))
    );
    env.assert_valid();
    Ok(())
}

#[test]
fn test_one_grab_per_seat() -> TestResult {
    let mut env = TestEnv::from_config_file("grab-exclusive", "two_seats.conf")?;
    let client = env.client();
    let first = env.start_window(client, 400, 300)?;
    let second = env.start_window(client, 200, 200)?;

    let (serial, _) = env.press(800.0, 400.0)?;
    env.state.begin_move(client, env.seat, first, serial)?;

    let err = env
        .state
        .begin_move(client, env.seat, second, serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::AlreadyGrabbed(_))));
    assert!(!err.is_protocol_violation());
    assert_eq!(env.state.grabs().get(env.seat).map(|g| g.surface), Some(first));

    println!("\n=== A second seat grabs independently ===");
    let other = seat_named(&env, "seat1")?;
    let serial = env.state.next_serial();
    env.state
        .route_pointer_button(other, serial, (900.0, 500.0).into(), 0x110, true)?;
    env.state.begin_move(client, other, second, serial)?;
    assert_eq!(env.state.grabs().get(other).map(|g| g.surface), Some(second));
    assert_eq!(env.state.grabs().get(env.seat).map(|g| g.surface), Some(first));
    env.assert_valid();
    Ok(())
}

#[test]
fn test_stale_serial_changes_nothing() -> TestResult {
    let mut env = TestEnv::new("grab-stale-serial");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    let before = env.geometry(window);

    let (old, _) = env.click(800.0, 400.0)?;
    env.press(800.0, 400.0)?;
    env.clear_log();

    let err = env
        .state
        .begin_move(client, env.seat, window, old)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::StaleSerial { .. })));
    assert!(err.is_protocol_violation());

    assert!(!env.state.grabs().is_grabbed(env.seat));
    assert_eq!(env.geometry(window), before);
    assert!(env.drain().is_empty());
    Ok(())
}

#[test]
fn test_released_serial_cannot_start_a_grab() -> TestResult {
    let mut env = TestEnv::new("grab-after-release");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;

    let (serial, _) = env.click(800.0, 400.0)?;
    let err = env
        .state
        .begin_move(client, env.seat, window, serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::StaleSerial { .. })));
    Ok(())
}

#[test]
fn test_destroying_the_target_frees_the_seat() -> TestResult {
    let mut env = TestEnv::new("grab-target-destroyed");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    let other = env.start_window(client, 100, 100)?;

    let (serial, _) = env.press(800.0, 400.0)?;
    env.state.begin_move(client, env.seat, window, serial)?;
    env.motion(850.0, 450.0)?;
    env.clear_log();

    println!("\n=== Destroying {window} mid-drag ===");
    env.state.destroy_surface(client, window)?;
    assert!(!env.state.grabs().is_grabbed(env.seat));
    let released = env.drain().into_iter().any(|e| {
        matches!(
            e,
            ShellEvent::Seat(SeatEvent::PointerGrabReleased { surface, .. }) if surface == window
        )
    });
    assert!(released);

    assert_eq!(env.motion(900.0, 500.0)?, InputRoute::Normal);
    assert_eq!(env.release(900.0, 500.0)?, InputRoute::Normal);

    let (serial, _) = env.press(910.0, 510.0)?;
    env.state.begin_move(client, env.seat, other, serial)?;
    env.assert_valid();
    Ok(())
}

#[test]
fn test_resize_clamps_to_min_size() -> TestResult {
    let mut env = TestEnv::from_config_file("grab-resize-min", "two_seats.conf")?;
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;

    let (serial, _) = env.press(770.0, 400.0)?;
    env.state
        .begin_resize(client, env.seat, window, ResizeEdge::TOP_LEFT, serial)?;
    env.motion(1770.0, 1400.0)?;
    env.release(1770.0, 1400.0)?;

    let (_, size, _) = env.last_configure(window).ok_or("no configure")?;
    assert_eq!(size, Some((50, 40).into()));

    println!("\n=== Client settles on the clamped size ===");
    env.ack_and_commit(client, window)?;
    // the bottom-right corner stays put
    assert_eq!(
        env.geometry(window),
        Some(Rectangle::new((1110, 650).into(), (50, 40).into()))
    );
    Ok(())
}

#[test]
fn test_client_max_size_bounds_resize() -> TestResult {
    let mut env = TestEnv::new("grab-resize-max");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    env.state.set_max_size(client, window, (450, 0).into())?;

    let (serial, _) = env.press(1100.0, 600.0)?;
    env.state
        .begin_resize(client, env.seat, window, ResizeEdge::BOTTOM_RIGHT, serial)?;
    env.motion(1300.0, 700.0)?;
    let (_, size, _) = env.last_configure(window).ok_or("no configure")?;
    assert_eq!(size, Some((450, 400).into()));
    Ok(())
}

#[test]
fn test_resize_without_edges_is_rejected() -> TestResult {
    let mut env = TestEnv::new("grab-resize-no-edges");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;

    let (serial, _) = env.press(800.0, 400.0)?;
    let err = env
        .state
        .begin_resize(client, env.seat, window, ResizeEdge::empty(), serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Rejected(_)));
    assert!(!env.state.grabs().is_grabbed(env.seat));
    Ok(())
}

#[test]
fn test_maximized_resize_stays_in_usable_area() -> TestResult {
    let mut env = TestEnv::new("grab-resize-maximized");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    env.state.set_maximized(client, window)?;
    env.ack_and_commit(client, window)?;
    assert_eq!(env.window_state(window), Some(WindowState::Maximized));
    assert_eq!(
        env.geometry(window),
        Some(Rectangle::new((0, 0).into(), (1920, 1080).into()))
    );

    let (serial, _) = env.press(1800.0, 1000.0)?;
    env.state
        .begin_resize(client, env.seat, window, ResizeEdge::BOTTOM_RIGHT, serial)?;
    env.clear_log();

    println!("\n=== Growing past the output is ignored ===");
    env.motion(1850.0, 1050.0)?;
    assert!(configures_for(&mut env, window).is_empty());

    println!("\n=== Shrinking is honoured ===");
    env.motion(1700.0, 900.0)?;
    assert_eq!(configures_for(&mut env, window), vec![Some((1820, 980).into())]);
    Ok(())
}

#[test]
fn test_fullscreen_and_minimized_windows_cannot_be_grabbed() -> TestResult {
    let mut env = TestEnv::new("grab-not-grabbable");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    env.state.set_fullscreen(client, window, None)?;
    env.ack_and_commit(client, window)?;
    assert_eq!(env.window_state(window), Some(WindowState::Fullscreen));

    let (serial, _) = env.press(800.0, 400.0)?;
    let err = env
        .state
        .begin_move(client, env.seat, window, serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::NotGrabbable(_))));
    env.release(800.0, 400.0)?;

    let minimized = env.start_window(client, 200, 200)?;
    env.state.set_minimized(client, minimized)?;
    let (serial, _) = env.press(10.0, 10.0)?;
    let err = env
        .state
        .begin_resize(client, env.seat, minimized, ResizeEdge::RIGHT, serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::NotGrabbable(_))));
    Ok(())
}

#[test]
fn test_cancel_restores_start_geometry() -> TestResult {
    let mut env = TestEnv::new("grab-cancel");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    let start = env.geometry(window).ok_or("no geometry")?;

    let (serial, _) = env.press(800.0, 400.0)?;
    env.state.begin_move(client, env.seat, window, serial)?;
    env.motion(900.0, 500.0)?;
    assert_ne!(env.geometry(window), Some(start));
    env.state.cancel_grab(env.seat)?;
    assert_eq!(env.geometry(window), Some(start));
    assert_eq!(env.release(900.0, 500.0)?, InputRoute::Normal);

    println!("\n=== Cancelling a resize asks for the start size ===");
    let (serial, _) = env.press(1150.0, 680.0)?;
    env.state
        .begin_resize(client, env.seat, window, ResizeEdge::BOTTOM_RIGHT, serial)?;
    env.motion(1250.0, 730.0)?;
    let (_, size, _) = env.last_configure(window).ok_or("no configure")?;
    assert_eq!(size, Some((500, 350).into()));

    let grab = env.state.cancel_grab(env.seat)?;
    assert_eq!(grab.surface, window);
    let (_, size, _) = env.last_configure(window).ok_or("no configure")?;
    assert_eq!(size, Some(start.size));

    assert!(matches!(
        env.state.cancel_grab(env.seat),
        Err(GrabError::NoGrab(_))
    ));
    env.assert_valid();
    Ok(())
}
