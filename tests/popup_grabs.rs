mod common;

use common::{TestEnv, TestResult};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tether::{
    config::Config,
    error::{GrabError, TetherError},
    input::InputRoute,
    surface::{ClientId, SurfaceId},
};
use smithay::utils::Rectangle;

/// Window with two nested grabbing popups: (window, p1, p2)
fn nested_popups(env: &mut TestEnv, client: ClientId) -> TestResult<(SurfaceId, SurfaceId, SurfaceId)> {
    let window = env.start_window(client, 400, 300)?;
    let g = env.geometry(window).ok_or("window has no geometry")?;

    let (s1, route) = env.click(g.loc.x as f64 + 20.0, g.loc.y as f64 + 20.0)?;
    assert_eq!(route, InputRoute::Normal);
    let p1 = env.start_popup(client, window, Rectangle::new((10, 10).into(), (200, 200).into()))?;
    env.state.popup_grab(client, env.seat, p1, s1)?;

    let p1_geo = env.geometry(p1).ok_or("popup has no geometry")?;
    assert_eq!(p1_geo.loc, (g.loc.x + 10, g.loc.y + 10).into());
    let (s2, route) = env.click(p1_geo.loc.x as f64 + 5.0, p1_geo.loc.y as f64 + 5.0)?;
    assert_eq!(route, InputRoute::Popup(p1));
    let p2 = env.start_popup(client, p1, Rectangle::new((100, 100).into(), (150, 150).into()))?;
    env.state.popup_grab(client, env.seat, p2, s2)?;

    let stack = env.state.popups().stack(env.seat).ok_or("no popup stack")?;
    assert_eq!(stack.len(), 2);
    assert_eq!(env.state.popups().top(env.seat), Some(p2));
    Ok((window, p1, p2))
}

#[test]
fn test_outside_click_dismisses_innermost_first() -> TestResult {
    let mut env = TestEnv::new("popup-outside-click");
    let client = env.client();
    let (window, p1, p2) = nested_popups(&mut env, client)?;
    env.clear_log();

    println!("\n=== Clicking outside both popups ===");
    let (serial, route) = env.press(5.0, 5.0)?;
    assert_eq!(route, InputRoute::Passthrough);
    assert_eq!(env.popup_done_order(), vec![p2, p1]);
    assert!(env.state.popups().stack(env.seat).is_none());

    // the dismissing press still counts as the seat's current press
    env.state.begin_move(client, env.seat, window, serial)?;
    env.release(5.0, 5.0)?;
    assert!(!env.state.grabs().is_grabbed(env.seat));
    env.assert_valid();
    Ok(())
}

#[test]
fn test_outside_click_without_passthrough_is_swallowed() -> TestResult {
    let config = Config {
        popup_dismiss_passthrough: false,
        ..Config::default()
    };
    let mut env = TestEnv::with_config("popup-no-passthrough", config);
    let client = env.client();
    let (_, p1, p2) = nested_popups(&mut env, client)?;
    env.clear_log();

    let (_, route) = env.press(5.0, 5.0)?;
    assert_eq!(route, InputRoute::Dismissed);
    assert!(!route.reaches_normal_routing());
    assert_eq!(env.popup_done_order(), vec![p2, p1]);
    env.assert_valid();
    Ok(())
}

#[test]
fn test_click_inside_popup_keeps_the_stack() -> TestResult {
    let mut env = TestEnv::new("popup-inside-click");
    let client = env.client();
    let (_, p1, p2) = nested_popups(&mut env, client)?;
    env.clear_log();

    let p1_geo = env.geometry(p1).ok_or("popup has no geometry")?;
    let (_, route) = env.click(p1_geo.loc.x as f64 + 1.0, p1_geo.loc.y as f64 + 1.0)?;
    assert_eq!(route, InputRoute::Popup(p1));
    assert!(env.popup_done_order().is_empty());
    assert_eq!(env.state.popups().top(env.seat), Some(p2));
    Ok(())
}

#[test]
fn test_out_of_order_grab_tears_down_the_stack() -> TestResult {
    let mut env = TestEnv::new("popup-out-of-order");
    let client = env.client();
    let (window, p1, p2) = nested_popups(&mut env, client)?;

    let stray = env.start_popup(client, window, Rectangle::new((300, 10).into(), (50, 50).into()))?;
    let p2_geo = env.geometry(p2).ok_or("popup has no geometry")?;
    let (serial, _) = env.click(p2_geo.loc.x as f64 + 1.0, p2_geo.loc.y as f64 + 1.0)?;
    env.clear_log();

    let err = env
        .state
        .popup_grab(client, env.seat, stray, serial)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::NotTopmost { .. })));
    assert!(err.is_protocol_violation());
    assert!(env.state.popups().stack(env.seat).is_none());
    assert_eq!(env.popup_done_order(), vec![p2, p1]);
    env.assert_valid();
    Ok(())
}

#[test]
fn test_only_the_newest_popup_may_grab() -> TestResult {
    let mut env = TestEnv::new("popup-newest-only");
    let client = env.client();
    let window = env.start_window(client, 400, 300)?;
    let g = env.geometry(window).ok_or("window has no geometry")?;

    let (s1, _) = env.click(g.loc.x as f64 + 20.0, g.loc.y as f64 + 20.0)?;
    let p1 = env.start_popup(client, window, Rectangle::new((10, 10).into(), (200, 200).into()))?;
    env.state.popup_grab(client, env.seat, p1, s1)?;

    let p1_geo = env.geometry(p1).ok_or("popup has no geometry")?;
    let (s2, _) = env.click(p1_geo.loc.x as f64 + 5.0, p1_geo.loc.y as f64 + 5.0)?;
    let older = env.start_popup(client, p1, Rectangle::new((20, 20).into(), (50, 50).into()))?;
    let newer = env.start_popup(client, p1, Rectangle::new((80, 20).into(), (50, 50).into()))?;
    env.clear_log();

    println!("\n=== Grabbing with the older sibling ===");
    let err = env
        .state
        .popup_grab(client, env.seat, older, s2)
        .unwrap_err();
    assert!(matches!(err, TetherError::Grab(GrabError::NotTopmost { popup }) if popup == older));
    assert!(env.state.popups().stack(env.seat).is_none());
    assert_eq!(env.popup_done_order(), vec![p1]);
    assert!(env.state.registry().get(newer).is_some());
    env.assert_valid();
    Ok(())
}

#[test]
fn test_destroying_parent_window_dismisses_popups() -> TestResult {
    let mut env = TestEnv::new("popup-parent-destroyed");
    let client = env.client();
    let (window, p1, p2) = nested_popups(&mut env, client)?;
    env.clear_log();

    env.state.destroy_surface(client, window)?;
    assert_eq!(env.popup_done_order(), vec![p2, p1]);
    assert!(env.state.popups().stack(env.seat).is_none());
    env.assert_valid();
    Ok(())
}

#[test]
fn test_keys_follow_the_popup_grab() -> TestResult {
    let mut env = TestEnv::new("popup-keyboard");
    let client = env.client();
    let (window, _, p2) = nested_popups(&mut env, client)?;

    let serial = env.state.next_serial();
    let route = env.state.route_key(env.seat, serial, 30, true)?;
    assert_eq!(route, InputRoute::Popup(p2));

    env.press(5.0, 5.0)?;
    let serial = env.state.next_serial();
    let route = env.state.route_key(env.seat, serial, 30, true)?;
    assert_eq!(route, InputRoute::Focused(window));
    Ok(())
}

#[test]
fn test_random_popup_operations_keep_stacks_nested() -> TestResult {
    let mut env = TestEnv::new("popup-random");
    let client = env.client();
    let window = env.start_window(client, 800, 600)?;
    let mut rng = StdRng::seed_from_u64(0x7e7e_2024);

    for round in 0..300 {
        let depth = env
            .state
            .popups()
            .stack(env.seat)
            .map(|s| s.len())
            .unwrap_or(0);

        match rng.gen_range(0..5) {
            // grab a new popup nested in the current top
            0 | 1 if depth < 20 => {
                let parent = env.state.popups().top(env.seat).unwrap_or(window);
                let pg = env.geometry(parent).ok_or("parent has no geometry")?;
                let (serial, _) = env.click(pg.loc.x as f64 + 2.0, pg.loc.y as f64 + 2.0)?;
                let popup =
                    env.start_popup(client, parent, Rectangle::new((5, 5).into(), (60, 60).into()))?;
                env.state.popup_grab(client, env.seat, popup, serial)?;
                assert_eq!(env.state.popups().top(env.seat), Some(popup));
            }
            // click far away from every popup
            2 => {
                env.click(1900.0, 1070.0)?;
                assert!(env.state.popups().stack(env.seat).is_none());
            }
            // destroy a random popup of the stack
            3 if depth > 0 => {
                let entries: Vec<SurfaceId> = env
                    .state
                    .popups()
                    .stack(env.seat)
                    .map(|s| s.entries().iter().map(|e| e.surface).collect())
                    .unwrap_or_default();
                let index = rng.gen_range(0..entries.len());
                env.state.destroy_surface(client, entries[index])?;
                let remaining = env
                    .state
                    .popups()
                    .stack(env.seat)
                    .map(|s| s.len())
                    .unwrap_or(0);
                assert_eq!(remaining, index, "round {round}");
            }
            // grab a popup that does not nest
            4 if depth > 0 => {
                let top = env.state.popups().top(env.seat).ok_or("no top")?;
                let tg = env.geometry(top).ok_or("top has no geometry")?;
                let stray =
                    env.start_popup(client, window, Rectangle::new((700, 500).into(), (20, 20).into()))?;
                let (serial, _) = env.click(tg.loc.x as f64 + 2.0, tg.loc.y as f64 + 2.0)?;
                assert!(env.state.popup_grab(client, env.seat, stray, serial).is_err());
                assert!(env.state.popups().stack(env.seat).is_none());
            }
            _ => {
                env.motion(rng.gen_range(0.0..1920.0), rng.gen_range(0.0..1080.0))?;
            }
        }

        env.state.dispatch_pending();
        env.assert_valid();
    }
    Ok(())
}
