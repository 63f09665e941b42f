//! Common testing utilities for tether integration tests

#![allow(dead_code)]

use std::path::Path;

use tether::{
    config::Config,
    event::{ActivationEvent, ClientEvent, RenderEvent, ShellEvent},
    input::{InputRoute, SeatId},
    shell::{RoleRequest, WindowState},
    surface::{Buffer, BufferId, ClientId, SurfaceId},
    ShellState,
};
use smithay::utils::{Logical, Rectangle, Serial, Size};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// In-process shell with one output and helpers that play the client side
pub struct TestEnv {
    pub test_name: String,
    pub state: ShellState,
    pub seat: SeatId,
    /// Every event emitted so far, in order
    pub log: Vec<ShellEvent>,
    next_buffer: u64,
}

impl TestEnv {
    /// Shell with the default config and a 1920x1080 output named `main`
    pub fn new(test_name: &str) -> Self {
        Self::with_config(test_name, Config::default())
    }

    pub fn with_config(test_name: &str, config: Config) -> Self {
        let mut state = ShellState::new(config);
        if state.outputs().is_empty() {
            state.add_output("main", Rectangle::new((0, 0).into(), (1920, 1080).into()), 1.0);
        }
        let seat = state.default_seat().expect("default seat");
        println!("=== {test_name} ===");
        Self {
            test_name: test_name.to_string(),
            state,
            seat,
            log: Vec::new(),
            next_buffer: 1,
        }
    }

    /// Shell configured from a file under tests/test_configs
    pub fn from_config_file(test_name: &str, file: &str) -> TestResult<Self> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/test_configs")
            .join(file);
        let config = Config::load_from_file(&path)?;
        Ok(Self::with_config(test_name, config))
    }

    /// Move queued events into the log and return them
    pub fn drain(&mut self) -> Vec<ShellEvent> {
        let events = self.state.take_events();
        self.log.extend(events.iter().cloned());
        events
    }

    pub fn client(&mut self) -> ClientId {
        self.state.connect_client()
    }

    pub fn buffer(&mut self, size: Size<i32, Logical>) -> Buffer {
        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        Buffer { id, size }
    }

    /// Latest configure sent to `surface`
    pub fn last_configure(
        &mut self,
        surface: SurfaceId,
    ) -> Option<(Serial, Option<Size<i32, Logical>>, WindowState)> {
        self.drain();
        self.log.iter().rev().find_map(|e| match e {
            ShellEvent::Client(ClientEvent::Configure {
                surface: s,
                serial,
                size,
                state,
                ..
            }) if *s == surface => Some((*serial, *size, *state)),
            _ => None,
        })
    }

    /// Ack the latest configure and commit a buffer of the requested size
    pub fn ack_and_commit(&mut self, client: ClientId, surface: SurfaceId) -> TestResult {
        let (serial, size, _) = self
            .last_configure(surface)
            .ok_or("surface was never configured")?;
        self.state.ack_configure(client, surface, serial)?;
        if let Some(size) = size.filter(|s| !s.is_empty()) {
            let buffer = self.buffer(size);
            self.state.attach_buffer(client, surface, Some(buffer))?;
        }
        self.state.commit(client, surface)?;
        self.drain();
        Ok(())
    }

    /// Create and map a toplevel of `w`x`h`
    pub fn start_window(&mut self, client: ClientId, w: i32, h: i32) -> TestResult<SurfaceId> {
        let surface = self.state.create_surface(client)?;
        self.state.assign_role(client, surface, RoleRequest::Toplevel)?;
        self.state.commit(client, surface)?;
        let (serial, _, _) = self
            .last_configure(surface)
            .ok_or("no initial configure")?;
        self.state.ack_configure(client, surface, serial)?;
        let buffer = self.buffer((w, h).into());
        self.state.attach_buffer(client, surface, Some(buffer))?;
        self.state.commit(client, surface)?;
        self.drain();
        println!("Mapped window {surface} at {:?}", self.geometry(surface));
        Ok(surface)
    }

    /// Create and map a popup placed at `rect` relative to `parent`
    pub fn start_popup(
        &mut self,
        client: ClientId,
        parent: SurfaceId,
        rect: Rectangle<i32, Logical>,
    ) -> TestResult<SurfaceId> {
        let popup = self.state.create_surface(client)?;
        self.state.assign_role(
            client,
            popup,
            RoleRequest::Popup {
                parent,
                geometry: rect,
            },
        )?;
        self.state.commit(client, popup)?;
        let serial = self
            .drain()
            .into_iter()
            .find_map(|e| match e {
                ShellEvent::Client(ClientEvent::PopupConfigure { surface, serial, .. })
                    if surface == popup =>
                {
                    Some(serial)
                }
                _ => None,
            })
            .ok_or("no popup configure")?;
        self.state.ack_configure(client, popup, serial)?;
        let buffer = self.buffer(rect.size);
        self.state.attach_buffer(client, popup, Some(buffer))?;
        self.state.commit(client, popup)?;
        self.drain();
        Ok(popup)
    }

    pub fn press(&mut self, x: f64, y: f64) -> TestResult<(Serial, InputRoute)> {
        let serial = self.state.next_serial();
        let route = self
            .state
            .route_pointer_button(self.seat, serial, (x, y).into(), 0x110, true)?;
        self.drain();
        Ok((serial, route))
    }

    pub fn release(&mut self, x: f64, y: f64) -> TestResult<InputRoute> {
        let serial = self.state.next_serial();
        let route = self
            .state
            .route_pointer_button(self.seat, serial, (x, y).into(), 0x110, false)?;
        self.drain();
        Ok(route)
    }

    pub fn motion(&mut self, x: f64, y: f64) -> TestResult<InputRoute> {
        let route = self.state.route_pointer_motion(self.seat, (x, y).into())?;
        self.drain();
        Ok(route)
    }

    /// Press and release at a point, returning the press serial
    pub fn click(&mut self, x: f64, y: f64) -> TestResult<(Serial, InputRoute)> {
        let press = self.press(x, y)?;
        self.release(x, y)?;
        Ok(press)
    }

    pub fn geometry(&self, surface: SurfaceId) -> Option<Rectangle<i32, Logical>> {
        self.state.geometry_of(surface)
    }

    pub fn window_state(&self, surface: SurfaceId) -> Option<WindowState> {
        self.state
            .registry()
            .get(surface)
            .and_then(|s| s.role.shell())
            .map(|s| s.window_state())
    }

    pub fn activated(&self) -> Option<SurfaceId> {
        self.state.seats().get(self.seat).and_then(|s| s.activated)
    }

    /// Popups told `popup_done` since the log was last cleared, in order
    pub fn popup_done_order(&mut self) -> Vec<SurfaceId> {
        self.drain();
        self.log
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Client(ClientEvent::PopupDone { surface }) => Some(*surface),
                _ => None,
            })
            .collect()
    }

    pub fn activation_events(&mut self) -> Vec<ActivationEvent> {
        self.drain();
        self.log
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Activation(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&mut self) -> Vec<SurfaceId> {
        self.drain();
        self.log
            .iter()
            .filter_map(|e| match e {
                ShellEvent::Render(RenderEvent::SurfaceDestroyed { surface }) => Some(*surface),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.drain();
        self.log.clear();
    }

    /// Fail the test when cross references are inconsistent
    pub fn assert_valid(&self) {
        if let Err(errors) = tether::state::validation::validate_full_state(&self.state) {
            panic!("{}: invalid state: {errors:?}", self.test_name);
        }
    }
}
