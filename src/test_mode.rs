//! Headless test mode
//!
//! `tether --test SCRIPT` replays a JSON-lines script against a
//! [`ShellState`] and prints every emitted event as one JSON line. Clients,
//! surfaces, seats and outputs are referred to by name in the script; the
//! runner maps names to ids as they are created.
//!
//! ```text
//! {"op":"connect","client":"app"}
//! {"op":"create_surface","client":"app","name":"win"}
//! {"op":"role","client":"app","surface":"win","role":{"type":"toplevel"}}
//! {"op":"commit","client":"app","surface":"win"}
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Write};

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{TetherError, TetherResult},
    event::{ClientEvent, ShellEvent},
    input::{InputRoute, SeatId},
    output::OutputId,
    shell::{PanelEdge, ResizeEdge, RoleRequest},
    state::{Reply, Request, ShellState},
    surface::{Buffer, ClientId, SurfaceId},
    utils::wire,
};
use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

/// Role as written in a script, parents and outputs by name
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptRole {
    Toplevel,
    Transient {
        parent: String,
        #[serde(default = "wire::origin", with = "wire::point")]
        offset: Point<i32, Logical>,
    },
    Popup {
        parent: String,
        #[serde(with = "wire::rectangle")]
        geometry: Rectangle<i32, Logical>,
    },
    Panel {
        output: String,
        edge: PanelEdge,
        #[serde(default)]
        exclusive_zone: i32,
    },
    Overlay {
        output: String,
        #[serde(default = "wire::origin", with = "wire::point")]
        position: Point<i32, Logical>,
    },
}

/// One line of a script
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Connect {
        client: String,
    },
    Disconnect {
        client: String,
    },
    CreateSurface {
        client: String,
        name: String,
    },
    Attach {
        client: String,
        surface: String,
        buffer: Option<Buffer>,
    },
    Damage {
        client: String,
        surface: String,
        #[serde(with = "wire::rectangle")]
        rect: Rectangle<i32, Logical>,
    },
    InputRegion {
        client: String,
        surface: String,
        #[serde(default, deserialize_with = "wire::region::deserialize")]
        region: Option<Vec<Rectangle<i32, Logical>>>,
    },
    Commit {
        client: String,
        surface: String,
    },
    Destroy {
        client: String,
        surface: String,
    },
    Role {
        client: String,
        surface: String,
        role: ScriptRole,
    },
    /// Without a serial the latest configure of the surface is acked
    Ack {
        client: String,
        surface: String,
        serial: Option<u32>,
    },
    Maximize {
        client: String,
        surface: String,
    },
    Unmaximize {
        client: String,
        surface: String,
    },
    Fullscreen {
        client: String,
        surface: String,
        output: Option<String>,
    },
    Unfullscreen {
        client: String,
        surface: String,
    },
    Minimize {
        client: String,
        surface: String,
    },
    MinSize {
        client: String,
        surface: String,
        #[serde(with = "wire::size")]
        size: Size<i32, Logical>,
    },
    MaxSize {
        client: String,
        surface: String,
        #[serde(with = "wire::size")]
        size: Size<i32, Logical>,
    },
    /// Without a serial the seat's latest press is used
    Move {
        client: String,
        surface: String,
        seat: Option<String>,
        serial: Option<u32>,
    },
    Resize {
        client: String,
        surface: String,
        edges: ResizeEdge,
        seat: Option<String>,
        serial: Option<u32>,
    },
    PopupGrab {
        client: String,
        surface: String,
        seat: Option<String>,
        serial: Option<u32>,
    },
    Button {
        seat: Option<String>,
        x: f64,
        y: f64,
        #[serde(default = "default_button")]
        button: u32,
        pressed: bool,
    },
    Motion {
        seat: Option<String>,
        x: f64,
        y: f64,
    },
    Key {
        seat: Option<String>,
        key: u32,
        pressed: bool,
    },
    CancelGrab {
        seat: Option<String>,
    },
    Activate {
        surface: String,
        seat: Option<String>,
    },
    AddOutput {
        name: String,
        #[serde(with = "wire::rectangle")]
        geometry: Rectangle<i32, Logical>,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    OutputGeometry {
        name: String,
        #[serde(with = "wire::rectangle")]
        geometry: Rectangle<i32, Logical>,
    },
    RemoveOutput {
        name: String,
    },
    Dispatch,
}

fn default_button() -> u32 {
    // BTN_LEFT
    0x110
}

fn default_scale() -> f64 {
    1.0
}

/// Replays script steps against a shell
pub struct ScriptRunner {
    state: ShellState,
    clients: HashMap<String, ClientId>,
    surfaces: HashMap<String, SurfaceId>,
    /// Latest configure serial per surface, for acks without a serial
    configures: HashMap<SurfaceId, Serial>,
}

impl ScriptRunner {
    pub fn new(config: Config) -> Self {
        Self {
            state: ShellState::new(config),
            clients: HashMap::new(),
            surfaces: HashMap::new(),
            configures: HashMap::new(),
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    fn client(&self, name: &str) -> TetherResult<ClientId> {
        self.clients
            .get(name)
            .copied()
            .ok_or_else(|| TetherError::Config(format!("unknown client '{name}'")))
    }

    fn surface(&self, name: &str) -> TetherResult<SurfaceId> {
        self.surfaces
            .get(name)
            .copied()
            .ok_or_else(|| TetherError::Config(format!("unknown surface '{name}'")))
    }

    fn seat(&self, name: Option<&str>) -> TetherResult<SeatId> {
        let seat = match name {
            Some(name) => self.state.seats().by_name(name).map(|s| s.id),
            None => self.state.default_seat(),
        };
        seat.ok_or_else(|| TetherError::Config(format!("unknown seat '{}'", name.unwrap_or("default"))))
    }

    fn output(&self, name: &str) -> TetherResult<OutputId> {
        self.state
            .outputs()
            .by_name(name)
            .map(|o| o.id)
            .ok_or_else(|| TetherError::Config(format!("unknown output '{name}'")))
    }

    fn press_serial(&self, seat: SeatId, serial: Option<u32>) -> TetherResult<Serial> {
        if let Some(raw) = serial {
            return Ok(Serial::from(raw));
        }
        self.state
            .seats()
            .get(seat)
            .and_then(|s| s.last_press_serial.or(s.last_key_serial))
            .ok_or_else(|| TetherError::Config(format!("{seat} has no input serial")))
    }

    fn request(&mut self, client: &str, request: Request) -> TetherResult<Reply> {
        let client = self.client(client)?;
        self.state.handle_request(client, request)
    }

    fn role(&self, role: ScriptRole) -> TetherResult<RoleRequest> {
        Ok(match role {
            ScriptRole::Toplevel => RoleRequest::Toplevel,
            ScriptRole::Transient { parent, offset } => RoleRequest::Transient {
                parent: self.surface(&parent)?,
                offset,
            },
            ScriptRole::Popup { parent, geometry } => RoleRequest::Popup {
                parent: self.surface(&parent)?,
                geometry,
            },
            ScriptRole::Panel {
                output,
                edge,
                exclusive_zone,
            } => RoleRequest::Panel {
                output: self.output(&output)?,
                edge,
                exclusive_zone,
            },
            ScriptRole::Overlay { output, position } => RoleRequest::Overlay {
                output: self.output(&output)?,
                position,
            },
        })
    }

    /// Run one step; returns the input route for input steps
    pub fn step(&mut self, step: ScriptStep) -> TetherResult<Option<InputRoute>> {
        match step {
            ScriptStep::Connect { client } => {
                let id = self.state.connect_client();
                self.clients.insert(client, id);
            }
            ScriptStep::Disconnect { client } => {
                let id = self.client(&client)?;
                self.state.disconnect_client(id)?;
            }
            ScriptStep::CreateSurface { client, name } => {
                if let Reply::Surface(id) = self.request(&client, Request::CreateSurface)? {
                    self.surfaces.insert(name, id);
                }
            }
            ScriptStep::Attach {
                client,
                surface,
                buffer,
            } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::AttachBuffer { surface, buffer })?;
            }
            ScriptStep::Damage {
                client,
                surface,
                rect,
            } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::Damage { surface, rect })?;
            }
            ScriptStep::InputRegion {
                client,
                surface,
                region,
            } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::SetInputRegion { surface, region })?;
            }
            ScriptStep::Commit { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::Commit { surface })?;
            }
            ScriptStep::Destroy { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::Destroy { surface })?;
            }
            ScriptStep::Role {
                client,
                surface,
                role,
            } => {
                let surface = self.surface(&surface)?;
                let role = self.role(role)?;
                self.request(&client, Request::AssignRole { surface, role })?;
            }
            ScriptStep::Ack {
                client,
                surface,
                serial,
            } => {
                let surface = self.surface(&surface)?;
                let serial = match serial {
                    Some(raw) => Serial::from(raw),
                    None => self.configures.get(&surface).copied().ok_or_else(|| {
                        TetherError::Config(format!("{surface} has not been configured"))
                    })?,
                };
                self.request(&client, Request::AckConfigure { surface, serial })?;
            }
            ScriptStep::Maximize { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::SetMaximized { surface })?;
            }
            ScriptStep::Unmaximize { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::UnsetMaximized { surface })?;
            }
            ScriptStep::Fullscreen {
                client,
                surface,
                output,
            } => {
                let surface = self.surface(&surface)?;
                let output = output.map(|name| self.output(&name)).transpose()?;
                self.request(&client, Request::SetFullscreen { surface, output })?;
            }
            ScriptStep::Unfullscreen { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::UnsetFullscreen { surface })?;
            }
            ScriptStep::Minimize { client, surface } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::SetMinimized { surface })?;
            }
            ScriptStep::MinSize {
                client,
                surface,
                size,
            } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::SetMinSize { surface, size })?;
            }
            ScriptStep::MaxSize {
                client,
                surface,
                size,
            } => {
                let surface = self.surface(&surface)?;
                self.request(&client, Request::SetMaxSize { surface, size })?;
            }
            ScriptStep::Move {
                client,
                surface,
                seat,
                serial,
            } => {
                let surface = self.surface(&surface)?;
                let seat = self.seat(seat.as_deref())?;
                let serial = self.press_serial(seat, serial)?;
                self.request(
                    &client,
                    Request::Move {
                        seat,
                        surface,
                        serial,
                    },
                )?;
            }
            ScriptStep::Resize {
                client,
                surface,
                edges,
                seat,
                serial,
            } => {
                let surface = self.surface(&surface)?;
                let seat = self.seat(seat.as_deref())?;
                let serial = self.press_serial(seat, serial)?;
                self.request(
                    &client,
                    Request::Resize {
                        seat,
                        surface,
                        edges,
                        serial,
                    },
                )?;
            }
            ScriptStep::PopupGrab {
                client,
                surface,
                seat,
                serial,
            } => {
                let popup = self.surface(&surface)?;
                let seat = self.seat(seat.as_deref())?;
                let serial = self.press_serial(seat, serial)?;
                self.request(
                    &client,
                    Request::PopupGrab {
                        seat,
                        popup,
                        serial,
                    },
                )?;
            }
            ScriptStep::Button {
                seat,
                x,
                y,
                button,
                pressed,
            } => {
                let seat = self.seat(seat.as_deref())?;
                let serial = self.state.next_serial();
                let route = self
                    .state
                    .route_pointer_button(seat, serial, (x, y).into(), button, pressed)?;
                return Ok(Some(route));
            }
            ScriptStep::Motion { seat, x, y } => {
                let seat = self.seat(seat.as_deref())?;
                return Ok(Some(self.state.route_pointer_motion(seat, (x, y).into())?));
            }
            ScriptStep::Key { seat, key, pressed } => {
                let seat = self.seat(seat.as_deref())?;
                let serial = self.state.next_serial();
                return Ok(Some(self.state.route_key(seat, serial, key, pressed)?));
            }
            ScriptStep::CancelGrab { seat } => {
                let seat = self.seat(seat.as_deref())?;
                self.state.cancel_grab(seat)?;
            }
            ScriptStep::Activate { surface, seat } => {
                let surface = self.surface(&surface)?;
                let seat = self.seat(seat.as_deref())?;
                self.state.activate(seat, surface)?;
            }
            ScriptStep::AddOutput {
                name,
                geometry,
                scale,
            } => {
                self.state.add_output(name, geometry, scale);
            }
            ScriptStep::OutputGeometry { name, geometry } => {
                let output = self.output(&name)?;
                self.state.set_output_geometry(output, geometry)?;
            }
            ScriptStep::RemoveOutput { name } => {
                let output = self.output(&name)?;
                self.state.remove_output(output)?;
            }
            ScriptStep::Dispatch => self.state.dispatch_pending(),
        }
        Ok(None)
    }

    /// Drain queued events, remembering configure serials
    pub fn take_events(&mut self) -> Vec<ShellEvent> {
        let events = self.state.take_events();
        for event in &events {
            match event {
                ShellEvent::Client(ClientEvent::Configure {
                    surface, serial, ..
                })
                | ShellEvent::Client(ClientEvent::PopupConfigure {
                    surface, serial, ..
                }) => {
                    self.configures.insert(*surface, *serial);
                }
                _ => {}
            }
        }
        events
    }

    /// Run a whole script, writing one JSON line per event, route or error
    pub fn run<R: BufRead, W: Write>(&mut self, script: R, out: &mut W) -> TetherResult<()> {
        for (index, line) in script.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            let number = index + 1;

            let step: ScriptStep = match serde_json::from_str(line) {
                Ok(step) => step,
                Err(err) => {
                    warn!("Script line {number}: {err}");
                    writeln!(out, "{}", json!({ "line": number, "parse_error": err.to_string() }))?;
                    continue;
                }
            };

            match self.step(step) {
                Ok(Some(route)) => {
                    writeln!(out, "{}", json!({ "line": number, "route": route }))?;
                }
                Ok(None) => {}
                Err(err) => {
                    writeln!(
                        out,
                        "{}",
                        json!({
                            "line": number,
                            "error": err.to_string(),
                            "severity": format!("{:?}", err.severity()),
                        })
                    )?;
                }
            }

            for event in self.take_events() {
                writeln!(out, "{}", serde_json::to_string(&event)?)?;
            }
        }
        Ok(())
    }
}

/// Entry point of `tether --test`
pub fn run_test_mode<R: BufRead, W: Write>(config: Config, script: R, out: &mut W) -> TetherResult<()> {
    config.validate()?;
    info!("Replaying script in test mode");
    let mut runner = ScriptRunner::new(config);
    runner.run(script, out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
{"op":"add_output","name":"main","geometry":{"loc":{"x":0,"y":0},"size":{"w":800,"h":600}}}
{"op":"connect","client":"app"}
{"op":"create_surface","client":"app","name":"win"}
{"op":"role","client":"app","surface":"win","role":{"type":"toplevel"}}
{"op":"commit","client":"app","surface":"win"}
{"op":"ack","client":"app","surface":"win"}
{"op":"attach","client":"app","surface":"win","buffer":{"id":1,"size":{"w":200,"h":100}}}
{"op":"commit","client":"app","surface":"win"}
{"op":"button","x":400.0,"y":300.0,"pressed":true}
"#;

    #[test]
    fn script_maps_and_routes() {
        let mut out = Vec::new();
        run_test_mode(Config::default(), SCRIPT.as_bytes(), &mut out).unwrap();
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert!(lines
            .iter()
            .any(|l| l["data"]["event"] == "surface_mapped"));
        assert!(lines.iter().any(|l| l["route"]["route"] == "normal"));
        assert!(lines.iter().all(|l| l.get("error").is_none()));
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let mut out = Vec::new();
        run_test_mode(
            Config::default(),
            "{\"op\":\"nope\"}\n{\"op\":\"dispatch\"}\n".as_bytes(),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("parse_error"));
    }
}
