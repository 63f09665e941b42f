//! Client request dispatch
//!
//! The transport decodes client messages into [`Request`] values and hands
//! them to [`ShellState::handle_request`]. A request that breaks the
//! protocol ends the client in the same call: a `ProtocolError` event is
//! queued and everything the client owned is torn down.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::{log_error, ErrorSeverity, TetherResult},
    event::ClientEvent,
    input::SeatId,
    output::OutputId,
    shell::{GrabHandle, ResizeEdge, RoleKind, RoleRequest},
    state::ShellState,
    surface::{Buffer, ClientId, SurfaceId},
};
use smithay::utils::{Logical, Rectangle, Serial, Size};

/// A decoded client request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreateSurface,
    AttachBuffer {
        surface: SurfaceId,
        buffer: Option<Buffer>,
    },
    Damage {
        surface: SurfaceId,
        rect: Rectangle<i32, Logical>,
    },
    SetInputRegion {
        surface: SurfaceId,
        region: Option<Vec<Rectangle<i32, Logical>>>,
    },
    Commit {
        surface: SurfaceId,
    },
    Destroy {
        surface: SurfaceId,
    },
    AssignRole {
        surface: SurfaceId,
        role: RoleRequest,
    },
    AckConfigure {
        surface: SurfaceId,
        serial: Serial,
    },
    SetMaximized {
        surface: SurfaceId,
    },
    UnsetMaximized {
        surface: SurfaceId,
    },
    SetFullscreen {
        surface: SurfaceId,
        output: Option<OutputId>,
    },
    UnsetFullscreen {
        surface: SurfaceId,
    },
    SetMinimized {
        surface: SurfaceId,
    },
    SetMinSize {
        surface: SurfaceId,
        size: Size<i32, Logical>,
    },
    SetMaxSize {
        surface: SurfaceId,
        size: Size<i32, Logical>,
    },
    Move {
        seat: SeatId,
        surface: SurfaceId,
        serial: Serial,
    },
    Resize {
        seat: SeatId,
        surface: SurfaceId,
        edges: ResizeEdge,
        serial: Serial,
    },
    PopupGrab {
        seat: SeatId,
        popup: SurfaceId,
        serial: Serial,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::CreateSurface => "create_surface",
            Request::AttachBuffer { .. } => "attach_buffer",
            Request::Damage { .. } => "damage",
            Request::SetInputRegion { .. } => "set_input_region",
            Request::Commit { .. } => "commit",
            Request::Destroy { .. } => "destroy",
            Request::AssignRole { .. } => "assign_role",
            Request::AckConfigure { .. } => "ack_configure",
            Request::SetMaximized { .. } => "set_maximized",
            Request::UnsetMaximized { .. } => "unset_maximized",
            Request::SetFullscreen { .. } => "set_fullscreen",
            Request::UnsetFullscreen { .. } => "unset_fullscreen",
            Request::SetMinimized { .. } => "set_minimized",
            Request::SetMinSize { .. } => "set_min_size",
            Request::SetMaxSize { .. } => "set_max_size",
            Request::Move { .. } => "move",
            Request::Resize { .. } => "resize",
            Request::PopupGrab { .. } => "popup_grab",
        }
    }
}

/// Successful outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reply", content = "value", rename_all = "snake_case")]
pub enum Reply {
    Surface(SurfaceId),
    Role(RoleKind),
    Grab(GrabHandle),
    Done,
}

impl ShellState {
    /// Execute one request from `client`
    pub fn handle_request(&mut self, client: ClientId, request: Request) -> TetherResult<Reply> {
        let name = request.name();
        let result = self.dispatch_request(client, request);
        if let Err(err) = &result {
            match err.severity() {
                ErrorSeverity::ProtocolViolation => {
                    warn!("{client} violated the protocol in {name}: {err}");
                    self.events.emit_client(ClientEvent::ProtocolError {
                        client,
                        message: err.to_string(),
                    });
                    log_error(self.disconnect_client(client));
                }
                ErrorSeverity::PolicyRejection => debug!("Rejected {name} from {client}: {err}"),
                ErrorSeverity::ResourceGone => debug!("{name} from {client} raced a destroy: {err}"),
            }
        }
        result
    }

    fn dispatch_request(&mut self, client: ClientId, request: Request) -> TetherResult<Reply> {
        match request {
            Request::CreateSurface => self.create_surface(client).map(Reply::Surface),
            Request::AttachBuffer { surface, buffer } => {
                self.attach_buffer(client, surface, buffer).map(|_| Reply::Done)
            }
            Request::Damage { surface, rect } => self.damage(client, surface, rect).map(|_| Reply::Done),
            Request::SetInputRegion { surface, region } => self
                .set_input_region(client, surface, region)
                .map(|_| Reply::Done),
            Request::Commit { surface } => self.commit(client, surface).map(|_| Reply::Done),
            Request::Destroy { surface } => self.destroy_surface(client, surface).map(|_| Reply::Done),
            Request::AssignRole { surface, role } => {
                self.assign_role(client, surface, role).map(Reply::Role)
            }
            Request::AckConfigure { surface, serial } => self
                .ack_configure(client, surface, serial)
                .map(|_| Reply::Done),
            Request::SetMaximized { surface } => self.set_maximized(client, surface).map(|_| Reply::Done),
            Request::UnsetMaximized { surface } => {
                self.unset_maximized(client, surface).map(|_| Reply::Done)
            }
            Request::SetFullscreen { surface, output } => self
                .set_fullscreen(client, surface, output)
                .map(|_| Reply::Done),
            Request::UnsetFullscreen { surface } => {
                self.unset_fullscreen(client, surface).map(|_| Reply::Done)
            }
            Request::SetMinimized { surface } => self.set_minimized(client, surface).map(|_| Reply::Done),
            Request::SetMinSize { surface, size } => {
                self.set_min_size(client, surface, size).map(|_| Reply::Done)
            }
            Request::SetMaxSize { surface, size } => {
                self.set_max_size(client, surface, size).map(|_| Reply::Done)
            }
            Request::Move {
                seat,
                surface,
                serial,
            } => self.begin_move(client, seat, surface, serial).map(Reply::Grab),
            Request::Resize {
                seat,
                surface,
                edges,
                serial,
            } => self
                .begin_resize(client, seat, surface, edges, serial)
                .map(Reply::Grab),
            Request::PopupGrab {
                seat,
                popup,
                serial,
            } => self.popup_grab(client, seat, popup, serial).map(|_| Reply::Done),
        }
    }
}
