//! Interactive move and resize grabs
//!
//! A grab is started by a client request that names the press serial which
//! triggered it. While the grab lives, pointer motion on that seat drives
//! the window instead of reaching any client. Each seat holds at most one.

use super::{ResizeData, ResizeState, Role, ShellContext, WindowState};
use crate::error::GrabError;
use crate::event::SeatEvent;
use crate::input::{SeatId, SeatState};
use crate::surface::SurfaceId;
use crate::utils::{clamp_size, wire};
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle, Serial, Size};
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ResizeEdge: u32 {
        const NONE = 0;
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const TOP_LEFT = 5;
        const BOTTOM_LEFT = 6;
        const RIGHT = 8;
        const TOP_RIGHT = 9;
        const BOTTOM_RIGHT = 10;
    }
}

/// What an interactive grab does with pointer motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "edges", rename_all = "snake_case")]
pub enum GrabKind {
    Move,
    Resize(ResizeEdge),
}

/// An active move or resize
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveGrab {
    pub seat: SeatId,
    pub surface: SurfaceId,
    pub kind: GrabKind,
    /// Pointer position when the grab started
    pub start_pointer: Point<f64, Logical>,
    /// Window geometry when the grab started
    pub start_geometry: Rectangle<i32, Logical>,
    /// Size sent with the latest resize configure
    pub last_size: Size<i32, Logical>,
    pub serial: Serial,
}

/// Handle returned when a grab starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrabHandle {
    pub seat: SeatId,
    pub surface: SurfaceId,
    #[serde(with = "wire::serial")]
    pub serial: Serial,
}

/// Interactive grabs of all seats
#[derive(Debug, Default)]
pub struct InteractiveGrabs {
    grabs: HashMap<SeatId, InteractiveGrab>,
}

impl InteractiveGrabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, seat: SeatId) -> Option<&InteractiveGrab> {
        self.grabs.get(&seat)
    }

    pub fn is_grabbed(&self, seat: SeatId) -> bool {
        self.grabs.contains_key(&seat)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractiveGrab> {
        self.grabs.values()
    }

    /// Start a move or resize of `surface` on `seat`
    pub fn begin(
        &mut self,
        ctx: &mut ShellContext<'_>,
        seat: &SeatState,
        surface: SurfaceId,
        kind: GrabKind,
        serial: Serial,
    ) -> Result<GrabHandle, GrabError> {
        if self.grabs.contains_key(&seat.id) {
            return Err(GrabError::AlreadyGrabbed(seat.id));
        }
        if !seat.is_current_press(serial) {
            debug!(
                "Refusing grab on {}: serial {:?}, last press {:?}",
                seat.id, serial, seat.last_press_serial
            );
            return Err(GrabError::StaleSerial {
                seat: seat.id,
                serial,
            });
        }

        if !ctx.registry.is_alive(surface) {
            return Err(GrabError::SurfaceGone(surface));
        }
        let Some(shell) = ctx
            .registry
            .get_mut(surface)
            .and_then(|s| s.role.shell_mut())
        else {
            return Err(GrabError::NotGrabbable(surface));
        };
        if !shell.is_mapped()
            || matches!(
                shell.window_state(),
                WindowState::Fullscreen | WindowState::Minimized
            )
        {
            return Err(GrabError::NotGrabbable(surface));
        }

        let start_geometry = shell.geometry();
        if let GrabKind::Resize(edges) = kind {
            shell.resize_state = ResizeState::Resizing(ResizeData {
                edges,
                initial_location: start_geometry.loc,
                initial_size: start_geometry.size,
            });
        }

        let grab = InteractiveGrab {
            seat: seat.id,
            surface,
            kind,
            start_pointer: seat.pointer_pos,
            start_geometry,
            last_size: start_geometry.size,
            serial,
        };
        info!("{} grabbed {surface} for {:?}", seat.id, kind);
        self.grabs.insert(seat.id, grab);
        ctx.events.emit_seat(SeatEvent::PointerGrabbed {
            seat: seat.id,
            surface,
            kind,
        });
        Ok(GrabHandle {
            seat: seat.id,
            surface,
            serial,
        })
    }

    /// Feed pointer motion; returns false when the seat has no grab
    pub fn on_motion(&mut self, ctx: &mut ShellContext<'_>, seat: SeatId, pos: Point<f64, Logical>) -> bool {
        let Some(grab) = self.grabs.get_mut(&seat) else {
            return false;
        };
        if !ctx.registry.is_alive(grab.surface) {
            warn!("{} grab target {} vanished", seat, grab.surface);
            let surface = grab.surface;
            self.release(ctx, seat, surface);
            return true;
        }

        let delta = pos - grab.start_pointer;
        match grab.kind {
            GrabKind::Move => {
                let location = (grab.start_geometry.loc.to_f64() + delta).to_i32_round();
                ctx.set_window_position(grab.surface, location);
            }
            GrabKind::Resize(edges) => {
                let Some(size) = resize_target(ctx, grab, edges, delta) else {
                    return true;
                };
                if size != grab.last_size {
                    grab.last_size = size;
                    trace!("Resizing {} to {:?}", grab.surface, size);
                    ctx.send_configure(grab.surface, Some(size), None);
                }
            }
        }
        true
    }

    /// All buttons were released; returns the finished grab
    pub fn on_release(&mut self, ctx: &mut ShellContext<'_>, seat: SeatId) -> Option<InteractiveGrab> {
        let grab = self.grabs.remove(&seat)?;
        ctx.events.emit_seat(SeatEvent::PointerGrabReleased {
            seat,
            surface: grab.surface,
        });
        match grab.kind {
            GrabKind::Move => finish_move(ctx, grab.surface),
            GrabKind::Resize(_) => finish_resize(ctx, grab.surface, grab.last_size),
        }
        debug!("{seat} released {}", grab.surface);
        Some(grab)
    }

    /// End the grab and put the window back where it started
    pub fn cancel(&mut self, ctx: &mut ShellContext<'_>, seat: SeatId) -> Result<InteractiveGrab, GrabError> {
        let grab = self.grabs.remove(&seat).ok_or(GrabError::NoGrab(seat))?;
        ctx.events.emit_seat(SeatEvent::PointerGrabReleased {
            seat,
            surface: grab.surface,
        });
        match grab.kind {
            GrabKind::Move => {
                ctx.set_window_position(grab.surface, grab.start_geometry.loc);
                finish_move(ctx, grab.surface);
            }
            GrabKind::Resize(_) => finish_resize(ctx, grab.surface, grab.start_geometry.size),
        }
        info!("{seat} cancelled grab of {}", grab.surface);
        Ok(grab)
    }

    /// Drop every grab on `surface` without waiting for a button release
    pub fn on_surface_destroyed(&mut self, ctx: &mut ShellContext<'_>, surface: SurfaceId) -> Vec<SeatId> {
        let seats: Vec<SeatId> = self
            .grabs
            .values()
            .filter(|g| g.surface == surface)
            .map(|g| g.seat)
            .collect();
        for seat in &seats {
            self.release(ctx, *seat, surface);
        }
        seats
    }

    fn release(&mut self, ctx: &mut ShellContext<'_>, seat: SeatId, surface: SurfaceId) {
        self.grabs.remove(&seat);
        if let Some(shell) = ctx
            .registry
            .get_mut(surface)
            .and_then(|s| s.role.shell_mut())
        {
            shell.resize_state = ResizeState::NotResizing;
        }
        info!("{seat} grab on {surface} dropped");
        ctx.events
            .emit_seat(SeatEvent::PointerGrabReleased { seat, surface });
    }
}

/// Size a resize grab asks for, or `None` when the motion must be ignored
fn resize_target(
    ctx: &ShellContext<'_>,
    grab: &InteractiveGrab,
    edges: ResizeEdge,
    delta: Point<f64, Logical>,
) -> Option<Size<i32, Logical>> {
    let shell = ctx.registry.get(grab.surface)?.role.shell()?;
    let (mut dx, mut dy) = (delta.x, delta.y);

    let mut new_width = grab.start_geometry.size.w;
    let mut new_height = grab.start_geometry.size.h;

    let left_right = ResizeEdge::LEFT | ResizeEdge::RIGHT;
    let top_bottom = ResizeEdge::TOP | ResizeEdge::BOTTOM;

    if edges.intersects(left_right) {
        if edges.intersects(ResizeEdge::LEFT) {
            dx = -dx;
        }
        new_width = (grab.start_geometry.size.w as f64 + dx) as i32;
    }
    if edges.intersects(top_bottom) {
        if edges.intersects(ResizeEdge::TOP) {
            dy = -dy;
        }
        new_height = (grab.start_geometry.size.h as f64 + dy) as i32;
    }

    let min = Size::from((
        shell.min_size.w.max(ctx.min_size.w).max(1),
        shell.min_size.h.max(ctx.min_size.h).max(1),
    ));
    let size = clamp_size(new_width, new_height, min, shell.max_size);

    if shell.window_state() == WindowState::Maximized {
        let data = ResizeData {
            edges,
            initial_location: grab.start_geometry.loc,
            initial_size: grab.start_geometry.size,
        };
        let target = Rectangle::new(data.anchored_location(shell.position, size), size);
        let usable = ctx
            .outputs
            .output_for_rect(grab.start_geometry)
            .and_then(|output| ctx.outputs.usable_area(output))?;
        if !usable.contains_rect(target) {
            debug!("Ignoring resize of maximized {} to {:?}", grab.surface, size);
            return None;
        }
    }
    Some(size)
}

fn finish_move(ctx: &mut ShellContext<'_>, surface: SurfaceId) {
    let parent_position = match ctx.registry.get(surface).map(|s| &s.role) {
        Some(Role::Transient {
            parent: Some(parent),
            ..
        }) => ctx
            .registry
            .get(*parent)
            .and_then(|p| p.role.shell())
            .map(|shell| shell.position),
        _ => None,
    };
    if let Some(origin) = parent_position {
        if let Some(Role::Transient { offset, shell, .. }) =
            ctx.registry.get_mut(surface).map(|s| &mut s.role)
        {
            *offset = shell.position - origin;
            trace!("{surface} offset now {:?}", offset);
        }
    }
    ctx.reposition_transients(surface);
}

/// Send the final, non-resizing configure and wait for it to settle
fn finish_resize(ctx: &mut ShellContext<'_>, surface: SurfaceId, size: Size<i32, Logical>) {
    let Some(data) = ctx
        .registry
        .get_mut(surface)
        .and_then(|s| s.role.shell_mut())
        .and_then(|shell| {
            let data = shell.resize_state.data().copied();
            shell.resize_state = ResizeState::NotResizing;
            data
        })
    else {
        return;
    };
    let Some(serial) = ctx.send_configure(surface, Some(size), None) else {
        return;
    };
    if let Some(shell) = ctx
        .registry
        .get_mut(surface)
        .and_then(|s| s.role.shell_mut())
    {
        shell.resize_state = ResizeState::Resizing(data).finish(serial);
    }
}
