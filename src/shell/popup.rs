//! Popup grabs
//!
//! Each seat keeps a stack of grabbing popups, innermost on top. A new
//! grab must come from the client's newest popup and nest inside the current
//! top; the first grab of a stack must be parented to a window or panel.
//! Dismissal always runs innermost-first over a snapshot of the affected
//! entries, so surfaces vanishing mid-way cannot disturb the walk.

use super::{global_geometry, Role, RoleKind, ShellContext};
use crate::error::GrabError;
use crate::event::{ClientEvent, SeatEvent};
use crate::input::{SeatId, SeatState};
use crate::surface::{ClientId, SurfaceId};
use smithay::utils::{Logical, Point, Serial};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One grabbing popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGrabEntry {
    pub surface: SurfaceId,
    /// Serial of the input event that triggered the grab
    pub serial: Serial,
}

/// Grab stack of one seat, bottom first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupStack {
    entries: Vec<PopupGrabEntry>,
}

impl PopupStack {
    pub fn top(&self) -> Option<&PopupGrabEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.entries.iter().any(|e| e.surface == surface)
    }

    /// Entries from the bottom of the stack to the top
    pub fn entries(&self) -> &[PopupGrabEntry] {
        &self.entries
    }

    fn position(&self, surface: SurfaceId) -> Option<usize> {
        self.entries.iter().position(|e| e.surface == surface)
    }
}

/// Result of checking a button press against a seat's popup grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutsideInput {
    /// The seat has no popup grab
    NoGrab,
    /// The press landed on a popup of the stack
    Inside(SurfaceId),
    /// The press missed the stack; every popup of it was dismissed
    Dismissed,
}

/// Popup grab stacks of all seats
#[derive(Debug, Default)]
pub struct PopupGrabManager {
    stacks: HashMap<SeatId, PopupStack>,
}

impl PopupGrabManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stack(&self, seat: SeatId) -> Option<&PopupStack> {
        self.stacks.get(&seat).filter(|s| !s.is_empty())
    }

    pub fn top(&self, seat: SeatId) -> Option<SurfaceId> {
        self.stack(seat).and_then(|s| s.top()).map(|e| e.surface)
    }

    pub fn stacks(&self) -> impl Iterator<Item = (SeatId, &PopupStack)> {
        self.stacks.iter().map(|(seat, stack)| (*seat, stack))
    }

    /// Whether any seat's stack holds `surface`
    pub fn is_grabbing(&self, surface: SurfaceId) -> bool {
        self.stacks.values().any(|s| s.contains(surface))
    }

    /// Push `popup` onto the grab stack of `seat`
    ///
    /// A serial that does not match recent input on the seat dismisses the
    /// popup at once. Only the client's most recently created popup may grab,
    /// and it must nest inside the current top; anything else tears the whole
    /// stack down.
    pub fn push_popup(
        &mut self,
        ctx: &mut ShellContext<'_>,
        seat: &SeatState,
        popup: SurfaceId,
        serial: Serial,
    ) -> Result<(), GrabError> {
        if !ctx.registry.is_alive(popup) {
            return Err(GrabError::SurfaceGone(popup));
        }
        let Some(state) = ctx.registry.get(popup).and_then(|s| s.role.popup()) else {
            return Err(GrabError::NotGrabbable(popup));
        };
        if state.dismissed {
            debug!("Ignoring grab for dismissed {popup}");
            return Ok(());
        }
        let parent = state.parent;
        let sequence = state.sequence;
        let client = ctx.registry.get(popup).map(|s| s.client);
        let already_grabbed = state.grab_serial.is_some() || self.is_grabbing(popup);

        if !seat.is_recent_input(serial) {
            warn!("Grab for {popup} on {} with stale serial {:?}", seat.id, serial);
            self.send_done(ctx, popup);
            return Err(GrabError::InvalidPopupSerial {
                seat: seat.id,
                serial,
            });
        }

        let newest = client.and_then(|c| newest_popup_sequence(ctx, c)) == Some(sequence);
        let nests = match self.stack(seat.id).and_then(|s| s.top()) {
            Some(top) => top.surface == parent && !already_grabbed,
            None => !already_grabbed && is_grab_root(ctx, parent),
        };
        if !newest || !nests {
            if !newest {
                debug!("{popup} is not the newest popup of its client");
            }
            let dismissed = self.dismiss_all(ctx, seat.id);
            warn!(
                "{popup} grabbed out of order on {}; dismissed {} popups",
                seat.id,
                dismissed.len()
            );
            return Err(GrabError::NotTopmost { popup });
        }

        let stack = self.stacks.entry(seat.id).or_default();
        stack.entries.push(PopupGrabEntry {
            surface: popup,
            serial,
        });
        if let Some(state) = ctx.registry.get_mut(popup).and_then(|s| s.role.popup_mut()) {
            state.grab_serial = Some(serial);
        }
        info!("{popup} grabbed {}, depth {}", seat.id, stack.len());
        ctx.events.emit_seat(SeatEvent::PopupGrabStarted {
            seat: seat.id,
            popup,
        });
        Ok(())
    }

    /// Dismiss `popup` and every popup above it on `seat`
    ///
    /// Returns the dismissed popups innermost-first.
    pub fn dismiss_from(
        &mut self,
        ctx: &mut ShellContext<'_>,
        seat: SeatId,
        popup: SurfaceId,
    ) -> Vec<SurfaceId> {
        let Some(stack) = self.stacks.get_mut(&seat) else {
            return Vec::new();
        };
        let Some(index) = stack.position(popup) else {
            return Vec::new();
        };
        let snapshot = stack.entries.split_off(index);
        let emptied = stack.is_empty();

        let dismissed: Vec<SurfaceId> = snapshot.iter().rev().map(|e| e.surface).collect();
        for surface in &dismissed {
            self.send_done(ctx, *surface);
        }
        if emptied {
            self.stacks.remove(&seat);
            ctx.events.emit_seat(SeatEvent::PopupGrabEnded { seat });
        }
        debug!("Dismissed {} popups on {seat}", dismissed.len());
        dismissed
    }

    /// Dismiss the entire stack of `seat`
    pub fn dismiss_all(&mut self, ctx: &mut ShellContext<'_>, seat: SeatId) -> Vec<SurfaceId> {
        let bottom = self
            .stack(seat)
            .and_then(|s| s.entries.first())
            .map(|e| e.surface);
        match bottom {
            Some(bottom) => self.dismiss_from(ctx, seat, bottom),
            None => Vec::new(),
        }
    }

    /// Check a button press against the grab of `seat`
    ///
    /// A press that misses every popup of the stack dismisses all of them;
    /// the caller decides whether the press then reaches normal routing.
    pub fn on_outside_input(
        &mut self,
        ctx: &mut ShellContext<'_>,
        seat: SeatId,
        pos: Point<f64, Logical>,
    ) -> OutsideInput {
        if self.stack(seat).is_none() {
            return OutsideInput::NoGrab;
        }
        match self.surface_at(ctx, seat, pos) {
            Some(surface) => OutsideInput::Inside(surface),
            None => {
                debug!("Press at {:?} outside popups of {seat}", pos);
                self.dismiss_all(ctx, seat);
                OutsideInput::Dismissed
            }
        }
    }

    /// Topmost popup of the stack of `seat` accepting input at `pos`
    pub fn surface_at(
        &self,
        ctx: &ShellContext<'_>,
        seat: SeatId,
        pos: Point<f64, Logical>,
    ) -> Option<SurfaceId> {
        self.stack(seat)?
            .entries
            .iter()
            .rev()
            .map(|e| e.surface)
            .find(|surface| popup_accepts_input(ctx, *surface, pos))
    }

    /// `surface` is going away or lost its buffer
    ///
    /// Stacks containing it, or rooted on it, are cut at that point. Popups
    /// parented to it that never grabbed are dismissed too.
    pub fn on_surface_gone(&mut self, ctx: &mut ShellContext<'_>, surface: SurfaceId) {
        let cuts: Vec<(SeatId, SurfaceId)> = self
            .stacks
            .iter()
            .filter_map(|(seat, stack)| {
                stack
                    .entries
                    .iter()
                    .find(|e| {
                        e.surface == surface
                            || ctx
                                .registry
                                .get(e.surface)
                                .and_then(|s| s.role.popup())
                                .is_some_and(|p| p.parent == surface)
                    })
                    .map(|e| (*seat, e.surface))
            })
            .collect();
        for (seat, from) in cuts {
            self.dismiss_from(ctx, seat, from);
        }

        for child in ctx.registry.children_of(surface) {
            let ungrabbed = ctx
                .registry
                .get(child)
                .and_then(|s| s.role.popup())
                .is_some_and(|p| !p.dismissed);
            if ungrabbed && !self.is_grabbing(child) {
                self.send_done(ctx, child);
            }
        }
    }

    fn send_done(&self, ctx: &mut ShellContext<'_>, surface: SurfaceId) {
        let alive = ctx.registry.is_alive(surface);
        let Some(popup) = ctx.registry.get_mut(surface).and_then(|s| s.role.popup_mut()) else {
            return;
        };
        if popup.dismissed {
            return;
        }
        popup.dismissed = true;
        if alive {
            ctx.events.emit_client(ClientEvent::PopupDone { surface });
        }
    }
}

/// Creation order of the newest popup `client` still has open
fn newest_popup_sequence(ctx: &ShellContext<'_>, client: ClientId) -> Option<u64> {
    ctx.registry
        .iter()
        .filter(|s| s.client == client && !s.destroy_pending)
        .filter_map(|s| s.role.popup())
        .filter(|p| !p.dismissed)
        .map(|p| p.sequence)
        .max()
}

/// A live, mapped window or layer surface may root a popup grab
fn is_grab_root(ctx: &ShellContext<'_>, parent: SurfaceId) -> bool {
    let Some(surface) = ctx.registry.get(parent) else {
        return false;
    };
    if surface.destroy_pending {
        return false;
    }
    match &surface.role {
        Role::Toplevel(shell) | Role::Transient { shell, .. } => shell.is_mapped(),
        Role::Panel(_) | Role::Overlay(_) => surface.mapped,
        Role::Popup(_) | Role::None => false,
    }
}

fn popup_accepts_input(ctx: &ShellContext<'_>, popup: SurfaceId, pos: Point<f64, Logical>) -> bool {
    let Some(geometry) = global_geometry(ctx.registry, ctx.outputs, popup, ctx.max_parent_depth)
    else {
        return false;
    };
    ctx.registry
        .get(popup)
        .filter(|s| s.role.kind() == RoleKind::Popup)
        .is_some_and(|s| s.accepts_input_at(pos - geometry.loc.to_f64()))
}
