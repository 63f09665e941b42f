//! Seat grab requests: interactive move/resize and popup grabs

use tracing::debug;

use crate::{
    error::{GrabError, OptionExt, TetherError, TetherResult},
    input::SeatId,
    shell::{GrabHandle, GrabKind, InteractiveGrab, ResizeEdge},
    state::ShellState,
    surface::{ClientId, SurfaceId},
};
use smithay::utils::Serial;

impl ShellState {
    /// Start moving `surface` with the pointer of `seat`
    pub fn begin_move(
        &mut self,
        client: ClientId,
        seat: SeatId,
        surface: SurfaceId,
        serial: Serial,
    ) -> TetherResult<GrabHandle> {
        self.begin_grab(client, seat, surface, GrabKind::Move, serial)
    }

    /// Start resizing `surface` from `edges`
    pub fn begin_resize(
        &mut self,
        client: ClientId,
        seat: SeatId,
        surface: SurfaceId,
        edges: ResizeEdge,
        serial: Serial,
    ) -> TetherResult<GrabHandle> {
        if edges.is_empty() {
            return Err(TetherError::Rejected(format!(
                "resize of {surface} without edges"
            )));
        }
        self.begin_grab(client, seat, surface, GrabKind::Resize(edges), serial)
    }

    fn begin_grab(
        &mut self,
        client: ClientId,
        seat: SeatId,
        surface: SurfaceId,
        kind: GrabKind,
        serial: Serial,
    ) -> TetherResult<GrabHandle> {
        self.check_owner(client, surface)?;
        let (mut ctx, _, grabs, seats) = self.split();
        let seat_state = seats
            .get(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?;
        Ok(grabs.begin(&mut ctx, seat_state, surface, kind, serial)?)
    }

    /// Grab `seat` for `popup`, nesting it on the seat's popup stack
    pub fn popup_grab(
        &mut self,
        client: ClientId,
        seat: SeatId,
        popup: SurfaceId,
        serial: Serial,
    ) -> TetherResult<()> {
        self.check_owner(client, popup)?;
        let (mut ctx, popups, _, seats) = self.split();
        let seat_state = seats
            .get(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?;
        popups.push_popup(&mut ctx, seat_state, popup, serial)?;
        Ok(())
    }

    /// Abort the interactive grab of `seat`, restoring the start geometry
    pub fn cancel_grab(&mut self, seat: SeatId) -> Result<InteractiveGrab, GrabError> {
        let (mut ctx, _, grabs, _) = self.split();
        let grab = grabs.cancel(&mut ctx, seat)?;
        debug!("Cancelled {:?} of {}", grab.kind, grab.surface);
        Ok(grab)
    }

    /// Dismiss every popup grabbed on `seat`
    pub fn dismiss_popups(&mut self, seat: SeatId) -> Vec<SurfaceId> {
        let (mut ctx, popups, _, _) = self.split();
        popups.dismiss_all(&mut ctx, seat)
    }
}
