//! Pointer input handling

use tracing::{debug, trace};

use super::{InputRoute, SeatId};
use crate::{
    error::{OptionExt, TetherError, TetherResult},
    shell::OutsideInput,
    state::ShellState,
};
use smithay::utils::{Logical, Point, Serial};

impl ShellState {
    /// Route a pointer button event of `seat`
    ///
    /// An interactive grab owns every button event of its seat and ends once
    /// all buttons are up. Otherwise a press is checked against the seat's
    /// popup grab: a miss dismisses the whole stack, and the press reaches
    /// normal routing only when `popup_dismiss_passthrough` is set.
    pub fn route_pointer_button(
        &mut self,
        seat: SeatId,
        serial: Serial,
        pos: Point<f64, Logical>,
        button: u32,
        pressed: bool,
    ) -> TetherResult<InputRoute> {
        profiling::scope!("route_pointer_button");
        let passthrough = self.config.popup_dismiss_passthrough;
        let (mut ctx, popups, grabs, seats) = self.split();
        let seat_state = seats
            .get_mut(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?;
        seat_state.pointer_pos = pos;
        if !seat_state.set_button(button, pressed, serial) {
            trace!("Ignoring repeated button {button} on {seat}");
        }
        let buttons_up = seat_state.pressed_buttons.is_empty();

        if grabs.is_grabbed(seat) {
            if buttons_up {
                grabs.on_release(&mut ctx, seat);
            }
            return Ok(InputRoute::Grabbed);
        }

        if !pressed {
            return Ok(match popups.top(seat) {
                Some(top) => InputRoute::Popup(top),
                None => InputRoute::Normal,
            });
        }

        let route = match popups.on_outside_input(&mut ctx, seat, pos) {
            OutsideInput::NoGrab => InputRoute::Normal,
            OutsideInput::Inside(popup) => InputRoute::Popup(popup),
            OutsideInput::Dismissed if passthrough => InputRoute::Passthrough,
            OutsideInput::Dismissed => InputRoute::Dismissed,
        };
        debug!("Press {:?} on {seat} at {:?} routed {:?}", serial, pos, route);
        Ok(route)
    }

    /// Route pointer motion of `seat` to its grab, if any
    pub fn route_pointer_motion(
        &mut self,
        seat: SeatId,
        pos: Point<f64, Logical>,
    ) -> TetherResult<InputRoute> {
        profiling::scope!("route_pointer_motion");
        let (mut ctx, popups, grabs, seats) = self.split();
        seats
            .get_mut(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?
            .pointer_pos = pos;

        if grabs.on_motion(&mut ctx, seat, pos) {
            return Ok(InputRoute::Grabbed);
        }
        Ok(match popups.surface_at(&ctx, seat, pos) {
            Some(popup) => InputRoute::Popup(popup),
            None => InputRoute::Normal,
        })
    }
}
