//! Keyboard input handling

use tracing::trace;

use super::{InputRoute, SeatId};
use crate::{
    error::{OptionExt, TetherError, TetherResult},
    state::ShellState,
};
use smithay::utils::Serial;

impl ShellState {
    /// Route a key event of `seat`
    ///
    /// Keys go to the topmost grabbing popup, else to the window activated
    /// on the seat.
    pub fn route_key(
        &mut self,
        seat: SeatId,
        serial: Serial,
        key: u32,
        pressed: bool,
    ) -> TetherResult<InputRoute> {
        profiling::scope!("route_key");
        let seat_state = self
            .seats
            .get_mut(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?;
        if pressed {
            seat_state.last_key_serial = Some(serial);
        }
        let activated = seat_state.activated;

        let route = if let Some(popup) = self.popups.top(seat) {
            InputRoute::Popup(popup)
        } else if let Some(window) = activated.filter(|w| self.registry.is_alive(*w)) {
            InputRoute::Focused(window)
        } else {
            InputRoute::Normal
        };
        trace!("Key {key} on {seat} routed {:?}", route);
        Ok(route)
    }
}
