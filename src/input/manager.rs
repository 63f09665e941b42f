use super::SeatId;
use crate::surface::SurfaceId;
use smithay::utils::{Logical, Point, Serial};
use tracing::info;

/// Per-seat input bookkeeping
#[derive(Debug, Clone)]
pub struct SeatState {
    pub id: SeatId,
    pub name: String,
    /// Last known pointer position in global coordinates
    pub pointer_pos: Point<f64, Logical>,
    /// Buttons currently held down
    pub pressed_buttons: Vec<u32>,
    /// Serial of the most recent pointer button press
    pub last_press_serial: Option<Serial>,
    /// Serial of the most recent key press
    pub last_key_serial: Option<Serial>,
    /// Window holding keyboard activation on this seat
    pub activated: Option<SurfaceId>,
}

impl SeatState {
    pub fn new(id: SeatId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            pointer_pos: (0.0, 0.0).into(),
            pressed_buttons: Vec::new(),
            last_press_serial: None,
            last_key_serial: None,
            activated: None,
        }
    }

    /// Record a button change; returns false for a duplicate press or a
    /// release of a button that was never pressed
    pub fn set_button(&mut self, button: u32, pressed: bool, serial: Serial) -> bool {
        if pressed {
            if self.pressed_buttons.contains(&button) {
                return false;
            }
            self.pressed_buttons.push(button);
            self.last_press_serial = Some(serial);
            true
        } else {
            let before = self.pressed_buttons.len();
            self.pressed_buttons.retain(|b| *b != button);
            before != self.pressed_buttons.len()
        }
    }

    /// Whether `serial` names the press that is still holding the pointer
    pub fn is_current_press(&self, serial: Serial) -> bool {
        !self.pressed_buttons.is_empty() && self.last_press_serial == Some(serial)
    }

    /// Whether `serial` names the latest user input on this seat
    pub fn is_recent_input(&self, serial: Serial) -> bool {
        self.last_press_serial == Some(serial) || self.last_key_serial == Some(serial)
    }
}

/// Centralized seat management
#[derive(Debug, Default)]
pub struct SeatManager {
    seats: Vec<SeatState>,
    next_id: u32,
}

impl SeatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_seat(&mut self, name: impl Into<String>) -> SeatId {
        let id = SeatId(self.next_id);
        self.next_id += 1;
        let seat = SeatState::new(id, name);
        info!("Adding seat '{}' as {}", seat.name, id);
        self.seats.push(seat);
        id
    }

    pub fn get(&self, id: SeatId) -> Option<&SeatState> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SeatId) -> Option<&mut SeatState> {
        self.seats.iter_mut().find(|s| s.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&SeatState> {
        self.seats.iter().find(|s| s.name == name)
    }

    /// The first seat, used for compositor-initiated activation
    pub fn default_seat(&self) -> Option<SeatId> {
        self.seats.first().map(|s| s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeatState> {
        self.seats.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SeatState> {
        self.seats.iter_mut()
    }

    pub fn ids(&self) -> Vec<SeatId> {
        self.seats.iter().map(|s| s.id).collect()
    }
}
