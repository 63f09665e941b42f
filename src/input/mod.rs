//! Input routing for tether
//!
//! The external seat dispatcher hands every pointer and keyboard event to
//! the shell first. Interactive grabs and popup grabs get the first look;
//! the returned [`InputRoute`] tells the dispatcher whether its normal focus
//! routing should still see the event.

mod keyboard;
pub mod manager;
mod pointer;

pub use self::manager::{SeatManager, SeatState};

use crate::surface::SurfaceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(u32);

impl SeatId {
    pub fn from_raw(raw: u32) -> Self {
        SeatId(raw)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seat({})", self.0)
    }
}

/// Where an input event ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "surface", rename_all = "snake_case")]
pub enum InputRoute {
    /// Consumed by an interactive move or resize
    Grabbed,
    /// Delivered to a popup of the seat's grab stack
    Popup(SurfaceId),
    /// The popup stack was dismissed and the event swallowed
    Dismissed,
    /// The popup stack was dismissed; normal routing sees the event too
    Passthrough,
    /// Keyboard event for the seat's activated window
    Focused(SurfaceId),
    /// Nothing in the shell claimed the event
    Normal,
}

impl InputRoute {
    /// Whether the dispatcher's own focus routing should handle the event
    pub fn reaches_normal_routing(&self) -> bool {
        matches!(self, InputRoute::Passthrough | InputRoute::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unclaimed_events_reach_normal_routing() {
        assert!(InputRoute::Normal.reaches_normal_routing());
        assert!(InputRoute::Passthrough.reaches_normal_routing());
        assert!(!InputRoute::Dismissed.reaches_normal_routing());
        assert!(!InputRoute::Grabbed.reaches_normal_routing());
    }
}
