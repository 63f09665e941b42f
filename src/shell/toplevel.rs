//! Toplevel and transient window state
//!
//! Size and state changes are negotiated in two phases. The compositor sends
//! a [`Configure`] tagged with a fresh serial, the client acknowledges it,
//! and the next commit makes the acknowledged state current. Minimizing is
//! the exception: it has no configure and applies at once.

use super::resize_state::ResizeState;
use crate::output::OutputId;
use crate::surface::CommitOutcome;
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle, Serial, Size};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Window state advertised to and acknowledged by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    #[default]
    Normal,
    Maximized,
    Fullscreen,
    Minimized,
}

/// Visibility of a shell surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapState {
    #[default]
    Unmapped,
    Mapped(WindowState),
}

/// A configure the compositor sent and may still be waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configure {
    pub serial: Serial,
    /// Suggested size, `None` lets the client pick
    pub size: Option<Size<i32, Logical>>,
    pub state: WindowState,
    pub activated: bool,
    pub resizing: bool,
    /// Where the compositor places the window once this configure lands
    pub placement: Option<Point<i32, Logical>>,
}

/// Result of acknowledging a configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Accepted(Configure),
    /// Not newer than the last acknowledged serial; ignored
    Stale,
}

/// What a commit changed on a shell surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitTransition {
    pub mapped: bool,
    pub unmapped: bool,
    pub state_changed: Option<(WindowState, WindowState)>,
    pub position_changed: bool,
}

/// Per-window state of a toplevel or transient
#[derive(Debug, Clone, Default)]
pub struct ShellSurface {
    /// Global position of the window's top-left corner
    pub position: Point<i32, Logical>,
    /// Size of the last committed buffer
    pub committed_size: Size<i32, Logical>,
    /// Size suggested by the last configure
    pub requested_size: Option<Size<i32, Logical>>,
    pub activated: bool,
    /// Client size hints, zero means unconstrained
    pub min_size: Size<i32, Logical>,
    pub max_size: Size<i32, Logical>,
    pub resize_state: ResizeState,
    /// Output a fullscreen request targeted
    pub fullscreen_output: Option<OutputId>,
    map_state: MapState,
    /// State advertised by the next configure
    pending_state: WindowState,
    /// Configures sent and not yet acknowledged, oldest first
    sent: VecDeque<Configure>,
    last_acked: Option<Serial>,
    /// Acknowledged configure waiting for its commit
    acked: Option<Configure>,
    /// Geometry to return to when leaving maximized or fullscreen
    saved_geometry: Option<Rectangle<i32, Logical>>,
    /// State to return to when un-minimized
    minimized_from: Option<WindowState>,
    initial_configure_sent: bool,
}

impl ShellSurface {
    pub fn new(position: Point<i32, Logical>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn map_state(&self) -> MapState {
        self.map_state
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.map_state, MapState::Mapped(_))
    }

    /// Current state, `Normal` while unmapped
    pub fn window_state(&self) -> WindowState {
        match self.map_state {
            MapState::Mapped(state) => state,
            MapState::Unmapped => WindowState::Normal,
        }
    }

    pub fn pending_state(&self) -> WindowState {
        self.pending_state
    }

    pub fn set_pending_state(&mut self, state: WindowState) {
        self.pending_state = state;
    }

    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        Rectangle::new(self.position, self.committed_size)
    }

    pub fn last_acked(&self) -> Option<Serial> {
        self.last_acked
    }

    pub fn initial_configure_sent(&self) -> bool {
        self.initial_configure_sent
    }

    pub fn has_pending_configure(&self) -> bool {
        !self.sent.is_empty() || self.acked.is_some()
    }

    pub fn saved_geometry(&self) -> Option<Rectangle<i32, Logical>> {
        self.saved_geometry
    }

    /// Remember where the window was before it filled an area
    pub fn save_geometry(&mut self) {
        if self.saved_geometry.is_none() {
            self.saved_geometry = Some(self.geometry());
        }
    }

    pub fn take_saved_geometry(&mut self) -> Option<Rectangle<i32, Logical>> {
        self.saved_geometry.take()
    }

    /// Record a configure about to be sent and return it
    pub fn prepare_configure(
        &mut self,
        serial: Serial,
        size: Option<Size<i32, Logical>>,
        placement: Option<Point<i32, Logical>>,
    ) -> Configure {
        let configure = Configure {
            serial,
            size,
            state: self.pending_state,
            activated: self.activated,
            resizing: matches!(self.resize_state, ResizeState::Resizing(_)),
            placement,
        };
        self.requested_size = size;
        self.initial_configure_sent = true;
        self.sent.push_back(configure);
        trace!("Prepared configure {:?}: {:?}", serial, configure);
        configure
    }

    /// Handle the client's acknowledgement of `serial`
    ///
    /// Returns `None` when no configure with that serial was ever sent.
    pub fn ack(&mut self, serial: Serial) -> Option<AckOutcome> {
        if let Some(last) = self.last_acked {
            if last.is_no_older_than(&serial) {
                debug!("Ignoring stale ack {:?}, last acked {:?}", serial, last);
                return Some(AckOutcome::Stale);
            }
        }
        let index = self.sent.iter().position(|c| c.serial == serial)?;
        // acking a configure implicitly acks everything sent before it
        let configure = self.sent.drain(..=index).last()?;
        self.last_acked = Some(serial);
        self.acked = Some(configure);
        self.resize_state = self.resize_state.ack(serial);
        Some(AckOutcome::Accepted(configure))
    }

    /// Apply a surface commit to the window state
    pub fn apply_commit(&mut self, outcome: &CommitOutcome) -> CommitTransition {
        let mut transition = CommitTransition::default();

        if outcome.unmapped {
            self.map_state = MapState::Unmapped;
            self.acked = None;
            self.resize_state = ResizeState::NotResizing;
            self.committed_size = Size::default();
            transition.unmapped = true;
            return transition;
        }

        if outcome.newly_mapped {
            self.map_state = MapState::Mapped(WindowState::Normal);
            transition.mapped = true;
        }
        self.committed_size = outcome.size;

        if let Some(configure) = self.acked.take() {
            if let MapState::Mapped(old) = self.map_state {
                if old != configure.state {
                    self.map_state = MapState::Mapped(configure.state);
                    transition.state_changed = Some((old, configure.state));
                }
            }
            if let Some(placement) = configure.placement {
                if placement != self.position {
                    self.position = placement;
                    transition.position_changed = true;
                }
            }
        }

        let (resize_state, anchor) = self.resize_state.commit();
        self.resize_state = resize_state;
        if let Some(data) = anchor {
            let location = data.anchored_location(self.position, self.committed_size);
            if location != self.position {
                self.position = location;
                transition.position_changed = true;
            }
        }

        transition
    }

    /// Minimize at once; returns false when there is nothing to do
    pub fn minimize(&mut self) -> bool {
        match self.map_state {
            MapState::Mapped(WindowState::Minimized) | MapState::Unmapped => false,
            MapState::Mapped(state) => {
                self.minimized_from = Some(state);
                self.map_state = MapState::Mapped(WindowState::Minimized);
                self.pending_state = WindowState::Minimized;
                true
            }
        }
    }

    /// Leave the minimized state, back to whatever it was before
    pub fn unminimize(&mut self) -> Option<WindowState> {
        if self.map_state != MapState::Mapped(WindowState::Minimized) {
            return None;
        }
        let state = self.minimized_from.take().unwrap_or_default();
        self.map_state = MapState::Mapped(state);
        self.pending_state = state;
        Some(state)
    }
}
