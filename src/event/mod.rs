//! Event system for tether
//!
//! Everything the shell tells the outside world is an explicit event object
//! appended to one ordered queue: renderer notifications, messages for
//! clients, seat grab changes and activation changes. Nothing calls back
//! into the shell while a handler runs; consumers drain the queue after the
//! handler returns.
//!
//! Compositor policy that must not run inside the request that triggered it
//! is queued separately as a [`DeferredAction`] and executed by the next
//! dispatch turn.

use crate::input::SeatId;
use crate::shell::{GrabKind, WindowState};
use crate::surface::{BufferId, ClientId, SurfaceId};
use crate::utils::wire;
use serde::Serialize;
use smithay::utils::{Logical, Rectangle, Serial, Size};
use std::collections::VecDeque;

/// Notifications for the external renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// New content is current; `damage` is surface-local
    SurfaceCommitted {
        surface: SurfaceId,
        #[serde(with = "wire::rectangles")]
        damage: Vec<Rectangle<i32, Logical>>,
        released: Option<BufferId>,
    },
    SurfaceMapped { surface: SurfaceId },
    SurfaceUnmapped { surface: SurfaceId },
    /// Global geometry changed
    GeometryChanged {
        surface: SurfaceId,
        #[serde(with = "wire::rectangle")]
        geometry: Rectangle<i32, Logical>,
    },
    /// A window entered a new state; minimized windows are not drawn
    WindowStateChanged {
        surface: SurfaceId,
        state: WindowState,
    },
    SurfaceDestroyed { surface: SurfaceId },
}

/// Messages addressed to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Configure {
        surface: SurfaceId,
        #[serde(with = "wire::serial")]
        serial: Serial,
        #[serde(with = "wire::option_size")]
        size: Option<Size<i32, Logical>>,
        state: WindowState,
        activated: bool,
        resizing: bool,
    },
    /// Placement of a popup relative to its parent
    PopupConfigure {
        surface: SurfaceId,
        #[serde(with = "wire::serial")]
        serial: Serial,
        #[serde(with = "wire::rectangle")]
        geometry: Rectangle<i32, Logical>,
    },
    PopupDone { surface: SurfaceId },
    /// The client broke the protocol and is being disconnected
    ProtocolError { client: ClientId, message: String },
}

/// Changes to seat input routing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SeatEvent {
    /// Pointer input is owned by an interactive grab
    PointerGrabbed {
        seat: SeatId,
        surface: SurfaceId,
        kind: GrabKind,
    },
    /// Pointer input returns to normal routing
    PointerGrabReleased { seat: SeatId, surface: SurfaceId },
    PopupGrabStarted { seat: SeatId, popup: SurfaceId },
    PopupGrabEnded { seat: SeatId },
}

/// Keyboard activation changes; a deactivation always precedes the
/// activation that caused it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivationEvent {
    Deactivated { seat: SeatId, surface: SurfaceId },
    Activated { seat: SeatId, surface: SurfaceId },
}

/// Combined event type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ShellEvent {
    Render(RenderEvent),
    Client(ClientEvent),
    Seat(SeatEvent),
    Activation(ActivationEvent),
}

/// Compositor policy executed on the next dispatch turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Output geometry changed under a fullscreen window
    Unfullscreen { surface: SurfaceId },
    /// Re-derive output usable areas from panel exclusive zones
    ArrangePanels,
}

/// Event handler trait
pub trait EventHandler {
    /// Handle an event
    fn handle_event(&mut self, event: &ShellEvent);
}

/// Ordered event queue with optional handlers
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<ShellEvent>,
    deferred: VecDeque<DeferredAction>,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queue.len())
            .field("deferred", &self.deferred.len())
            .field("handlers_count", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event handler
    pub fn register_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Append an event to the queue
    pub fn emit(&mut self, event: ShellEvent) {
        tracing::trace!("Queued {:?}", event);
        self.queue.push_back(event);
    }

    pub fn emit_render(&mut self, event: RenderEvent) {
        self.emit(ShellEvent::Render(event));
    }

    pub fn emit_client(&mut self, event: ClientEvent) {
        self.emit(ShellEvent::Client(event));
    }

    pub fn emit_seat(&mut self, event: SeatEvent) {
        self.emit(ShellEvent::Seat(event));
    }

    pub fn emit_activation(&mut self, event: ActivationEvent) {
        self.emit(ShellEvent::Activation(event));
    }

    pub fn defer(&mut self, action: DeferredAction) {
        if !self.deferred.contains(&action) {
            self.deferred.push_back(action);
        }
    }

    pub fn take_deferred(&mut self) -> Option<DeferredAction> {
        self.deferred.pop_front()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Remove and return every queued event in order
    pub fn drain(&mut self) -> Vec<ShellEvent> {
        self.queue.drain(..).collect()
    }

    /// Deliver every queued event to the registered handlers
    pub fn flush(&mut self) {
        while let Some(event) = self.queue.pop_front() {
            for handler in &mut self.handlers {
                handler.handle_event(&event);
            }
        }
    }

    pub fn pending(&self) -> impl DoubleEndedIterator<Item = &ShellEvent> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
