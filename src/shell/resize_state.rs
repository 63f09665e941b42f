//! Resize settle state machine
//!
//! A resize does not end when the button is released: the client still has
//! to acknowledge the final configure and commit a buffer of the final size.
//! Until then a resize from the top or left edge has to keep moving the
//! window so the opposite edge stays put.

use super::ResizeEdge;
use smithay::utils::{Logical, Point, Serial, Size};

/// Data associated with a resize operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeData {
    /// The edges that are being resized
    pub edges: ResizeEdge,
    /// The window location before resize started
    pub initial_location: Point<i32, Logical>,
    /// The window size before resize started
    pub initial_size: Size<i32, Logical>,
}

impl ResizeData {
    /// Location that keeps the edges opposite to the grabbed ones fixed
    pub fn anchored_location(
        &self,
        current: Point<i32, Logical>,
        committed: Size<i32, Logical>,
    ) -> Point<i32, Logical> {
        let mut location = current;
        if self.edges.intersects(ResizeEdge::LEFT) {
            location.x = self.initial_location.x + (self.initial_size.w - committed.w);
        }
        if self.edges.intersects(ResizeEdge::TOP) {
            location.y = self.initial_location.y + (self.initial_size.h - committed.h);
        }
        location
    }
}

/// State of the resize operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeState {
    /// The surface is not being resized
    #[default]
    NotResizing,
    /// The surface is currently being resized
    Resizing(ResizeData),
    /// The grab ended; waiting for the client to ack the final configure
    WaitingForFinalAck(ResizeData, Serial),
    /// The final configure was acked; waiting for the matching commit
    WaitingForCommit(ResizeData),
}

impl ResizeState {
    pub fn is_resizing(&self) -> bool {
        !matches!(self, ResizeState::NotResizing)
    }

    pub fn data(&self) -> Option<&ResizeData> {
        match self {
            ResizeState::NotResizing => None,
            ResizeState::Resizing(data)
            | ResizeState::WaitingForFinalAck(data, _)
            | ResizeState::WaitingForCommit(data) => Some(data),
        }
    }

    /// Grab released after the final configure `serial` was sent
    pub fn finish(self, serial: Serial) -> ResizeState {
        match self {
            ResizeState::Resizing(data) => ResizeState::WaitingForFinalAck(data, serial),
            other => {
                tracing::error!("Invalid resize state on release: {other:?}");
                ResizeState::NotResizing
            }
        }
    }

    /// Client acknowledged `acked`
    pub fn ack(self, acked: Serial) -> ResizeState {
        match self {
            ResizeState::WaitingForFinalAck(data, serial) if acked.is_no_older_than(&serial) => {
                ResizeState::WaitingForCommit(data)
            }
            other => other,
        }
    }

    /// Client committed; returns the new state and the anchor data to apply
    pub fn commit(self) -> (ResizeState, Option<ResizeData>) {
        match self {
            ResizeState::Resizing(data) => (self, Some(data)),
            ResizeState::WaitingForFinalAck(data, _) => (self, Some(data)),
            ResizeState::WaitingForCommit(data) => (ResizeState::NotResizing, Some(data)),
            ResizeState::NotResizing => (self, None),
        }
    }
}
