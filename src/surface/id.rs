//! Type-safe handles for surfaces and clients
//!
//! Surfaces are addressed by an arena slot plus a generation. Destroying a
//! surface bumps the slot's generation, so every copy of the old handle that
//! is still held somewhere stops resolving instead of aliasing whatever
//! surface reuses the slot.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generation-checked handle to a surface in the [`SurfaceRegistry`](super::SurfaceRegistry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SurfaceId {
    index: u32,
    generation: u32,
}

impl SurfaceId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        SurfaceId { index, generation }
    }

    /// Arena slot of this handle
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Surface({}v{})", self.index, self.generation)
    }
}

/// Unique identifier for a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ClientId(NonZeroU64);

/// Starts at 1 to ensure NonZeroU64 is always valid
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ClientId {
    /// Generate a new unique client ID
    pub fn next() -> Self {
        let id = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        // Safety: We start at 1 and only increment, so this is never zero
        ClientId(NonZeroU64::new(id).expect("Client ID counter overflow"))
    }

    /// Returns None if the value is zero
    pub fn from_raw(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(ClientId)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client({})", self.0)
    }
}
