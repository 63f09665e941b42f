//! Role-agnostic surface state
//!
//! A surface double-buffers its state: requests from the client land in
//! `pending` and a commit moves all of it into `current` in one step.

mod id;
mod registry;

pub use id::{ClientId, SurfaceId};
pub use registry::{CommitOutcome, SurfaceRegistry};

use crate::shell::Role;
use crate::utils::wire;
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle, Size};

/// Opaque identifier of a client buffer, owned by the external renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(pub u64);

/// A client buffer as far as the shell cares: who it is and how big it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    pub id: BufferId,
    #[serde(with = "wire::size")]
    pub size: Size<i32, Logical>,
}

/// Buffer change queued by an attach request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAssignment {
    /// A null buffer was attached; the surface unmaps on commit
    Removed,
    NewBuffer(Buffer),
}

/// One side of the double-buffered surface state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceState {
    /// Only meaningful on the pending side; `None` leaves the buffer untouched
    pub buffer_assignment: Option<BufferAssignment>,
    pub buffer: Option<Buffer>,
    pub damage: Vec<Rectangle<i32, Logical>>,
    /// Surface-local input region, `None` means the whole surface
    pub input_region: Option<Vec<Rectangle<i32, Logical>>>,
}

/// A client surface
#[derive(Debug)]
pub struct Surface {
    pub id: SurfaceId,
    pub client: ClientId,
    pub role: Role,
    pub pending: SurfaceState,
    pub current: SurfaceState,
    /// A non-null buffer is committed and has not been detached since
    pub mapped: bool,
    /// Set while destruction notifies the other components
    pub destroy_pending: bool,
}

impl Surface {
    pub fn new(id: SurfaceId, client: ClientId) -> Self {
        Self {
            id,
            client,
            role: Role::None,
            pending: SurfaceState::default(),
            current: SurfaceState::default(),
            mapped: false,
            destroy_pending: false,
        }
    }

    /// Logical size of the current buffer
    pub fn size(&self) -> Size<i32, Logical> {
        self.current.buffer.map(|b| b.size).unwrap_or_default()
    }

    /// Whether a surface-local point accepts input
    pub fn accepts_input_at(&self, local: Point<f64, Logical>) -> bool {
        let bounds = Rectangle::from_size(self.size());
        if !bounds.to_f64().contains(local) {
            return false;
        }
        match &self.current.input_region {
            None => true,
            Some(region) => region.iter().any(|rect| rect.to_f64().contains(local)),
        }
    }
}
