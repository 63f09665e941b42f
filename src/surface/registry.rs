//! Surface registry: the single source of truth for surface liveness

use super::{BufferAssignment, BufferId, ClientId, Surface, SurfaceId};
use smithay::utils::{Logical, Rectangle, Size};
use tracing::{debug, trace};

#[derive(Debug)]
struct Slot {
    generation: u32,
    surface: Option<Surface>,
}

/// What a commit changed, so callers can drive role state machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitOutcome {
    /// Buffer replaced by this commit that the renderer may release
    pub released: Option<BufferId>,
    pub newly_mapped: bool,
    pub unmapped: bool,
    pub size: Size<i32, Logical>,
}

/// Arena of live surfaces addressed by generation-checked [`SurfaceId`]s
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh, role-less surface for `client`
    pub fn create(&mut self, client: ClientId) -> SurfaceId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                let id = SurfaceId::new(index, slot.generation);
                slot.surface = Some(Surface::new(id, client));
                id
            }
            None => {
                let index = self.slots.len() as u32;
                let id = SurfaceId::new(index, 1);
                self.slots.push(Slot {
                    generation: 1,
                    surface: Some(Surface::new(id, client)),
                });
                id
            }
        };
        self.live += 1;
        debug!("Created {id} for {client}");
        id
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.surface.as_ref())
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.surface.as_mut())
    }

    /// Live and not in the middle of being torn down
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        self.get(id).is_some_and(|s| !s.destroy_pending)
    }

    /// Queue a buffer change for the next commit
    pub fn attach(&mut self, id: SurfaceId, assignment: BufferAssignment) -> bool {
        let Some(surface) = self.get_mut(id) else {
            return false;
        };
        surface.pending.buffer_assignment = Some(assignment);
        true
    }

    pub fn damage(&mut self, id: SurfaceId, rect: Rectangle<i32, Logical>) -> bool {
        let Some(surface) = self.get_mut(id) else {
            return false;
        };
        surface.pending.damage.push(rect);
        true
    }

    pub fn set_input_region(&mut self, id: SurfaceId, region: Option<Vec<Rectangle<i32, Logical>>>) -> bool {
        let Some(surface) = self.get_mut(id) else {
            return false;
        };
        surface.pending.input_region = region;
        true
    }

    /// Apply the pending state in one step
    ///
    /// Returns `None` when the surface is gone. Nothing here can fail
    /// half-way, so either all pending state becomes current or none does.
    pub fn commit(&mut self, id: SurfaceId) -> Option<CommitOutcome> {
        let surface = self.get_mut(id)?;
        let mut outcome = CommitOutcome::default();

        match surface.pending.buffer_assignment.take() {
            Some(BufferAssignment::NewBuffer(buffer)) => {
                outcome.released = surface
                    .current
                    .buffer
                    .filter(|old| old.id != buffer.id)
                    .map(|old| old.id);
                surface.current.buffer = Some(buffer);
                if !surface.mapped {
                    surface.mapped = true;
                    outcome.newly_mapped = true;
                }
            }
            Some(BufferAssignment::Removed) => {
                outcome.released = surface.current.buffer.take().map(|old| old.id);
                if surface.mapped {
                    surface.mapped = false;
                    outcome.unmapped = true;
                }
            }
            None => {}
        }

        surface
            .current
            .damage
            .extend(surface.pending.damage.drain(..));
        surface.current.input_region = surface.pending.input_region.clone();
        outcome.size = surface.size();

        trace!(
            "{id} committed: size {:?}, mapped {}",
            outcome.size,
            surface.mapped
        );
        Some(outcome)
    }

    /// Hand the accumulated damage to the renderer
    pub fn take_damage(&mut self, id: SurfaceId) -> Vec<Rectangle<i32, Logical>> {
        self.get_mut(id)
            .map(|s| std::mem::take(&mut s.current.damage))
            .unwrap_or_default()
    }

    /// Flag a surface as being torn down; it stops counting as alive
    pub fn mark_destroy_pending(&mut self, id: SurfaceId) -> bool {
        match self.get_mut(id) {
            Some(surface) if !surface.destroy_pending => {
                surface.destroy_pending = true;
                true
            }
            _ => false,
        }
    }

    /// Free the slot and invalidate every outstanding handle to it
    pub fn remove(&mut self, id: SurfaceId) -> Option<Surface> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let surface = slot.surface.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(id.index());
        self.live -= 1;
        debug!("Removed {id} from registry");
        Some(surface)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.slots.iter().filter_map(|slot| slot.surface.as_ref())
    }

    pub fn surfaces_of(&self, client: ClientId) -> Vec<SurfaceId> {
        self.iter()
            .filter(|s| s.client == client)
            .map(|s| s.id)
            .collect()
    }

    /// Surfaces whose role names `parent` as their parent
    pub fn children_of(&self, parent: SurfaceId) -> Vec<SurfaceId> {
        self.iter()
            .filter(|s| s.role.parent() == Some(parent))
            .map(|s| s.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
