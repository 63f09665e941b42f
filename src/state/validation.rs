//! State validation module for ensuring consistency across the shell
//!
//! This module provides validation to ensure that:
//! - Popup grab stacks hold live popups nested parent-to-child
//! - Role parents of live surfaces are live themselves
//! - Interactive grabs and seat activation point at live windows
//! - No popup sits on more than one seat's stack

use crate::{
    input::{SeatId, SeatManager},
    shell::{InteractiveGrabs, PopupGrabManager, Role},
    state::ShellState,
    surface::{SurfaceId, SurfaceRegistry},
};
use std::collections::HashMap;

/// Errors that can occur during state validation
#[derive(Debug)]
pub enum ValidationError {
    /// A stack entry is dead, dismissed or not a popup
    StackHoldsInvalidPopup { seat: SeatId, popup: SurfaceId },
    /// A stack entry is not a child of the entry below it
    StackNotNested {
        seat: SeatId,
        popup: SurfaceId,
        below: SurfaceId,
    },
    /// The same popup is grabbed by several seats
    PopupInMultipleStacks { popup: SurfaceId, seats: Vec<SeatId> },
    /// A live surface names a parent that is gone
    DanglingParent { surface: SurfaceId, parent: SurfaceId },
    /// An interactive grab targets a surface that is gone
    GrabOnDeadSurface { seat: SeatId, surface: SurfaceId },
    /// A seat has a dead or non-window surface activated
    InvalidActivation { seat: SeatId, surface: SurfaceId },
}

/// Result type for validation operations
pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that every stack is a chain of live, nested popups
pub fn validate_popup_stacks(
    popups: &PopupGrabManager,
    registry: &SurfaceRegistry,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut locations: HashMap<SurfaceId, Vec<SeatId>> = HashMap::new();

    for (seat, stack) in popups.stacks() {
        let mut below: Option<SurfaceId> = None;
        for entry in stack.entries() {
            locations.entry(entry.surface).or_default().push(seat);

            let popup = registry
                .get(entry.surface)
                .filter(|s| !s.destroy_pending)
                .and_then(|s| s.role.popup())
                .filter(|p| !p.dismissed);
            let Some(popup) = popup else {
                errors.push(ValidationError::StackHoldsInvalidPopup {
                    seat,
                    popup: entry.surface,
                });
                below = Some(entry.surface);
                continue;
            };

            if let Some(below) = below {
                if popup.parent != below {
                    errors.push(ValidationError::StackNotNested {
                        seat,
                        popup: entry.surface,
                        below,
                    });
                }
            }
            below = Some(entry.surface);
        }
    }

    for (popup, seats) in locations {
        if seats.len() > 1 {
            errors.push(ValidationError::PopupInMultipleStacks { popup, seats });
        }
    }

    into_result(errors)
}

/// Validate that no live surface hangs off a dead parent
///
/// Dismissed popups are inert and may outlive their parent until the client
/// destroys them.
pub fn validate_role_parents(registry: &SurfaceRegistry) -> ValidationResult {
    let mut errors = Vec::new();

    for surface in registry.iter().filter(|s| !s.destroy_pending) {
        if let Role::Popup(popup) = &surface.role {
            if popup.dismissed {
                continue;
            }
        }
        let Some(parent) = surface.role.parent() else {
            continue;
        };
        if !registry.is_alive(parent) {
            errors.push(ValidationError::DanglingParent {
                surface: surface.id,
                parent,
            });
        }
    }

    into_result(errors)
}

/// Validate that grabs and activation only reference live windows
pub fn validate_seat_targets(
    grabs: &InteractiveGrabs,
    seats: &SeatManager,
    registry: &SurfaceRegistry,
) -> ValidationResult {
    let mut errors = Vec::new();

    for grab in grabs.iter() {
        if !registry.is_alive(grab.surface) {
            errors.push(ValidationError::GrabOnDeadSurface {
                seat: grab.seat,
                surface: grab.surface,
            });
        }
    }

    for seat in seats.iter() {
        let Some(surface) = seat.activated else {
            continue;
        };
        let is_window = registry
            .get(surface)
            .filter(|s| !s.destroy_pending)
            .is_some_and(|s| s.role.shell().is_some());
        if !is_window {
            errors.push(ValidationError::InvalidActivation {
                seat: seat.id,
                surface,
            });
        }
    }

    into_result(errors)
}

/// Full state validation combining all consistency checks
pub fn validate_full_state(state: &ShellState) -> ValidationResult {
    let mut all_errors = Vec::new();

    if let Err(errors) = validate_popup_stacks(state.popups(), state.registry()) {
        all_errors.extend(errors);
    }

    if let Err(errors) = validate_role_parents(state.registry()) {
        all_errors.extend(errors);
    }

    if let Err(errors) = validate_seat_targets(state.grabs(), state.seats(), state.registry()) {
        all_errors.extend(errors);
    }

    into_result(all_errors)
}

#[cfg(debug_assertions)]
/// Debug helper to log validation errors
pub fn log_validation_errors(errors: &[ValidationError]) {
    for error in errors {
        tracing::error!("State validation error: {:?}", error);
    }
}
