//! Role assignment
//!
//! A role is granted once and stays until the surface is destroyed. Parent
//! links are checked when the role is granted: the parent must be alive,
//! must itself have a suitable role, and the resulting chain must be acyclic
//! and no deeper than the configured limit.

use super::{LayerSurface, PopupSurface, Role, RoleKind, RoleRequest, ShellSurface};
use crate::error::{ParentError, RoleError};
use crate::surface::{SurfaceId, SurfaceRegistry};
use tracing::{debug, warn};

/// Default bound on parent chain length
pub const DEFAULT_MAX_PARENT_DEPTH: usize = 64;

/// Walk from `start` towards the root, returning every surface visited
///
/// The walk stops at a role without a parent, at a handle that no longer
/// resolves, or after `limit` steps.
pub fn parent_chain(registry: &SurfaceRegistry, start: SurfaceId, limit: usize) -> Vec<SurfaceId> {
    let mut chain = Vec::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if chain.len() >= limit {
            break;
        }
        let Some(surface) = registry.get(id) else {
            break;
        };
        chain.push(id);
        current = surface.role.parent();
    }
    chain
}

fn validate_parent(
    registry: &SurfaceRegistry,
    surface: SurfaceId,
    parent: SurfaceId,
    kind: RoleKind,
    max_depth: usize,
) -> Result<(), ParentError> {
    if parent == surface {
        return Err(ParentError::SelfParent);
    }
    if !registry.is_alive(parent) {
        return Err(ParentError::Dead);
    }
    let parent_kind = query_role(registry, parent);
    match (kind, parent_kind) {
        (_, RoleKind::None) => return Err(ParentError::NoRole),
        (RoleKind::Transient, k) if !k.is_window() => return Err(ParentError::WrongKind),
        _ => {}
    }

    // one extra step so an over-long chain is observable
    let chain = parent_chain(registry, parent, max_depth + 1);
    if chain.contains(&surface) {
        return Err(ParentError::Cycle);
    }
    if chain.len() > max_depth {
        return Err(ParentError::TooDeep);
    }
    Ok(())
}

/// Grant `request` to `surface`
///
/// All checks run before anything is written, so a failed assignment leaves
/// the registry untouched. Parent problems are reported ahead of an existing
/// role, which makes any attempt to close a cycle fail with `InvalidParent`.
pub fn assign_role(
    registry: &mut SurfaceRegistry,
    surface: SurfaceId,
    request: RoleRequest,
    max_depth: usize,
    popup_sequence: u64,
) -> Result<RoleKind, RoleError> {
    if !registry.is_alive(surface) {
        return Err(RoleError::SurfaceGone(surface));
    }

    if let Some(parent) = request.parent() {
        validate_parent(registry, surface, parent, request.kind(), max_depth).map_err(
            |reason| {
                warn!("Refusing {} role for {surface}: {reason}", request.kind().name());
                RoleError::InvalidParent {
                    surface,
                    parent,
                    reason,
                }
            },
        )?;
    }

    let existing = query_role(registry, surface);
    if existing != RoleKind::None {
        return Err(RoleError::AlreadyHasRole { surface, existing });
    }

    let role = match request {
        RoleRequest::Toplevel => Role::Toplevel(ShellSurface::new((0, 0).into())),
        RoleRequest::Transient { parent, offset } => {
            let anchor = registry
                .get(parent)
                .and_then(|p| p.role.shell())
                .map(|shell| shell.position)
                .unwrap_or_default();
            Role::Transient {
                parent: Some(parent),
                offset,
                shell: ShellSurface::new(anchor + offset),
            }
        }
        RoleRequest::Popup { parent, geometry } => Role::Popup(PopupSurface {
            parent,
            geometry,
            grab_serial: None,
            sequence: popup_sequence,
            configure_serial: None,
            dismissed: false,
        }),
        RoleRequest::Panel {
            output,
            edge,
            exclusive_zone,
        } => Role::Panel(LayerSurface {
            output,
            edge: Some(edge),
            exclusive_zone,
            position: (0, 0).into(),
        }),
        RoleRequest::Overlay { output, position } => Role::Overlay(LayerSurface {
            output,
            edge: None,
            exclusive_zone: 0,
            position,
        }),
    };

    let kind = role.kind();
    let Some(target) = registry.get_mut(surface) else {
        return Err(RoleError::SurfaceGone(surface));
    };
    target.role = role;
    debug!("{surface} is now a {}", kind.name());
    Ok(kind)
}

/// Role currently held by `surface`, `None` for dead handles
pub fn query_role(registry: &SurfaceRegistry, surface: SurfaceId) -> RoleKind {
    registry
        .get(surface)
        .map(|s| s.role.kind())
        .unwrap_or(RoleKind::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ClientId;
    use smithay::utils::Rectangle;

    fn registry_with(n: usize) -> (SurfaceRegistry, Vec<SurfaceId>) {
        let mut registry = SurfaceRegistry::new();
        let client = ClientId::next();
        let ids = (0..n).map(|_| registry.create(client)).collect();
        (registry, ids)
    }

    fn assign(registry: &mut SurfaceRegistry, id: SurfaceId, req: RoleRequest) -> Result<RoleKind, RoleError> {
        assign_role(registry, id, req, DEFAULT_MAX_PARENT_DEPTH, 0)
    }

    #[test]
    fn role_is_granted_once() {
        let (mut registry, ids) = registry_with(1);
        assert_eq!(assign(&mut registry, ids[0], RoleRequest::Toplevel), Ok(RoleKind::Toplevel));
        assert_eq!(
            assign(&mut registry, ids[0], RoleRequest::Toplevel),
            Err(RoleError::AlreadyHasRole {
                surface: ids[0],
                existing: RoleKind::Toplevel
            })
        );
        assert_eq!(query_role(&registry, ids[0]), RoleKind::Toplevel);
    }

    #[test]
    fn transient_requires_live_window_parent() {
        let (mut registry, ids) = registry_with(3);
        let err = assign(
            &mut registry,
            ids[1],
            RoleRequest::Transient {
                parent: ids[0],
                offset: (0, 0).into(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RoleError::InvalidParent {
                reason: ParentError::NoRole,
                ..
            }
        ));

        assign(&mut registry, ids[0], RoleRequest::Toplevel).unwrap();
        registry.remove(ids[0]);
        let err = assign(
            &mut registry,
            ids[1],
            RoleRequest::Transient {
                parent: ids[0],
                offset: (0, 0).into(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RoleError::InvalidParent {
                reason: ParentError::Dead,
                ..
            }
        ));
        // failed attempts leave no role behind
        assert_eq!(query_role(&registry, ids[1]), RoleKind::None);
    }

    #[test]
    fn self_parent_is_rejected() {
        let (mut registry, ids) = registry_with(1);
        let err = assign(
            &mut registry,
            ids[0],
            RoleRequest::Popup {
                parent: ids[0],
                geometry: Rectangle::default(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RoleError::InvalidParent {
                reason: ParentError::SelfParent,
                ..
            }
        ));
    }

    #[test]
    fn closing_a_cycle_reports_invalid_parent() {
        let (mut registry, ids) = registry_with(2);
        assign(&mut registry, ids[0], RoleRequest::Toplevel).unwrap();
        assign(
            &mut registry,
            ids[1],
            RoleRequest::Transient {
                parent: ids[0],
                offset: (10, 10).into(),
            },
        )
        .unwrap();
        let err = assign(
            &mut registry,
            ids[0],
            RoleRequest::Transient {
                parent: ids[1],
                offset: (0, 0).into(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            RoleError::InvalidParent {
                surface: ids[0],
                parent: ids[1],
                reason: ParentError::Cycle
            }
        );
    }

    #[test]
    fn transient_starts_at_parent_offset() {
        let (mut registry, ids) = registry_with(2);
        assign(&mut registry, ids[0], RoleRequest::Toplevel).unwrap();
        registry
            .get_mut(ids[0])
            .and_then(|s| s.role.shell_mut())
            .unwrap()
            .position = (100, 50).into();
        assign(
            &mut registry,
            ids[1],
            RoleRequest::Transient {
                parent: ids[0],
                offset: (20, 30).into(),
            },
        )
        .unwrap();
        let shell = registry.get(ids[1]).and_then(|s| s.role.shell()).unwrap();
        assert_eq!(shell.position, (120, 80).into());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let limit = 4;
        let (mut registry, ids) = registry_with(limit + 2);
        assign_role(&mut registry, ids[0], RoleRequest::Toplevel, limit, 0).unwrap();
        for i in 1..=limit {
            let result = assign_role(
                &mut registry,
                ids[i],
                RoleRequest::Transient {
                    parent: ids[i - 1],
                    offset: (0, 0).into(),
                },
                limit,
                0,
            );
            assert!(result.is_ok(), "depth {i} should be accepted");
        }
        let err = assign_role(
            &mut registry,
            ids[limit + 1],
            RoleRequest::Transient {
                parent: ids[limit],
                offset: (0, 0).into(),
            },
            limit,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RoleError::InvalidParent {
                reason: ParentError::TooDeep,
                ..
            }
        ));
    }
}
