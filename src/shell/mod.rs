//! Shell roles and the state machines built on top of them
//!
//! A surface becomes a window, popup or panel by being granted a [`Role`].
//! The role carries all role-specific state; dropping the surface drops it.

mod grabs;
mod popup;
mod resize_state;
pub mod role;
mod toplevel;

pub use grabs::{GrabHandle, GrabKind, InteractiveGrab, InteractiveGrabs, ResizeEdge};
pub use popup::{OutsideInput, PopupGrabEntry, PopupGrabManager, PopupStack};
pub use resize_state::{ResizeData, ResizeState};
pub use toplevel::{
    AckOutcome, CommitTransition, Configure, MapState, ShellSurface, WindowState,
};

use crate::event::{ClientEvent, EventBus, RenderEvent};
use crate::output::{OutputId, OutputLayout};
use crate::surface::{SurfaceId, SurfaceRegistry};
use crate::utils::SerialCounter;
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle, Serial, Size};
use tracing::trace;

/// Behavioral category of a surface, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    #[default]
    None,
    Toplevel,
    Transient,
    Popup,
    Panel,
    Overlay,
}

impl RoleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RoleKind::None => "none",
            RoleKind::Toplevel => "toplevel",
            RoleKind::Transient => "transient",
            RoleKind::Popup => "popup",
            RoleKind::Panel => "panel",
            RoleKind::Overlay => "overlay",
        }
    }

    /// Roles that own a [`ShellSurface`]
    pub fn is_window(&self) -> bool {
        matches!(self, RoleKind::Toplevel | RoleKind::Transient)
    }
}

/// Edge of an output a panel docks against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelEdge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Popup role payload
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSurface {
    pub parent: SurfaceId,
    /// Placement relative to the parent's origin
    pub geometry: Rectangle<i32, Logical>,
    /// Serial of the input event that triggered the grab, once grabbed
    pub grab_serial: Option<Serial>,
    /// Creation order across all popups, used to enforce grab nesting
    pub sequence: u64,
    /// Serial of the placement configure sent on the first commit
    pub configure_serial: Option<Serial>,
    /// `popup_done` has been sent; the popup is inert until destroyed
    pub dismissed: bool,
}

/// Panel and overlay role payload
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSurface {
    pub output: OutputId,
    /// Panels dock against an edge; overlays float at `position`
    pub edge: Option<PanelEdge>,
    /// Space reserved along `edge`, zero or negative reserves nothing
    pub exclusive_zone: i32,
    /// Output-local placement of an overlay
    pub position: Point<i32, Logical>,
}

/// Role of a surface with its role-specific state
#[derive(Debug, Default)]
pub enum Role {
    #[default]
    None,
    Toplevel(ShellSurface),
    Transient {
        /// `None` once the parent is destroyed; the window then stands alone
        parent: Option<SurfaceId>,
        /// Position relative to the parent's top-left
        offset: Point<i32, Logical>,
        shell: ShellSurface,
    },
    Popup(PopupSurface),
    Panel(LayerSurface),
    Overlay(LayerSurface),
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::None => RoleKind::None,
            Role::Toplevel(_) => RoleKind::Toplevel,
            Role::Transient { .. } => RoleKind::Transient,
            Role::Popup(_) => RoleKind::Popup,
            Role::Panel(_) => RoleKind::Panel,
            Role::Overlay(_) => RoleKind::Overlay,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Role::None)
    }

    pub fn parent(&self) -> Option<SurfaceId> {
        match self {
            Role::Transient { parent, .. } => *parent,
            Role::Popup(popup) => Some(popup.parent),
            _ => None,
        }
    }

    pub fn shell(&self) -> Option<&ShellSurface> {
        match self {
            Role::Toplevel(shell) | Role::Transient { shell, .. } => Some(shell),
            _ => None,
        }
    }

    pub fn shell_mut(&mut self) -> Option<&mut ShellSurface> {
        match self {
            Role::Toplevel(shell) | Role::Transient { shell, .. } => Some(shell),
            _ => None,
        }
    }

    pub fn popup(&self) -> Option<&PopupSurface> {
        match self {
            Role::Popup(popup) => Some(popup),
            _ => None,
        }
    }

    pub fn popup_mut(&mut self) -> Option<&mut PopupSurface> {
        match self {
            Role::Popup(popup) => Some(popup),
            _ => None,
        }
    }

    pub fn layer(&self) -> Option<&LayerSurface> {
        match self {
            Role::Panel(layer) | Role::Overlay(layer) => Some(layer),
            _ => None,
        }
    }
}

/// Role grant as requested by a client
#[derive(Debug, Clone, PartialEq)]
pub enum RoleRequest {
    Toplevel,
    Transient {
        parent: SurfaceId,
        offset: Point<i32, Logical>,
    },
    Popup {
        parent: SurfaceId,
        geometry: Rectangle<i32, Logical>,
    },
    Panel {
        output: OutputId,
        edge: PanelEdge,
        exclusive_zone: i32,
    },
    Overlay {
        output: OutputId,
        position: Point<i32, Logical>,
    },
}

impl RoleRequest {
    pub fn kind(&self) -> RoleKind {
        match self {
            RoleRequest::Toplevel => RoleKind::Toplevel,
            RoleRequest::Transient { .. } => RoleKind::Transient,
            RoleRequest::Popup { .. } => RoleKind::Popup,
            RoleRequest::Panel { .. } => RoleKind::Panel,
            RoleRequest::Overlay { .. } => RoleKind::Overlay,
        }
    }

    pub fn parent(&self) -> Option<SurfaceId> {
        match self {
            RoleRequest::Transient { parent, .. } | RoleRequest::Popup { parent, .. } => {
                Some(*parent)
            }
            _ => None,
        }
    }
}

/// Mutable view of the shell state handed to the grab controllers
///
/// Holding disjoint borrows lets a controller touch the registry and emit
/// events while the shell state still owns the controller itself.
pub struct ShellContext<'a> {
    pub registry: &'a mut SurfaceRegistry,
    pub outputs: &'a OutputLayout,
    pub serials: &'a mut SerialCounter,
    pub events: &'a mut EventBus,
    /// Compositor-wide lower bound for interactive resizes
    pub min_size: Size<i32, Logical>,
    pub max_parent_depth: usize,
}

impl ShellContext<'_> {
    /// Send a configure to a toplevel or transient; `None` for other roles
    pub fn send_configure(
        &mut self,
        surface: SurfaceId,
        size: Option<Size<i32, Logical>>,
        placement: Option<Point<i32, Logical>>,
    ) -> Option<Serial> {
        let shell = self.registry.get_mut(surface)?.role.shell_mut()?;
        let serial = self.serials.next_serial();
        let configure = shell.prepare_configure(serial, size, placement);
        self.events.emit_client(ClientEvent::Configure {
            surface,
            serial,
            size,
            state: configure.state,
            activated: configure.activated,
            resizing: configure.resizing,
        });
        Some(serial)
    }

    /// Move a window and drag its transient children along
    pub fn set_window_position(&mut self, surface: SurfaceId, position: Point<i32, Logical>) {
        let Some(shell) = self
            .registry
            .get_mut(surface)
            .and_then(|s| s.role.shell_mut())
        else {
            return;
        };
        if shell.position == position {
            return;
        }
        shell.position = position;
        let geometry = shell.geometry();
        self.events.emit_render(RenderEvent::GeometryChanged { surface, geometry });
        self.reposition_transients(surface);
    }

    /// Place every transient child of `anchor` at its recorded offset
    pub fn reposition_transients(&mut self, anchor: SurfaceId) {
        let mut work = vec![(anchor, 0usize)];
        while let Some((parent, depth)) = work.pop() {
            if depth > self.max_parent_depth {
                break;
            }
            let Some(origin) = self
                .registry
                .get(parent)
                .and_then(|s| s.role.shell())
                .map(|shell| shell.position)
            else {
                continue;
            };
            for child in self.registry.children_of(parent) {
                let Some(surface) = self.registry.get_mut(child) else {
                    continue;
                };
                if let Role::Transient { offset, shell, .. } = &mut surface.role {
                    let position = origin + *offset;
                    if shell.position != position {
                        shell.position = position;
                        let geometry = shell.geometry();
                        trace!("{child} follows {parent} to {:?}", position);
                        self.events
                            .emit_render(RenderEvent::GeometryChanged { surface: child, geometry });
                    }
                    work.push((child, depth + 1));
                }
            }
        }
    }

    /// Global geometry of any surface with a role
    pub fn global_geometry(&self, surface: SurfaceId) -> Option<Rectangle<i32, Logical>> {
        global_geometry(self.registry, self.outputs, surface, self.max_parent_depth)
    }
}

/// Global geometry of `surface`
///
/// Popups are placed relative to their parent, so the lookup walks up the
/// parent chain; `limit` bounds the walk.
pub fn global_geometry(
    registry: &SurfaceRegistry,
    outputs: &OutputLayout,
    surface: SurfaceId,
    limit: usize,
) -> Option<Rectangle<i32, Logical>> {
    let target = registry.get(surface)?;
    let size = target.size();
    match &target.role {
        Role::None => None,
        Role::Toplevel(shell) | Role::Transient { shell, .. } => Some(shell.geometry()),
        Role::Popup(popup) => {
            if limit == 0 {
                return None;
            }
            let parent = global_geometry(registry, outputs, popup.parent, limit - 1)?;
            let size = if size.is_empty() { popup.geometry.size } else { size };
            Some(Rectangle::new(parent.loc + popup.geometry.loc, size))
        }
        Role::Panel(layer) => {
            let out = outputs.get(layer.output)?.geometry;
            let loc = match layer.edge {
                Some(PanelEdge::Bottom) => (out.loc.x, out.loc.y + out.size.h - size.h),
                Some(PanelEdge::Right) => (out.loc.x + out.size.w - size.w, out.loc.y),
                Some(PanelEdge::Top) | Some(PanelEdge::Left) | None => (out.loc.x, out.loc.y),
            };
            Some(Rectangle::new(loc.into(), size))
        }
        Role::Overlay(layer) => {
            let out = outputs.get(layer.output)?.geometry;
            Some(Rectangle::new(out.loc + layer.position, size))
        }
    }
}
