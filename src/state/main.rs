use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    error::{OptionExt, TetherError, TetherResult},
    event::{ActivationEvent, DeferredAction, EventBus, RenderEvent, ShellEvent},
    input::{SeatId, SeatManager},
    output::{Margins, OutputId, OutputLayout},
    shell::{
        global_geometry, role::parent_chain, InteractiveGrabs, PanelEdge, PopupGrabManager, Role,
        RoleKind, ShellContext, WindowState,
    },
    surface::{Buffer, BufferAssignment, ClientId, SurfaceId, SurfaceRegistry},
    utils::SerialCounter,
};
use smithay::utils::{Logical, Point, Rectangle, Serial, Size};

/// The shell core: every surface, role, grab and output in one place
///
/// All entry points run on one logical thread. Each call finishes its own
/// teardown before returning, so no other call ever observes a handle to a
/// surface that is half destroyed.
#[derive(Debug)]
pub struct ShellState {
    pub config: Config,
    pub(crate) registry: SurfaceRegistry,
    pub(crate) outputs: OutputLayout,
    pub(crate) seats: SeatManager,
    pub(crate) popups: PopupGrabManager,
    pub(crate) grabs: InteractiveGrabs,
    pub(crate) events: EventBus,
    pub(crate) serials: SerialCounter,
    pub(crate) clients: HashSet<ClientId>,
    /// Creation counter handed to new popups
    pub(crate) popup_sequence: u64,
}

impl ShellState {
    /// Build a shell from `config`, creating its seats and outputs
    pub fn new(config: Config) -> Self {
        let mut seats = SeatManager::new();
        for name in config.seat_names() {
            seats.add_seat(name);
        }

        let mut outputs = OutputLayout::new();
        for output in &config.outputs {
            outputs.add_output(
                output.name.clone(),
                Rectangle::new(output.position.into(), output.resolution.into()),
                output.scale,
            );
        }

        info!(
            "Shell ready: {} seats, {} outputs, min size {:?}, max depth {}",
            seats.ids().len(),
            config.outputs.len(),
            config.min_size,
            config.max_parent_depth
        );

        Self {
            config,
            registry: SurfaceRegistry::new(),
            outputs,
            seats,
            popups: PopupGrabManager::new(),
            grabs: InteractiveGrabs::new(),
            events: EventBus::new(),
            serials: SerialCounter::default(),
            clients: HashSet::new(),
            popup_sequence: 0,
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn outputs(&self) -> &OutputLayout {
        &self.outputs
    }

    pub fn seats(&self) -> &SeatManager {
        &self.seats
    }

    pub fn popups(&self) -> &PopupGrabManager {
        &self.popups
    }

    pub fn grabs(&self) -> &InteractiveGrabs {
        &self.grabs
    }

    pub fn event_bus(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Remove and return every queued event in order
    pub fn take_events(&mut self) -> Vec<ShellEvent> {
        self.events.drain()
    }

    /// Deliver queued events to the registered handlers
    pub fn flush_events(&mut self) {
        self.events.flush();
    }

    pub fn default_seat(&self) -> Option<SeatId> {
        self.seats.default_seat()
    }

    /// Allocate a serial for an input event from the shared counter
    pub fn next_serial(&mut self) -> Serial {
        self.serials.next_serial()
    }

    /// Split the state into a controller context and the controllers
    pub(crate) fn split(
        &mut self,
    ) -> (
        ShellContext<'_>,
        &mut PopupGrabManager,
        &mut InteractiveGrabs,
        &mut SeatManager,
    ) {
        (
            ShellContext {
                registry: &mut self.registry,
                outputs: &self.outputs,
                serials: &mut self.serials,
                events: &mut self.events,
                min_size: self.config.min_size,
                max_parent_depth: self.config.max_parent_depth,
            },
            &mut self.popups,
            &mut self.grabs,
            &mut self.seats,
        )
    }

    /// Global geometry of a surface with a role
    pub fn geometry_of(&self, surface: SurfaceId) -> Option<Rectangle<i32, Logical>> {
        global_geometry(
            &self.registry,
            &self.outputs,
            surface,
            self.config.max_parent_depth,
        )
    }

    /// Output a surface belongs to
    pub fn output_of(&self, surface: SurfaceId) -> Option<OutputId> {
        let target = self.registry.get(surface)?;
        if let Some(layer) = target.role.layer() {
            return Some(layer.output);
        }
        self.outputs.output_for_rect(self.geometry_of(surface)?)
    }

    pub fn usable_area(&self, output: OutputId) -> TetherResult<Rectangle<i32, Logical>> {
        self.outputs
            .usable_area(output)
            .ok_or_log(|| TetherError::UnknownOutput(output))
    }

    /// Resolve `surface` for a request from `client`
    pub(crate) fn check_owner(&self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        if !self.clients.contains(&client) {
            return Err(TetherError::UnknownClient(client));
        }
        let target = self
            .registry
            .get(surface)
            .filter(|s| !s.destroy_pending)
            .ok_or_log(|| TetherError::SurfaceGone(surface))?;
        if target.client != client {
            return Err(TetherError::NotOwner { client, surface });
        }
        Ok(())
    }

    // Clients

    pub fn connect_client(&mut self) -> ClientId {
        let client = ClientId::next();
        self.clients.insert(client);
        debug!("{client} connected");
        client
    }

    /// Tear down everything `client` owns
    ///
    /// Surfaces are destroyed deepest-first so every popup is dismissed
    /// before the window it hangs off.
    pub fn disconnect_client(&mut self, client: ClientId) -> TetherResult<()> {
        if !self.clients.remove(&client) {
            return Err(TetherError::UnknownClient(client));
        }
        let mut surfaces: Vec<(usize, SurfaceId)> = self
            .registry
            .surfaces_of(client)
            .into_iter()
            .map(|id| {
                let depth =
                    parent_chain(&self.registry, id, self.config.max_parent_depth + 1).len();
                (depth, id)
            })
            .collect();
        surfaces.sort_by(|a, b| b.0.cmp(&a.0));

        info!("{client} disconnected, destroying {} surfaces", surfaces.len());
        for (_, surface) in surfaces {
            self.teardown(surface);
        }
        Ok(())
    }

    // Surfaces

    pub fn create_surface(&mut self, client: ClientId) -> TetherResult<SurfaceId> {
        if !self.clients.contains(&client) {
            return Err(TetherError::UnknownClient(client));
        }
        Ok(self.registry.create(client))
    }

    /// Queue a buffer for the next commit; `None` detaches
    pub fn attach_buffer(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        buffer: Option<Buffer>,
    ) -> TetherResult<()> {
        self.check_owner(client, surface)?;
        let assignment = match buffer {
            Some(buffer) => BufferAssignment::NewBuffer(buffer),
            None => BufferAssignment::Removed,
        };
        self.registry.attach(surface, assignment);
        Ok(())
    }

    pub fn damage(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        rect: Rectangle<i32, Logical>,
    ) -> TetherResult<()> {
        self.check_owner(client, surface)?;
        self.registry.damage(surface, rect);
        Ok(())
    }

    pub fn set_input_region(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        region: Option<Vec<Rectangle<i32, Logical>>>,
    ) -> TetherResult<()> {
        self.check_owner(client, surface)?;
        self.registry.set_input_region(surface, region);
        Ok(())
    }

    /// Make the pending state current and drive the role state machine
    pub fn commit(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        profiling::scope!("commit");
        self.check_owner(client, surface)?;

        let before = self.geometry_of(surface);
        let outcome = self
            .registry
            .commit(surface)
            .ok_or_log(|| TetherError::SurfaceGone(surface))?;
        let damage = self.registry.take_damage(surface);
        self.events.emit_render(RenderEvent::SurfaceCommitted {
            surface,
            damage,
            released: outcome.released,
        });

        let kind = self
            .registry
            .get(surface)
            .map(|s| s.role.kind())
            .unwrap_or_default();
        match kind {
            RoleKind::Toplevel | RoleKind::Transient => self.commit_window(surface, &outcome),
            RoleKind::Popup => self.commit_popup(surface, &outcome),
            RoleKind::Panel | RoleKind::Overlay => {
                if outcome.newly_mapped {
                    self.events
                        .emit_render(RenderEvent::SurfaceMapped { surface });
                }
                if outcome.unmapped {
                    self.events
                        .emit_render(RenderEvent::SurfaceUnmapped { surface });
                    let (mut ctx, popups, _, _) = self.split();
                    popups.on_surface_gone(&mut ctx, surface);
                }
                if kind == RoleKind::Panel {
                    self.events.defer(DeferredAction::ArrangePanels);
                }
            }
            RoleKind::None => {}
        }

        let mapped = self.registry.get(surface).is_some_and(|s| s.mapped);
        if mapped {
            if let Some(geometry) = self.geometry_of(surface) {
                if before != Some(geometry) {
                    self.events
                        .emit_render(RenderEvent::GeometryChanged { surface, geometry });
                }
            }
        }
        Ok(())
    }

    fn commit_window(&mut self, surface: SurfaceId, outcome: &crate::surface::CommitOutcome) {
        let needs_initial = self
            .registry
            .get(surface)
            .and_then(|s| s.role.shell())
            .is_some_and(|shell| !shell.initial_configure_sent());
        if needs_initial {
            let (mut ctx, _, _, _) = self.split();
            ctx.send_configure(surface, None, None);
        }

        let Some(shell) = self
            .registry
            .get_mut(surface)
            .and_then(|s| s.role.shell_mut())
        else {
            return;
        };
        let transition = shell.apply_commit(outcome);

        if transition.mapped {
            self.events
                .emit_render(RenderEvent::SurfaceMapped { surface });
            self.place_new_window(surface);
            if self.config.activate_on_map {
                if let Some(seat) = self.seats.default_seat() {
                    if let Err(err) = self.activate(seat, surface) {
                        debug!("Not activating {surface} on map: {err}");
                    }
                }
            }
        }

        if let Some((old, new)) = transition.state_changed {
            info!("{surface} state {:?} -> {:?}", old, new);
            self.events
                .emit_render(RenderEvent::WindowStateChanged { surface, state: new });
            if new != WindowState::Fullscreen {
                if let Some(shell) = self
                    .registry
                    .get_mut(surface)
                    .and_then(|s| s.role.shell_mut())
                {
                    shell.fullscreen_output = None;
                }
            }
        }

        if transition.position_changed {
            let (mut ctx, _, _, _) = self.split();
            ctx.reposition_transients(surface);
        }

        if transition.unmapped {
            self.handle_unmap(surface);
        }
    }

    fn commit_popup(&mut self, surface: SurfaceId, outcome: &crate::surface::CommitOutcome) {
        let needs_configure = self
            .registry
            .get(surface)
            .and_then(|s| s.role.popup())
            .is_some_and(|p| p.configure_serial.is_none() && !p.dismissed);
        if needs_configure {
            let serial = self.serials.next_serial();
            if let Some(popup) = self
                .registry
                .get_mut(surface)
                .and_then(|s| s.role.popup_mut())
            {
                popup.configure_serial = Some(serial);
                self.events
                    .emit_client(crate::event::ClientEvent::PopupConfigure {
                        surface,
                        serial,
                        geometry: popup.geometry,
                    });
            }
        }

        if outcome.newly_mapped {
            self.events
                .emit_render(RenderEvent::SurfaceMapped { surface });
        }
        if outcome.unmapped {
            self.events
                .emit_render(RenderEvent::SurfaceUnmapped { surface });
            let (mut ctx, popups, _, _) = self.split();
            popups.on_surface_gone(&mut ctx, surface);
        }
    }

    /// Center a new toplevel on the output under the default seat's pointer
    fn place_new_window(&mut self, surface: SurfaceId) {
        let Some(Role::Toplevel(shell)) = self.registry.get(surface).map(|s| &s.role) else {
            return;
        };
        if shell.window_state() != WindowState::Normal || shell.position != Point::default() {
            return;
        }
        let size = shell.committed_size;
        let pointer = self
            .seats
            .default_seat()
            .and_then(|seat| self.seats.get(seat))
            .map(|seat| seat.pointer_pos)
            .unwrap_or_default();
        let Some(area) = self
            .outputs
            .output_at(pointer)
            .or_else(|| self.outputs.outputs().next().map(|o| o.id))
            .and_then(|output| self.outputs.usable_area(output))
        else {
            return;
        };
        let position = Point::from((
            area.loc.x + ((area.size.w - size.w) / 2).max(0),
            area.loc.y + ((area.size.h - size.h) / 2).max(0),
        ));
        debug!("Placing {surface} at {:?}", position);
        let (mut ctx, _, _, _) = self.split();
        ctx.set_window_position(surface, position);
    }

    /// A window lost its buffer
    fn handle_unmap(&mut self, surface: SurfaceId) {
        self.events
            .emit_render(RenderEvent::SurfaceUnmapped { surface });
        self.release_references(surface);
    }

    /// Drop grabs, popup stacks and activation that point at `surface`
    pub(crate) fn release_references(&mut self, surface: SurfaceId) {
        let (mut ctx, popups, grabs, seats) = self.split();
        grabs.on_surface_destroyed(&mut ctx, surface);
        popups.on_surface_gone(&mut ctx, surface);
        for seat in seats.iter_mut().filter(|s| s.activated == Some(surface)) {
            seat.activated = None;
            if let Some(shell) = ctx
                .registry
                .get_mut(surface)
                .and_then(|s| s.role.shell_mut())
            {
                shell.activated = false;
            }
            ctx.events.emit_activation(ActivationEvent::Deactivated {
                seat: seat.id,
                surface,
            });
        }
    }

    /// Destroy a surface on behalf of its client; destroying twice is a no-op
    pub fn destroy_surface(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        match self.check_owner(client, surface) {
            Ok(()) => {}
            Err(TetherError::SurfaceGone(_)) => return Ok(()),
            Err(err) => return Err(err),
        }
        self.teardown(surface);
        Ok(())
    }

    /// Remove every reference to `surface`, then the surface itself
    pub(crate) fn teardown(&mut self, surface: SurfaceId) {
        if !self.registry.mark_destroy_pending(surface) {
            return;
        }
        let kind = self
            .registry
            .get(surface)
            .map(|s| s.role.kind())
            .unwrap_or_default();
        debug!("Tearing down {surface} ({})", kind.name());

        self.release_references(surface);

        for child in self.registry.children_of(surface) {
            if let Some(Role::Transient { parent, .. }) =
                self.registry.get_mut(child).map(|s| &mut s.role)
            {
                debug!("{child} lost its parent {surface}");
                *parent = None;
            }
        }

        if kind == RoleKind::Panel {
            self.events.defer(DeferredAction::ArrangePanels);
        }
        self.registry.remove(surface);
        self.events
            .emit_render(RenderEvent::SurfaceDestroyed { surface });
    }

    // Activation

    /// Give keyboard activation on `seat` to `surface`
    ///
    /// The previously activated window is deactivated first, and its
    /// `Deactivated` event precedes the new `Activated` one.
    pub fn activate(&mut self, seat: SeatId, surface: SurfaceId) -> TetherResult<()> {
        let previous = self
            .seats
            .get(seat)
            .ok_or_log(|| TetherError::UnknownSeat(seat))?
            .activated;
        let target = self
            .registry
            .get(surface)
            .filter(|s| !s.destroy_pending)
            .ok_or_log(|| TetherError::SurfaceGone(surface))?;
        let shell = target.role.shell().ok_or(TetherError::WrongRole {
            surface,
            expected: RoleKind::Toplevel,
            actual: target.role.kind(),
        })?;
        if !shell.is_mapped() {
            return Err(TetherError::Rejected(format!("{surface} is not mapped")));
        }
        if previous == Some(surface) {
            return Ok(());
        }

        let (mut ctx, _, _, seats) = self.split();
        if let Some(previous) = previous {
            let still_active_elsewhere = seats
                .iter()
                .any(|s| s.id != seat && s.activated == Some(previous));
            if let Some(shell) = ctx
                .registry
                .get_mut(previous)
                .and_then(|s| s.role.shell_mut())
            {
                if !still_active_elsewhere {
                    shell.activated = false;
                    let size = Some(shell.committed_size).filter(|s| !s.is_empty());
                    ctx.send_configure(previous, size, None);
                }
            }
            ctx.events.emit_activation(ActivationEvent::Deactivated {
                seat,
                surface: previous,
            });
        }

        let mut unminimized = None;
        if let Some(shell) = ctx
            .registry
            .get_mut(surface)
            .and_then(|s| s.role.shell_mut())
        {
            unminimized = shell.unminimize();
            shell.activated = true;
            let size = Some(shell.committed_size).filter(|s| !s.is_empty());
            ctx.send_configure(surface, size, None);
        }
        if let Some(state) = unminimized {
            ctx.events
                .emit_render(RenderEvent::WindowStateChanged { surface, state });
        }
        if let Some(seat_state) = seats.get_mut(seat) {
            seat_state.activated = Some(surface);
        }
        ctx.events
            .emit_activation(ActivationEvent::Activated { seat, surface });
        info!("{surface} activated on {seat}");
        Ok(())
    }

    // Outputs

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        geometry: Rectangle<i32, Logical>,
        scale: f64,
    ) -> OutputId {
        self.outputs.add_output(name, geometry, scale)
    }

    /// Remove an output; fullscreen windows on it fall back to normal
    pub fn remove_output(&mut self, output: OutputId) -> TetherResult<()> {
        self.queue_unfullscreen_on(output);
        let removed = self
            .outputs
            .remove_output(output)
            .ok_or_log(|| TetherError::UnknownOutput(output))?;
        let stranded = self
            .registry
            .iter()
            .filter(|s| s.role.layer().is_some_and(|l| l.output == output))
            .count();
        if stranded > 0 {
            warn!(
                "Output '{}' removed with {} layer surfaces still bound to it",
                removed.name, stranded
            );
        }
        info!("Removed output '{}'", removed.name);
        Ok(())
    }

    /// Move or resize an output
    ///
    /// Fullscreen windows on it are un-fullscreened on the next dispatch
    /// turn; maximized windows are re-fit to the new usable area.
    pub fn set_output_geometry(
        &mut self,
        output: OutputId,
        geometry: Rectangle<i32, Logical>,
    ) -> TetherResult<()> {
        let old = self
            .outputs
            .set_geometry(output, geometry)
            .ok_or_log(|| TetherError::UnknownOutput(output))?;
        if old == geometry {
            return Ok(());
        }
        info!("{output} changed from {:?} to {:?}", old, geometry);
        self.queue_unfullscreen_on(output);
        self.events.defer(DeferredAction::ArrangePanels);
        Ok(())
    }

    fn queue_unfullscreen_on(&mut self, output: OutputId) {
        let fullscreen: Vec<SurfaceId> = self
            .registry
            .iter()
            .filter(|s| !s.destroy_pending)
            .filter(|s| {
                s.role.shell().is_some_and(|shell| {
                    shell.fullscreen_output == Some(output)
                        && (shell.window_state() == WindowState::Fullscreen
                            || shell.pending_state() == WindowState::Fullscreen)
                })
            })
            .map(|s| s.id)
            .collect();
        for surface in fullscreen {
            debug!("Queueing unfullscreen of {surface}");
            self.events
                .defer(DeferredAction::Unfullscreen { surface });
        }
    }

    /// Recompute reserved margins from panel exclusive zones
    pub(crate) fn arrange_panels(&mut self) {
        let ids: Vec<OutputId> = self.outputs.outputs().map(|o| o.id).collect();
        for output in ids {
            let mut margins = Margins::default();
            for surface in self.registry.iter() {
                if !surface.mapped || surface.destroy_pending {
                    continue;
                }
                let Role::Panel(layer) = &surface.role else {
                    continue;
                };
                if layer.output != output || layer.exclusive_zone <= 0 {
                    continue;
                }
                match layer.edge {
                    Some(PanelEdge::Top) => margins.top += layer.exclusive_zone,
                    Some(PanelEdge::Bottom) => margins.bottom += layer.exclusive_zone,
                    Some(PanelEdge::Left) => margins.left += layer.exclusive_zone,
                    Some(PanelEdge::Right) => margins.right += layer.exclusive_zone,
                    None => {}
                }
            }
            let changed = self
                .outputs
                .get(output)
                .is_some_and(|o| o.reserved != margins);
            self.outputs.set_reserved(output, margins);
            if changed {
                debug!("{output} reserves {:?}", margins);
                self.refit_maximized(output);
            }
        }
    }

    /// Send maximized windows on `output` a configure for its usable area
    fn refit_maximized(&mut self, output: OutputId) {
        let Some(area) = self.outputs.usable_area(output) else {
            return;
        };
        let maximized: Vec<SurfaceId> = self
            .registry
            .iter()
            .filter(|s| {
                s.role
                    .shell()
                    .is_some_and(|shell| shell.pending_state() == WindowState::Maximized)
            })
            .map(|s| s.id)
            .filter(|id| self.output_of(*id) == Some(output))
            .collect();
        let (mut ctx, _, _, _) = self.split();
        for surface in maximized {
            ctx.send_configure(surface, Some(area.size), Some(area.loc));
        }
    }

    /// Run queued compositor policy
    pub fn dispatch_pending(&mut self) {
        profiling::scope!("dispatch_pending");
        while let Some(action) = self.events.take_deferred() {
            debug!("Running deferred {:?}", action);
            match action {
                DeferredAction::Unfullscreen { surface } => self.unfullscreen(surface),
                DeferredAction::ArrangePanels => self.arrange_panels(),
            }
        }

        #[cfg(debug_assertions)]
        if let Err(errors) = super::validation::validate_full_state(self) {
            super::validation::log_validation_errors(&errors);
        }
    }

    /// Return a window to the normal state
    pub(crate) fn unfullscreen(&mut self, surface: SurfaceId) {
        let Some(shell) = self
            .registry
            .get_mut(surface)
            .filter(|s| !s.destroy_pending)
            .and_then(|s| s.role.shell_mut())
        else {
            return;
        };
        if shell.window_state() != WindowState::Fullscreen
            && shell.pending_state() != WindowState::Fullscreen
        {
            return;
        }
        shell.set_pending_state(WindowState::Normal);
        shell.fullscreen_output = None;
        let saved = shell.take_saved_geometry();
        let (mut ctx, _, _, _) = self.split();
        match saved {
            Some(geometry) => ctx.send_configure(surface, Some(geometry.size), Some(geometry.loc)),
            None => ctx.send_configure(surface, None, None),
        };
    }

    /// Clamp a client size hint to sane values
    pub(crate) fn sanitize_hint(size: Size<i32, Logical>) -> Size<i32, Logical> {
        if size.w < 0 || size.h < 0 {
            error!("Negative size hint {}x{}, using 0x0", size.w, size.h);
            return Size::default();
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::RoleRequest;
    use crate::surface::BufferId;

    fn shell_with_output() -> ShellState {
        let mut state = ShellState::new(Config::default());
        state.add_output("test", Rectangle::new((0, 0).into(), (1000, 800).into()), 1.0);
        state
    }

    fn buffer(id: u64, w: i32, h: i32) -> Option<Buffer> {
        Some(Buffer {
            id: BufferId(id),
            size: (w, h).into(),
        })
    }

    #[test]
    fn first_commit_sends_initial_configure() {
        let mut state = shell_with_output();
        let client = state.connect_client();
        let surface = state.create_surface(client).unwrap();
        state
            .assign_role(client, surface, RoleRequest::Toplevel)
            .unwrap();
        state.commit(client, surface).unwrap();
        let configures = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, ShellEvent::Client(crate::event::ClientEvent::Configure { .. })))
            .count();
        assert_eq!(configures, 1);
    }

    #[test]
    fn mapping_centers_and_activates() {
        let mut state = shell_with_output();
        let client = state.connect_client();
        let surface = state.create_surface(client).unwrap();
        state
            .assign_role(client, surface, RoleRequest::Toplevel)
            .unwrap();
        state.attach_buffer(client, surface, buffer(1, 200, 100)).unwrap();
        state.commit(client, surface).unwrap();
        assert_eq!(
            state.geometry_of(surface),
            Some(Rectangle::new((400, 350).into(), (200, 100).into()))
        );
        let seat = state.default_seat().unwrap();
        assert_eq!(state.seats().get(seat).unwrap().activated, Some(surface));
    }

    #[test]
    fn foreign_surface_is_not_owned() {
        let mut state = shell_with_output();
        let a = state.connect_client();
        let b = state.connect_client();
        let surface = state.create_surface(a).unwrap();
        let err = state.commit(b, surface).unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut state = shell_with_output();
        let client = state.connect_client();
        let surface = state.create_surface(client).unwrap();
        state.destroy_surface(client, surface).unwrap();
        state.destroy_surface(client, surface).unwrap();
        let destroyed = state
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, ShellEvent::Render(RenderEvent::SurfaceDestroyed { .. })))
            .count();
        assert_eq!(destroyed, 1);
    }
}
