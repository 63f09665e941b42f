//! Role, configure and window state requests

use tracing::{debug, info};

use crate::{
    error::{OptionExt, TetherError, TetherResult},
    event::{DeferredAction, RenderEvent},
    output::OutputId,
    shell::{role, RoleKind, RoleRequest, ShellSurface, WindowState},
    state::ShellState,
    surface::{ClientId, SurfaceId},
};
use smithay::utils::{Logical, Rectangle, Serial, Size};

impl ShellState {
    /// Grant a role to a surface of `client`
    pub fn assign_role(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        request: RoleRequest,
    ) -> TetherResult<RoleKind> {
        self.check_owner(client, surface)?;
        if let Some(parent) = request.parent() {
            // dead parents are reported by role validation
            if let Some(owner) = self.registry.get(parent).map(|p| p.client) {
                if owner != client {
                    return Err(TetherError::NotOwner {
                        client,
                        surface: parent,
                    });
                }
            }
        }
        match &request {
            RoleRequest::Panel { output, .. } | RoleRequest::Overlay { output, .. } => {
                self.outputs
                    .get(*output)
                    .ok_or_log(|| TetherError::UnknownOutput(*output))?;
            }
            _ => {}
        }

        let sequence = self.popup_sequence + 1;
        let kind = role::assign_role(
            &mut self.registry,
            surface,
            request,
            self.config.max_parent_depth,
            sequence,
        )?;
        match kind {
            RoleKind::Popup => self.popup_sequence = sequence,
            RoleKind::Panel => self.events.defer(DeferredAction::ArrangePanels),
            _ => {}
        }
        Ok(kind)
    }

    /// Handle the client's acknowledgement of a configure
    pub fn ack_configure(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        serial: Serial,
    ) -> TetherResult<()> {
        self.check_owner(client, surface)?;
        let target = self
            .registry
            .get_mut(surface)
            .ok_or_log(|| TetherError::SurfaceGone(surface))?;
        let actual = target.role.kind();

        if let Some(popup) = target.role.popup_mut() {
            if popup.configure_serial != Some(serial) {
                return Err(TetherError::InvalidConfigureSerial { surface, serial });
            }
            return Ok(());
        }
        let shell = target.role.shell_mut().ok_or(TetherError::WrongRole {
            surface,
            expected: RoleKind::Toplevel,
            actual,
        })?;
        match shell.ack(serial) {
            Some(outcome) => {
                debug!("{surface} acked {:?}: {:?}", serial, outcome);
                Ok(())
            }
            None => Err(TetherError::InvalidConfigureSerial { surface, serial }),
        }
    }

    /// Window of `client` for a state request
    fn window_mut(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<&mut ShellSurface> {
        self.check_owner(client, surface)?;
        let target = self
            .registry
            .get_mut(surface)
            .ok_or_log(|| TetherError::SurfaceGone(surface))?;
        let actual = target.role.kind();
        target.role.shell_mut().ok_or(TetherError::WrongRole {
            surface,
            expected: RoleKind::Toplevel,
            actual,
        })
    }

    /// Output a window request targets: its own, else the first one
    fn target_output(&self, surface: SurfaceId) -> TetherResult<OutputId> {
        self.output_of(surface)
            .or_else(|| self.outputs.outputs().next().map(|o| o.id))
            .ok_or_else(|| TetherError::Rejected("no outputs".to_string()))
    }

    pub fn set_maximized(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        self.window_mut(client, surface)?;
        let area = self.usable_area(self.target_output(surface)?)?;
        self.configure_filled(client, surface, WindowState::Maximized, area)
    }

    pub fn unset_maximized(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        let shell = self.window_mut(client, surface)?;
        if shell.pending_state() != WindowState::Maximized {
            return Ok(());
        }
        shell.set_pending_state(WindowState::Normal);
        let saved = shell.take_saved_geometry();
        let (mut ctx, _, _, _) = self.split();
        match saved {
            Some(geometry) => ctx.send_configure(surface, Some(geometry.size), Some(geometry.loc)),
            None => ctx.send_configure(surface, None, None),
        };
        Ok(())
    }

    /// Fullscreen on `output`, or on the output the window is on
    pub fn set_fullscreen(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        output: Option<OutputId>,
    ) -> TetherResult<()> {
        self.window_mut(client, surface)?;
        let output = match output {
            Some(output) => output,
            None => self.target_output(surface)?,
        };
        let geometry = self
            .outputs
            .get(output)
            .ok_or_log(|| TetherError::UnknownOutput(output))?
            .geometry;
        self.configure_filled(client, surface, WindowState::Fullscreen, geometry)?;
        self.window_mut(client, surface)?.fullscreen_output = Some(output);
        Ok(())
    }

    pub fn unset_fullscreen(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        self.window_mut(client, surface)?;
        self.unfullscreen(surface);
        Ok(())
    }

    /// Ask the client to fill `area` in `state`
    fn configure_filled(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        state: WindowState,
        area: Rectangle<i32, Logical>,
    ) -> TetherResult<()> {
        let shell = self.window_mut(client, surface)?;
        if shell.window_state() == WindowState::Normal {
            shell.save_geometry();
        }
        shell.set_pending_state(state);
        info!("{surface} requested {:?} in {:?}", state, area);
        let (mut ctx, _, _, _) = self.split();
        ctx.send_configure(surface, Some(area.size), Some(area.loc));
        Ok(())
    }

    /// Minimize at once; the window stops receiving input
    pub fn set_minimized(&mut self, client: ClientId, surface: SurfaceId) -> TetherResult<()> {
        if !self.window_mut(client, surface)?.minimize() {
            return Ok(());
        }
        info!("{surface} minimized");
        self.events.emit_render(RenderEvent::WindowStateChanged {
            surface,
            state: WindowState::Minimized,
        });
        self.release_references(surface);
        Ok(())
    }

    pub fn set_min_size(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        size: Size<i32, Logical>,
    ) -> TetherResult<()> {
        self.window_mut(client, surface)?.min_size = Self::sanitize_hint(size);
        Ok(())
    }

    pub fn set_max_size(
        &mut self,
        client: ClientId,
        surface: SurfaceId,
        size: Size<i32, Logical>,
    ) -> TetherResult<()> {
        self.window_mut(client, surface)?.max_size = Self::sanitize_hint(size);
        Ok(())
    }
}
