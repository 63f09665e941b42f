//! Error types for tether
//!
//! Every failure is local to one client or one seat. Errors are sorted into
//! three classes by [`TetherError::severity`]: protocol violations end the
//! offending client, policy rejections are ignored (or answered with a
//! corrective configure), and vanished resources are no-ops.

use crate::input::SeatId;
use crate::output::OutputId;
use crate::shell::RoleKind;
use crate::surface::{ClientId, SurfaceId};
use smithay::utils::Serial;
use std::fmt;

/// How the transport layer must react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Structurally invalid request; the client connection is terminated
    ProtocolViolation,
    /// Valid request the shell declines; the connection stays alive
    PolicyRejection,
    /// The request raced a destruction; treated as a no-op
    ResourceGone,
}

/// Why a parent was refused during role assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParentError {
    #[error("parent is not a live surface")]
    Dead,
    #[error("parent has no role")]
    NoRole,
    #[error("surface cannot be its own parent")]
    SelfParent,
    #[error("parent chain would contain a cycle")]
    Cycle,
    #[error("parent chain exceeds the depth limit")]
    TooDeep,
    #[error("transients may only be parented to windows")]
    WrongKind,
}

/// Role assignment failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("{surface} already has role {}", .existing.name())]
    AlreadyHasRole {
        surface: SurfaceId,
        existing: RoleKind,
    },

    #[error("Invalid parent {parent} for {surface}: {reason}")]
    InvalidParent {
        surface: SurfaceId,
        parent: SurfaceId,
        reason: ParentError,
    },

    #[error("{0} is gone")]
    SurfaceGone(SurfaceId),
}

/// Popup and interactive grab failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrabError {
    #[error("Serial {serial:?} is not the last press on {seat}")]
    StaleSerial { seat: SeatId, serial: Serial },

    #[error("Popup grab serial {serial:?} does not match an input event on {seat}")]
    InvalidPopupSerial { seat: SeatId, serial: Serial },

    #[error("{0} already holds an interactive grab")]
    AlreadyGrabbed(SeatId),

    #[error("{popup} is not the topmost popup")]
    NotTopmost { popup: SurfaceId },

    #[error("{0} cannot be grabbed in its current state")]
    NotGrabbable(SurfaceId),

    #[error("{0} has no active grab")]
    NoGrab(SeatId),

    #[error("{0} is gone")]
    SurfaceGone(SurfaceId),
}

/// Main error type for tether operations
#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Grab(#[from] GrabError),

    /// Surface no longer resolves
    #[error("{0} not found")]
    SurfaceGone(SurfaceId),

    #[error("{client} does not own {surface}")]
    NotOwner { client: ClientId, surface: SurfaceId },

    #[error("{surface} has role {}, expected {}", .actual.name(), .expected.name())]
    WrongRole {
        surface: SurfaceId,
        expected: RoleKind,
        actual: RoleKind,
    },

    #[error("{surface} acknowledged configure {serial:?} that was never sent")]
    InvalidConfigureSerial { surface: SurfaceId, serial: Serial },

    #[error("{0} not found")]
    UnknownOutput(OutputId),

    #[error("{0} not found")]
    UnknownSeat(SeatId),

    #[error("{0} not found")]
    UnknownClient(ClientId),

    /// Request declined by compositor policy
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TetherError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TetherError::Role(RoleError::SurfaceGone(_)) => ErrorSeverity::ResourceGone,
            TetherError::Role(_) => ErrorSeverity::ProtocolViolation,
            TetherError::Grab(err) => match err {
                GrabError::StaleSerial { .. } | GrabError::NotTopmost { .. } => {
                    ErrorSeverity::ProtocolViolation
                }
                GrabError::SurfaceGone(_) => ErrorSeverity::ResourceGone,
                GrabError::InvalidPopupSerial { .. }
                | GrabError::AlreadyGrabbed(_)
                | GrabError::NotGrabbable(_)
                | GrabError::NoGrab(_) => ErrorSeverity::PolicyRejection,
            },
            TetherError::NotOwner { .. }
            | TetherError::WrongRole { .. }
            | TetherError::InvalidConfigureSerial { .. } => ErrorSeverity::ProtocolViolation,
            TetherError::SurfaceGone(_)
            | TetherError::UnknownOutput(_)
            | TetherError::UnknownSeat(_)
            | TetherError::UnknownClient(_) => ErrorSeverity::ResourceGone,
            TetherError::Rejected(_)
            | TetherError::Config(_)
            | TetherError::Io(_)
            | TetherError::Json(_) => {
                ErrorSeverity::PolicyRejection
            }
        }
    }

    pub fn is_protocol_violation(&self) -> bool {
        self.severity() == ErrorSeverity::ProtocolViolation
    }
}

/// Result type alias for tether operations
pub type TetherResult<T> = Result<T, TetherError>;

/// Extension trait for Option to convert to Result with error context
pub trait OptionExt<T> {
    /// Convert None to an error with context
    fn ok_or_log<F>(self, error_fn: F) -> TetherResult<T>
    where
        F: FnOnce() -> TetherError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_log<F>(self, error_fn: F) -> TetherResult<T>
    where
        F: FnOnce() -> TetherError,
    {
        match self {
            Some(val) => Ok(val),
            None => {
                let err = error_fn();
                tracing::debug!("{err}");
                Err(err)
            }
        }
    }
}

/// Helper for operations that should log errors but not propagate them
pub fn log_error<T, E: fmt::Display>(result: Result<T, E>) -> Option<T> {
    match result {
        Ok(val) => Some(val),
        Err(err) => {
            tracing::warn!("Operation failed: {err}");
            None
        }
    }
}
