//! State management module
//!
//! This module contains the shell state, the request dispatcher and the
//! consistency checks run over them.

mod main;
mod requests;
pub mod validation;

pub use main::ShellState;
pub use requests::{Reply, Request};
