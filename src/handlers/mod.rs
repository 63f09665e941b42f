//! Request handlers for tether
//!
//! Each module adds the requests of one protocol area to
//! [`ShellState`](crate::state::ShellState). They are kept apart from the
//! state module so the core lifecycle code stays readable.

mod seat;
mod xdg_shell;
