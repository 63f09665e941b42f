//! tether - shell-protocol core for a Wayland-style compositor
//!
//! tether grants client surfaces their roles and arbitrates everything the
//! user does with them:
//!
//! - **Roles**: toplevels, transients, popups, panels and overlays, granted
//!   once per surface with acyclic parent links
//! - **Two-phase configure**: window state and size change only after the
//!   client acks a configure and commits
//! - **Grabs**: per-seat popup grab stacks with outside-click dismissal, and
//!   interactive move/resize driven by pointer motion
//!
//! # Architecture
//!
//! The core is a set of state machines behind one serialized entry point,
//! [`ShellState`]. Rendering, wire transport and input devices live outside
//! and talk to it through events and plain method calls:
//!
//! - [`state`]: Shell state, request dispatch and consistency checks
//! - [`surface`]: Generation-checked surface registry
//! - [`shell`]: Roles, window state machine, popup and interactive grabs
//! - [`handlers`]: Role, window state and seat grab requests
//! - [`input`]: Seats and pointer/keyboard routing
//! - [`output`]: Output layout and coordinate mapping
//! - [`event`]: Ordered event queue and deferred compositor actions
//! - [`config`]: Line-based configuration file

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod event;
pub mod handlers;
pub mod input;
pub mod output;
pub mod shell;
pub mod state;
pub mod surface;
pub mod test_mode;
pub mod utils;

pub use state::ShellState;
