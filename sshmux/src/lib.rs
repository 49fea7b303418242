//! Build tmux sessions of ssh windows from saved layouts.
//!
//! A layout is a plain-text file with one record per window
//! (`target|label|command`). Replaying a layout creates a fresh tmux
//! session, opens one window per record in file order, starts the remote
//! connection in each, and attaches.
//!
//! - **[`core`]**: Pure logic (record codec, remote-shell requests, session
//!   state machine). No I/O.
//! - **[`io`]**: Side-effecting adapters (layout store, tmux, dialog UI,
//!   process execution, config).
//!
//! [`session`] and [`menu`] coordinate the two to implement the
//! interactive flows.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod menu;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::Error;
