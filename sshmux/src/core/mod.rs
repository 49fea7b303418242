//! Pure logic: layout records, remote-shell requests, and the session
//! construction state machine.
//!
//! Nothing here touches the filesystem or spawns processes.

pub mod inventory;
pub mod layout;
pub mod prompt;
pub mod remote;
pub mod session_state;
