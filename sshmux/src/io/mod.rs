//! Side-effecting adapters: files, tmux, dialogs, and external programs.

pub mod config;
pub mod deps;
pub mod dialog;
pub mod git;
pub mod layout_store;
pub mod paths;
pub mod process;
pub mod sync;
pub mod themes;
pub mod tmux;
