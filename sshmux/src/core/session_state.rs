//! Session construction state machine.
//!
//! `Empty -> Creating { next } -> Built -> Attached`. Windows must be added at
//! consecutive indices starting at 0, and nothing can be added once the
//! session has been finalized.

use anyhow::{Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session exists yet.
    Empty,
    /// Session exists; `next` is the index the next window must use.
    Creating { next: usize },
    /// Window 0 selected, ready to attach.
    Built,
    /// Terminal handed to the multiplexer.
    Attached,
}

impl SessionState {
    pub fn on_created(self) -> Result<Self> {
        match self {
            SessionState::Empty => Ok(SessionState::Creating { next: 0 }),
            other => bail!("session already created (state {other:?})"),
        }
    }

    /// Accept a window at `index` and advance.
    pub fn on_window(self, index: usize) -> Result<Self> {
        match self {
            SessionState::Creating { next } if next == index => {
                Ok(SessionState::Creating { next: next + 1 })
            }
            SessionState::Creating { next } => {
                bail!("window index {index} out of order (expected {next})")
            }
            other => bail!("cannot add window in state {other:?}"),
        }
    }

    pub fn on_built(self) -> Result<Self> {
        match self {
            SessionState::Creating { next } if next > 0 => Ok(SessionState::Built),
            SessionState::Creating { .. } => bail!("cannot finalize a session with no windows"),
            other => bail!("cannot finalize in state {other:?}"),
        }
    }

    pub fn on_attached(self) -> Result<Self> {
        match self {
            SessionState::Built => Ok(SessionState::Attached),
            other => bail!("cannot attach in state {other:?}"),
        }
    }

    /// Number of windows created so far.
    pub fn window_count(self) -> Option<usize> {
        match self {
            SessionState::Creating { next } => Some(next),
            _ => None,
        }
    }
}
