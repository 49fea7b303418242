//! Terminal multiplexer adapter.
//!
//! The [`Multiplexer`] trait is the seam between session construction and
//! `tmux` itself. Tests use a recording multiplexer that never spawns a
//! process.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::io::process::{run_checked, run_interactive};

/// Window-level operations on a named session.
pub trait Multiplexer {
    /// True if a session with this exact name exists.
    fn has_session(&self, session: &str) -> Result<bool>;

    /// Create a detached session.
    fn new_session(&self, session: &str) -> Result<()>;

    /// Create window `index` named `label`, replacing any window already there.
    fn new_window(&self, session: &str, index: usize, label: &str) -> Result<()>;

    /// Type `line` into window `index` and press Enter.
    fn send_line(&self, session: &str, index: usize, line: &str) -> Result<()>;

    fn select_window(&self, session: &str, index: usize) -> Result<()>;

    /// Attach the controlling terminal; blocks until detach or session end.
    fn attach(&self, session: &str) -> Result<()>;

    /// True if a multiplexer server is running.
    fn server_running(&self) -> bool;

    /// Reload the multiplexer configuration from `path`.
    fn source_file(&self, path: &str) -> Result<()>;
}

/// `tmux` binary adapter.
#[derive(Debug, Clone)]
pub struct Tmux {
    program: String,
}

impl Tmux {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<()> {
        run_checked(&self.program, args)?;
        Ok(())
    }
}

impl Default for Tmux {
    fn default() -> Self {
        Self::new("tmux")
    }
}

/// `session:index` target string.
pub fn window_target(session: &str, index: usize) -> String {
    format!("{session}:{index}")
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.into_iter().map(str::to_string).collect()
}

/// Argument vectors for each tmux operation, kept separate from process
/// spawning so they can be checked without a tmux server.
pub mod args {
    use super::{strings, window_target};

    pub fn has_session(session: &str) -> Vec<String> {
        // `=` forces an exact match instead of tmux's prefix matching.
        strings(["has-session", "-t", format!("={session}").as_str()])
    }

    pub fn new_session(session: &str) -> Vec<String> {
        strings(["new-session", "-d", "-s", session])
    }

    pub fn new_window(session: &str, index: usize, label: &str) -> Vec<String> {
        strings([
            "new-window",
            "-d",
            "-k",
            "-t",
            window_target(session, index).as_str(),
            "-n",
            label,
        ])
    }

    pub fn send_line(session: &str, index: usize, line: &str) -> Vec<String> {
        strings([
            "send-keys",
            "-t",
            window_target(session, index).as_str(),
            line,
            "Enter",
        ])
    }

    pub fn select_window(session: &str, index: usize) -> Vec<String> {
        strings(["select-window", "-t", window_target(session, index).as_str()])
    }

    pub fn attach(session: &str) -> Vec<String> {
        strings(["attach-session", "-t", format!("={session}").as_str()])
    }

    pub fn source_file(path: &str) -> Vec<String> {
        strings(["source-file", path])
    }
}

impl Multiplexer for Tmux {
    fn has_session(&self, session: &str) -> Result<bool> {
        let status = std::process::Command::new(&self.program)
            .args(args::has_session(session))
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;
        Ok(status.success())
    }

    #[instrument(skip_all, fields(session))]
    fn new_session(&self, session: &str) -> Result<()> {
        debug!("creating detached session");
        self.run(&args::new_session(session))
    }

    #[instrument(skip_all, fields(session, index, label))]
    fn new_window(&self, session: &str, index: usize, label: &str) -> Result<()> {
        self.run(&args::new_window(session, index, label))
    }

    #[instrument(skip_all, fields(session, index))]
    fn send_line(&self, session: &str, index: usize, line: &str) -> Result<()> {
        debug!(line, "sending keys");
        self.run(&args::send_line(session, index, line))
    }

    fn select_window(&self, session: &str, index: usize) -> Result<()> {
        self.run(&args::select_window(session, index))
    }

    #[instrument(skip_all, fields(session))]
    fn attach(&self, session: &str) -> Result<()> {
        run_interactive(&self.program, &args::attach(session))
    }

    fn server_running(&self) -> bool {
        std::process::Command::new(&self.program)
            .arg("list-sessions")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }

    fn source_file(&self, path: &str) -> Result<()> {
        self.run(&args::source_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_window_replaces_existing_index() {
        assert_eq!(
            args::new_window("sshmux-ops", 0, "db1"),
            vec!["new-window", "-d", "-k", "-t", "sshmux-ops:0", "-n", "db1"]
        );
    }

    #[test]
    fn send_line_targets_window_and_presses_enter() {
        assert_eq!(
            args::send_line("s", 2, "ssh web1"),
            vec!["send-keys", "-t", "s:2", "ssh web1", "Enter"]
        );
    }

    #[test]
    fn session_lookups_are_exact() {
        assert_eq!(args::has_session("s"), vec!["has-session", "-t", "=s"]);
        assert_eq!(args::attach("s"), vec!["attach-session", "-t", "=s"]);
    }
}
