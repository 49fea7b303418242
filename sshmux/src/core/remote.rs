//! Remote shell invocations.
//!
//! A window's connection is described as a typed [`RemoteShellRequest`] and
//! turned into an argv by a [`RemoteShell`] client. The argv is only joined
//! into a shell line at the very end, with every word quoted.

use anyhow::{Result, anyhow};

use crate::core::layout::WindowSpec;

/// Connect to `target`, optionally running `command` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteShellRequest {
    pub target: String,
    pub command: Option<String>,
}

impl RemoteShellRequest {
    /// Plain interactive login.
    pub fn login(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            command: None,
        }
    }

    pub fn for_window(spec: &WindowSpec) -> Self {
        Self {
            target: spec.target.clone(),
            command: spec.remote_command().map(str::to_string),
        }
    }
}

/// Shapes remote-shell requests into process arguments.
pub trait RemoteShell {
    /// Full argv (program first) for the request.
    fn argv(&self, request: &RemoteShellRequest) -> Vec<String>;

    /// The argv as one shell-safe line, ready to be typed into a pane.
    fn command_line(&self, request: &RemoteShellRequest) -> Result<String> {
        let argv = self.argv(request);
        shlex::try_join(argv.iter().map(String::as_str))
            .map_err(|err| anyhow!("quote remote shell command: {err}"))
    }
}

/// `ssh` client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshClient {
    program: String,
    keep_shell: bool,
}

/// Appended to a remote command so the window ends in an interactive shell.
pub const KEEP_SHELL_SUFFIX: &str = "exec \"${SHELL:-bash}\" -l";

impl SshClient {
    pub fn new(program: impl Into<String>, keep_shell: bool) -> Self {
        Self {
            program: program.into(),
            keep_shell,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SshClient {
    fn default() -> Self {
        Self::new("ssh", false)
    }
}

impl RemoteShell for SshClient {
    fn argv(&self, request: &RemoteShellRequest) -> Vec<String> {
        let mut argv = vec![self.program.clone(), request.target.clone()];
        if let Some(command) = &request.command {
            let remote = if self.keep_shell {
                format!("{command}; {KEEP_SHELL_SUFFIX}")
            } else {
                command.clone()
            };
            argv.push("-t".to_string());
            argv.push(remote);
        }
        argv
    }
}
