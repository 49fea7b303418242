//! Git adapter used to fetch the theme repository.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::io::process::ensure_success;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Shallow-clone `url` into `dest` (relative to the working directory).
    #[instrument(skip_all, fields(url))]
    pub fn clone_shallow(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(dest = %dest.display(), "cloning");
        let dest = dest.display().to_string();
        self.run_checked(&["clone", "--depth", "1", url, dest.as_str()])?;
        Ok(())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        ensure_success("git", &owned, output.status, &output.stderr)?;
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    #[test]
    fn clone_copies_local_repository() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let origin = temp.path().join("origin");
        std::fs::create_dir_all(&origin).expect("mkdir");
        let sh = |args: &[&str]| {
            let out = Command::new("git")
                .args(args)
                .current_dir(&origin)
                .output()
                .expect("git");
            assert!(out.status.success(), "git {args:?} failed");
        };
        sh(&["init", "-q"]);
        std::fs::write(origin.join("dark.tmuxtheme"), "set -g status-style bg=black\n")
            .expect("write");
        sh(&["add", "-A"]);
        sh(&[
            "-c",
            "user.name=test",
            "-c",
            "user.email=test@example.com",
            "commit",
            "-q",
            "-m",
            "init",
        ]);

        let git = Git::new(temp.path());
        let url = format!("file://{}", origin.display());
        git.clone_shallow(&url, Path::new("themes")).expect("clone");
        assert!(temp.path().join("themes/dark.tmuxtheme").is_file());
        assert!(temp.path().join("themes/.git").is_dir());
    }

    #[test]
    fn clone_failure_is_external_command_error() {
        if !git_available() {
            return;
        }
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path());
        let err = git
            .clone_shallow("file:///definitely/not/a/repo", Path::new("themes"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::Error>(),
            Some(crate::error::Error::ExternalCommand { .. })
        ));
    }
}
