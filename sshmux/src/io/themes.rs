//! Cosmetic tmux themes: fetch a theme repository, list its themes, and
//! install one as the user's tmux configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::git::Git;
use crate::io::tmux::Multiplexer;

const THEME_EXTENSIONS: [&str; 2] = ["tmuxtheme", "conf"];

/// Theme files under a directory.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    dir: PathBuf,
}

impl ThemeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clone `repo_url` into the theme directory unless it already exists.
    ///
    /// Returns `true` if a clone was performed.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn ensure_fetched(&self, repo_url: &str) -> Result<bool> {
        if self.dir.is_dir() {
            debug!("themes already present");
            return Ok(false);
        }
        let parent = self
            .dir
            .parent()
            .ok_or_else(|| anyhow!("themes dir has no parent: {}", self.dir.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
        let name = self
            .dir
            .file_name()
            .ok_or_else(|| anyhow!("themes dir has no name: {}", self.dir.display()))?;
        info!(repo_url, "fetching themes");
        Git::new(parent).clone_shallow(repo_url, Path::new(name))?;
        Ok(true)
    }

    /// Theme names (paths relative to the theme directory), sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if self.dir.is_dir() {
            collect_themes(&self.dir, &self.dir, &mut names)?;
        }
        names.sort();
        Ok(names)
    }

    /// Path of a listed theme. Names that escape the directory are rejected.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(anyhow!("invalid theme name '{name}'"));
        }
        let path = self.dir.join(relative);
        if !path.is_file() {
            return Err(anyhow!("theme '{name}' not found"));
        }
        Ok(path)
    }

    /// Copy theme `name` to `tmux_conf`, keeping the first pre-existing file
    /// as `<tmux_conf>.bak`, then reload a running tmux server.
    #[instrument(skip_all, fields(theme = name))]
    pub fn apply<M: Multiplexer + ?Sized>(
        &self,
        name: &str,
        tmux_conf: &Path,
        mux: &M,
    ) -> Result<()> {
        let source = self.path_for(name)?;
        if let Some(parent) = tmux_conf.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let backup = backup_path(tmux_conf);
        if tmux_conf.exists() && !backup.exists() {
            fs::copy(tmux_conf, &backup)
                .with_context(|| format!("back up {}", tmux_conf.display()))?;
            debug!(backup = %backup.display(), "existing tmux config backed up");
        }
        fs::copy(&source, tmux_conf)
            .with_context(|| format!("copy {} to {}", source.display(), tmux_conf.display()))?;
        info!(conf = %tmux_conf.display(), "theme applied");
        if mux.server_running()
            && let Err(err) = mux.source_file(&tmux_conf.display().to_string())
        {
            warn!(err = %err, "reloading tmux config failed");
        }
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

fn collect_themes(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read {}", dir.display()))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_themes(root, &path, out)?;
            continue;
        }
        let is_theme = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| THEME_EXTENSIONS.contains(&ext));
        if is_theme && let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
