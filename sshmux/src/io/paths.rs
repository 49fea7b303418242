//! Canonical filesystem locations, resolved once from config and home.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::io::config::Config;

/// Name of the per-user state directory under `$HOME`.
pub const STATE_DIR_NAME: &str = ".sshmux";

/// All paths sshmux reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub home: PathBuf,
    pub layouts_dir: PathBuf,
    pub themes_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub inventory: PathBuf,
    pub tmux_conf: PathBuf,
}

impl Paths {
    /// Resolve configured paths against `home`. `~/` prefixes are expanded;
    /// relative paths are taken relative to `home`.
    pub fn resolve(home: &Path, cfg: &Config) -> Self {
        let state = home.join(STATE_DIR_NAME);
        let pick = |configured: &Option<PathBuf>, default: PathBuf| match configured {
            Some(path) => expand_home(home, path),
            None => default,
        };
        Self {
            home: home.to_path_buf(),
            layouts_dir: pick(&cfg.paths.layouts_dir, state.join("layouts")),
            themes_dir: pick(&cfg.paths.themes_dir, state.join("themes")),
            logs_dir: pick(&cfg.paths.logs_dir, state.join("logs")),
            inventory: pick(&cfg.paths.inventory, state.join("servers")),
            tmux_conf: pick(&cfg.themes.tmux_conf, home.join(".tmux.conf")),
        }
    }
}

/// Default config file location for `home`.
pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(STATE_DIR_NAME).join("config.toml")
}

/// The invoking user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))
}

fn expand_home(home: &Path, path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        return home.join(rest);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}
