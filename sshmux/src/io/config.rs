//! sshmux configuration stored at `~/.sshmux/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::layout::DELIMITER;
use crate::error::Error;

/// sshmux configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below. Paths are resolved against the home directory by
/// [`Paths::resolve`](crate::io::paths::Paths::resolve).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Prepended to a layout name to form the tmux session name.
    pub session_prefix: String,
    pub paths: PathsConfig,
    pub ssh: SshConfig,
    pub tmux: TmuxConfig,
    pub dialog: DialogConfig,
    pub sync: SyncConfig,
    pub themes: ThemesConfig,
    pub install: InstallConfig,
}

/// Directory overrides. `None` means the default under `~/.sshmux/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub layouts_dir: Option<PathBuf>,
    pub themes_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    /// Server list, one host per line.
    pub inventory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
    pub program: String,
    /// Drop to an interactive remote login shell after a remote command
    /// finishes, instead of returning to the local pane shell.
    pub keep_shell: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmuxConfig {
    pub program: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DialogBackend {
    /// `whiptail`-compatible full-screen dialogs.
    Whiptail,
    /// Numbered menus and line prompts on stdin/stdout.
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DialogConfig {
    pub backend: DialogBackend,
    pub program: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncTransport {
    Rsync,
    Scp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    pub transport: SyncTransport,
    /// Directory mirrored from every host.
    pub remote_dir: String,
    /// Per-host wall-clock budget in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThemesConfig {
    pub repo_url: String,
    /// File a selected theme is copied to.
    pub tmux_conf: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    /// Installer invocation; missing program names are appended.
    pub command: Vec<String>,
    /// Programs checked before the interactive menu starts.
    pub required: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_prefix: "sshmux-".to_string(),
            paths: PathsConfig::default(),
            ssh: SshConfig::default(),
            tmux: TmuxConfig::default(),
            dialog: DialogConfig::default(),
            sync: SyncConfig::default(),
            themes: ThemesConfig::default(),
            install: InstallConfig::default(),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            keep_shell: false,
        }
    }
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            program: "tmux".to_string(),
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            backend: DialogBackend::Whiptail,
            program: "whiptail".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            transport: SyncTransport::Rsync,
            remote_dir: "/var/log".to_string(),
            timeout_secs: 10 * 60,
        }
    }
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            repo_url: "https://github.com/jimeh/tmux-themepack.git".to_string(),
            tmux_conf: None,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            command: ["sudo", "apt-get", "install", "-y"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            required: ["tmux", "ssh", "whiptail", "rsync", "git"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.session_prefix.trim().is_empty() {
            return Err(invalid("session_prefix must not be empty".to_string()));
        }
        if self.session_prefix.contains([DELIMITER, ':', '.']) {
            return Err(invalid(format!(
                "session_prefix must not contain '{DELIMITER}', ':' or '.'"
            )));
        }
        for (key, program) in [
            ("ssh.program", &self.ssh.program),
            ("tmux.program", &self.tmux.program),
            ("dialog.program", &self.dialog.program),
        ] {
            if program.trim().is_empty() {
                return Err(invalid(format!("{key} must not be empty")));
            }
        }
        if self.sync.remote_dir.trim().is_empty() {
            return Err(invalid("sync.remote_dir must not be empty".to_string()));
        }
        if self.sync.timeout_secs == 0 {
            return Err(invalid("sync.timeout_secs must be > 0".to_string()));
        }
        if self.install.command.is_empty() || self.install.command[0].trim().is_empty() {
            return Err(invalid("install.command must be a non-empty array".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> anyhow::Error {
    Error::InvalidInput(message).into()
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = Config::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &Config) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.sync.transport = SyncTransport::Scp;
        cfg.paths.layouts_dir = Some(PathBuf::from("/srv/layouts"));
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "session_prefix = \"ops-\"\n[dialog]\nbackend = \"plain\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.session_prefix, "ops-");
        assert_eq!(cfg.dialog.backend, DialogBackend::Plain);
        assert_eq!(cfg.dialog.program, "whiptail");
        assert_eq!(cfg.ssh, SshConfig::default());
    }

    #[test]
    fn rejects_unusable_prefix() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "session_prefix = \"a:b\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("session_prefix"));
    }
}
