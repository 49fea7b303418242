//! Menu-driven tmux layouts of ssh sessions.
//!
//! With no subcommand an interactive menu runs. Saved layouts live under
//! `~/.sshmux/layouts`, one record per window.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use sshmux::core::remote::SshClient;
use sshmux::error::{Error, exit_code_for};
use sshmux::io::config::{Config, DialogBackend, load_config, write_config};
use sshmux::io::deps::{ensure_installed, missing};
use sshmux::io::dialog::{Dialog, LineDialog, WhiptailDialog};
use sshmux::io::layout_store::LayoutStore;
use sshmux::io::paths::{Paths, default_config_path, home_dir};
use sshmux::io::sync::transfer_for;
use sshmux::io::tmux::Tmux;
use sshmux::logging;
use sshmux::menu::{Menu, load_hosts, run_sync};
use sshmux::session::replay;

#[derive(Parser)]
#[command(
    name = "sshmux",
    version,
    about = "Build tmux sessions of ssh windows from saved layouts"
)]
struct Cli {
    /// Config file (default `~/.sshmux/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print saved layout names, one per line.
    List,
    /// Rebuild a saved layout and attach to it.
    Load {
        /// Layout name.
        name: String,
    },
    /// Copy remote logs of every inventory host into the logs directory.
    Sync,
    /// Write the default config file if missing.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let home = home_dir()?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&home));

    if let Some(Command::InitConfig { force }) = cli.command {
        return cmd_init_config(&config_path, force);
    }

    let cfg = load_config(&config_path)?;
    let paths = Paths::resolve(&home, &cfg);
    debug!(layouts = %paths.layouts_dir.display(), "paths resolved");

    match cli.command {
        None => cmd_menu(&cfg, &paths),
        Some(Command::List) => cmd_list(&paths),
        Some(Command::Load { name }) => cmd_load(&cfg, &paths, &name),
        Some(Command::Sync) => cmd_sync(&cfg, &paths),
        Some(Command::InitConfig { .. }) => Ok(()),
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("{} already exists", path.display());
        return Ok(());
    }
    write_config(path, &Config::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_menu(cfg: &Config, paths: &Paths) -> Result<()> {
    let dialog = dialog_for(cfg);
    ensure_installed(dialog.as_ref(), &cfg.install.required, &cfg.install.command)?;

    let mux = Tmux::new(cfg.tmux.program.as_str());
    let ssh = SshClient::new(cfg.ssh.program.as_str(), cfg.ssh.keep_shell);
    let transfer = transfer_for(cfg);
    Menu {
        cfg,
        paths,
        mux: &mux,
        shell: &ssh,
        dialog: dialog.as_ref(),
        transfer: transfer.as_ref(),
    }
    .run()
}

fn cmd_list(paths: &Paths) -> Result<()> {
    for name in LayoutStore::new(&paths.layouts_dir).list()? {
        println!("{name}");
    }
    Ok(())
}

fn cmd_load(cfg: &Config, paths: &Paths, name: &str) -> Result<()> {
    let store = LayoutStore::new(&paths.layouts_dir);
    if !store.exists(name)? {
        return Err(Error::NotFound {
            name: name.to_string(),
        }
        .into());
    }
    let mux = Tmux::new(cfg.tmux.program.as_str());
    let ssh = SshClient::new(cfg.ssh.program.as_str(), cfg.ssh.keep_shell);
    require(&[cfg.tmux.program.as_str(), ssh.program()])?;
    replay(&store, name, &mux, &ssh, &cfg.session_prefix)
}

fn cmd_sync(cfg: &Config, paths: &Paths) -> Result<()> {
    let hosts = load_hosts(&paths.inventory)?;
    let transfer = transfer_for(cfg);
    let report = run_sync(cfg, paths, transfer.as_ref(), &hosts);
    println!("{}", report.summary());
    if !report.all_ok() {
        let failed: Vec<&str> = report.failed().map(|host| host.host.as_str()).collect();
        bail!("log sync failed for: {}", failed.join(", "));
    }
    Ok(())
}

/// Whiptail when configured and installed, otherwise plain line prompts.
fn dialog_for(cfg: &Config) -> Box<dyn Dialog> {
    match cfg.dialog.backend {
        DialogBackend::Whiptail if missing(&[cfg.dialog.program.as_str()]).is_empty() => {
            Box::new(WhiptailDialog::new(cfg.dialog.program.as_str()))
        }
        DialogBackend::Whiptail => {
            debug!(program = %cfg.dialog.program, "dialog program missing, using line prompts");
            Box::new(LineDialog::stdio())
        }
        DialogBackend::Plain => Box::new(LineDialog::stdio()),
    }
}

fn require(programs: &[&str]) -> Result<()> {
    let absent = missing(programs);
    if absent.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingDependency(absent).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_subcommand_runs_menu() {
        let cli = Cli::parse_from(["sshmux"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_load() {
        let cli = Cli::parse_from(["sshmux", "load", "ops"]);
        assert!(matches!(cli.command, Some(Command::Load { name }) if name == "ops"));
    }

    #[test]
    fn parse_init_config_force() {
        let cli = Cli::parse_from(["sshmux", "init-config", "--force"]);
        assert!(matches!(cli.command, Some(Command::InitConfig { force: true })));
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["sshmux", "list", "--config", "/tmp/c.toml"]);
        assert!(matches!(cli.command, Some(Command::List)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn load_requires_name() {
        assert!(Cli::try_parse_from(["sshmux", "load"]).is_err());
    }
}
