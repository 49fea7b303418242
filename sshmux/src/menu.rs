//! Top-level interactive menu.
//!
//! Flows that attach to tmux end the program when the user detaches. The
//! other flows, and any flow that fails with a user-facing error (missing
//! layout, bad name, and so on), return to the menu. Cancelling the menu
//! itself exits cleanly.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::inventory::parse_inventory;
use crate::core::layout::validate_layout_name;
use crate::core::remote::RemoteShell;
use crate::error::Error;
use crate::io::config::Config;
use crate::io::dialog::{Dialog, MenuItem};
use crate::io::layout_store::LayoutStore;
use crate::io::paths::Paths;
use crate::io::sync::{SyncReport, Transfer, sync_all};
use crate::io::themes::ThemeStore;
use crate::io::tmux::Multiplexer;
use crate::session::{build_interactive, replay};

const TITLE: &str = "sshmux";

/// Result of one menu flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The user attached to a session and has since detached.
    Attached,
    /// Show the menu again.
    Back,
}

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Create,
    Load,
    Sync,
    Theme,
}

impl Choice {
    pub const ALL: [Choice; 4] = [Choice::Create, Choice::Load, Choice::Sync, Choice::Theme];

    pub fn tag(self) -> &'static str {
        match self {
            Choice::Create => "create",
            Choice::Load => "load",
            Choice::Sync => "sync",
            Choice::Theme => "theme",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Choice::Create => "Create a layout from the server list",
            Choice::Load => "Load a saved layout",
            Choice::Sync => "Sync remote logs",
            Choice::Theme => "Apply a tmux theme",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Choice> {
        Choice::ALL.into_iter().find(|choice| choice.tag() == tag)
    }
}

/// Everything a flow needs, passed in explicitly.
pub struct Menu<'a> {
    pub cfg: &'a Config,
    pub paths: &'a Paths,
    pub mux: &'a dyn Multiplexer,
    pub shell: &'a dyn RemoteShell,
    pub dialog: &'a dyn Dialog,
    pub transfer: &'a dyn Transfer,
}

impl Menu<'_> {
    fn store(&self) -> LayoutStore {
        LayoutStore::new(&self.paths.layouts_dir)
    }

    /// Show the menu until the user cancels or a session has been attached.
    pub fn run(&self) -> Result<()> {
        let items: Vec<MenuItem> = Choice::ALL
            .into_iter()
            .map(|choice| MenuItem::new(choice.tag(), choice.description()))
            .collect();
        loop {
            let Some(tag) = self.dialog.menu(TITLE, "Choose an action", &items)? else {
                info!("menu cancelled");
                return Ok(());
            };
            let Some(choice) = Choice::from_tag(&tag) else {
                warn!(tag = %tag, "unknown menu choice");
                continue;
            };
            match self.dispatch(choice) {
                Ok(Flow::Attached) => return Ok(()),
                Ok(Flow::Back) => {}
                Err(err) if is_flow_local(&err) => {
                    warn!(err = %format!("{err:#}"), "flow aborted");
                    self.dialog.message(TITLE, &format!("{err:#}"))?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn dispatch(&self, choice: Choice) -> Result<Flow> {
        match choice {
            Choice::Create => self.create(),
            Choice::Load => self.load(),
            Choice::Sync => self.sync(),
            Choice::Theme => self.theme(),
        }
    }

    #[instrument(skip_all)]
    fn create(&self) -> Result<Flow> {
        let Some(name) = self.dialog.input(TITLE, "Name for the new layout", "")? else {
            return Ok(Flow::Back);
        };
        let name = name.trim().to_string();
        validate_layout_name(&name)?;
        let store = self.store();
        if store.exists(&name)? {
            let replace = self.dialog.confirm(
                TITLE,
                &format!("Layout '{name}' already exists. Replace it?"),
            )?;
            if !replace {
                return Err(Error::LayoutExists { name }.into());
            }
        }
        // The old records are only dropped once the new session exists.
        let inventory = load_inventory(&self.paths.inventory)?;
        build_interactive(
            &store,
            &name,
            &inventory,
            self.mux,
            self.shell,
            self.dialog,
            &self.cfg.session_prefix,
        )?;
        Ok(Flow::Attached)
    }

    #[instrument(skip_all)]
    fn load(&self) -> Result<Flow> {
        let store = self.store();
        let names = store.list()?;
        if names.is_empty() {
            self.dialog.message(
                TITLE,
                &format!("No layouts saved in {}", store.dir().display()),
            )?;
            return Ok(Flow::Back);
        }
        let items: Vec<MenuItem> = names
            .iter()
            .map(|name| MenuItem::new(name.as_str(), ""))
            .collect();
        let Some(name) = self.dialog.menu(TITLE, "Choose a layout", &items)? else {
            return Ok(Flow::Back);
        };
        replay(
            &store,
            &name,
            self.mux,
            self.shell,
            &self.cfg.session_prefix,
        )?;
        Ok(Flow::Attached)
    }

    #[instrument(skip_all)]
    fn sync(&self) -> Result<Flow> {
        let hosts = load_hosts(&self.paths.inventory)?;
        let report = run_sync(self.cfg, self.paths, self.transfer, &hosts);
        self.dialog.message(TITLE, &report.summary())?;
        Ok(Flow::Back)
    }

    #[instrument(skip_all)]
    fn theme(&self) -> Result<Flow> {
        let themes = ThemeStore::new(&self.paths.themes_dir);
        if let Err(err) = themes.ensure_fetched(&self.cfg.themes.repo_url) {
            warn!(err = %err, "fetching themes failed");
            self.dialog
                .message(TITLE, &format!("Could not fetch themes: {err:#}"))?;
            return Ok(Flow::Back);
        }
        let names = themes.list()?;
        if names.is_empty() {
            self.dialog.message(
                TITLE,
                &format!("No themes found in {}", themes.dir().display()),
            )?;
            return Ok(Flow::Back);
        }
        let items: Vec<MenuItem> = names
            .iter()
            .map(|name| MenuItem::new(name.as_str(), ""))
            .collect();
        let Some(name) = self.dialog.menu(TITLE, "Choose a theme", &items)? else {
            return Ok(Flow::Back);
        };
        themes.apply(&name, &self.paths.tmux_conf, self.mux)?;
        self.dialog.message(
            TITLE,
            &format!("Theme '{name}' written to {}", self.paths.tmux_conf.display()),
        )?;
        Ok(Flow::Back)
    }
}

/// Sync logs for every host, using the configured remote directory.
pub fn run_sync<T: Transfer + ?Sized>(
    cfg: &Config,
    paths: &Paths,
    transfer: &T,
    hosts: &[String],
) -> SyncReport {
    sync_all(transfer, hosts, &cfg.sync.remote_dir, &paths.logs_dir)
}

/// Read the server inventory. A missing file is reported as invalid input
/// naming where it was expected.
pub fn load_inventory(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::InvalidInput(format!(
            "no server list at {} (one host per line)",
            path.display()
        ))
        .into()),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

/// Hosts listed in the inventory at `path`. An inventory without hosts is
/// invalid input.
pub fn load_hosts(path: &Path) -> Result<Vec<String>> {
    let hosts = parse_inventory(&load_inventory(path)?);
    if hosts.is_empty() {
        return Err(Error::InvalidInput("server inventory lists no hosts".to_string()).into());
    }
    Ok(hosts)
}

/// Errors that abort only the current flow and return to the menu.
fn is_flow_local(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<Error>(),
            Some(
                Error::NotFound { .. }
                    | Error::InvalidInput(_)
                    | Error::LayoutExists { .. }
                    | Error::MalformedRecord { .. }
            )
        )
    })
}
