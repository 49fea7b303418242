//! Session construction: turn a layout, or answers typed at prompts, into a
//! tmux session with one ssh window per [`WindowSpec`], then attach to it.
//!
//! Construction is strictly sequential. Remote logins are fire-and-forget:
//! only the multiplexer commands are checked, never whether ssh connected.
//! An aborted build leaves the session and any records already written.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::inventory::parse_inventory;
use crate::core::layout::{WindowSpec, validate_layout_name};
use crate::core::prompt::{coerce_count, default_label};
use crate::core::remote::{RemoteShell, RemoteShellRequest};
use crate::core::session_state::SessionState;
use crate::error::Error;
use crate::io::dialog::Dialog;
use crate::io::layout_store::LayoutStore;
use crate::io::tmux::Multiplexer;

const TITLE: &str = "Create layout";

/// Builds one multiplexer session.
pub struct SessionBuilder<'a, M: ?Sized, S: ?Sized> {
    mux: &'a M,
    shell: &'a S,
    prefix: String,
    session: Option<String>,
    state: SessionState,
}

impl<'a, M: Multiplexer + ?Sized, S: RemoteShell + ?Sized> SessionBuilder<'a, M, S> {
    pub fn new(mux: &'a M, shell: &'a S, prefix: impl Into<String>) -> Self {
        Self {
            mux,
            shell,
            prefix: prefix.into(),
            session: None,
            state: SessionState::Empty,
        }
    }

    /// Session name for a layout.
    pub fn session_name(&self, layout: &str) -> String {
        format!("{}{layout}", self.prefix)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Create the detached session for `layout`. An existing session of the
    /// same name is an error, never reused, and so is a multiplexer that
    /// cannot be queried.
    #[instrument(skip_all, fields(layout))]
    pub fn create_session(&mut self, layout: &str) -> Result<()> {
        let next = self.state.on_created()?;
        let session = self.session_name(layout);
        match self.mux.has_session(&session) {
            Ok(false) => {}
            Ok(true) => {
                return Err(Error::SessionCreate {
                    session,
                    reason: "a session with this name already exists".to_string(),
                }
                .into());
            }
            Err(err) => {
                return Err(Error::SessionCreate {
                    session,
                    reason: format!("multiplexer unavailable: {err:#}"),
                }
                .into());
            }
        }
        if let Err(err) = self.mux.new_session(&session) {
            return Err(Error::SessionCreate {
                session,
                reason: format!("{err:#}"),
            }
            .into());
        }
        info!(session = %session, "session created");
        self.session = Some(session);
        self.state = next;
        Ok(())
    }

    /// Create window `index` for `spec` and start its remote connection.
    #[instrument(skip_all, fields(index, label = %spec.label, target = %spec.target))]
    pub fn add_window(&mut self, index: usize, spec: &WindowSpec) -> Result<()> {
        let next = self.state.on_window(index)?;
        let session = self.current_session()?;
        let request = RemoteShellRequest::for_window(spec);
        let line = self.shell.command_line(&request)?;
        self.mux
            .new_window(session, index, &spec.label)
            .with_context(|| format!("create window {index} '{}'", spec.label))?;
        self.mux
            .send_line(session, index, &line)
            .with_context(|| format!("start connection in window {index}"))?;
        debug!(line = %line, "window started");
        self.state = next;
        Ok(())
    }

    /// Select window 0 and attach; blocks until the user detaches.
    #[instrument(skip_all)]
    pub fn finalize(&mut self) -> Result<()> {
        let built = self.state.on_built()?;
        let session = self.current_session()?.to_string();
        self.mux.select_window(&session, 0)?;
        self.state = built;
        info!(session = %session, "attaching");
        self.mux
            .attach(&session)
            .with_context(|| format!("attach to {session}"))?;
        self.state = built.on_attached()?;
        Ok(())
    }

    /// Index the next window must use.
    pub fn next_index(&self) -> usize {
        self.state.window_count().unwrap_or(0)
    }

    fn current_session(&self) -> Result<&str> {
        self.session
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no session created"))
    }
}

/// Rebuild the session for a saved layout and attach to it.
///
/// The layout is read in full before any session is created, so a missing
/// or malformed layout leaves tmux untouched.
#[instrument(skip_all, fields(layout))]
pub fn replay<M: Multiplexer + ?Sized, S: RemoteShell + ?Sized>(
    store: &LayoutStore,
    layout: &str,
    mux: &M,
    shell: &S,
    prefix: &str,
) -> Result<()> {
    let windows = store
        .read_all(layout)
        .with_context(|| format!("load layout {layout}"))?;
    if windows.is_empty() {
        return Err(Error::InvalidInput(format!("layout '{layout}' has no windows")).into());
    }
    let mut builder = SessionBuilder::new(mux, shell, prefix);
    builder.create_session(layout)?;
    for (index, spec) in windows.iter().enumerate() {
        builder.add_window(index, spec)?;
    }
    info!(windows = windows.len(), "layout replayed");
    builder.finalize()
}

/// Build a new layout from an inventory, prompting for extra windows per
/// host, recording every window as it is created, then attach.
///
/// Any records already stored under `layout` are discarded once the session
/// exists, so a failure before that point leaves the old layout intact.
#[instrument(skip_all, fields(layout))]
pub fn build_interactive<M, S, D>(
    store: &LayoutStore,
    layout: &str,
    inventory: &str,
    mux: &M,
    shell: &S,
    dialog: &D,
    prefix: &str,
) -> Result<()>
where
    M: Multiplexer + ?Sized,
    S: RemoteShell + ?Sized,
    D: Dialog + ?Sized,
{
    validate_layout_name(layout)?;
    let hosts = parse_inventory(inventory);
    if hosts.is_empty() {
        return Err(Error::InvalidInput("server inventory lists no hosts".to_string()).into());
    }
    let mut shells = Vec::with_capacity(hosts.len());
    for host in &hosts {
        match WindowSpec::shell(host.as_str()) {
            Ok(spec) => shells.push(spec),
            Err(err) => {
                warn!(host = %host, err = %err, "skipping inventory host");
                dialog.message(TITLE, &format!("Skipping host '{host}': {err}"))?;
            }
        }
    }
    if shells.is_empty() {
        return Err(
            Error::InvalidInput("server inventory lists no usable hosts".to_string()).into(),
        );
    }

    let mut builder = SessionBuilder::new(mux, shell, prefix);
    builder.create_session(layout)?;
    if store.exists(layout)? {
        info!("replacing existing layout");
        store.remove(layout)?;
    }

    for spec in &shells {
        let host = spec.target.as_str();
        add_and_record(&mut builder, store, layout, spec)?;

        let prompt = format!("How many extra windows for {host}?");
        let answer = dialog.input(TITLE, &prompt, "0")?.unwrap_or_default();
        let (count, coerced) = coerce_count(&answer);
        if coerced {
            warn!(host = %host, answer = %answer, "non-numeric window count, using 0");
        }

        for n in 1..=count {
            let prompt = format!("Command for {host} window {n}");
            let Some(command) = dialog.input(TITLE, &prompt, "")? else {
                break;
            };
            let fallback = default_label(host, n);
            let prompt = format!("Label for {host} window {n}");
            let Some(label) = dialog.input(TITLE, &prompt, &fallback)? else {
                break;
            };
            let label = if label.trim().is_empty() {
                fallback
            } else {
                label
            };
            match WindowSpec::new(host, label, command) {
                Ok(spec) => add_and_record(&mut builder, store, layout, &spec)?,
                Err(err) => {
                    warn!(host = %host, err = %err, "skipping window");
                    dialog.message(TITLE, &format!("Skipping window: {err}"))?;
                }
            }
        }
    }

    builder.finalize()
}

fn add_and_record<M, S>(
    builder: &mut SessionBuilder<'_, M, S>,
    store: &LayoutStore,
    layout: &str,
    spec: &WindowSpec,
) -> Result<()>
where
    M: Multiplexer + ?Sized,
    S: RemoteShell + ?Sized,
{
    let index = builder.next_index();
    builder.add_window(index, spec)?;
    store
        .append(layout, spec)
        .with_context(|| format!("record window {index} of {layout}"))
}
