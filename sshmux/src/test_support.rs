//! Test-only fakes for the multiplexer and dialog seams.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use anyhow::{Result, anyhow};

use crate::core::layout::WindowSpec;
use crate::io::dialog::{Dialog, MenuItem};
use crate::io::layout_store::LayoutStore;
use crate::io::tmux::Multiplexer;

/// One recorded multiplexer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    NewSession { session: String },
    NewWindow { session: String, index: usize, label: String },
    SendLine { session: String, index: usize, line: String },
    SelectWindow { session: String, index: usize },
    Attach { session: String },
    SourceFile { path: String },
}

/// Multiplexer that records calls instead of spawning tmux.
#[derive(Debug, Default)]
pub struct RecordingMultiplexer {
    calls: RefCell<Vec<MuxCall>>,
    sessions: RefCell<BTreeSet<String>>,
    server_running: bool,
    fail_attach: bool,
}

impl RecordingMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a session with this name already exists.
    pub fn with_session(self, session: &str) -> Self {
        self.sessions.borrow_mut().insert(session.to_string());
        self
    }

    pub fn with_server_running(mut self, running: bool) -> Self {
        self.server_running = running;
        self
    }

    /// Make `attach` fail, as when no terminal is available.
    pub fn with_failing_attach(mut self) -> Self {
        self.fail_attach = true;
        self
    }

    pub fn calls(&self) -> Vec<MuxCall> {
        self.calls.borrow().clone()
    }

    /// `(index, label)` of every created window, in creation order.
    pub fn windows(&self) -> Vec<(usize, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                MuxCall::NewWindow { index, label, .. } => Some((*index, label.clone())),
                _ => None,
            })
            .collect()
    }

    /// Lines sent to window `index`.
    pub fn lines_for(&self, index: usize) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                MuxCall::SendLine { index: i, line, .. } if *i == index => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MuxCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Multiplexer for RecordingMultiplexer {
    fn has_session(&self, session: &str) -> Result<bool> {
        Ok(self.sessions.borrow().contains(session))
    }

    fn new_session(&self, session: &str) -> Result<()> {
        if !self.sessions.borrow_mut().insert(session.to_string()) {
            return Err(anyhow!("duplicate session: {session}"));
        }
        self.record(MuxCall::NewSession {
            session: session.to_string(),
        });
        Ok(())
    }

    fn new_window(&self, session: &str, index: usize, label: &str) -> Result<()> {
        self.record(MuxCall::NewWindow {
            session: session.to_string(),
            index,
            label: label.to_string(),
        });
        Ok(())
    }

    fn send_line(&self, session: &str, index: usize, line: &str) -> Result<()> {
        self.record(MuxCall::SendLine {
            session: session.to_string(),
            index,
            line: line.to_string(),
        });
        Ok(())
    }

    fn select_window(&self, session: &str, index: usize) -> Result<()> {
        self.record(MuxCall::SelectWindow {
            session: session.to_string(),
            index,
        });
        Ok(())
    }

    fn attach(&self, session: &str) -> Result<()> {
        if self.fail_attach {
            return Err(anyhow!("open terminal failed: not a terminal"));
        }
        self.record(MuxCall::Attach {
            session: session.to_string(),
        });
        Ok(())
    }

    fn server_running(&self) -> bool {
        self.server_running
    }

    fn source_file(&self, path: &str) -> Result<()> {
        self.record(MuxCall::SourceFile {
            path: path.to_string(),
        });
        Ok(())
    }
}

/// A queued dialog answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Menu tag or input text.
    Text(String),
    /// Confirmation result.
    Confirm(bool),
    /// User pressed Cancel/Escape.
    Cancel,
}

/// Dialog that replays queued answers and records every prompt shown.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: RefCell<VecDeque<Answer>>,
    prompts: RefCell<Vec<String>>,
    messages: RefCell<Vec<String>>,
}

impl ScriptedDialog {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            ..Self::default()
        }
    }

    /// Shorthand for a script of text answers.
    pub fn texts(answers: &[&str]) -> Self {
        Self::new(
            answers
                .iter()
                .map(|a| Answer::Text((*a).to_string()))
                .collect(),
        )
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for prompt '{prompt}'"))
    }
}

impl Dialog for ScriptedDialog {
    fn menu(&self, _title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<String>> {
        match self.next(prompt)? {
            Answer::Text(tag) if items.iter().any(|item| item.tag == tag) => Ok(Some(tag)),
            Answer::Text(tag) => Err(anyhow!("scripted menu answer '{tag}' is not an item")),
            Answer::Cancel => Ok(None),
            Answer::Confirm(_) => Err(anyhow!("scripted confirm answer given to a menu")),
        }
    }

    fn input(&self, _title: &str, prompt: &str, _default: &str) -> Result<Option<String>> {
        match self.next(prompt)? {
            Answer::Text(text) => Ok(Some(text)),
            Answer::Cancel => Ok(None),
            Answer::Confirm(_) => Err(anyhow!("scripted confirm answer given to an input")),
        }
    }

    fn confirm(&self, _title: &str, prompt: &str) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            Answer::Cancel => Ok(false),
            Answer::Text(_) => Err(anyhow!("scripted text answer given to a confirm")),
        }
    }

    fn message(&self, _title: &str, text: &str) -> Result<()> {
        self.messages.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Write `windows` as layout `name` in `store`.
pub fn write_layout(store: &LayoutStore, name: &str, windows: &[WindowSpec]) -> Result<()> {
    for window in windows {
        store.append(name, window)?;
    }
    Ok(())
}

/// The three-window `ops` layout used across tests.
pub fn ops_windows() -> Vec<WindowSpec> {
    [
        ("db1", "db1", "bash"),
        ("db1", "db1-tail", "tail -f /var/log/syslog"),
        ("web1", "web1", "bash"),
    ]
    .into_iter()
    .map(|(target, label, command)| WindowSpec {
        target: target.to_string(),
        label: label.to_string(),
        command: command.to_string(),
    })
    .collect()
}

/// Temporary home directory with the default `~/.sshmux` layout.
pub struct TestHome {
    dir: tempfile::TempDir,
}

impl TestHome {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the server inventory at its default location.
    pub fn write_inventory(&self, contents: &str) -> Result<()> {
        let path = self.path().join(".sshmux/servers");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
