//! Interactive prompts.
//!
//! [`Dialog`] is what the menu and session construction talk to.
//! [`WhiptailDialog`] drives a `whiptail`-compatible program; [`LineDialog`]
//! falls back to numbered menus and line prompts on any reader/writer pair.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::io::process::ensure_success;

/// One selectable menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Value returned when selected.
    pub tag: String,
    /// Text shown next to the tag.
    pub description: String,
}

impl MenuItem {
    pub fn new(tag: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            description: description.into(),
        }
    }
}

/// Prompt surface. `None` / `false` mean the user cancelled.
pub trait Dialog {
    /// Pick one item; returns its tag.
    fn menu(&self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<String>>;

    /// Free-text answer.
    fn input(&self, title: &str, prompt: &str, default: &str) -> Result<Option<String>>;

    fn confirm(&self, title: &str, prompt: &str) -> Result<bool>;

    fn message(&self, title: &str, text: &str) -> Result<()>;
}

const HEIGHT: &str = "20";
const WIDTH: &str = "70";
const LIST_HEIGHT: &str = "12";

/// Exit code whiptail uses for "Cancel"/"No".
const EXIT_CANCEL: i32 = 1;
/// Exit code whiptail uses for Escape.
const EXIT_ESCAPE: i32 = 255;

/// `whiptail` (or `dialog`) adapter.
#[derive(Debug, Clone)]
pub struct WhiptailDialog {
    program: String,
}

impl WhiptailDialog {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run the dialog program on the terminal. The answer is written to
    /// stderr, so only stderr is captured.
    #[instrument(skip_all, fields(program = %self.program))]
    fn run(&self, args: Vec<String>) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("spawn {}", self.program))?;
        match output.status.code() {
            Some(0) => {
                let answer = String::from_utf8_lossy(&output.stderr).trim().to_string();
                debug!(answer = %answer, "dialog answered");
                Ok(Some(answer))
            }
            Some(EXIT_CANCEL | EXIT_ESCAPE) => {
                debug!("dialog cancelled");
                Ok(None)
            }
            _ => {
                ensure_success(&self.program, &args, output.status, &output.stderr)?;
                Ok(None)
            }
        }
    }
}

/// Argument vectors for each dialog kind.
pub mod args {
    use super::{HEIGHT, LIST_HEIGHT, MenuItem, WIDTH};

    fn base(title: &str, kind: &str, prompt: &str) -> Vec<String> {
        ["--title", title, kind, prompt, HEIGHT, WIDTH]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn menu(title: &str, prompt: &str, items: &[MenuItem]) -> Vec<String> {
        let mut args = base(title, "--menu", prompt);
        args.push(LIST_HEIGHT.to_string());
        for item in items {
            args.push(item.tag.clone());
            args.push(item.description.clone());
        }
        args
    }

    pub fn input(title: &str, prompt: &str, default: &str) -> Vec<String> {
        let mut args = base(title, "--inputbox", prompt);
        args.push(default.to_string());
        args
    }

    pub fn confirm(title: &str, prompt: &str) -> Vec<String> {
        base(title, "--yesno", prompt)
    }

    pub fn message(title: &str, text: &str) -> Vec<String> {
        base(title, "--msgbox", text)
    }
}

impl Dialog for WhiptailDialog {
    fn menu(&self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<String>> {
        self.run(args::menu(title, prompt, items))
    }

    fn input(&self, title: &str, prompt: &str, default: &str) -> Result<Option<String>> {
        self.run(args::input(title, prompt, default))
    }

    fn confirm(&self, title: &str, prompt: &str) -> Result<bool> {
        Ok(self.run(args::confirm(title, prompt))?.is_some())
    }

    fn message(&self, title: &str, text: &str) -> Result<()> {
        self.run(args::message(title, text))?;
        Ok(())
    }
}

/// Line-oriented prompts over a reader/writer pair.
///
/// End of input, or an empty answer to a menu, is a cancel.
pub struct LineDialog<R, W> {
    reader: RefCell<R>,
    writer: RefCell<W>,
}

impl<R: BufRead, W: Write> LineDialog<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: RefCell::new(reader),
            writer: RefCell::new(writer),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn say(&self, text: &str) -> Result<()> {
        let mut writer = self.writer.borrow_mut();
        writer.write_all(text.as_bytes()).context("write prompt")?;
        writer.flush().context("flush prompt")
    }

    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .reader
            .borrow_mut()
            .read_line(&mut line)
            .context("read answer")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

impl LineDialog<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompts on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Dialog for LineDialog<R, W> {
    fn menu(&self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<String>> {
        let mut text = format!("== {title} ==\n{prompt}\n");
        for (idx, item) in items.iter().enumerate() {
            text.push_str(&format!("  {}) {} - {}\n", idx + 1, item.tag, item.description));
        }
        text.push_str("> ");
        loop {
            self.say(&text)?;
            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(None);
            }
            if let Ok(choice) = answer.parse::<usize>()
                && (1..=items.len()).contains(&choice)
            {
                return Ok(Some(items[choice - 1].tag.clone()));
            }
            if let Some(item) = items.iter().find(|item| item.tag == answer) {
                return Ok(Some(item.tag.clone()));
            }
            self.say(&format!("invalid choice '{answer}'\n"))?;
        }
    }

    fn input(&self, title: &str, prompt: &str, default: &str) -> Result<Option<String>> {
        if default.is_empty() {
            self.say(&format!("{title}: {prompt}\n> "))?;
        } else {
            self.say(&format!("{title}: {prompt} [{default}]\n> "))?;
        }
        Ok(self.read_line()?.map(|answer| {
            if answer.trim().is_empty() {
                default.to_string()
            } else {
                answer
            }
        }))
    }

    fn confirm(&self, title: &str, prompt: &str) -> Result<bool> {
        self.say(&format!("{title}: {prompt} [y/N] "))?;
        Ok(self
            .read_line()?
            .is_some_and(|answer| matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")))
    }

    fn message(&self, title: &str, text: &str) -> Result<()> {
        self.say(&format!("{title}: {text}\n"))
    }
}
