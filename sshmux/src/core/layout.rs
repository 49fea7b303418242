//! Layout record codec.
//!
//! A layout file holds one window per line as `target|label|command`, in
//! creation order. There is no escaping, so field values are validated to be
//! delimiter-free before a record is ever encoded.

use std::path::Path;

use crate::error::Error;

/// Field separator used on disk.
pub const DELIMITER: char = '|';

/// Command meaning "just open an interactive shell".
pub const SHELL_SENTINEL: &str = "bash";

/// File extension of layout files (without the dot).
pub const LAYOUT_EXTENSION: &str = "layout";

/// One window of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    /// SSH destination.
    pub target: String,
    /// Multiplexer window name.
    pub label: String,
    /// Command run remotely after connecting, or [`SHELL_SENTINEL`].
    pub command: String,
}

impl WindowSpec {
    /// Build a validated spec. An empty command becomes the shell sentinel.
    pub fn new(
        target: impl Into<String>,
        label: impl Into<String>,
        command: impl Into<String>,
    ) -> Result<Self, Error> {
        let target = target.into().trim().to_string();
        let label = label.into().trim().to_string();
        let mut command = command.into().trim().to_string();
        if command.is_empty() {
            command = SHELL_SENTINEL.to_string();
        }
        let spec = Self {
            target,
            label,
            command,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Window that opens a bare shell on `target`, named after it.
    pub fn shell(target: impl Into<String>) -> Result<Self, Error> {
        let target = target.into();
        Self::new(target.clone(), target, SHELL_SENTINEL)
    }

    /// True when the window should open a plain interactive login.
    pub fn is_shell(&self) -> bool {
        self.command == SHELL_SENTINEL
    }

    /// Remote command to run, or `None` for the shell sentinel.
    pub fn remote_command(&self) -> Option<&str> {
        if self.is_shell() {
            None
        } else {
            Some(&self.command)
        }
    }

    /// Check that every field can be written and read back unchanged.
    pub fn validate(&self) -> Result<(), Error> {
        if self.target.is_empty() {
            return Err(Error::InvalidInput("window target must not be empty".into()));
        }
        if self.label.is_empty() {
            return Err(Error::InvalidInput("window label must not be empty".into()));
        }
        for (field, value) in [
            ("target", &self.target),
            ("label", &self.label),
            ("command", &self.command),
        ] {
            if value.contains(DELIMITER) {
                return Err(Error::InvalidInput(format!(
                    "window {field} must not contain '{DELIMITER}': '{value}'"
                )));
            }
            if value.contains(['\n', '\r']) {
                return Err(Error::InvalidInput(format!(
                    "window {field} must be a single line"
                )));
            }
        }
        Ok(())
    }
}

/// Encode one record, newline-terminated.
pub fn encode_record(spec: &WindowSpec) -> String {
    format!(
        "{}{DELIMITER}{}{DELIMITER}{}\n",
        spec.target, spec.label, spec.command
    )
}

/// Parse a single line (without its newline).
///
/// Returns `None` when the line does not have exactly three fields or has an
/// empty target or label.
pub fn parse_record(line: &str) -> Option<WindowSpec> {
    let mut fields = line.split(DELIMITER);
    let target = fields.next()?.trim();
    let label = fields.next()?.trim();
    let command = fields.next()?.trim();
    if fields.next().is_some() || target.is_empty() || label.is_empty() {
        return None;
    }
    let command = if command.is_empty() {
        SHELL_SENTINEL
    } else {
        command
    };
    Some(WindowSpec {
        target: target.to_string(),
        label: label.to_string(),
        command: command.to_string(),
    })
}

/// Parse a whole layout file. Blank lines are skipped; any other line that is
/// not a valid record fails the whole parse.
pub fn parse_layout(path: &Path, contents: &str) -> Result<Vec<WindowSpec>, Error> {
    let mut windows = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line) {
            Some(spec) => windows.push(spec),
            None => {
                return Err(Error::MalformedRecord {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
        }
    }
    Ok(windows)
}

/// Check that `name` is usable as a layout file stem.
pub fn validate_layout_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("layout name must not be empty".into()));
    }
    if name != name.trim() {
        return Err(Error::InvalidInput(format!(
            "layout name must not have surrounding whitespace: '{name}'"
        )));
    }
    // tmux rewrites '.' and ':' in session names, so targets would miss.
    if name.contains(['/', '\\', '.', ':', DELIMITER, '\n']) {
        return Err(Error::InvalidInput(format!(
            "layout name must not contain '/', '\\', '.', ':' or '{DELIMITER}': '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(target: &str, label: &str, command: &str) -> WindowSpec {
        WindowSpec::new(target, label, command).expect("valid spec")
    }

    #[test]
    fn encodes_fields_in_fixed_order() {
        let line = encode_record(&spec("db1", "db1-tail", "tail -f /var/log/syslog"));
        assert_eq!(line, "db1|db1-tail|tail -f /var/log/syslog\n");
    }

    #[test]
    fn parses_three_field_record() {
        let parsed = parse_record("web1|web1|bash").expect("record");
        assert_eq!(parsed, spec("web1", "web1", "bash"));
        assert!(parsed.is_shell());
        assert_eq!(parsed.remote_command(), None);
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert_eq!(parse_record("db1 db1 bash"), None);
        assert_eq!(parse_record("db1|db1"), None);
        assert_eq!(parse_record("db1|db1|bash|extra"), None);
        assert_eq!(parse_record("|label|bash"), None);
    }

    #[test]
    fn empty_command_becomes_sentinel() {
        assert_eq!(spec("h", "h", "  ").command, SHELL_SENTINEL);
        assert_eq!(parse_record("h|h|").expect("record").command, SHELL_SENTINEL);
    }

    #[test]
    fn window_spec_rejects_delimiter_and_newlines() {
        let err = WindowSpec::new("db1", "a|b", "bash").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = WindowSpec::new("db1", "db1", "echo a\necho b").unwrap_err();
        assert!(err.to_string().contains("single line"));
        assert!(WindowSpec::new("", "x", "bash").is_err());
    }

    #[test]
    fn parse_layout_skips_blank_lines_and_fails_fast_on_malformed() {
        let path = Path::new("/tmp/ops.layout");
        let ok = parse_layout(path, "a|a|bash\n\n  \nb|b|top\n").expect("parse");
        assert_eq!(ok.len(), 2);
        assert_eq!(ok[1].remote_command(), Some("top"));

        let err = parse_layout(path, "a|a|bash\nbroken line\nb|b|top\n").unwrap_err();
        match err {
            Error::MalformedRecord { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "broken line");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn layout_names_are_validated() {
        assert!(validate_layout_name("ops").is_ok());
        assert!(validate_layout_name("prod-db_2").is_ok());
        assert!(validate_layout_name("").is_err());
        assert!(validate_layout_name(".hidden").is_err());
        assert!(validate_layout_name("a/b").is_err());
        assert!(validate_layout_name("a|b").is_err());
        assert!(validate_layout_name(" ops").is_err());
        assert!(validate_layout_name("web.prod").is_err());
        assert!(validate_layout_name("web:prod").is_err());
    }
}
