//! Typed failure classes surfaced to the user.
//!
//! Orchestration code works in `anyhow::Result`; these variants are raised
//! inside those chains so callers (and `main`) can classify a failure with
//! `err.downcast_ref::<Error>()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::exit_codes;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more required external programs are not on `PATH`.
    #[error("missing required programs: {}", .0.join(", "))]
    MissingDependency(Vec<String>),

    /// No layout file exists for the requested name.
    #[error("layout '{name}' not found")]
    NotFound { name: String },

    /// A layout line does not have exactly three delimited fields.
    #[error("malformed record in {} line {line}: '{content}'", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// User or configuration input that cannot be used as given.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A layout with this name already exists and the user declined replacing it.
    #[error("layout '{name}' already exists")]
    LayoutExists { name: String },

    /// The multiplexer refused to create the session.
    #[error("cannot create session '{session}': {reason}")]
    SessionCreate { session: String, reason: String },

    /// An external program exited unsuccessfully.
    #[error("{program} {} failed ({}): {stderr}", .args.join(" "), describe_code(.code))]
    ExternalCommand {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },
}

impl Error {
    /// Stable process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } => exit_codes::NOT_FOUND,
            Error::MissingDependency(_) => exit_codes::MISSING_DEPENDENCY,
            Error::InvalidInput(_) | Error::MalformedRecord { .. } | Error::LayoutExists { .. } => {
                exit_codes::INVALID_INPUT
            }
            Error::SessionCreate { .. } | Error::ExternalCommand { .. } => exit_codes::FAILURE,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {code}"),
        None => "killed by signal".to_string(),
    }
}

/// Map any error chain to an exit code, using the first typed [`Error`] found.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map_or(exit_codes::FAILURE, Error::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_code_found_through_context() {
        let err = Err::<(), _>(Error::NotFound {
            name: "ops".to_string(),
        })
        .context("load layout ops")
        .unwrap_err();
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);
    }

    #[test]
    fn untyped_errors_map_to_failure() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&err), exit_codes::FAILURE);
    }

    #[test]
    fn external_command_message_names_program_and_code() {
        let err = Error::ExternalCommand {
            program: "tmux".to_string(),
            args: vec!["attach".to_string()],
            code: Some(1),
            stderr: "no sessions".to_string(),
        };
        assert_eq!(err.to_string(), "tmux attach failed (exit 1): no sessions");
    }
}
