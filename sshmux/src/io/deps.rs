//! Required-program detection and best-effort installation.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::error::Error;
use crate::io::dialog::Dialog;
use crate::io::process::run_interactive;

/// Programs from `required` that are not on `PATH`, in input order.
pub fn missing<S: AsRef<str>>(required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(|program| AsRef::<str>::as_ref(program))
        .filter(|program| which::which(program).is_err())
        .map(str::to_string)
        .collect()
}

/// Installer argv: `command` followed by the missing program names.
pub fn install_args(command: &[String], missing: &[String]) -> Option<(String, Vec<String>)> {
    let (program, base) = command.split_first()?;
    let mut args = base.to_vec();
    args.extend(missing.iter().cloned());
    Some((program.clone(), args))
}

/// Make sure every required program exists, offering to install the
/// missing ones. Still-missing programs fail with
/// [`Error::MissingDependency`].
#[instrument(skip_all)]
pub fn ensure_installed<D: Dialog + ?Sized>(
    dialog: &D,
    required: &[String],
    install_command: &[String],
) -> Result<()> {
    let absent = missing(required);
    if absent.is_empty() {
        return Ok(());
    }
    warn!(missing = ?absent, "required programs missing");
    let prompt = format!(
        "Missing programs: {}\nInstall them with '{}'?",
        absent.join(", "),
        install_command.join(" ")
    );
    if !dialog.confirm("Dependencies", &prompt)? {
        return Err(Error::MissingDependency(absent).into());
    }
    if let Some((program, args)) = install_args(install_command, &absent) {
        info!(program = %program, "installing missing programs");
        if let Err(err) = run_interactive(&program, &args) {
            warn!(err = %err, "installer failed");
        }
    }
    let still = missing(absent.as_slice());
    if still.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingDependency(still).into())
    }
}
