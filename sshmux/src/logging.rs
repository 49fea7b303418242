//! Development-time tracing for debugging sshmux.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. User-facing
//! messages go through the dialog UI or stdout instead, so the default level
//! is kept at `warn` to leave the terminal clean before tmux attaches.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=sshmux=debug sshmux load ops
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
