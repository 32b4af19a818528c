/*!
Logging initialization for the command-line front end.

Logs go to stderr so that datasets written to stdout stay machine-readable. The
filter comes from `RUST_LOG`; without it a sensible default is used. With the
`profiling` feature the library's profiling scopes are emitted as tracing spans
and show up under the same filter.
*/

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "info";

pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let initialized = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if initialized.is_err() {
        tracing::warn!("A global tracing subscriber was already installed");
    }
}
