//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

/// Environment variable overriding `--log-level` with a full filter directive.
pub const LOG_ENV_VAR: &str = "LOGKEEPER_LOG";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn setup_logging(level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
