use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize logging.
///
/// Logs go to stderr so they never interleave with the conversation on
/// stdout. `RUST_LOG` wins over the configured filter.
pub fn init(config: &LoggingConfig) {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(filter_layer);

    match config.format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

/// Whether debug logs can land on the same terminal as the conversation.
///
/// Transport events are emitted at debug level while a reply is awaited, so
/// a terminal view must not rewrite lines in place when this holds.
pub fn debug_logs_on_terminal() -> bool {
    LevelFilter::current() >= LevelFilter::DEBUG && std::io::stderr().is_terminal()
}
