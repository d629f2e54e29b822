//! Tracing subscriber setup

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter from `RUST_LOG`, falling back to the verbosity default
fn filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber, writing to stderr
pub fn init(config: &CliConfig) -> CliResult<()> {
    let json = config.json_logs.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text = (!config.json_logs).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.color.should_color())
            .with_target(config.verbosity.is_verbose())
    });
    tracing_subscriber::registry()
        .with(filter(config))
        .with(json)
        .with(text)
        .try_init()
        .map_err(|e| CliError::Logging {
            message: e.to_string(),
        })
}
