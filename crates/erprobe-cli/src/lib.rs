//! erprobe CLI Library
//!
//! Command-line runner for the erprobe suites: run a suite, show its plan,
//! archive leftover fixtures, print the effective configuration.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
pub mod output;

pub use commands::{
    CleanupArgs, Cli, ColorArg, Commands, ConfigArgs, PlanArgs, PlanFormat, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Printer;
