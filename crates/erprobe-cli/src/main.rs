//! erprobe: run ERP end-to-end suites
//!
//! ## Usage
//!
//! ```bash
//! erprobe plan production-cycle          # Show steps and their context keys
//! erprobe run production-cycle --env qa  # Run against the qa environment
//! erprobe cleanup --kind material        # Archive leftover ERPTEST_MATERIAL rows
//! erprobe config                         # Print the effective configuration
//! ```

use clap::Parser;
use erprobe_cli::{handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Printer, Verbosity};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", console::style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    console::set_colors_enabled(config.color.should_color());
    logging::init(&config)?;
    let printer = Printer::new(config.verbosity.is_quiet());

    let erp = handlers::load_config(cli.config.as_deref(), cli.env.as_deref())?;
    tracing::debug!(environment = %erp.environment, "configuration loaded");

    match cli.command {
        Commands::Run(args) => handlers::run(erp, &args, &printer).await,
        Commands::Plan(args) => handlers::plan(&args, &printer),
        Commands::Cleanup(args) => handlers::cleanup(erp, &args, &printer).await,
        Commands::Config(args) => handlers::config(&erp, &args, &printer),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(color)
        .with_json_logs(cli.json_logs)
}
