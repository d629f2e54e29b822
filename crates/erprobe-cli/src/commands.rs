//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use erprobe::FixtureKind;
use std::path::PathBuf;

/// erprobe: end-to-end suites for the ERP web application
#[derive(Parser, Debug)]
#[command(name = "erprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "ERPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment to target, overriding the configuration
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a suite against the configured environment
    Run(RunArgs),

    /// Show the steps of a suite without running it
    Plan(PlanArgs),

    /// Archive leftover test fixtures
    Cleanup(CleanupArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite name (production-cycle, fixtures)
    pub suite: String,

    /// Existing product to launch orders for
    #[arg(long)]
    pub product: Option<String>,

    /// Units received into stock
    #[arg(long)]
    pub stock_quantity: Option<u32>,

    /// Units ordered
    #[arg(long)]
    pub order_quantity: Option<u32>,

    /// Units disassembled after completion
    #[arg(long)]
    pub disassemble_quantity: Option<u32>,

    /// Keep the fixtures created by the run
    #[arg(long)]
    pub no_teardown: bool,

    /// Directory for the report and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Suite name
    pub suite: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: PlanFormat,
}

/// Plan output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlanFormat {
    /// One line per step
    #[default]
    Text,
    /// JSON array of steps
    Json,
}

/// Arguments for the cleanup command
#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// Only this fixture kind (order, product, assembly, detail, material, equipment, user)
    #[arg(short, long, value_parser = parse_kind)]
    pub kind: Option<FixtureKind>,

    /// Archive rows with this prefix instead of the kind's own
    #[arg(short, long, requires = "kind")]
    pub prefix: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Only validate, print nothing on success
    #[arg(long)]
    pub check: bool,
}

fn parse_kind(raw: &str) -> Result<FixtureKind, String> {
    raw.parse().map_err(|e: erprobe::ErpError| e.to_string())
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["erprobe", "run", "production-cycle"]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.suite, "production-cycle");
                assert!(!args.no_teardown);
                assert!(args.product.is_none());
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_run_with_options() {
            let cli = Cli::parse_from([
                "erprobe",
                "run",
                "production-cycle",
                "--product",
                "Gearbox",
                "--order-quantity",
                "4",
                "--no-teardown",
                "-o",
                "out",
            ]);
            if let Commands::Run(args) = cli.command {
                assert_eq!(args.product.as_deref(), Some("Gearbox"));
                assert_eq!(args.order_quantity, Some(4));
                assert!(args.no_teardown);
                assert_eq!(args.output, Some(PathBuf::from("out")));
            } else {
                panic!("expected Run command");
            }
        }

        #[test]
        fn test_parse_plan_json() {
            let cli = Cli::parse_from(["erprobe", "plan", "fixtures", "--format", "json"]);
            if let Commands::Plan(args) = cli.command {
                assert_eq!(args.format, PlanFormat::Json);
            } else {
                panic!("expected Plan command");
            }
        }

        #[test]
        fn test_parse_cleanup_kind() {
            let cli = Cli::parse_from(["erprobe", "cleanup", "--kind", "Material"]);
            if let Commands::Cleanup(args) = cli.command {
                assert_eq!(args.kind, Some(FixtureKind::Material));
                assert!(args.prefix.is_none());
            } else {
                panic!("expected Cleanup command");
            }
        }

        #[test]
        fn test_cleanup_unknown_kind_rejected() {
            assert!(Cli::try_parse_from(["erprobe", "cleanup", "--kind", "invoice"]).is_err());
        }

        #[test]
        fn test_cleanup_prefix_requires_kind() {
            assert!(Cli::try_parse_from(["erprobe", "cleanup", "--prefix", "ERPTEST_MATERIAL_0101"]).is_err());
            assert!(Cli::try_parse_from([
                "erprobe",
                "cleanup",
                "--kind",
                "material",
                "--prefix",
                "ERPTEST_MATERIAL_0101"
            ])
            .is_ok());
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from([
                "erprobe",
                "config",
                "--env",
                "staging",
                "-vv",
                "--json-logs",
                "--color",
                "never",
            ]);
            assert_eq!(cli.env.as_deref(), Some("staging"));
            assert_eq!(cli.verbose, 2);
            assert!(cli.json_logs);
            assert!(matches!(cli.color, ColorArg::Never));
        }

        #[test]
        fn test_run_requires_suite() {
            assert!(Cli::try_parse_from(["erprobe", "run"]).is_err());
        }
    }
}
