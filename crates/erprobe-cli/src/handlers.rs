//! Command handlers

use crate::commands::{CleanupArgs, ConfigArgs, PlanArgs, PlanFormat, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::{render_plan, Printer};
use erprobe::{ErpConfig, SuiteOptions};
use std::path::Path;

/// Load the configuration and apply the `--env` override
pub fn load_config(path: Option<&Path>, env: Option<&str>) -> CliResult<ErpConfig> {
    let mut config = ErpConfig::load(path)?;
    if let Some(env) = env {
        config.environment = env.to_string();
        config.validate()?;
    }
    Ok(config)
}

/// Suite options from the run flags
#[must_use]
pub fn suite_options(args: &RunArgs) -> SuiteOptions {
    let defaults = SuiteOptions::default();
    SuiteOptions {
        product: args.product.clone().unwrap_or(defaults.product),
        stock_quantity: args.stock_quantity.unwrap_or(defaults.stock_quantity),
        order_quantity: args.order_quantity.unwrap_or(defaults.order_quantity),
        disassemble_quantity: args.disassemble_quantity.unwrap_or(defaults.disassemble_quantity),
        teardown: !args.no_teardown,
    }
}

/// `erprobe plan`
pub fn plan(args: &PlanArgs, printer: &Printer) -> CliResult<()> {
    let pipeline = erprobe::scenario::build_suite(&args.suite, &SuiteOptions::default())?;
    let text = match args.format {
        PlanFormat::Text => render_plan(pipeline.name(), &pipeline.plan()),
        PlanFormat::Json => serde_json::to_string_pretty(&pipeline.plan())?,
    };
    printer.print(&text)?;
    Ok(())
}

/// `erprobe config`
pub fn config(config: &ErpConfig, args: &ConfigArgs, printer: &Printer) -> CliResult<()> {
    if args.check {
        tracing::info!(environment = %config.environment, "configuration valid");
        return Ok(());
    }
    printer.print(&config.to_yaml()?)?;
    Ok(())
}

#[cfg(feature = "browser")]
mod live {
    use super::{suite_options, CliError, CliResult, Printer};
    use crate::commands::{CleanupArgs, RunArgs};
    use crate::output::{render_cleanup, render_report};
    use erprobe::cleanup::CleanupTarget;
    use erprobe::fixture::full_sweep;
    use erprobe::pages::archive_fixtures;
    use erprobe::{CdpBrowser, ErpConfig, PageDriver, ScenarioContext, Session};
    use std::sync::Arc;

    async fn open_session(config: ErpConfig) -> CliResult<(CdpBrowser, Session)> {
        let browser = CdpBrowser::launch(config.browser.clone()).await?;
        let page = browser.new_page().await?;
        let session = Session::new(Arc::new(page) as Arc<dyn PageDriver>, config);
        Ok((browser, session))
    }

    pub async fn run(config: ErpConfig, args: &RunArgs, printer: &Printer) -> CliResult<()> {
        let mut config = config;
        if let Some(dir) = &args.output {
            config.artifacts_dir = dir.clone();
        }
        let artifacts = config.artifacts_dir.clone();
        let pipeline = erprobe::scenario::build_suite(&args.suite, &suite_options(args))?;
        let (browser, session) = open_session(config).await?;

        let mut ctx = ScenarioContext::new();
        let outcome = pipeline.run(&session, &mut ctx).await;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
        let report = outcome?;
        let path = report.write_to(&artifacts).await?;
        printer.print(&render_report(&report, Some(&path)))?;

        if report.is_success() {
            Ok(())
        } else {
            let summary = report.summary();
            Err(CliError::SuiteFailed {
                suite: report.suite.clone(),
                failed: summary.failed,
                skipped: summary.skipped,
            })
        }
    }

    pub async fn cleanup(config: ErpConfig, args: &CleanupArgs, printer: &Printer) -> CliResult<()> {
        let targets = match args.kind {
            Some(kind) => {
                let prefix = args.prefix.clone().unwrap_or_else(|| kind.prefix().to_string());
                vec![(kind, CleanupTarget::prefix(prefix)?)]
            }
            None => full_sweep()?,
        };
        let (browser, session) = open_session(config).await?;

        let mut failed = 0;
        for (kind, target) in targets {
            match archive_fixtures(&session, kind, &target).await {
                Ok(report) => {
                    failed += report.failed.len();
                    printer.print(&render_cleanup(kind, &report))?;
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!(%kind, error = %e, "cleanup failed");
                }
            }
        }
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(CliError::CleanupIncomplete { failed })
        }
    }
}

/// `erprobe run`
pub async fn run(config: ErpConfig, args: &RunArgs, printer: &Printer) -> CliResult<()> {
    #[cfg(feature = "browser")]
    {
        live::run(config, args, printer).await
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = (config, args, printer);
        Err(no_browser())
    }
}

/// `erprobe cleanup`
pub async fn cleanup(config: ErpConfig, args: &CleanupArgs, printer: &Printer) -> CliResult<()> {
    #[cfg(feature = "browser")]
    {
        live::cleanup(config, args, printer).await
    }
    #[cfg(not(feature = "browser"))]
    {
        let _ = (config, args, printer);
        Err(no_browser())
    }
}

#[cfg(not(feature = "browser"))]
fn no_browser() -> CliError {
    CliError::config("built without browser support; rebuild with --features browser")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["erprobe", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_suite_options_defaults() {
        let options = suite_options(&run_args(&["fixtures"]));
        assert_eq!(options, SuiteOptions::default());
    }

    #[test]
    fn test_suite_options_overrides() {
        let options = suite_options(&run_args(&[
            "production-cycle",
            "--product",
            "Gearbox",
            "--disassemble-quantity",
            "2",
            "--no-teardown",
        ]));
        assert_eq!(options.product, "Gearbox");
        assert_eq!(options.disassemble_quantity, 2);
        assert!(!options.teardown);
        assert_eq!(options.order_quantity, SuiteOptions::default().order_quantity);
    }

    #[test]
    fn test_load_config_file_and_env_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "environment: local\nbase_urls:\n  local: http://localhost:9000\n  qa: http://qa.erp\n").unwrap();
        let config = load_config(Some(file.path()), Some("qa")).unwrap();
        assert_eq!(config.environment, "qa");
        assert_eq!(config.base_url().unwrap(), "http://qa.erp");
    }

    #[test]
    fn test_load_config_unknown_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "environment: local").unwrap();
        let err = load_config(Some(file.path()), Some("prod")).unwrap_err();
        assert!(matches!(err, CliError::Erp(_)));
    }

    #[test]
    fn test_plan_unknown_suite() {
        let args = PlanArgs {
            suite: "smoke".into(),
            format: PlanFormat::Text,
        };
        assert!(plan(&args, &Printer::new(true)).is_err());
    }

    #[test]
    fn test_plan_known_suite() {
        let args = PlanArgs {
            suite: "fixtures".into(),
            format: PlanFormat::Json,
        };
        assert!(plan(&args, &Printer::new(true)).is_ok());
    }
}
