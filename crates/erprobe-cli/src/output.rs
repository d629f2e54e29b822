//! Human-readable rendering of plans, reports and cleanup results

use console::{style, Term};
use erprobe::report::ReportSummary;
use erprobe::scenario::StepPlan;
use erprobe::{CleanupReport, FixtureKind, RunReport, StepRecord, StepStatus};
use std::fmt::Write as _;
use std::path::Path;

/// Writes command output to stdout unless quiet
#[derive(Debug)]
pub struct Printer {
    term: Term,
    /// Quiet mode
    pub quiet: bool,
}

impl Printer {
    /// Printer on stdout
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            quiet,
        }
    }

    /// Print text, one line per line
    pub fn print(&self, text: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        for line in text.lines() {
            self.term.write_line(line)?;
        }
        Ok(())
    }
}

/// One line per step with what it reads and writes
#[must_use]
pub fn render_plan(suite: &str, plan: &[StepPlan]) -> String {
    let mut out = format!("{}\n", style(suite).bold());
    for (i, step) in plan.iter().enumerate() {
        let _ = write!(out, "{:>3}. {}", i + 1, step.name);
        if !step.requires.is_empty() {
            let _ = write!(out, "  reads: {}", step.requires.join(", "));
        }
        if !step.produces.is_empty() {
            let _ = write!(out, "  writes: {}", step.produces.join(", "));
        }
        out.push('\n');
    }
    out
}

fn status_mark(status: StepStatus) -> String {
    match status {
        StepStatus::Passed => style("PASS").green().to_string(),
        StepStatus::Failed => style("FAIL").red().bold().to_string(),
        StepStatus::Skipped => style("SKIP").yellow().to_string(),
    }
}

fn render_step(out: &mut String, step: &StepRecord) {
    let _ = writeln!(out, "  {} {} ({}ms)", status_mark(step.status), step.name, step.duration_ms);
    if let Some(error) = &step.error {
        let _ = writeln!(out, "       {}", style(error).red());
    }
    for failure in &step.soft_failures {
        let _ = writeln!(out, "       soft: {}", failure.message);
    }
    for note in &step.annotations {
        let _ = writeln!(out, "       {}", style(note).dim());
    }
}

fn render_summary(out: &mut String, summary: &ReportSummary) {
    let _ = writeln!(
        out,
        "{} passed, {} failed, {} skipped, {} soft failure(s)",
        style(summary.passed).green(),
        style(summary.failed).red(),
        style(summary.skipped).yellow(),
        summary.soft_failures
    );
}

/// Steps, cleanup and totals of a finished run
#[must_use]
pub fn render_report(report: &RunReport, written_to: Option<&Path>) -> String {
    let mut out = format!(
        "{} on {} (run {})\n",
        style(&report.suite).bold(),
        report.environment,
        report.run_id
    );
    for step in &report.steps {
        render_step(&mut out, step);
    }
    if !report.cleanup.is_empty() {
        let archived: usize = report.cleanup.iter().map(|c| c.archived.len()).sum();
        let failed: usize = report.cleanup.iter().map(|c| c.failed.len()).sum();
        let _ = writeln!(out, "cleanup: {archived} archived, {failed} failed");
    }
    render_summary(&mut out, &report.summary());
    if let Some(path) = written_to {
        let _ = writeln!(out, "report: {}", path.display());
    }
    out
}

/// Result of archiving one fixture kind
#[must_use]
pub fn render_cleanup(kind: FixtureKind, report: &CleanupReport) -> String {
    let mut out = format!(
        "{kind}: {} archived, {} skipped, {} failed\n",
        report.archived.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for row in &report.failed {
        let _ = writeln!(out, "  {} {}: {}", style("FAIL").red(), row.text, row.reason);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use erprobe::cleanup::FailedRow;
    use std::time::Duration;

    fn plain() {
        console::set_colors_enabled(false);
    }

    #[test]
    fn test_render_plan() {
        plain();
        let plan = vec![
            StepPlan {
                name: "launch-order".into(),
                requires: vec!["product".into()],
                produces: vec!["order_number".into()],
            },
            StepPlan {
                name: "ship-order".into(),
                requires: vec!["order_number".into()],
                produces: vec![],
            },
        ];
        let text = render_plan("production-cycle", &plan);
        assert!(text.contains("  1. launch-order  reads: product  writes: order_number"));
        assert!(text.contains("  2. ship-order  reads: order_number\n"));
    }

    #[test]
    fn test_render_report() {
        plain();
        let mut report = RunReport::new("fixtures", "local");
        report.record(StepRecord::passed("create-user", Duration::from_millis(1200)));
        report.record(StepRecord::failed("create-material", Duration::from_millis(300), "form open"));
        report.record(StepRecord::skipped("create-equipment"));
        report.cleanup.push(CleanupReport {
            archived: vec!["ERPTEST_TEST_USER_t_1".into()],
            ..CleanupReport::default()
        });
        let text = render_report(&report, Some(Path::new("artifacts/run.json")));
        assert!(text.contains("PASS create-user (1200ms)"));
        assert!(text.contains("FAIL create-material"));
        assert!(text.contains("form open"));
        assert!(text.contains("SKIP create-equipment"));
        assert!(text.contains("cleanup: 1 archived, 0 failed"));
        assert!(text.contains("1 passed, 1 failed, 1 skipped"));
        assert!(text.contains("report: artifacts/run.json"));
    }

    #[test]
    fn test_render_cleanup_lists_failures() {
        plain();
        let report = CleanupReport {
            archived: vec!["a".into()],
            failed: vec![FailedRow {
                text: "ERPTEST_MATERIAL_t_2".into(),
                reason: "archive button disabled".into(),
            }],
            ..CleanupReport::default()
        };
        let text = render_cleanup(FixtureKind::Material, &report);
        assert!(text.starts_with("material: 1 archived, 0 skipped, 1 failed"));
        assert!(text.contains("ERPTEST_MATERIAL_t_2: archive button disabled"));
    }

    #[test]
    fn test_quiet_printer_prints_nothing() {
        assert!(Printer::new(true).print("hidden").is_ok());
    }
}
