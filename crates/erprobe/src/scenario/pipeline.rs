//! Ordered execution of scenario steps.
//!
//! Steps declare the context keys they read and write. A pipeline is
//! validated before it runs, so a step can never start without its inputs;
//! it then runs strictly in order, and once a step fails the rest are
//! recorded as skipped. Fixtures in the ledger are archived afterwards
//! whatever the outcome.

use super::context::ScenarioContext;
use crate::cleanup::{CleanupReport, FailedRow};
use crate::fixture::FixtureLedger;
use crate::pages::archive_fixtures;
use crate::report::{RunReport, StepRecord};
use crate::result::{ErpError, ErpResult};
use crate::session::{Session, StepNotes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::time::Instant;

/// One named step of a scenario
#[async_trait]
pub trait ScenarioStep: Send + Sync {
    /// Step name, unique within a pipeline
    fn name(&self) -> &str;

    /// Context keys read
    fn requires(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Context keys written
    fn produces(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Run the step
    async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<()>;
}

/// Static description of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    /// Step name
    pub name: String,
    /// Keys read
    pub requires: Vec<String>,
    /// Keys written
    pub produces: Vec<String>,
}

/// Steps run in order against one session
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn ScenarioStep>>,
    seeded: Vec<&'static str>,
    teardown: bool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("seeded", &self.seeded)
            .field("teardown", &self.teardown)
            .finish()
    }
}

impl Pipeline {
    /// Empty pipeline
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            seeded: Vec::new(),
            teardown: true,
        }
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: impl ScenarioStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Declare a key the caller puts into the context before running
    #[must_use]
    pub fn seed(mut self, key: &'static str) -> Self {
        self.seeded.push(key);
        self
    }

    /// Whether fixtures are archived after the run (default on)
    #[must_use]
    pub const fn with_teardown(mut self, teardown: bool) -> Self {
        self.teardown = teardown;
        self
    }

    /// Pipeline name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether there are no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Description of every step, in order
    #[must_use]
    pub fn plan(&self) -> Vec<StepPlan> {
        self.steps
            .iter()
            .map(|s| StepPlan {
                name: s.name().to_string(),
                requires: s.requires().into_iter().map(String::from).collect(),
                produces: s.produces().into_iter().map(String::from).collect(),
            })
            .collect()
    }

    /// Check that every requirement is seeded or produced by an earlier step
    pub fn validate(&self) -> ErpResult<()> {
        let mut available: HashSet<&str> = self.seeded.iter().copied().collect();
        let mut names = HashSet::new();
        for step in &self.steps {
            if !names.insert(step.name()) {
                return Err(ErpError::ConfigError {
                    message: format!("step name {:?} used twice in {}", step.name(), self.name),
                });
            }
            if let Some(missing) = step.requires().into_iter().find(|k| !available.contains(k)) {
                return Err(ErpError::ScenarioOrder {
                    step: step.name().to_string(),
                    missing: missing.to_string(),
                });
            }
            available.extend(step.produces());
        }
        Ok(())
    }

    /// Run every step in order and return the report
    ///
    /// Only a pipeline that fails validation is an `Err`; step failures are
    /// recorded in the report.
    pub async fn run(&self, session: &Session, ctx: &mut ScenarioContext) -> ErpResult<RunReport> {
        self.validate()?;
        let mut report = RunReport::new(&self.name, &session.config().environment);
        tracing::info!(suite = %self.name, steps = self.steps.len(), run_id = %report.run_id, "scenario started");

        let mut failed = false;
        for step in &self.steps {
            let name = step.name();
            if failed {
                tracing::info!(step = name, "skipped");
                report.record(StepRecord::skipped(name));
                continue;
            }
            session.begin_step(name);
            let started = Instant::now();
            let outcome = match step.run(session, ctx).await {
                Ok(()) => Self::check_outputs(step.as_ref(), ctx).and_then(|()| session.verify_soft()),
                Err(e) => Err(e),
            };
            let elapsed = started.elapsed();
            let record = match outcome {
                Ok(()) => {
                    tracing::info!(step = name, ms = elapsed.as_millis() as u64, "passed");
                    with_notes(StepRecord::passed(name, elapsed), session.finish_step())
                }
                Err(e) => {
                    tracing::error!(step = name, error = %e, "failed");
                    if let Err(shot) = session.screenshot(&format!("{name}-failure")).await {
                        tracing::warn!(step = name, error = %shot, "failure screenshot not taken");
                    }
                    failed = true;
                    with_notes(StepRecord::failed(name, elapsed, e.to_string()), session.finish_step())
                }
            };
            report.record(record);
        }

        if self.teardown {
            report.cleanup = teardown_fixtures(session, ctx.ledger_mut()).await;
        }
        report.finish();
        let summary = report.summary();
        tracing::info!(
            suite = %self.name,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "scenario finished"
        );
        Ok(report)
    }

    fn check_outputs(step: &dyn ScenarioStep, ctx: &ScenarioContext) -> ErpResult<()> {
        match step.produces().into_iter().find(|k| !ctx.contains(k)) {
            Some(key) => Err(ErpError::MissingOutput {
                step: step.name().to_string(),
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn with_notes(mut record: StepRecord, notes: StepNotes) -> StepRecord {
    record.annotations = notes.annotations;
    record.attachments = notes.attachments;
    record.soft_failures = notes.soft_failures;
    record
}

/// Archive every fixture in the ledger, in teardown order
///
/// A kind whose cleanup fails is reported as one failed row and stays in
/// the ledger; the remaining kinds are still attempted.
pub async fn teardown_fixtures(session: &Session, ledger: &mut FixtureLedger) -> Vec<CleanupReport> {
    let plan = match ledger.teardown_plan() {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(error = %e, "fixture ledger is inconsistent, nothing archived");
            return vec![CleanupReport {
                failed: vec![FailedRow {
                    text: "fixture ledger".into(),
                    reason: e.to_string(),
                }],
                ..CleanupReport::default()
            }];
        }
    };
    let mut reports = Vec::with_capacity(plan.len());
    for (kind, target) in plan {
        match archive_fixtures(session, kind, &target).await {
            Ok(report) => {
                if report.is_clean() {
                    ledger.forget(kind);
                }
                reports.push(report);
            }
            Err(e) => {
                tracing::error!(%kind, error = %e, "teardown failed");
                reports.push(CleanupReport {
                    failed: vec![FailedRow {
                        text: target.search_text().to_string(),
                        reason: e.to_string(),
                    }],
                    ..CleanupReport::default()
                });
            }
        }
    }
    reports
}
