//! Scenarios: named steps sharing a typed context, run in order.

pub mod context;
pub mod pipeline;
pub mod steps;
pub mod suites;

pub use context::{keys, ContextKey, ScenarioContext};
pub use pipeline::{teardown_fixtures, Pipeline, ScenarioStep, StepPlan};
pub use suites::{build as build_suite, SuiteOptions, FIXTURES, PRODUCTION_CYCLE, SUITES};
