//! Fixture naming and the ledger of fixtures created during a run.
//!
//! Fixtures are created through the UI and can only be found again by
//! name, so every name starts with a per-kind prefix. Teardown archives by
//! prefix in dependency order: an order references a product, a product
//! references materials, and the application refuses to archive a record
//! that is still referenced.

use crate::cleanup::CleanupTarget;
use crate::result::{ErpError, ErpResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

/// Kind of record the suite creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    /// Production order
    Order,
    /// Finished product
    Product,
    /// Assembly
    Assembly,
    /// Detail (part)
    Detail,
    /// Material
    Material,
    /// Equipment
    Equipment,
    /// User
    User,
}

impl FixtureKind {
    /// All kinds in teardown order
    pub const TEARDOWN_ORDER: [Self; 7] = [
        Self::Order,
        Self::Product,
        Self::Assembly,
        Self::Detail,
        Self::Material,
        Self::Equipment,
        Self::User,
    ];

    /// Name prefix
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Order => "ERPTEST_ORDER",
            Self::Product => "ERPTEST_PRODUCT",
            Self::Assembly => "ERPTEST_ASSEMBLY",
            Self::Detail => "ERPTEST_DETAIL",
            Self::Material => "ERPTEST_MATERIAL",
            Self::Equipment => "ERPTEST_EQUIPMENT",
            Self::User => "ERPTEST_TEST_USER",
        }
    }

    /// Teardown priority; lower is archived first
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Order => 0,
            Self::Product | Self::Assembly | Self::Detail => 1,
            Self::Material => 2,
            Self::Equipment => 3,
            Self::User => 4,
        }
    }

    /// Lower-case label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Product => "product",
            Self::Assembly => "assembly",
            Self::Detail => "detail",
            Self::Material => "material",
            Self::Equipment => "equipment",
            Self::User => "user",
        }
    }

    /// Kind whose prefix starts `name`
    #[must_use]
    pub fn of_name(name: &str) -> Option<Self> {
        Self::TEARDOWN_ORDER
            .into_iter()
            .find(|k| name.starts_with(k.prefix()))
    }
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixtureKind {
    type Err = ErpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::TEARDOWN_ORDER
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ErpError::FixtureError {
                message: format!("unknown fixture kind {s:?}"),
            })
    }
}

/// Generates unique fixture names for one run: `{PREFIX}_{tag}_{n}`
#[derive(Debug)]
pub struct FixtureNamer {
    tag: String,
    seq: AtomicU32,
}

impl FixtureNamer {
    /// Namer tagged with the current time (`MMDDHHMMSS`)
    #[must_use]
    pub fn new() -> Self {
        Self::with_tag(Utc::now().format("%m%d%H%M%S").to_string())
    }

    /// Namer with an explicit tag
    #[must_use]
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            seq: AtomicU32::new(0),
        }
    }

    /// Run tag
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Next name for a kind
    #[must_use]
    pub fn next(&self, kind: FixtureKind) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{}_{n}", kind.prefix(), self.tag)
    }
}

impl Default for FixtureNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixture created during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Kind
    pub kind: FixtureKind,
    /// Full name as typed into the UI
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Fixtures created so far, grouped by kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureLedger {
    records: Vec<FixtureRecord>,
}

impl FixtureLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created fixture
    pub fn record(&mut self, kind: FixtureKind, name: impl Into<String>) -> ErpResult<()> {
        let name = name.into();
        if !name.starts_with(kind.prefix()) {
            return Err(ErpError::FixtureError {
                message: format!("{kind} fixture {name:?} lacks prefix {}", kind.prefix()),
            });
        }
        tracing::debug!(%kind, name = %name, "fixture recorded");
        self.records.push(FixtureRecord {
            kind,
            name,
            created_at: Utc::now(),
        });
        Ok(())
    }

    /// All records in creation order
    #[must_use]
    pub fn records(&self) -> &[FixtureRecord] {
        &self.records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names recorded for a kind
    #[must_use]
    pub fn names_of(&self, kind: FixtureKind) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Cleanup targets in teardown order, one per kind that has records
    pub fn teardown_plan(&self) -> ErpResult<Vec<(FixtureKind, CleanupTarget)>> {
        let mut by_kind: BTreeMap<(u8, FixtureKind), Vec<String>> = BTreeMap::new();
        for r in &self.records {
            by_kind
                .entry((r.kind.priority(), r.kind))
                .or_default()
                .push(r.name.clone());
        }
        by_kind
            .into_iter()
            .map(|((_, kind), names)| Ok((kind, CleanupTarget::names(kind.prefix(), names)?)))
            .collect()
    }

    /// Drop the records of a kind after its teardown
    pub fn forget(&mut self, kind: FixtureKind) {
        self.records.retain(|r| r.kind != kind);
    }
}

/// Prefix-only cleanup targets for every kind, in teardown order
pub fn full_sweep() -> ErpResult<Vec<(FixtureKind, CleanupTarget)>> {
    FixtureKind::TEARDOWN_ORDER
        .into_iter()
        .map(|k| Ok((k, CleanupTarget::prefix(k.prefix())?)))
        .collect()
}
