//! Typed values handed from one scenario step to the next.
//!
//! Values are stored as JSON so the whole context can be written into the
//! run report; typed [`ContextKey`]s keep reads and writes consistent.

use crate::fixture::{FixtureLedger, FixtureNamer};
use crate::result::{ErpError, ErpResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// A named, typed slot in the context
#[derive(Debug)]
pub struct ContextKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Declare a key
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    /// Key name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

/// Keys used by the built-in suites
pub mod keys {
    use super::ContextKey;

    /// Material fixture name
    pub const MATERIAL: ContextKey<String> = ContextKey::new("material");
    /// Product fixture name
    pub const PRODUCT: ContextKey<String> = ContextKey::new("product");
    /// Equipment fixture name
    pub const EQUIPMENT: ContextKey<String> = ContextKey::new("equipment");
    /// User fixture name
    pub const USER: ContextKey<String> = ContextKey::new("user");
    /// Table number the user got
    pub const USER_TABLE_NUMBER: ContextKey<u32> = ContextKey::new("user_table_number");
    /// Launched order number
    pub const ORDER_NUMBER: ContextKey<String> = ContextKey::new("order_number");
    /// Units ordered
    pub const ORDER_QUANTITY: ContextKey<u32> = ContextKey::new("order_quantity");
    /// Stock on hand before the receipt
    pub const STOCK_BEFORE: ContextKey<u64> = ContextKey::new("stock_before");
}

/// Values shared along a pipeline, plus the fixture ledger of the run
#[derive(Debug, Default)]
pub struct ScenarioContext {
    values: BTreeMap<&'static str, Value>,
    ledger: FixtureLedger,
    namer: FixtureNamer,
}

impl ScenarioContext {
    /// Empty context with a time-tagged namer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty context with a fixed fixture namer
    #[must_use]
    pub fn with_namer(namer: FixtureNamer) -> Self {
        Self {
            namer,
            ..Self::default()
        }
    }

    /// Store a value
    pub fn insert<T: Serialize>(&mut self, key: ContextKey<T>, value: &T) -> ErpResult<()> {
        self.values.insert(key.name, serde_json::to_value(value)?);
        Ok(())
    }

    /// Read a value; a missing key is an error naming `step`
    pub fn get<T: DeserializeOwned>(&self, key: ContextKey<T>, step: &str) -> ErpResult<T> {
        let value = self.values.get(key.name).ok_or_else(|| ErpError::MissingOutput {
            step: step.to_string(),
            key: key.name.to_string(),
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Read a value if present
    pub fn try_get<T: DeserializeOwned>(&self, key: ContextKey<T>) -> ErpResult<Option<T>> {
        self.values
            .get(key.name)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(Into::into)
    }

    /// Whether a key by name is set
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names of the keys set
    pub fn key_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    /// JSON snapshot of all values
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    /// Fixture namer of the run
    #[must_use]
    pub const fn namer(&self) -> &FixtureNamer {
        &self.namer
    }

    /// Fixtures created so far
    #[must_use]
    pub const fn ledger(&self) -> &FixtureLedger {
        &self.ledger
    }

    /// Mutable ledger
    pub fn ledger_mut(&mut self) -> &mut FixtureLedger {
        &mut self.ledger
    }
}
