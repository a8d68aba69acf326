//! Environment bindings for a workload.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::StackError;

use super::logical_id::LogicalId;
use super::value::ValueSource;

/// Variable name to value source, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EnvironmentBindings(BTreeMap<String, ValueSource>);

impl EnvironmentBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, source: ValueSource) -> Self {
        self.0.insert(name.into(), source);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValueSource> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueSource)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Resources that must exist before a workload holding these bindings.
    pub fn dependencies(&self) -> Vec<LogicalId> {
        self.0
            .values()
            .filter_map(|source| source.dependency().cloned())
            .unique()
            .collect()
    }

    /// Check that exactly the `contract` variables are bound, no more, no fewer.
    pub fn verify_contract(&self, contract: &[&str]) -> Result<(), StackError> {
        let expected: BTreeSet<&str> = contract.iter().copied().collect();
        let actual: BTreeSet<&str> = self.names().collect();

        let missing: Vec<String> = expected.difference(&actual).map(|s| s.to_string()).collect();
        let unexpected: Vec<String> = actual.difference(&expected).map(|s| s.to_string()).collect();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(StackError::EnvironmentContractMismatch { missing, unexpected })
        }
    }

    /// Render as a `{NAME: value}` object, the shape functions expect.
    pub fn to_variables_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, source)| (name.clone(), source.to_json()))
                .collect(),
        )
    }

    /// Render as a `Name`/`Value` list, the shape container services expect.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|(name, source)| {
                    serde_json::json!({ "Name": name, "Value": source.to_json() })
                })
                .collect(),
        )
    }
}
