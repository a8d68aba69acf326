//! Configuration source adapter.
//!
//! A [`ParameterStore`] records where each [`ConfigKey`] lives. The
//! [`ConfigResolver`] reads it for one topology: every lookup is registered so
//! the plan can list the parameters the provisioning engine must resolve, and
//! all missing required keys are reported together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::StackError;
use crate::traits::ConfigSource;
use crate::types::{ConfigKey, ParameterRef, Topology, ValueSource};

/// In-memory view of the external parameter store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterStore {
    entries: BTreeMap<ConfigKey, ValueSource>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store declaring the conventional parameter names for the bot
    /// credentials and index name. The feature flag and external principal
    /// stay unset.
    pub fn with_defaults() -> Self {
        [
            ConfigKey::SlackBotToken,
            ConfigKey::SlackSigningSecret,
            ConfigKey::IndexName,
        ]
        .into_iter()
        .fold(Self::new(), |store, key| {
            store.with_parameter(key, key.default_parameter_name())
        })
    }

    /// Declare that `key` is stored under parameter `name`.
    pub fn with_parameter(mut self, key: ConfigKey, name: impl Into<String>) -> Self {
        self.entries.insert(key, ValueSource::parameter(name));
        self
    }

    /// Provide `key` as a literal, bypassing the parameter store.
    pub fn with_literal(mut self, key: ConfigKey, value: impl Into<String>) -> Self {
        self.entries.insert(key, ValueSource::literal(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl ConfigSource for ParameterStore {
    fn lookup(&self, key: ConfigKey) -> Option<ValueSource> {
        self.entries.get(&key).cloned()
    }

    fn source_name(&self) -> &str {
        "parameter-store"
    }
}

/// Configuration values resolved for one topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    values: BTreeMap<ConfigKey, ValueSource>,
    parameters: Vec<ParameterRef>,
}

impl ResolvedConfig {
    pub fn get(&self, key: ConfigKey) -> Option<&ValueSource> {
        self.values.get(&key)
    }

    /// A value the topology declared as required.
    pub fn required(&self, key: ConfigKey) -> Result<&ValueSource, StackError> {
        self.values
            .get(&key)
            .ok_or(StackError::MissingRequiredConfiguration { keys: vec![key] })
    }

    /// Parameters looked up, in lookup order, without duplicates.
    pub fn parameters(&self) -> &[ParameterRef] {
        &self.parameters
    }
}

/// Reads configuration for a topology from a [`ConfigSource`].
pub struct ConfigResolver<S> {
    source: S,
    resolved: ResolvedConfig,
    missing: Vec<ConfigKey>,
}

impl<S: ConfigSource> ConfigResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            resolved: ResolvedConfig::default(),
            missing: Vec::new(),
        }
    }

    /// Look up `key`, registering the lookup. Absence is not an error here.
    pub fn resolve(&mut self, key: ConfigKey) -> Option<ValueSource> {
        let value = self.source.lookup(key)?;
        // Literals may be secrets; only the parameter name is ever logged.
        let parameter = match &value {
            ValueSource::Parameter(param) => param.name(),
            ValueSource::Literal(_) | ValueSource::Attribute(_) => "",
        };
        debug!(
            event = "Configuration",
            phase = "Lookup",
            source = self.source.source_name(),
            key = key.to_string(),
            kind = value.kind(),
            parameter
        );
        if let ValueSource::Parameter(param) = &value {
            if !self.resolved.parameters.contains(param) {
                self.resolved.parameters.push(param.clone());
            }
        }
        self.resolved.values.insert(key, value.clone());
        Some(value)
    }

    /// Look up `key`, remembering it as missing if absent.
    pub fn require(&mut self, key: ConfigKey) -> Option<ValueSource> {
        let value = self.resolve(key);
        if value.is_none() {
            self.missing.push(key);
        }
        value
    }

    /// Resolve everything `topology` reads. Fails with every missing required
    /// key at once.
    pub fn resolve_topology(mut self, topology: Topology) -> Result<ResolvedConfig, StackError> {
        // Walk keys in declaration order so lookups are registered deterministically.
        for key in ConfigKey::iter() {
            if topology.required_keys().contains(&key) {
                self.require(key);
            } else if topology.optional_keys().contains(&key) {
                self.resolve(key);
            }
        }
        self.finish()
    }

    pub fn finish(self) -> Result<ResolvedConfig, StackError> {
        if self.missing.is_empty() {
            Ok(self.resolved)
        } else {
            Err(StackError::MissingRequiredConfiguration { keys: self.missing })
        }
    }
}
