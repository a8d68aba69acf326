use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::config::ParameterStore;
use crate::error::StackError;
use crate::types::{ConfigKey, Topology, validate_provider_name};

pub const DEFAULT_COLLECTION_NAME: &str = "knowledge-base";

/// Settings for one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSettings {
    pub topology: Topology,
    pub collection_name: String,
    pub parameters: ParameterStore,
}

impl StackSettings {
    pub fn new(topology: Topology, parameters: ParameterStore) -> Self {
        Self {
            topology,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            parameters,
        }
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    topology: String,
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    use_default_parameters: bool,
    #[serde(default)]
    parameters: BTreeMap<ConfigKey, String>,
    #[serde(default)]
    literals: BTreeMap<ConfigKey, String>,
}

/// Parse a JSON settings document into [`StackSettings`].
///
/// Malformed JSON maps to `StackError::InvalidFormat`, an unknown topology to
/// `StackError::UnsupportedTopology` and a bad collection name to
/// `StackError::InvalidName`.
///
/// Example:
/// ```rust
/// use ragstack_core::{Topology, parse_settings};
/// let settings = parse_settings(r#"{
///     "topology": "ServiceOnly",
///     "parameters": { "SlackBotToken": "BotToken", "SlackSigningSecret": "SignSecret" }
/// }"#).unwrap();
/// assert_eq!(settings.topology, Topology::ServiceOnly);
/// assert_eq!(settings.parameters.len(), 2);
/// ```
pub fn parse_settings(text: &str) -> Result<StackSettings, StackError> {
    let raw: RawSettings = serde_json::from_str(text)?;
    let topology = Topology::from_str(&raw.topology)?;

    let collection_name = raw
        .collection_name
        .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
    validate_provider_name("collection", &collection_name)?;

    let mut store = if raw.use_default_parameters {
        ParameterStore::with_defaults()
    } else {
        ParameterStore::new()
    };
    for (key, name) in raw.parameters {
        store = store.with_parameter(key, name);
    }
    for (key, value) in raw.literals {
        store = store.with_literal(key, value);
    }

    debug!(
        event = "Settings",
        phase = "Parsed",
        topology = topology.to_string(),
        collection = %collection_name,
        entries = store.len()
    );

    Ok(StackSettings {
        topology,
        collection_name,
        parameters: store,
    })
}
