use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ConfigKey;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("missing required configuration: {}", .keys.iter().join(", "))]
    MissingRequiredConfiguration { keys: Vec<ConfigKey> },

    #[error("unsupported topology: {0}")]
    UnsupportedTopology(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("duplicate resource: {0}")]
    DuplicateResource(String),

    #[error("invalid {kind} name '{name}': expected 3-32 lowercase letters, digits or hyphens, starting with a letter")]
    InvalidName { kind: String, name: String },

    #[error("collection '{0}' has no encryption policy covering it")]
    MissingEncryptionPolicy(String),

    #[error(
        "environment does not match runtime contract (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    EnvironmentContractMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::InvalidFormat(err.to_string())
    }
}
