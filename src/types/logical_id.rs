//! Logical resource identifiers and provider name rules.

use std::fmt::{Display, Formatter, Result as FmtResult};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StackError;

// Collection and security policy names share the same provider rule.
static PROVIDER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]{2,31}$").expect("static pattern is valid"));

/// The logical id of a declared resource, e.g. `KnowledgeBaseCollection`.
///
/// Logical ids are unique within one synthesis pass and are what dependency
/// edges point at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Self {
        LogicalId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LogicalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LogicalId {
    fn from(s: &str) -> Self {
        LogicalId::new(s)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check a physical name against the provider rule for collections and policies.
pub fn validate_provider_name(kind: &str, name: &str) -> Result<(), StackError> {
    if PROVIDER_NAME.is_match(name) {
        Ok(())
    } else {
        Err(StackError::InvalidName {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }
}
