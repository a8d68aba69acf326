//! IAM permission grants attached to execution roles.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::logical_id::LogicalId;
use super::value::AttrRef;

/// The resources a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ResourceScope {
    /// Explicit resource ARNs. Each reference becomes a dependency of the role.
    Scoped { resources: Vec<AttrRef> },
    /// Any resource (`*`). Only used to break a reference cycle, and always
    /// carries the reason it was chosen.
    Unscoped { rationale: String },
}

/// An `Allow` statement on a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Grant {
    pub sid: String,
    pub actions: Vec<String>,
    pub scope: ResourceScope,
}

impl Grant {
    pub fn scoped<I, S>(sid: impl Into<String>, actions: I, resources: Vec<AttrRef>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Grant {
            sid: sid.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            scope: ResourceScope::Scoped { resources },
        }
    }

    pub fn unscoped<I, S>(sid: impl Into<String>, actions: I, rationale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Grant {
            sid: sid.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            scope: ResourceScope::Unscoped {
                rationale: rationale.into(),
            },
        }
    }

    pub fn rationale(&self) -> Option<&str> {
        match &self.scope {
            ResourceScope::Unscoped { rationale } => Some(rationale),
            ResourceScope::Scoped { .. } => None,
        }
    }

    /// Resources this grant names, and therefore must exist before the role
    /// holding it.
    pub fn referenced_resources(&self) -> Vec<LogicalId> {
        match &self.scope {
            ResourceScope::Scoped { resources } => {
                resources.iter().map(|r| r.resource.clone()).collect()
            }
            ResourceScope::Unscoped { .. } => Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        let resources: Vec<Value> = match &self.scope {
            ResourceScope::Scoped { resources } => resources.iter().map(AttrRef::to_json).collect(),
            ResourceScope::Unscoped { .. } => vec![json!("*")],
        };
        json!({
            "Sid": self.sid,
            "Effect": "Allow",
            "Action": self.actions,
            "Resource": resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscoped_grant_renders_wildcard_and_keeps_rationale() {
        let grant = Grant::unscoped(
            "InvokeSelf",
            ["lambda:InvokeFunction"],
            "the function's own ARN would make the role depend on the function",
        );
        assert_eq!(grant.to_json()["Resource"], json!(["*"]));
        assert!(grant.rationale().is_some());
        assert!(grant.referenced_resources().is_empty());
    }

    #[test]
    fn test_scoped_grant_references_resources() {
        let grant = Grant::scoped(
            "ReadCollection",
            ["aoss:APIAccessAll"],
            vec![AttrRef::arn("KnowledgeBaseCollection")],
        );
        assert_eq!(
            grant.referenced_resources(),
            vec![LogicalId::new("KnowledgeBaseCollection")]
        );
        assert_eq!(
            grant.to_json()["Resource"],
            json!([{ "Fn::GetAtt": ["KnowledgeBaseCollection", "Arn"] }])
        );
        assert_eq!(grant.rationale(), None);
    }
}
