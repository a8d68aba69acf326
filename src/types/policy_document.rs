//! Collection security and access policy documents.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use super::logical_id::LogicalId;
use super::value::ValueSource;

// Stands in for an attribute principal while the document is serialized, so
// the reference can be spliced back in as an intrinsic.
const PRINCIPAL_SLOT: &str = "@@principal";

/// The resource type a policy rule applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuleResourceType {
    Collection,
    Dashboard,
    Index,
}

/// One rule of a policy document: a resource type, the resource patterns it
/// matches and (for data-access policies) the permissions it grants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PolicyRule {
    pub resource_type: RuleResourceType,
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl PolicyRule {
    /// Matches the collection itself: `collection/<name>`.
    pub fn collection(name: &str) -> Self {
        Self::new(RuleResourceType::Collection, format!("collection/{name}"))
    }

    /// Matches the collection's dashboard, which shares the collection pattern.
    pub fn dashboard(name: &str) -> Self {
        Self::new(RuleResourceType::Dashboard, format!("collection/{name}"))
    }

    /// Matches every index in the collection: `index/<name>/*`.
    pub fn index(name: &str) -> Self {
        Self::new(RuleResourceType::Index, format!("index/{name}/*"))
    }

    fn new(resource_type: RuleResourceType, pattern: String) -> Self {
        Self {
            resource_type,
            resources: vec![pattern],
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this rule applies to the named collection. A trailing `*` in a
    /// pattern matches any suffix.
    pub fn matches_collection(&self, name: &str) -> bool {
        if self.resource_type != RuleResourceType::Collection {
            return false;
        }
        let target = format!("collection/{name}");
        self.resources.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => target.starts_with(prefix),
            None => *pattern == target,
        })
    }

    fn to_json(&self) -> Value {
        let mut rule = Map::new();
        rule.insert("ResourceType".into(), json!(self.resource_type.as_ref()));
        rule.insert("Resource".into(), json!(self.resources));
        if !self.permissions.is_empty() {
            rule.insert("Permission".into(), json!(self.permissions));
        }
        Value::Object(rule)
    }
}

/// A declarative policy document attached to a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyDocument {
    /// Associates matching collections with an encryption key. Must exist
    /// before any collection it covers.
    Encryption {
        rules: Vec<PolicyRule>,
        aws_owned_key: bool,
    },
    /// Network reachability of the collection and its dashboard.
    Network {
        rules: Vec<PolicyRule>,
        allow_from_public: bool,
    },
    /// Principal permissions on the collection and its indexes.
    DataAccess {
        rules: Vec<PolicyRule>,
        principals: Vec<ValueSource>,
    },
}

impl PolicyDocument {
    /// Build a data-access document. Principals are de-duplicated, keeping the
    /// first occurrence.
    pub fn data_access(rules: Vec<PolicyRule>, principals: Vec<ValueSource>) -> Self {
        PolicyDocument::DataAccess {
            rules,
            principals: principals.into_iter().unique().collect(),
        }
    }

    /// The provider's policy type string.
    pub fn policy_type(&self) -> &'static str {
        match self {
            PolicyDocument::Encryption { .. } => "encryption",
            PolicyDocument::Network { .. } => "network",
            PolicyDocument::DataAccess { .. } => "data",
        }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        match self {
            PolicyDocument::Encryption { rules, .. }
            | PolicyDocument::Network { rules, .. }
            | PolicyDocument::DataAccess { rules, .. } => rules,
        }
    }

    pub fn principals(&self) -> &[ValueSource] {
        match self {
            PolicyDocument::DataAccess { principals, .. } => principals,
            _ => &[],
        }
    }

    pub fn is_encryption(&self) -> bool {
        matches!(self, PolicyDocument::Encryption { .. })
    }

    /// Whether this document has a rule covering the named collection.
    pub fn covers_collection(&self, name: &str) -> bool {
        self.rules().iter().any(|r| r.matches_collection(name))
    }

    /// Resources whose attributes this document references.
    pub fn referenced_resources(&self) -> Vec<LogicalId> {
        self.principals()
            .iter()
            .filter_map(|p| p.dependency().cloned())
            .unique()
            .collect()
    }

    /// Render in the provider's document shape.
    pub fn to_json(&self) -> Value {
        self.render(|_, principal| principal.to_json())
    }

    /// Render as the provider's `Policy` property, which is a JSON string.
    ///
    /// Attribute principals only exist at provisioning time, so a document
    /// holding one becomes an `Fn::Join` of string fragments around
    /// `Fn::GetAtt` references. Parameter principals stay inline as dynamic
    /// references.
    pub fn to_property(&self) -> Value {
        let text = self
            .render(|slot, principal| match principal {
                ValueSource::Attribute(_) => Value::String(format!("{PRINCIPAL_SLOT}{slot}@@")),
                other => other.to_json(),
            })
            .to_string();

        let mut parts: Vec<Value> = Vec::new();
        let mut rest = text.as_str();
        for (slot, principal) in self.principals().iter().enumerate() {
            let ValueSource::Attribute(attr) = principal else {
                continue;
            };
            if let Some((head, tail)) = rest.split_once(&format!("{PRINCIPAL_SLOT}{slot}@@")) {
                parts.push(Value::String(head.to_string()));
                parts.push(attr.to_json());
                rest = tail;
            }
        }

        if parts.is_empty() {
            return Value::String(text);
        }
        parts.push(Value::String(rest.to_string()));
        json!({ "Fn::Join": ["", parts] })
    }

    fn render(&self, principal: impl Fn(usize, &ValueSource) -> Value) -> Value {
        let rules: Vec<Value> = self.rules().iter().map(PolicyRule::to_json).collect();
        match self {
            PolicyDocument::Encryption { aws_owned_key, .. } => {
                json!({ "Rules": rules, "AWSOwnedKey": aws_owned_key })
            }
            PolicyDocument::Network {
                allow_from_public, ..
            } => {
                json!([{ "Rules": rules, "AllowFromPublic": allow_from_public }])
            }
            PolicyDocument::DataAccess { principals, .. } => {
                let principals: Vec<Value> = principals
                    .iter()
                    .enumerate()
                    .map(|(slot, p)| principal(slot, p))
                    .collect();
                json!([{ "Rules": rules, "Principal": principals }])
            }
        }
    }
}
