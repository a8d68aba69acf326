//! Value sources: literals, deferred parameters and resource attributes.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display as StrumDisplay};
use utoipa::ToSchema;

use super::logical_id::LogicalId;

/// An attribute that only exists once a resource has been provisioned.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    StrumDisplay,
    ToSchema,
)]
pub enum Attribute {
    Arn,
    CollectionEndpoint,
}

/// A reference to an attribute of another declared resource.
///
/// Holding one of these inside a resource implies that the referenced resource
/// must be created first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct AttrRef {
    pub resource: LogicalId,
    pub attribute: Attribute,
}

impl AttrRef {
    pub fn new(resource: impl Into<LogicalId>, attribute: Attribute) -> Self {
        AttrRef {
            resource: resource.into(),
            attribute,
        }
    }

    pub fn arn(resource: impl Into<LogicalId>) -> Self {
        AttrRef::new(resource, Attribute::Arn)
    }

    /// Render as a `Fn::GetAtt` intrinsic.
    pub fn to_json(&self) -> Value {
        json!({ "Fn::GetAtt": [self.resource.as_str(), self.attribute.as_ref()] })
    }
}

impl Display for AttrRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.resource, self.attribute)
    }
}

/// A named entry in the external parameter store.
///
/// The value is never read during synthesis; it renders as a dynamic
/// reference that the provisioning engine resolves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ParameterRef(String);

impl ParameterRef {
    pub fn new(name: impl Into<String>) -> Self {
        ParameterRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn dynamic_reference(&self) -> String {
        format!("{{{{resolve:ssm:{}}}}}", self.0)
    }
}

impl Display for ParameterRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.dynamic_reference())
    }
}

/// Where a property or environment value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum ValueSource {
    Literal(String),
    Parameter(ParameterRef),
    Attribute(AttrRef),
}

impl ValueSource {
    pub fn literal(value: impl Into<String>) -> Self {
        ValueSource::Literal(value.into())
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        ValueSource::Parameter(ParameterRef::new(name))
    }

    /// `literal`, `parameter` or `attribute`; safe to log where the value
    /// itself is not.
    pub fn kind(&self) -> &'static str {
        match self {
            ValueSource::Literal(_) => "literal",
            ValueSource::Parameter(_) => "parameter",
            ValueSource::Attribute(_) => "attribute",
        }
    }

    /// The resource this value forces to exist first, if any.
    pub fn dependency(&self) -> Option<&LogicalId> {
        match self {
            ValueSource::Attribute(attr) => Some(&attr.resource),
            ValueSource::Literal(_) | ValueSource::Parameter(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ValueSource::Literal(v) => Value::String(v.clone()),
            ValueSource::Parameter(p) => Value::String(p.dynamic_reference()),
            ValueSource::Attribute(a) => a.to_json(),
        }
    }
}

impl From<AttrRef> for ValueSource {
    fn from(attr: AttrRef) -> Self {
        ValueSource::Attribute(attr)
    }
}

impl From<ParameterRef> for ValueSource {
    fn from(param: ParameterRef) -> Self {
        ValueSource::Parameter(param)
    }
}

impl Display for ValueSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValueSource::Literal(v) => write!(f, "{v:?}"),
            ValueSource::Parameter(p) => write!(f, "{p}"),
            ValueSource::Attribute(a) => write!(f, "{a}"),
        }
    }
}
