//! Data model for synthesis: resources, references, policy documents,
//! environment bindings and the finished plan.
//!
//! Rendered reference forms:
//! - Resource attribute: `{"Fn::GetAtt": ["<LogicalId>", "<Attribute>"]}`
//! - Parameter store value: `{{resolve:ssm:<ParameterName>}}`
//! - Unscoped grant resource: `"*"`

mod config_key;
mod edge;
mod environment;
mod grant;
mod logical_id;
mod plan;
mod policy_document;
mod resource;
mod topology;
mod value;

pub use config_key::ConfigKey;
pub use edge::DependencyEdge;
pub use environment::EnvironmentBindings;
pub use grant::{Grant, ResourceScope};
pub use logical_id::{LogicalId, validate_provider_name};
pub use plan::StackPlan;
pub use policy_document::{PolicyDocument, PolicyRule, RuleResourceType};
pub use resource::{Resource, ResourceKind};
pub use topology::{
    AOSS_ENDPOINT_URL, AOSS_INDEX_NAME, RAG_ENABLED, SLACK_BOT_TOKEN, SLACK_SIGNING_SECRET,
    Topology,
};
pub use value::{AttrRef, Attribute, ParameterRef, ValueSource};
