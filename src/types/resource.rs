//! Declared resources handed to the provisioning engine.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::logical_id::LogicalId;
use super::policy_document::PolicyDocument;
use super::value::ValueSource;

/// The type tag of a declared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ResourceKind {
    /// The vector-search collection hosting the index.
    Collection,
    /// Encryption or network security policy for a collection.
    SecurityPolicy,
    /// Data-access policy naming the principals allowed into a collection.
    AccessPolicy,
    /// IAM execution role.
    Role,
    /// Long-running container service.
    Service,
    /// Event-driven function.
    Function,
    /// Public invocation endpoint bound to a function.
    FunctionUrl,
    /// Resource-based permission on a function.
    Permission,
}

impl ResourceKind {
    /// The provider type name, as it appears in the rendered template.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Collection => "AWS::OpenSearchServerless::Collection",
            Self::SecurityPolicy => "AWS::OpenSearchServerless::SecurityPolicy",
            Self::AccessPolicy => "AWS::OpenSearchServerless::AccessPolicy",
            Self::Role => "AWS::IAM::Role",
            Self::Service => "AWS::AppRunner::Service",
            Self::Function => "AWS::Lambda::Function",
            Self::FunctionUrl => "AWS::Lambda::Url",
            Self::Permission => "AWS::Lambda::Permission",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.type_name())
    }
}

/// A named, typed resource declaration.
///
/// Dependencies are collected while properties are added: any property that
/// references another resource's attribute records that resource in
/// `depends_on`. Explicit ordering constraints are added with
/// [`Resource::with_dependency`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Resource {
    id: LogicalId,
    kind: ResourceKind,
    properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<LogicalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document: Option<PolicyDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.id, self.kind)
    }
}

impl Resource {
    pub fn new(id: impl Into<LogicalId>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
            document: None,
            notes: Vec::new(),
        }
    }

    /// Set a literal property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a property from a value source, recording any implied dependency.
    pub fn with_value(mut self, key: impl Into<String>, value: &ValueSource) -> Self {
        if let Some(dep) = value.dependency() {
            self.push_dependency(dep.clone());
        }
        self.properties.insert(key.into(), value.to_json());
        self
    }

    /// Attach a policy document, rendered as the string `Policy` property.
    pub fn with_document(mut self, document: PolicyDocument) -> Self {
        for dep in document.referenced_resources() {
            self.push_dependency(dep);
        }
        self.properties
            .insert("Policy".to_string(), document.to_property());
        self.document = Some(document);
        self
    }

    /// Record an explicit "must exist before" constraint.
    pub fn with_dependency(mut self, dependency: impl Into<LogicalId>) -> Self {
        self.push_dependency(dependency.into());
        self
    }

    /// Attach a note that must travel with the resource to review.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    fn push_dependency(&mut self, dep: LogicalId) {
        if !self.depends_on.contains(&dep) {
            self.depends_on.push(dep);
        }
    }

    pub fn id(&self) -> &LogicalId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn depends_on(&self) -> &[LogicalId] {
        &self.depends_on
    }

    pub fn document(&self) -> Option<&PolicyDocument> {
        self.document.as_ref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}
