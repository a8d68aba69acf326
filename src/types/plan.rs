//! The finished, ordered output of one synthesis pass.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::error::StackError;

use super::edge::DependencyEdge;
use super::environment::EnvironmentBindings;
use super::logical_id::LogicalId;
use super::policy_document::PolicyDocument;
use super::resource::{Resource, ResourceKind};
use super::topology::Topology;
use super::value::ParameterRef;

/// An ordered resource set ready for the provisioning engine.
///
/// Every resource appears after all of its dependencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StackPlan {
    pub topology: Topology,
    pub resources: Vec<Resource>,
    /// Every ordering constraint, including ones no property expresses.
    pub edges: Vec<DependencyEdge>,
    pub environment: EnvironmentBindings,
    /// Parameter store entries the provisioning engine must resolve.
    pub parameters: Vec<ParameterRef>,
    /// Deliberate broad grants and other decisions flagged for human review.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_notes: Vec<String>,
}

impl StackPlan {
    pub fn resource_ids(&self) -> Vec<&LogicalId> {
        self.resources.iter().map(Resource::id).collect()
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id().as_str() == id)
    }

    /// Position of a resource in the provisioning order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.id().as_str() == id)
    }

    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind() == kind).count()
    }

    /// Resources `id` must wait for.
    pub fn dependencies_of(&self, id: &str) -> Vec<&LogicalId> {
        self.edges
            .iter()
            .filter(|e| e.dependent.as_str() == id)
            .map(|e| &e.dependency)
            .collect()
    }

    pub fn policy_documents(&self) -> Vec<&PolicyDocument> {
        self.resources.iter().filter_map(Resource::document).collect()
    }

    /// Render as a provider template. `Resources` keeps provisioning order in
    /// the accompanying `Order` list since template maps are unordered.
    pub fn to_template(&self) -> Value {
        let mut resources = Map::new();
        for resource in &self.resources {
            let mut body = Map::new();
            body.insert("Type".into(), json!(resource.kind().type_name()));
            body.insert("Properties".into(), json!(resource.properties()));
            let depends_on = self.dependencies_of(resource.id().as_str());
            if !depends_on.is_empty() {
                body.insert("DependsOn".into(), json!(depends_on));
            }
            resources.insert(resource.id().to_string(), Value::Object(body));
        }
        json!({
            "Description": format!("RagStack {}", self.topology),
            "Order": self.resource_ids(),
            "Resources": resources,
        })
    }

    /// SHA-256 over the serialized plan. Identical inputs give identical
    /// fingerprints.
    pub fn fingerprint(&self) -> Result<String, StackError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}
