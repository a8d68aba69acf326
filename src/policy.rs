//! Collection policies and execution-role grants.
//!
//! The data-access policy must name the workload's execution identity, while
//! the workload itself needs the collection endpoint. Naming the workload
//! directly would close a loop, so the identity comes from a role resource
//! declared on its own ([`CycleStrategy::StandaloneRole`]) or from a role
//! attached to the workload whose self-referencing grants are widened to
//! `*` ([`CycleStrategy::UnscopedGrant`]).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::StackError;
use crate::types::{
    AttrRef, Grant, LogicalId, PolicyDocument, PolicyRule, Resource, ResourceKind, ValueSource,
    validate_provider_name,
};

pub const ENCRYPTION_POLICY_ID: &str = "KnowledgeBaseCollectionEncryptionPolicy";
pub const NETWORK_POLICY_ID: &str = "KnowledgeBaseCollectionNetworkPolicy";
pub const ACCESS_POLICY_ID: &str = "KnowledgeBaseCollectionAccessPolicy";

const ALL_COLLECTION_ACTIONS: &str = "aoss:*";
const MODEL_ACTIONS: [&str; 2] = ["bedrock:InvokeModel", "bedrock:InvokeModelWithResponseStream"];
const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

const BROAD_ACCESS_RATIONALE: &str = "model invocation and collection actions are granted on \
    every resource rather than on named model and collection ARNs; kept as a wildcard grant \
    pending review";
const INVOKE_SELF_RATIONALE: &str = "the function's own ARN would make its attached role depend on \
    the function that depends on the role; intentional over-grant";
const DATA_ACCESS_REVIEW_NOTE: &str =
    "data-access policy grants aoss:* instead of an enumerated action set; preserved for review";

/// How the execution identity is made available to the access policy
/// without a reference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStrategy {
    /// The role is its own resource, declared before the workload.
    StandaloneRole,
    /// The role belongs to the workload; grants that would name the workload
    /// are widened to any resource.
    UnscopedGrant,
}

/// Who may assume an execution role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustedService {
    ContainerService,
    Function,
}

impl TrustedService {
    pub fn principal(&self) -> &'static str {
        match self {
            TrustedService::ContainerService => "tasks.apprunner.amazonaws.com",
            TrustedService::Function => "lambda.amazonaws.com",
        }
    }
}

/// Builds the collection's policy resources and the execution role.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    collection_name: String,
}

impl PolicyBuilder {
    /// Fails if the collection name, or any policy name derived from it,
    /// breaks the provider naming rule.
    pub fn new(collection_name: impl Into<String>) -> Result<Self, StackError> {
        let builder = Self {
            collection_name: collection_name.into(),
        };
        validate_provider_name("collection", &builder.collection_name)?;
        for suffix in ["encryption", "network", "access"] {
            validate_provider_name("security policy", &builder.policy_name(suffix))?;
        }
        Ok(builder)
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    fn policy_name(&self, suffix: &str) -> String {
        format!("{}-{suffix}-policy", self.collection_name)
    }

    /// Associates the collection with an AWS-owned key.
    pub fn encryption_policy(&self) -> Resource {
        let document = PolicyDocument::Encryption {
            rules: vec![PolicyRule::collection(&self.collection_name)],
            aws_owned_key: true,
        };
        self.security_policy(ENCRYPTION_POLICY_ID, "encryption", document)
    }

    /// Opens the collection and its dashboard to public network access.
    pub fn network_policy(&self) -> Resource {
        let document = PolicyDocument::Network {
            rules: vec![
                PolicyRule::collection(&self.collection_name),
                PolicyRule::dashboard(&self.collection_name),
            ],
            allow_from_public: true,
        };
        self.security_policy(NETWORK_POLICY_ID, "network", document)
    }

    fn security_policy(&self, id: &str, suffix: &str, document: PolicyDocument) -> Resource {
        debug!(event = "Policy", phase = "Build", policy = id, kind = document.policy_type());
        Resource::new(id, ResourceKind::SecurityPolicy)
            .with_property("Name", self.policy_name(suffix))
            .with_property("Type", document.policy_type())
            .with_document(document)
    }

    /// Data-access policy giving the execution role, and the external
    /// principal if any, full access to the collection and its indexes.
    ///
    /// The execution role comes first, then any external principal. Duplicates
    /// are dropped, so a single role always yields a one-element list.
    pub fn access_policy(&self, role: &LogicalId, external: Option<&ValueSource>) -> Resource {
        let role = ValueSource::from(AttrRef::arn(role.clone()));
        let principals: Vec<ValueSource> =
            std::iter::once(role).chain(external.cloned()).collect();

        let document = PolicyDocument::data_access(
            vec![
                PolicyRule::collection(&self.collection_name)
                    .with_permissions([ALL_COLLECTION_ACTIONS]),
                PolicyRule::index(&self.collection_name).with_permissions([ALL_COLLECTION_ACTIONS]),
            ],
            principals,
        );
        debug!(
            event = "Policy",
            phase = "Build",
            policy = ACCESS_POLICY_ID,
            principals = document.principals().len()
        );

        Resource::new(ACCESS_POLICY_ID, ResourceKind::AccessPolicy)
            .with_property("Name", self.policy_name("access"))
            .with_property("Type", document.policy_type())
            .with_document(document)
            .with_note(DATA_ACCESS_REVIEW_NOTE)
    }

    /// Grants the workload's role needs, given how cycles are broken.
    pub fn workload_grants(&self, strategy: CycleStrategy) -> Vec<Grant> {
        let actions: Vec<&str> = MODEL_ACTIONS
            .iter()
            .copied()
            .chain([ALL_COLLECTION_ACTIONS])
            .collect();
        let mut grants = vec![Grant::unscoped(
            "KnowledgeBaseAccess",
            actions,
            BROAD_ACCESS_RATIONALE,
        )];
        if strategy == CycleStrategy::UnscopedGrant {
            grants.push(Grant::unscoped(
                "InvokeSelf",
                ["lambda:InvokeFunction"],
                INVOKE_SELF_RATIONALE,
            ));
        }
        grants
    }
}

/// Declare an execution role.
///
/// With [`CycleStrategy::StandaloneRole`] the role stands alone; with
/// [`CycleStrategy::UnscopedGrant`] it is recorded as owned by `workload`.
/// Scoped grants add dependencies on the resources they name; unscoped grants
/// carry their rationale as a note.
pub fn execution_role(
    id: &LogicalId,
    trusted: TrustedService,
    grants: &[Grant],
    strategy: CycleStrategy,
    workload: &LogicalId,
) -> Resource {
    let statements: Vec<Value> = grants.iter().map(Grant::to_json).collect();
    let mut role = Resource::new(id.clone(), ResourceKind::Role).with_property(
        "AssumeRolePolicyDocument",
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": trusted.principal() },
                "Action": "sts:AssumeRole",
            }],
        }),
    );

    if !statements.is_empty() {
        role = role.with_property(
            "Policies",
            json!([{
                "PolicyName": format!("{id}DefaultPolicy"),
                "PolicyDocument": { "Version": "2012-10-17", "Statement": statements },
            }]),
        );
    }

    match strategy {
        CycleStrategy::StandaloneRole => {}
        CycleStrategy::UnscopedGrant => {
            role = role.with_property("Description", format!("Execution role owned by {workload}"));
        }
    }
    if trusted == TrustedService::Function {
        role = role.with_property("ManagedPolicyArns", json!([BASIC_EXECUTION_POLICY]));
    }

    for grant in grants {
        for dependency in grant.referenced_resources() {
            role = role.with_dependency(dependency);
        }
        if let Some(rationale) = grant.rationale() {
            warn!(
                event = "Policy",
                phase = "UnscopedGrant",
                role = id.as_str(),
                sid = grant.sid.as_str(),
                rationale = rationale
            );
            role = role.with_note(format!("{}: {rationale}", grant.sid));
        }
    }
    role
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn builder() -> PolicyBuilder {
        PolicyBuilder::new("knowledge-base").unwrap()
    }

    #[test]
    fn test_policy_names_follow_collection() {
        let b = builder();
        assert_eq!(
            b.encryption_policy().property("Name"),
            Some(&json!("knowledge-base-encryption-policy"))
        );
        assert_eq!(
            b.network_policy().property("Name"),
            Some(&json!("knowledge-base-network-policy"))
        );
        assert_eq!(
            b.access_policy(&LogicalId::new("Role"), None).property("Type"),
            Some(&json!("data"))
        );
    }

    #[test]
    fn test_long_collection_name_breaks_policy_name_rule() {
        // Valid as a collection name, too long once "-encryption-policy" is appended.
        let err = PolicyBuilder::new("knowledge-base-collection").unwrap_err();
        assert!(matches!(err, StackError::InvalidName { kind, .. } if kind == "security policy"));
    }

    #[test]
    fn test_encryption_and_network_policies_have_no_dependencies() {
        let b = builder();
        assert!(b.encryption_policy().depends_on().is_empty());
        assert!(b.network_policy().depends_on().is_empty());
    }

    #[test]
    fn test_network_policy_covers_collection_and_dashboard() {
        let policy = builder().network_policy();
        let text = policy.property("Policy").and_then(Value::as_str).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!([{
                "Rules": [
                    { "ResourceType": "collection", "Resource": ["collection/knowledge-base"] },
                    { "ResourceType": "dashboard", "Resource": ["collection/knowledge-base"] },
                ],
                "AllowFromPublic": true,
            }])
        );
    }

    #[parameterized(
        role_only = { None, 1 },
        with_external = { Some(ValueSource::parameter("ExternalPrincipalArn")), 2 },
        external_equal_to_role = { Some(ValueSource::from(AttrRef::arn("Role"))), 1 },
    )]
    fn test_access_policy_principals(external: Option<ValueSource>, expected: usize) {
        let policy = builder().access_policy(&LogicalId::new("Role"), external.as_ref());
        let document = policy.document().unwrap();
        assert_eq!(document.principals().len(), expected);
        assert_eq!(document.principals()[0], ValueSource::from(AttrRef::arn("Role")));
        assert_eq!(policy.depends_on(), &[LogicalId::new("Role")]);
    }

    #[test]
    fn test_access_policy_grants_everything_and_is_flagged() {
        let policy = builder().access_policy(&LogicalId::new("Role"), None);
        for rule in policy.document().unwrap().rules() {
            assert_eq!(rule.permissions, vec!["aoss:*"]);
        }
        assert_eq!(policy.notes().len(), 1);
    }

    #[parameterized(
        standalone = { CycleStrategy::StandaloneRole, &["KnowledgeBaseAccess"] },
        unscoped = { CycleStrategy::UnscopedGrant, &["KnowledgeBaseAccess", "InvokeSelf"] },
    )]
    fn test_workload_grants(strategy: CycleStrategy, sids: &[&str]) {
        let grants = builder().workload_grants(strategy);
        let actual: Vec<&str> = grants.iter().map(|g| g.sid.as_str()).collect();
        assert_eq!(actual, sids);
        assert!(grants.iter().all(|g| g.rationale().is_some()));
    }

    #[test]
    fn test_broad_grant_rationale_names_the_wildcard() {
        let grants = builder().workload_grants(CycleStrategy::StandaloneRole);
        let rationale = grants[0].rationale().unwrap();
        assert!(rationale.contains("every resource"));
        assert!(!rationale.contains("region"));
    }

    #[test]
    fn test_service_grant_actions_are_reproduced() {
        let grants = builder().workload_grants(CycleStrategy::StandaloneRole);
        assert_eq!(
            grants[0].to_json(),
            json!({
                "Sid": "KnowledgeBaseAccess",
                "Effect": "Allow",
                "Action": [
                    "bedrock:InvokeModel",
                    "bedrock:InvokeModelWithResponseStream",
                    "aoss:*"
                ],
                "Resource": ["*"],
            })
        );
    }

    #[test]
    fn test_attached_role_records_owner_and_notes() {
        let b = builder();
        let workload = LogicalId::new("SlackBotFunction");
        let role = execution_role(
            &LogicalId::new("SlackBotFunctionServiceRole"),
            TrustedService::Function,
            &b.workload_grants(CycleStrategy::UnscopedGrant),
            CycleStrategy::UnscopedGrant,
            &workload,
        );
        assert!(role.depends_on().is_empty());
        assert_eq!(role.notes().len(), 2);
        assert_eq!(
            role.property("Description"),
            Some(&json!("Execution role owned by SlackBotFunction"))
        );
        assert_eq!(
            role.property("ManagedPolicyArns"),
            Some(&json!([BASIC_EXECUTION_POLICY]))
        );
    }

    #[test]
    fn test_scoped_grant_adds_role_dependency() {
        let grants = vec![Grant::scoped(
            "ReadCollection",
            ["aoss:APIAccessAll"],
            vec![AttrRef::arn("KnowledgeBaseCollection")],
        )];
        let role = execution_role(
            &LogicalId::new("Role"),
            TrustedService::ContainerService,
            &grants,
            CycleStrategy::StandaloneRole,
            &LogicalId::new("ServerService"),
        );
        assert_eq!(role.depends_on(), &[LogicalId::new("KnowledgeBaseCollection")]);
        assert!(role.notes().is_empty());
        assert!(role.property("Description").is_none());
    }
}
