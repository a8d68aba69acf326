use super::*;
use crate::assembler::{
    COLLECTION_ID, FUNCTION_ID, FUNCTION_ROLE_ID, FUNCTION_URL_ID, FUNCTION_URL_PERMISSION_ID,
    SERVICE_ID, SERVICE_ROLE_ID,
};
use crate::policy::{ACCESS_POLICY_ID, ENCRYPTION_POLICY_ID, NETWORK_POLICY_ID};
use crate::types::{ConfigKey, ResourceKind};
use strum::IntoEnumIterator;
use yare::parameterized;

mod ordering;

fn full_store() -> ParameterStore {
    ParameterStore::with_defaults()
        .with_parameter(ConfigKey::RagEnabled, "RagEnabled")
        .with_parameter(ConfigKey::ExternalPrincipal, "ExternalPrincipalArn")
}

fn plan_for(topology: Topology) -> StackPlan {
    synthesize(topology, ParameterStore::with_defaults()).unwrap()
}

#[test]
fn test_minimal_service_without_configuration() {
    let plan = synthesize(Topology::MinimalService, ParameterStore::new()).unwrap();

    assert_eq!(plan.resources.len(), 1);
    assert_eq!(plan.count_of(ResourceKind::Service), 1);
    assert_eq!(plan.count_of(ResourceKind::Collection), 0);
    assert!(plan.policy_documents().is_empty());
    assert!(plan.environment.is_empty());
    assert!(plan.parameters.is_empty());
    assert!(plan.review_notes.is_empty());
}

#[test]
fn test_service_with_knowledge_base_scenario() {
    let plan = plan_for(Topology::ServiceWithKnowledgeBase);

    assert_eq!(plan.resources.len(), 6);
    assert_eq!(plan.count_of(ResourceKind::Collection), 1);
    assert_eq!(plan.count_of(ResourceKind::SecurityPolicy), 2);
    assert_eq!(plan.count_of(ResourceKind::AccessPolicy), 1);
    assert_eq!(plan.count_of(ResourceKind::Role), 1);
    assert_eq!(plan.count_of(ResourceKind::Service), 1);

    assert!(plan.position(ENCRYPTION_POLICY_ID).unwrap() < plan.position(COLLECTION_ID).unwrap());

    let names: Vec<&str> = plan.environment.names().collect();
    assert_eq!(
        names,
        vec![
            "AOSS_ENDPOINT_URL",
            "AOSS_INDEX_NAME",
            "SLACK_BOT_TOKEN",
            "SLACK_SIGNING_SECRET"
        ]
    );
}

#[test]
fn test_function_with_knowledge_base_scenario() {
    let plan = plan_for(Topology::FunctionWithKnowledgeBase);

    assert_eq!(plan.resources.len(), 8);
    assert_eq!(plan.count_of(ResourceKind::Function), 1);
    assert_eq!(plan.count_of(ResourceKind::FunctionUrl), 1);
    assert_eq!(plan.count_of(ResourceKind::Permission), 1);
    assert_eq!(plan.count_of(ResourceKind::Service), 0);
    assert!(plan.position(ENCRYPTION_POLICY_ID).unwrap() < plan.position(COLLECTION_ID).unwrap());
    assert!(plan.position(FUNCTION_ROLE_ID).unwrap() < plan.position(FUNCTION_ID).unwrap());
    assert!(plan.position(FUNCTION_ID).unwrap() < plan.position(FUNCTION_URL_ID).unwrap());
    assert!(
        plan.position(FUNCTION_ID).unwrap() < plan.position(FUNCTION_URL_PERMISSION_ID).unwrap()
    );
}

#[parameterized(
    service_with_kb = { Topology::ServiceWithKnowledgeBase },
    service_only = { Topology::ServiceOnly },
    minimal = { Topology::MinimalService },
    function_with_kb = { Topology::FunctionWithKnowledgeBase },
)]
fn test_environment_matches_runtime_contract(topology: Topology) {
    let plan = synthesize(topology, full_store()).unwrap();
    let mut expected: Vec<&str> = topology.runtime_contract().to_vec();
    expected.sort();
    let actual: Vec<&str> = plan.environment.names().collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_every_topology_is_idempotent() {
    for topology in Topology::iter() {
        let first = synthesize(topology, full_store()).unwrap();
        let second = synthesize(topology, full_store()).unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        assert_eq!(first.to_template(), second.to_template());
    }
}

#[test]
fn test_topologies_have_distinct_fingerprints() {
    let fingerprints: std::collections::HashSet<String> = Topology::iter()
        .map(|t| synthesize(t, full_store()).unwrap().fingerprint().unwrap())
        .collect();
    assert_eq!(fingerprints.len(), 4);
}

#[test]
fn test_unscoped_grants_are_flagged_for_review() {
    let service = plan_for(Topology::ServiceWithKnowledgeBase);
    assert_eq!(service.review_notes.len(), 2);
    assert!(service.review_notes[0].starts_with(SERVICE_ROLE_ID));
    assert!(service.review_notes[1].starts_with(ACCESS_POLICY_ID));

    let function = plan_for(Topology::FunctionWithKnowledgeBase);
    assert_eq!(function.review_notes.len(), 3);
    assert!(
        function
            .review_notes
            .iter()
            .any(|n| n.contains("InvokeSelf"))
    );
}

#[test]
fn test_service_only_has_no_knowledge_base() {
    let plan = plan_for(Topology::ServiceOnly);
    assert_eq!(plan.resource_ids(), vec![&LogicalId::new(SERVICE_ID)]);
    assert!(plan.resource(SERVICE_ROLE_ID).is_none());
    assert!(plan.resource(NETWORK_POLICY_ID).is_none());
    assert!(plan.environment.get("AOSS_ENDPOINT_URL").is_none());
}

#[test]
fn test_composer_from_json_settings() {
    let composer = StackComposer::from_json(
        r#"{
            "topology": "ServiceWithKnowledgeBase",
            "collection_name": "support-docs",
            "use_default_parameters": true
        }"#,
    )
    .unwrap();
    assert_eq!(composer.topology(), Topology::ServiceWithKnowledgeBase);

    let plan = composer.synthesize().unwrap();
    let collection = plan.resource(COLLECTION_ID).unwrap();
    assert_eq!(collection.property("Name"), Some(&serde_json::json!("support-docs")));
    assert_eq!(
        plan.resource(ENCRYPTION_POLICY_ID).unwrap().property("Name"),
        Some(&serde_json::json!("support-docs-encryption-policy"))
    );
}

#[test]
fn test_template_lists_order_and_dependencies() {
    let plan = plan_for(Topology::ServiceWithKnowledgeBase);
    let template = plan.to_template();

    assert_eq!(template["Order"].as_array().unwrap().len(), 6);
    assert_eq!(
        template["Resources"][COLLECTION_ID]["DependsOn"],
        serde_json::json!([ENCRYPTION_POLICY_ID])
    );
    assert_eq!(
        template["Resources"][SERVICE_ID]["Type"],
        serde_json::json!("AWS::AppRunner::Service")
    );
    assert!(template["Resources"][NETWORK_POLICY_ID].get("DependsOn").is_none());
}

#[parameterized(
    service_with_kb = { Topology::ServiceWithKnowledgeBase, SERVICE_ROLE_ID },
    function_with_kb = { Topology::FunctionWithKnowledgeBase, FUNCTION_ROLE_ID },
)]
fn test_template_policies_are_strings_or_joins(topology: Topology, role: &str) {
    let template = plan_for(topology).to_template();
    let policy = |id: &str| template["Resources"][id]["Properties"]["Policy"].clone();

    for id in [ENCRYPTION_POLICY_ID, NETWORK_POLICY_ID] {
        let text = policy(id);
        let text = text.as_str().unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(text).is_ok());
    }

    let access = policy(ACCESS_POLICY_ID);
    let parts = access["Fn::Join"][1].as_array().unwrap();
    assert!(parts.iter().all(|p| p.is_string() || p.get("Fn::GetAtt").is_some()));
    assert!(parts.contains(&serde_json::json!({ "Fn::GetAtt": [role, "Arn"] })));
}

#[test]
fn test_fingerprint_is_hex_sha256() {
    let fingerprint = plan_for(Topology::MinimalService).fingerprint().unwrap();
    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
}
