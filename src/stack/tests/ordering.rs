use super::*;
use insta::assert_snapshot;

fn order_of(plan: &StackPlan) -> String {
    plan.resource_ids()
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[test]
fn test_service_with_knowledge_base_order() {
    let plan = plan_for(Topology::ServiceWithKnowledgeBase);
    assert_snapshot!(order_of(&plan), @"KnowledgeBaseCollectionEncryptionPolicy -> KnowledgeBaseCollection -> KnowledgeBaseCollectionNetworkPolicy -> ServerServiceInstanceRole -> KnowledgeBaseCollectionAccessPolicy -> ServerService");
}

#[test]
fn test_function_with_knowledge_base_order() {
    let plan = plan_for(Topology::FunctionWithKnowledgeBase);
    assert_snapshot!(order_of(&plan), @"KnowledgeBaseCollectionEncryptionPolicy -> KnowledgeBaseCollection -> KnowledgeBaseCollectionNetworkPolicy -> SlackBotFunctionServiceRole -> KnowledgeBaseCollectionAccessPolicy -> SlackBotFunction -> SlackBotFunctionUrl -> SlackBotFunctionUrlPermission");
}

#[parameterized(
    service_with_kb = { Topology::ServiceWithKnowledgeBase },
    service_only = { Topology::ServiceOnly },
    minimal = { Topology::MinimalService },
    function_with_kb = { Topology::FunctionWithKnowledgeBase },
)]
fn test_dependencies_precede_dependents(topology: Topology) {
    let plan = synthesize(topology, full_store()).unwrap();
    for edge in &plan.edges {
        let dependent = plan.position(edge.dependent.as_str()).unwrap();
        let dependency = plan.position(edge.dependency.as_str()).unwrap();
        assert!(dependency < dependent, "{edge} violated in {topology}");
    }
    for resource in &plan.resources {
        for dependency in resource.depends_on() {
            assert!(plan.position(dependency.as_str()) < plan.position(resource.id().as_str()));
        }
    }
}

#[test]
fn test_forced_edge_is_recorded_in_plan() {
    let plan = plan_for(Topology::ServiceWithKnowledgeBase);
    assert_eq!(
        plan.dependencies_of(COLLECTION_ID),
        vec![&LogicalId::new(ENCRYPTION_POLICY_ID)]
    );
    assert!(plan.resource(COLLECTION_ID).unwrap().depends_on().is_empty());
}

#[test]
fn test_workload_waits_for_collection_and_role() {
    let plan = plan_for(Topology::FunctionWithKnowledgeBase);
    let deps: Vec<&str> = plan
        .dependencies_of(FUNCTION_ID)
        .into_iter()
        .map(LogicalId::as_str)
        .collect();
    assert!(deps.contains(&COLLECTION_ID));
    assert!(deps.contains(&FUNCTION_ROLE_ID));
    assert_eq!(plan.dependencies_of(FUNCTION_URL_ID), vec![&LogicalId::new(FUNCTION_ID)]);
}

#[test]
fn test_order_is_stable_across_collection_names() {
    let default = plan_for(Topology::ServiceWithKnowledgeBase);
    let renamed = StackComposer::new(
        Topology::ServiceWithKnowledgeBase,
        ParameterStore::with_defaults(),
    )
    .with_collection_name("support-docs")
    .synthesize()
    .unwrap();
    assert_eq!(default.resource_ids(), renamed.resource_ids());
    assert_ne!(default.fingerprint().unwrap(), renamed.fingerprint().unwrap());
}
