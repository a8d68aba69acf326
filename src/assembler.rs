//! Topology assembly: one arm per deployment shape.

use serde_json::json;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::error::StackError;
use crate::policy::{CycleStrategy, PolicyBuilder, TrustedService, execution_role};
use crate::types::{
    AOSS_ENDPOINT_URL, AOSS_INDEX_NAME, AttrRef, Attribute, ConfigKey, EnvironmentBindings,
    LogicalId, RAG_ENABLED, Resource, ResourceKind, SLACK_BOT_TOKEN, SLACK_SIGNING_SECRET,
    Topology, ValueSource,
};

pub const COLLECTION_ID: &str = "KnowledgeBaseCollection";
pub const SERVICE_ID: &str = "ServerService";
pub const SERVICE_ROLE_ID: &str = "ServerServiceInstanceRole";
pub const FUNCTION_ID: &str = "SlackBotFunction";
pub const FUNCTION_ROLE_ID: &str = "SlackBotFunctionServiceRole";
pub const FUNCTION_URL_ID: &str = "SlackBotFunctionUrl";
pub const FUNCTION_URL_PERMISSION_ID: &str = "SlackBotFunctionUrlPermission";

const SERVER_SOURCE_DIR: &str = "../server";
const SERVER_PLATFORM: &str = "linux/amd64";
const BOT_PORT: u16 = 3000;
const HELLO_WORLD_PORT: u16 = 8000;
const FUNCTION_HANDLER: &str = "server.slack_bot_handler.handler";
const FUNCTION_RUNTIME: &str = "python3.12";
const PUBLIC_URL_AUTH: &str = "NONE";
// The handler treats a missing flag as "false"; bind the same default.
const RAG_DISABLED: &str = "false";

/// Resources and workload environment for one topology, in declaration order.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub resources: Vec<Resource>,
    pub environment: EnvironmentBindings,
    pub strategy: Option<CycleStrategy>,
}

/// Declare every resource `topology` needs.
///
/// The workload's environment is checked against the topology's runtime
/// contract before the workload is declared.
pub fn assemble(
    topology: Topology,
    config: &ResolvedConfig,
    collection_name: &str,
) -> Result<Assembly, StackError> {
    let assembly = match topology {
        Topology::ServiceWithKnowledgeBase => {
            let policies = PolicyBuilder::new(collection_name)?;
            let strategy = CycleStrategy::StandaloneRole;
            let role_id = LogicalId::new(SERVICE_ROLE_ID);
            let workload_id = LogicalId::new(SERVICE_ID);

            let environment = knowledge_base_environment(config)?;
            environment.verify_contract(topology.runtime_contract())?;

            let role = execution_role(
                &role_id,
                TrustedService::ContainerService,
                &policies.workload_grants(strategy),
                strategy,
                &workload_id,
            );
            let access = policies.access_policy(&role_id, config.get(ConfigKey::ExternalPrincipal));
            let service = container_service(&workload_id, BOT_PORT, &environment, Some(&role_id));

            Assembly {
                resources: vec![
                    collection(policies.collection_name()),
                    policies.encryption_policy(),
                    policies.network_policy(),
                    role,
                    access,
                    service,
                ],
                environment,
                strategy: Some(strategy),
            }
        }
        Topology::ServiceOnly => {
            let environment = slack_environment(config)?;
            environment.verify_contract(topology.runtime_contract())?;
            let service =
                container_service(&LogicalId::new(SERVICE_ID), BOT_PORT, &environment, None);
            Assembly {
                resources: vec![service],
                environment,
                strategy: None,
            }
        }
        Topology::MinimalService => {
            let environment = EnvironmentBindings::new();
            environment.verify_contract(topology.runtime_contract())?;
            let service = container_service(
                &LogicalId::new(SERVICE_ID),
                HELLO_WORLD_PORT,
                &environment,
                None,
            );
            Assembly {
                resources: vec![service],
                environment,
                strategy: None,
            }
        }
        Topology::FunctionWithKnowledgeBase => {
            let policies = PolicyBuilder::new(collection_name)?;
            let strategy = CycleStrategy::UnscopedGrant;
            let role_id = LogicalId::new(FUNCTION_ROLE_ID);
            let workload_id = LogicalId::new(FUNCTION_ID);

            let flag = config
                .get(ConfigKey::RagEnabled)
                .cloned()
                .unwrap_or_else(|| ValueSource::literal(RAG_DISABLED));
            let environment = knowledge_base_environment(config)?.bind(RAG_ENABLED, flag);
            environment.verify_contract(topology.runtime_contract())?;

            let role = execution_role(
                &role_id,
                TrustedService::Function,
                &policies.workload_grants(strategy),
                strategy,
                &workload_id,
            );
            let access = policies.access_policy(&role_id, config.get(ConfigKey::ExternalPrincipal));

            Assembly {
                resources: vec![
                    collection(policies.collection_name()),
                    policies.encryption_policy(),
                    policies.network_policy(),
                    role,
                    access,
                    function(&workload_id, &environment, &role_id),
                    function_url(&workload_id),
                    function_url_permission(&workload_id),
                ],
                environment,
                strategy: Some(strategy),
            }
        }
    };

    debug!(
        event = "Assembly",
        phase = "Declared",
        topology = topology.to_string(),
        resources = assembly.resources.len(),
        bindings = assembly.environment.len()
    );
    Ok(assembly)
}

fn slack_environment(config: &ResolvedConfig) -> Result<EnvironmentBindings, StackError> {
    Ok(EnvironmentBindings::new()
        .bind(SLACK_BOT_TOKEN, config.required(ConfigKey::SlackBotToken)?.clone())
        .bind(
            SLACK_SIGNING_SECRET,
            config.required(ConfigKey::SlackSigningSecret)?.clone(),
        ))
}

fn knowledge_base_environment(config: &ResolvedConfig) -> Result<EnvironmentBindings, StackError> {
    Ok(slack_environment(config)?
        .bind(
            AOSS_ENDPOINT_URL,
            AttrRef::new(COLLECTION_ID, Attribute::CollectionEndpoint).into(),
        )
        .bind(AOSS_INDEX_NAME, config.required(ConfigKey::IndexName)?.clone()))
}

fn collection(name: &str) -> Resource {
    Resource::new(COLLECTION_ID, ResourceKind::Collection)
        .with_property("Name", name)
        .with_property("Type", "VECTORSEARCH")
        .with_property("StandbyReplicas", "DISABLED")
}

fn container_service(
    id: &LogicalId,
    port: u16,
    environment: &EnvironmentBindings,
    instance_role: Option<&LogicalId>,
) -> Resource {
    let mut instance = json!({ "Cpu": "1 vCPU", "Memory": "2 GB" });
    if let Some(role) = instance_role {
        instance["InstanceRoleArn"] = AttrRef::arn(role.clone()).to_json();
    }

    let mut service = Resource::new(id.clone(), ResourceKind::Service)
        .with_property(
            "SourceConfiguration",
            json!({
                "AutoDeploymentsEnabled": true,
                "ImageRepository": {
                    "ImageRepositoryType": "ECR",
                    "Asset": { "Directory": SERVER_SOURCE_DIR, "Platform": SERVER_PLATFORM },
                    "ImageConfiguration": {
                        "Port": port.to_string(),
                        "RuntimeEnvironmentVariables": environment.to_json(),
                    },
                },
            }),
        )
        .with_property("InstanceConfiguration", instance)
        .with_property("HealthCheckConfiguration", json!({ "Protocol": "TCP" }));

    if let Some(role) = instance_role {
        service = service.with_dependency(role.clone());
    }
    for dependency in environment.dependencies() {
        service = service.with_dependency(dependency);
    }
    service
}

fn function(id: &LogicalId, environment: &EnvironmentBindings, role: &LogicalId) -> Resource {
    let mut function = Resource::new(id.clone(), ResourceKind::Function)
        .with_property("Runtime", FUNCTION_RUNTIME)
        .with_property("Handler", FUNCTION_HANDLER)
        .with_property("Code", json!({ "Asset": { "Directory": SERVER_SOURCE_DIR } }))
        .with_property("Timeout", 300)
        .with_property("MemorySize", 1024)
        .with_property(
            "Environment",
            json!({ "Variables": environment.to_variables_json() }),
        )
        .with_value("Role", &ValueSource::from(AttrRef::arn(role.clone())));
    for dependency in environment.dependencies() {
        function = function.with_dependency(dependency);
    }
    function
}

fn function_url(function: &LogicalId) -> Resource {
    Resource::new(FUNCTION_URL_ID, ResourceKind::FunctionUrl)
        .with_property("AuthType", PUBLIC_URL_AUTH)
        .with_value("TargetFunctionArn", &ValueSource::from(AttrRef::arn(function.clone())))
}

// An unauthenticated URL still answers 403 until anyone may invoke through it.
fn function_url_permission(function: &LogicalId) -> Resource {
    Resource::new(FUNCTION_URL_PERMISSION_ID, ResourceKind::Permission)
        .with_property("Action", "lambda:InvokeFunctionUrl")
        .with_property("Principal", "*")
        .with_property("FunctionUrlAuthType", PUBLIC_URL_AUTH)
        .with_value("FunctionName", &ValueSource::from(AttrRef::arn(function.clone())))
}
