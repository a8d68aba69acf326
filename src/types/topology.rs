//! The closed set of deployment shapes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use utoipa::ToSchema;

use crate::error::StackError;

use super::config_key::ConfigKey;

pub const AOSS_ENDPOINT_URL: &str = "AOSS_ENDPOINT_URL";
pub const AOSS_INDEX_NAME: &str = "AOSS_INDEX_NAME";
pub const SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
pub const SLACK_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";
pub const RAG_ENABLED: &str = "RAG_ENABLED";

/// A deployment shape, chosen once per synthesis pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, ToSchema,
)]
pub enum Topology {
    /// Container service plus knowledge-base collection with full policy wiring.
    ServiceWithKnowledgeBase,
    /// Container service running the bot without retrieval.
    ServiceOnly,
    /// Bare container service with no configuration at all.
    MinimalService,
    /// Event-driven function plus knowledge-base collection.
    FunctionWithKnowledgeBase,
}

impl Topology {
    /// Environment variables the workload's code reads, and nothing else.
    pub fn runtime_contract(&self) -> &'static [&'static str] {
        match self {
            Topology::ServiceWithKnowledgeBase => &[
                AOSS_ENDPOINT_URL,
                AOSS_INDEX_NAME,
                SLACK_BOT_TOKEN,
                SLACK_SIGNING_SECRET,
            ],
            Topology::ServiceOnly => &[SLACK_BOT_TOKEN, SLACK_SIGNING_SECRET],
            Topology::MinimalService => &[],
            Topology::FunctionWithKnowledgeBase => &[
                AOSS_ENDPOINT_URL,
                AOSS_INDEX_NAME,
                SLACK_BOT_TOKEN,
                SLACK_SIGNING_SECRET,
                RAG_ENABLED,
            ],
        }
    }

    /// Configuration keys that must be present for this topology.
    pub fn required_keys(&self) -> &'static [ConfigKey] {
        match self {
            Topology::ServiceWithKnowledgeBase | Topology::FunctionWithKnowledgeBase => &[
                ConfigKey::SlackBotToken,
                ConfigKey::SlackSigningSecret,
                ConfigKey::IndexName,
            ],
            Topology::ServiceOnly => &[ConfigKey::SlackBotToken, ConfigKey::SlackSigningSecret],
            Topology::MinimalService => &[],
        }
    }

    /// Configuration keys read when present and skipped otherwise.
    pub fn optional_keys(&self) -> &'static [ConfigKey] {
        match self {
            Topology::ServiceWithKnowledgeBase => &[ConfigKey::ExternalPrincipal],
            Topology::FunctionWithKnowledgeBase => {
                &[ConfigKey::RagEnabled, ConfigKey::ExternalPrincipal]
            }
            Topology::ServiceOnly | Topology::MinimalService => &[],
        }
    }
}

impl FromStr for Topology {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ServiceWithKnowledgeBase" => Ok(Topology::ServiceWithKnowledgeBase),
            "ServiceOnly" => Ok(Topology::ServiceOnly),
            "MinimalService" => Ok(Topology::MinimalService),
            "FunctionWithKnowledgeBase" => Ok(Topology::FunctionWithKnowledgeBase),
            _ => Err(StackError::UnsupportedTopology(s.to_string())),
        }
    }
}
