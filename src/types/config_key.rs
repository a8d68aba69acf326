//! Named configuration inputs read from the parameter store.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// A named configuration input.
///
/// Each key maps to one entry in the backing parameter store. Whether a key is
/// required depends on the [`Topology`](super::Topology) being synthesized.
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
    Display,
    EnumIter,
    EnumString,
    ToSchema,
)]
pub enum ConfigKey {
    /// Slack bot OAuth token.
    SlackBotToken,
    /// Slack request signing secret.
    SlackSigningSecret,
    /// Name of the vector index inside the collection.
    IndexName,
    /// Feature flag string switching retrieval on or off.
    RagEnabled,
    /// An extra principal ARN allowed to use the collection (e.g. the indexing operator).
    ExternalPrincipal,
}

impl ConfigKey {
    /// The parameter name this key is conventionally stored under.
    pub fn default_parameter_name(&self) -> &'static str {
        match self {
            ConfigKey::SlackBotToken => "SlackBotToken",
            ConfigKey::SlackSigningSecret => "SlackSignSecret",
            ConfigKey::IndexName => "AossIndexName",
            ConfigKey::RagEnabled => "RagEnabled",
            ConfigKey::ExternalPrincipal => "ExternalPrincipalArn",
        }
    }
}
