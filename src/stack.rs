use std::collections::HashMap;

use tracing::{debug, info};

use crate::assembler::assemble;
use crate::config::{ConfigResolver, ParameterStore};
use crate::error::StackError;
use crate::graph::DependencyGraph;
use crate::loader::{DEFAULT_COLLECTION_NAME, StackSettings, parse_settings};
use crate::traits::ConfigSource;
use crate::types::{LogicalId, Resource, StackPlan, Topology};

/// Composes a topology into an ordered [`StackPlan`].
///
/// Each call to [`StackComposer::synthesize`] is an independent pass over the
/// same inputs; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct StackComposer<S = ParameterStore> {
    topology: Topology,
    collection_name: String,
    source: S,
}

impl StackComposer<ParameterStore> {
    pub fn from_settings(settings: StackSettings) -> Self {
        StackComposer {
            topology: settings.topology,
            collection_name: settings.collection_name,
            source: settings.parameters,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, StackError> {
        Ok(Self::from_settings(parse_settings(text)?))
    }
}

impl<S: ConfigSource> StackComposer<S> {
    pub fn new(topology: Topology, source: S) -> Self {
        StackComposer {
            topology,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            source,
        }
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Run one synthesis pass. Either every resource is declared, ordered and
    /// returned, or nothing is.
    pub fn synthesize(&self) -> Result<StackPlan, StackError> {
        info!(
            event = "Synthesis",
            phase = "Start",
            topology = self.topology.to_string(),
            source = self.source.source_name()
        );

        // 1. Read configuration; all missing required keys fail together
        let config = ConfigResolver::new(&self.source).resolve_topology(self.topology)?;

        // 2. Declare resources, policies and environment for the topology
        let assembly = assemble(self.topology, &config, &self.collection_name)?;

        // 3. Order them
        let graph = DependencyGraph::from_resources(&assembly.resources)?;
        let order = graph.resolve_order()?;
        let edges = graph.edges();
        debug!(
            event = "Synthesis",
            phase = "Ordering",
            edges = edges.len(),
            order = order.iter().map(LogicalId::as_str).collect::<Vec<_>>().join(" -> ")
        );

        // 4. Emit resources in resolved order
        let mut declared: HashMap<LogicalId, Resource> = assembly
            .resources
            .into_iter()
            .map(|r| (r.id().clone(), r))
            .collect();
        let resources: Vec<Resource> = order
            .iter()
            .map(|id| {
                declared
                    .remove(id)
                    .ok_or_else(|| StackError::UnknownResource(id.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let review_notes = resources
            .iter()
            .flat_map(|r| r.notes().iter().map(move |note| format!("{}: {note}", r.id())))
            .collect();

        let plan = StackPlan {
            topology: self.topology,
            resources,
            edges,
            environment: assembly.environment,
            parameters: config.parameters().to_vec(),
            review_notes,
        };

        let fingerprint = plan.fingerprint()?;
        info!(
            event = "Synthesis",
            phase = "Result",
            topology = self.topology.to_string(),
            resources = plan.resources.len(),
            fingerprint
        );
        Ok(plan)
    }
}

/// Synthesize `topology` against `source` with the default collection name.
pub fn synthesize<S: ConfigSource>(topology: Topology, source: S) -> Result<StackPlan, StackError> {
    StackComposer::new(topology, source).synthesize()
}

#[cfg(test)]
mod tests;
