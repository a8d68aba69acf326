//! Resource dependency graph and creation ordering.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::StackError;
use crate::types::{DependencyEdge, LogicalId, Resource, ResourceKind};

/// "Must exist before" edges between declared resources.
///
/// Nodes keep their declaration order, which breaks ties between resources
/// with no ordering constraint so the resolved order is reproducible.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<LogicalId>,
    index: HashMap<LogicalId, usize>,
    // dependencies[i] holds the nodes that must precede node i.
    dependencies: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from declared resources: one node per resource, an edge
    /// per recorded dependency, plus the forced encryption-policy edges.
    pub fn from_resources(resources: &[Resource]) -> Result<Self, StackError> {
        let mut graph = Self::new();
        for resource in resources {
            graph.add_node(resource.id().clone())?;
        }
        for resource in resources {
            for dependency in resource.depends_on() {
                graph.add_edge(resource.id(), dependency)?;
            }
        }
        graph.enforce_encryption_before_collection(resources)?;
        Ok(graph)
    }

    pub fn add_node(&mut self, id: LogicalId) -> Result<(), StackError> {
        if self.index.contains_key(&id) {
            return Err(StackError::DuplicateResource(id.to_string()));
        }
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(id);
        self.dependencies.push(BTreeSet::new());
        Ok(())
    }

    /// Record that `dependent` must be created after `dependency`.
    ///
    /// A self-edge is accepted here and reported as a cycle by
    /// [`DependencyGraph::resolve_order`].
    pub fn add_edge(
        &mut self,
        dependent: &LogicalId,
        dependency: &LogicalId,
    ) -> Result<(), StackError> {
        let from = self.lookup(dependent)?;
        let to = self.lookup(dependency)?;
        self.dependencies[from].insert(to);
        Ok(())
    }

    fn lookup(&self, id: &LogicalId) -> Result<usize, StackError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StackError::UnknownResource(id.to_string()))
    }

    /// The provider rejects a collection whose encryption policy does not
    /// exist yet. Nothing in the collection's properties links the two, so
    /// the edge is added here for every collection, and a collection with no
    /// covering encryption policy is an error.
    pub fn enforce_encryption_before_collection(
        &mut self,
        resources: &[Resource],
    ) -> Result<(), StackError> {
        for collection in resources
            .iter()
            .filter(|r| r.kind() == ResourceKind::Collection)
        {
            let name = collection
                .property("Name")
                .and_then(|v| v.as_str())
                .unwrap_or(collection.id().as_str());

            let policies: Vec<&Resource> = resources
                .iter()
                .filter(|r| r.kind() == ResourceKind::SecurityPolicy)
                .filter(|r| {
                    r.document()
                        .is_some_and(|d| d.is_encryption() && d.covers_collection(name))
                })
                .collect();

            if policies.is_empty() {
                warn!(
                    event = "Graph",
                    phase = "ForcedEdge",
                    collection = collection.id().as_str(),
                    "no encryption policy covers collection"
                );
                return Err(StackError::MissingEncryptionPolicy(name.to_string()));
            }

            for policy in policies {
                debug!(
                    event = "Graph",
                    phase = "ForcedEdge",
                    dependent = collection.id().as_str(),
                    dependency = policy.id().as_str()
                );
                self.add_edge(collection.id(), policy.id())?;
            }
        }
        Ok(())
    }

    /// All edges, grouped by dependent in declaration order.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(from, deps)| {
                deps.iter().map(move |&to| {
                    DependencyEdge::new(self.nodes[from].clone(), self.nodes[to].clone())
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topologically sort the graph. Among resources that are ready at the
    /// same time, the one declared first goes first.
    ///
    /// Fails with `CyclicDependency` naming one cycle; no partial order is
    /// ever returned.
    pub fn resolve_order(&self) -> Result<Vec<LogicalId>, StackError> {
        let n = self.nodes.len();
        let mut remaining: Vec<usize> = self.dependencies.iter().map(BTreeSet::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, deps) in self.dependencies.iter().enumerate() {
            for &to in deps {
                dependents[to].push(from);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < n {
            let cycle = self.find_cycle(&remaining);
            warn!(event = "Graph", phase = "Ordering", cycle = cycle.join(" -> "));
            return Err(StackError::CyclicDependency { cycle });
        }

        Ok(order.into_iter().map(|i| self.nodes[i].clone()).collect())
    }

    // Every unplaced node still waits on another unplaced node, so following
    // unplaced dependencies from any of them must revisit a node.
    fn find_cycle(&self, remaining: &[usize]) -> Vec<String> {
        let unplaced = |i: usize| remaining[i] > 0;
        let Some(start) = (0..self.nodes.len()).find(|&i| unplaced(i)) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut current = start;
        loop {
            if let Some(pos) = path.iter().position(|&p| p == current) {
                let mut cycle: Vec<String> = path[pos..]
                    .iter()
                    .map(|&i| self.nodes[i].to_string())
                    .collect();
                cycle.push(self.nodes[current].to_string());
                return cycle;
            }
            path.push(current);
            match self.dependencies[current].iter().copied().find(|&d| unplaced(d)) {
                Some(next) => current = next,
                None => return path.iter().map(|&i| self.nodes[i].to_string()).collect(),
            }
        }
    }
}
