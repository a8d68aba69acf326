//! Ordering constraints between declared resources.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::logical_id::LogicalId;

/// `dependent` must be created after `dependency`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct DependencyEdge {
    pub dependent: LogicalId,
    pub dependency: LogicalId,
}

impl DependencyEdge {
    pub fn new(dependent: impl Into<LogicalId>, dependency: impl Into<LogicalId>) -> Self {
        DependencyEdge {
            dependent: dependent.into(),
            dependency: dependency.into(),
        }
    }
}

impl Display for DependencyEdge {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} -> {}", self.dependent, self.dependency)
    }
}
