// src/lib.rs
pub use assembler::{Assembly, assemble};
pub use config::{ConfigResolver, ParameterStore, ResolvedConfig};
pub use error::StackError;
pub use graph::DependencyGraph;
pub use loader::{DEFAULT_COLLECTION_NAME, StackSettings, parse_settings};
pub use policy::{CycleStrategy, PolicyBuilder, TrustedService, execution_role};
pub use stack::{StackComposer, synthesize};
pub use traits::ConfigSource;
pub use types::*;

mod assembler;
mod config;
mod error;
mod graph;
mod loader;
mod policy;
mod stack;
mod traits;
mod types;
