//! Registry-driven dependency resolution.
//!
//! Turns a set of guessed top-level package names into a closed,
//! version-constrained dependency set via a fixpoint over registry lookups,
//! then builds a DAG view and a native-build ordering over the result.

pub mod dag;
pub mod engine;
pub mod native;

pub use dag::{DagNode, DepGraph};
pub use engine::{DependencySet, FailedSet, ResolutionOutcome, resolve_dependencies};
pub use native::{augmented_requirements, build_order};
