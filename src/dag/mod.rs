// src/dag/mod.rs

//! Dependency graph construction and scheduling.
//!
//! - [`task`] defines the opaque task record and the discovery seam.
//! - [`edge`] defines the directed "run-before" edge.
//! - [`graph`] holds the symmetric adjacency structure.
//! - [`builder`] runs the pairwise classification pass.
//! - [`topo`] orders the graph and repairs cycles.
//! - [`grouping`] cuts the order into execution groups.

pub mod builder;
pub mod edge;
pub mod graph;
pub mod grouping;
pub mod task;
pub mod topo;

pub use builder::GraphBuilder;
pub use edge::{DependencyEdge, EdgeKind};
pub use graph::DependencyGraph;
pub use grouping::{ExecutionGroup, partition};
pub use task::{StaticTaskSource, Task, TaskKey, TaskKind, TaskSource};
pub use topo::{SortOutcome, break_weakest_edge, sort};
