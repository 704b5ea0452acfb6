// src/dag/mod.rs

//! DAG representation and dependency bookkeeping.
//!
//! - [`graph`] holds the validated, immutable job graph (adjacency only).
//! - [`state_manager`] holds the per-run remaining-dependency counters that
//!   workers consume concurrently.
//! - [`job`] defines the unit of work handed to the scheduler.

pub mod graph;
pub mod job;
pub mod state_manager;

pub use graph::DagGraph;
pub use job::Job;
pub use state_manager::DependencyState;
