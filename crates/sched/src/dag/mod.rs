//! Dependency graph and level decomposition.
//!
//! This module defines the directed graph recording dependency edges between
//! work units and the algorithms that validate, simplify and decompose it
//! into a deterministic execution order.
//!
//! # Structure
//!
//! - [`DependencyGraph`] - vertices plus directed edges, with structural
//!   queries (edge existence, reachability, cycle presence), transitive
//!   reduction and leveling
//! - [`Level`] - a set of tasks with no dependency among them (safe to run
//!   in parallel)
//! - [`LevelSchedule`] - the ordered sequence of levels produced by leveling
//!
//! # Execution Model
//!
//! Levels act as barriers: every task in level N must complete before any
//! task in level N+1 begins. Within a level there is no ordering guarantee.
//!
//! # Building schedules
//!
//! Construct a [`DependencyGraph`], add edges, confirm acyclicity with
//! [`DependencyGraph::has_cycle`], optionally strip redundant edges with
//! [`DependencyGraph::remove_redundant`], then call
//! [`DependencyGraph::build_levels`]. Cyclic input yields
//! [`Error::CycleDetected`](crate::error::Error::CycleDetected).

mod graph;
mod schedule;
mod topology;


pub use graph::DependencyGraph;
pub use schedule::{Level, LevelSchedule};
