//! Scheduler errors
//!
//! Graph-algorithm errors are synchronous return values at the call site
//! that invoked them; execution-phase failures and cancellation are reported
//! per task through [`crate::dispatch::RunReport`] instead. Out-of-range
//! task indices are programming-contract violations and fail fast (assert)
//! rather than appearing here.

use thiserror::Error;

use crate::types::TaskId;

/// Scheduler result type
pub type Result<T> = std::result::Result<T, Error>;

/// Scheduler errors
#[derive(Debug, Error)]
pub enum Error {
    /// The dependency graph is not a DAG. Leveling and transitive reduction
    /// require an acyclic edge set; the caller must fix the edges and retry.
    #[error("cycle detected in dependency graph: {tasks:?}")]
    CycleDetected {
        /// Tasks that could not be ordered because they sit on or behind
        /// a circular dependency chain.
        tasks: Vec<TaskId>,
    },

    /// The task table handed to the dispatcher does not cover the schedule.
    #[error("task table has {tasks} entries but the schedule covers {schedule} tasks")]
    TaskCountMismatch { tasks: usize, schedule: usize },

    /// A worker thread could not be spawned at pool construction.
    #[error("failed to spawn worker thread")]
    WorkerSpawn(#[from] std::io::Error),
}
