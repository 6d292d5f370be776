//! Prism scheduling core
//!
//! The task dependency graph and its parallel scheduler. Producer code
//! (render-graph compilers, job systems) builds a [`DependencyGraph`],
//! validates and simplifies it, levels it into a [`LevelSchedule`], and
//! hands the schedule plus a caller-owned task table to a [`Dispatcher`]
//! backed by a [`WorkerPool`].
//!
//! Graph construction and leveling are single-threaded and synchronous;
//! the graph is frozen once leveling starts. Only the work queue and the
//! per-level completion countdown are touched concurrently.

pub mod dag;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod types;

pub use dag::{DependencyGraph, Level, LevelSchedule};
pub use dispatch::{DispatchConfig, Dispatcher, RunReport, RunStatus, TaskOutcome};
pub use error::{Error, Result};
pub use pool::{PoolConfig, WorkerPool};
pub use types::{TaskContext, TaskError, TaskFn, TaskId, TaskSet};
