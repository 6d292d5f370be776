//! Core scheduling types
//!
//! Shared contracts between the dependency graph, the worker pool and the
//! dispatcher. Task bodies are owned by the caller; the scheduler only ever
//! sees a `TaskId` and its position in the level schedule.

use std::fmt;

/// Handle for one unit of work in a dependency graph.
///
/// A `TaskId` is an index in `[0, task_count)` assigned when the graph is
/// constructed. Identity is the index; there is no separate object lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Raw index into caller-owned task tables.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for TaskId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Failure reported by an individual task body.
///
/// The scheduler does not interpret the message; it is carried verbatim into
/// the task's result slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Context handed to a task body while it runs on a worker.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// The task being executed.
    pub task: TaskId,
    /// Index of the level this task belongs to.
    pub level: usize,
    /// Identity of the worker running the task.
    pub worker: usize,
}

/// Function executed for one task slot.
///
/// Tasks within a level may run concurrently and must be independent by
/// construction; that independence is established by the leveling algorithm,
/// not re-checked at execution time.
pub type TaskFn = Box<dyn Fn(&TaskContext) -> Result<(), TaskError> + Send + Sync>;

/// A complete task table, indexed by `TaskId`.
pub type TaskSet = Vec<TaskFn>;
