//! Leveled execution order produced by the dependency graph.

use crate::types::TaskId;

/// A set of tasks with no dependency among them.
///
/// No task in a level is reachable from any other task in the same level,
/// so its members may execute concurrently in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    /// Tasks in this level, sorted by index for determinism.
    pub tasks: Vec<TaskId>,
}

impl Level {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The output of leveling: levels in dependency order.
///
/// Every predecessor of a task in level `k` lies in some level `< k`.
/// A schedule is immutable once produced; it becomes stale if the graph it
/// was computed from mutates afterwards, in which case the caller must
/// recompute it.
#[derive(Debug, Clone)]
pub struct LevelSchedule {
    levels: Vec<Level>,
    task_count: usize,
}

impl LevelSchedule {
    pub(super) fn new(levels: Vec<Level>, task_count: usize) -> Self {
        Self { levels, task_count }
    }

    /// Levels in execution order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total number of tasks across all levels. Equals the task count of
    /// the graph the schedule was built from.
    pub fn task_count(&self) -> usize {
        self.task_count
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the level containing `task`, if the task exists.
    pub fn level_of(&self, task: TaskId) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.tasks.contains(&task))
    }
}
