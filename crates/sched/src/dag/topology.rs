//! Topological leveling and cycle residue for dependency graphs.

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::types::TaskId;

use super::schedule::Level;

/// Compute topological levels using Kahn's algorithm.
///
/// Repeatedly collects all tasks with current in-degree zero into the next
/// level, then removes them and decrements the in-degree of their
/// successors. Tasks within a level are sorted by index for determinism.
pub(super) fn topological_levels(edges: &[IndexSet<TaskId>]) -> Result<Vec<Level>> {
    let count = edges.len();
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut in_degree = vec![0usize; count];
    for successors in edges {
        for target in successors {
            in_degree[target.index()] += 1;
        }
    }

    let mut levels = Vec::new();
    let mut current: Vec<TaskId> = (0..count)
        .map(TaskId)
        .filter(|task| in_degree[task.index()] == 0)
        .collect();

    let mut placed = 0;

    while !current.is_empty() {
        // Sort for determinism
        current.sort();

        let mut next = Vec::new();
        for task in &current {
            for successor in &edges[task.index()] {
                in_degree[successor.index()] -= 1;
                if in_degree[successor.index()] == 0 {
                    next.push(*successor);
                }
            }
        }

        placed += current.len();
        levels.push(Level {
            tasks: std::mem::replace(&mut current, next),
        });
    }

    // Tasks that never reached in-degree zero sit on or behind a cycle
    if placed != count {
        let tasks = (0..count)
            .map(TaskId)
            .filter(|task| in_degree[task.index()] > 0)
            .collect();
        return Err(Error::CycleDetected { tasks });
    }

    Ok(levels)
}

/// Tasks left with nonzero in-degree after peeling every task that can be
/// ordered. Empty iff the edge set is acyclic.
pub(super) fn cycle_residue(edges: &[IndexSet<TaskId>]) -> Vec<TaskId> {
    let count = edges.len();
    let mut in_degree = vec![0usize; count];
    for successors in edges {
        for target in successors {
            in_degree[target.index()] += 1;
        }
    }

    let mut ready: Vec<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    while let Some(task) = ready.pop() {
        for successor in &edges[task] {
            in_degree[successor.index()] -= 1;
            if in_degree[successor.index()] == 0 {
                ready.push(successor.index());
            }
        }
    }

    (0..count)
        .map(TaskId)
        .filter(|task| in_degree[task.index()] > 0)
        .collect()
}
