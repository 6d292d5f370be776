//! The dependency graph: vertices, directed edges and structural queries.

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::types::TaskId;

use super::schedule::LevelSchedule;
use super::topology;

/// Visitation state for the cycle-detecting depth-first traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A directed graph of dependency edges between tasks.
///
/// An edge `(from, to)` means "`from` must complete before `to` runs".
/// The task count is fixed at construction; tasks are identified by their
/// index. Edges may be added freely, including edges that transiently form
/// a cycle: acyclicity is a queried invariant ([`has_cycle`]), not one
/// enforced at insertion time. [`build_levels`] and [`remove_redundant`]
/// require an acyclic edge set and report [`Error::CycleDetected`]
/// otherwise.
///
/// Task indices outside `[0, task_count)` are a programming-contract
/// violation: every method below asserts its index arguments and panics on
/// violation rather than returning an error.
///
/// [`has_cycle`]: DependencyGraph::has_cycle
/// [`build_levels`]: DependencyGraph::build_levels
/// [`remove_redundant`]: DependencyGraph::remove_redundant
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Adjacency sets keyed by source task. `IndexSet` keeps insertion
    /// order so traversal and leveling stay deterministic.
    edges: Vec<IndexSet<TaskId>>,
}

impl DependencyGraph {
    /// Create a graph over `task_count` tasks with no edges.
    pub fn new(task_count: usize) -> Self {
        Self {
            edges: vec![IndexSet::new(); task_count],
        }
    }

    /// Number of tasks the graph was constructed over.
    pub fn task_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(IndexSet::len).sum()
    }

    /// Record that `from` must complete before `to`.
    ///
    /// Idempotent: inserting an existing edge is a no-op. Self-loops are
    /// accepted here and rejected later by [`DependencyGraph::has_cycle`].
    ///
    /// # Panics
    ///
    /// Panics if `from` or `to` is outside `[0, task_count)`.
    pub fn add_edge(&mut self, from: TaskId, to: TaskId) {
        self.check_task(from);
        self.check_task(to);
        if self.edges[from.index()].insert(to) {
            trace!(%from, %to, "edge added");
        }
    }

    /// True iff the edge `(from, to)` is present.
    ///
    /// # Panics
    ///
    /// Panics if `from` or `to` is outside `[0, task_count)`.
    pub fn has_edge(&self, from: TaskId, to: TaskId) -> bool {
        self.check_task(from);
        self.check_task(to);
        self.edges[from.index()].contains(&to)
    }

    /// True iff the edge set contains any directed cycle, including
    /// self-loops.
    ///
    /// Depth-first traversal tracking three states per task: unvisited,
    /// in-progress (on the current traversal stack) and done. A cycle
    /// exists iff the traversal reaches an in-progress task. Every task is
    /// used as a root so disconnected components are covered; each task is
    /// visited once overall.
    pub fn has_cycle(&self) -> bool {
        let mut marks = vec![Mark::Unvisited; self.edges.len()];

        for root in 0..self.edges.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::InProgress;

            // Explicit stack of (task, successor cursor) frames
            let mut stack = vec![(root, 0usize)];
            while !stack.is_empty() {
                let top = stack.len() - 1;
                let (task, cursor) = stack[top];
                if let Some(&next) = self.edges[task].get_index(cursor) {
                    stack[top].1 += 1;
                    match marks[next.index()] {
                        Mark::InProgress => return true,
                        Mark::Unvisited => {
                            marks[next.index()] = Mark::InProgress;
                            stack.push((next.index(), 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[task] = Mark::Done;
                    stack.pop();
                }
            }
        }

        false
    }

    /// Boolean reachability: true iff some directed path leads from `from`
    /// to `to`. A task trivially reaches itself.
    ///
    /// # Panics
    ///
    /// Panics if `from` or `to` is outside `[0, task_count)`.
    pub fn is_reachable(&self, from: TaskId, to: TaskId) -> bool {
        self.check_task(from);
        self.check_task(to);
        if from == to {
            return true;
        }

        let mut visited = vec![false; self.edges.len()];
        visited[from.index()] = true;
        let mut stack = vec![from.index()];

        while let Some(task) = stack.pop() {
            for &next in &self.edges[task] {
                if next == to {
                    return true;
                }
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    stack.push(next.index());
                }
            }
        }

        false
    }

    /// Remove every redundant edge (transitive reduction).
    ///
    /// An edge `(a, b)` is redundant when `b` is already reachable from one
    /// of `a`'s other direct successors; removing it leaves the reachability
    /// relation unchanged while minimizing the edge count. Idempotent.
    /// Returns the number of edges removed.
    ///
    /// Requires an acyclic edge set; cyclic input yields
    /// [`Error::CycleDetected`] and leaves the graph untouched.
    pub fn remove_redundant(&mut self) -> Result<usize> {
        if self.has_cycle() {
            return Err(Error::CycleDetected {
                tasks: topology::cycle_residue(&self.edges),
            });
        }

        let mut removed = 0;
        for from in 0..self.edges.len() {
            let successors: Vec<TaskId> = self.edges[from].iter().copied().collect();
            for to in successors {
                // Redundant iff another current direct successor already
                // reaches `to`. Removal preserves reachability, so checking
                // against the current edge set stays correct as earlier
                // redundant edges disappear.
                let redundant = self.edges[from]
                    .iter()
                    .any(|&other| other != to && self.is_reachable(other, to));
                if redundant {
                    self.edges[from].shift_remove(&to);
                    removed += 1;
                    trace!(from = %TaskId(from), %to, "redundant edge removed");
                }
            }
        }

        if removed > 0 {
            debug!(removed, remaining = self.edge_count(), "graph simplified");
        }
        Ok(removed)
    }

    /// Decompose the graph into a leveled execution order.
    ///
    /// Cyclic input yields [`Error::CycleDetected`] listing the tasks that
    /// never reached in-degree zero. Best results come from a simplified
    /// graph ([`DependencyGraph::remove_redundant`]), though leveling is
    /// correct on any acyclic edge set.
    pub fn build_levels(&self) -> Result<LevelSchedule> {
        let levels = topology::topological_levels(&self.edges)?;
        debug!(
            tasks = self.task_count(),
            levels = levels.len(),
            "level schedule built"
        );
        Ok(LevelSchedule::new(levels, self.task_count()))
    }

    fn check_task(&self, task: TaskId) {
        assert!(
            task.index() < self.edges.len(),
            "task {task} out of range (graph has {} tasks)",
            self.edges.len()
        );
    }
}
