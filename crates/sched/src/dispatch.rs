//! Level-by-level dispatch
//!
//! Bridges a [`LevelSchedule`] to a [`WorkerPool`]: for each level, queue
//! every member task, wait for the level to drain, then advance. At most
//! one level is ever in flight, which is what keeps the dependency contract
//! intact during concurrent execution.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::unbounded;
use tracing::{debug, instrument, trace, warn};

use crate::dag::LevelSchedule;
use crate::error::{Error, Result};
use crate::pool::WorkerPool;
use crate::types::{TaskContext, TaskError, TaskFn, TaskId, TaskSet};

/// Dispatch configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Stop issuing further levels once a drained level contains a failed
    /// task. The failing level itself always drains; tasks in later levels
    /// are reported as [`TaskOutcome::Skipped`]. Off by default: one failed
    /// task does not block the independent tasks around it.
    pub fail_fast: bool,
}

/// Overall result of one schedule run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every level drained; no task failed.
    Completed,
    /// Every issued level drained but at least one task failed.
    Failed,
    /// A shutdown request was observed mid-schedule; remaining work was
    /// not issued.
    Cancelled,
}

/// Per-task result slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task body ran and reported success.
    Completed,
    /// The task body ran and reported failure, or panicked.
    Failed(TaskError),
    /// The task never ran: its level was not issued, or shutdown was
    /// observed before the task body started.
    Skipped,
}

impl TaskOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }
}

/// Report handed back to the caller once the run stops.
#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    /// One slot per task, indexed by [`TaskId`].
    pub outcomes: Vec<TaskOutcome>,
}

/// Executes level schedules against a worker pool.
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Run `schedule` against `pool`, executing `tasks[i]` for task `i`.
    ///
    /// Blocks the calling thread until every issued level has drained.
    /// Task failures do not abort the level they belong to; cancellation
    /// (a shutdown request on `pool`) stops the run and is reported as
    /// [`RunStatus::Cancelled`], never as a hang: a queued job that
    /// observes shutdown reports [`TaskOutcome::Skipped`] but still counts
    /// toward the level drain, and a level whose drain contains such a
    /// skip marks the run cancelled even when it is the final level.
    ///
    /// Returns [`Error::TaskCountMismatch`] when the task table does not
    /// cover the schedule.
    #[instrument(skip_all, fields(levels = schedule.level_count(), tasks = schedule.task_count()))]
    pub fn run(
        &self,
        pool: &WorkerPool,
        schedule: &LevelSchedule,
        tasks: &Arc<TaskSet>,
    ) -> Result<RunReport> {
        if tasks.len() != schedule.task_count() {
            return Err(Error::TaskCountMismatch {
                tasks: tasks.len(),
                schedule: schedule.task_count(),
            });
        }

        let mut outcomes = vec![TaskOutcome::Skipped; schedule.task_count()];
        let mut status = RunStatus::Completed;
        let shared = Arc::clone(pool.shared());
        let (results_tx, results_rx) = unbounded::<(TaskId, TaskOutcome)>();

        for (level_idx, level) in schedule.levels().iter().enumerate() {
            if shared.shutdown_requested() {
                debug!(level = level_idx, "shutdown observed between levels");
                status = RunStatus::Cancelled;
                break;
            }

            trace!(level = level_idx, width = level.len(), "level issued");
            for &task in &level.tasks {
                let tasks = Arc::clone(tasks);
                let shared = Arc::clone(&shared);
                let results = results_tx.clone();
                let accepted = pool.submit(move |worker| {
                    let outcome = if shared.shutdown_requested() {
                        TaskOutcome::Skipped
                    } else {
                        run_task(&tasks[task.index()], task, level_idx, worker)
                    };
                    // Every queued job reports, run or not, so the drain
                    // below cannot hang
                    let _ = results.send((task, outcome));
                });
                if !accepted {
                    // Pool already joined; account for the job ourselves
                    let _ = results_tx.send((task, TaskOutcome::Skipped));
                }
            }

            // Completion countdown: the level stays in flight until every
            // member has reported
            let mut level_failed = false;
            let mut level_skipped = false;
            for _ in 0..level.len() {
                if let Ok((task, outcome)) = results_rx.recv() {
                    match &outcome {
                        TaskOutcome::Failed(err) => {
                            warn!(%task, error = %err, "task failed");
                            level_failed = true;
                        }
                        TaskOutcome::Skipped => level_skipped = true,
                        TaskOutcome::Completed => {}
                    }
                    outcomes[task.index()] = outcome;
                }
            }

            // A skip inside an issued level means shutdown landed mid-level;
            // without this the last level would misreport as Completed
            if level_skipped && shared.shutdown_requested() {
                debug!(level = level_idx, "shutdown observed mid-level");
                status = RunStatus::Cancelled;
                break;
            }

            if level_failed {
                status = RunStatus::Failed;
                if self.config.fail_fast {
                    debug!(level = level_idx, "fail-fast abort after failed level");
                    break;
                }
            }
        }

        debug!(?status, "run finished");
        Ok(RunReport { status, outcomes })
    }
}

fn run_task(task_fn: &TaskFn, task: TaskId, level: usize, worker: usize) -> TaskOutcome {
    let ctx = TaskContext {
        task,
        level,
        worker,
    };
    trace!(%task, level, worker, "task start");
    match panic::catch_unwind(AssertUnwindSafe(|| task_fn(&ctx))) {
        Ok(Ok(())) => TaskOutcome::Completed,
        Ok(Err(err)) => TaskOutcome::Failed(err),
        Err(_) => TaskOutcome::Failed(TaskError::new("task panicked")),
    }
}
