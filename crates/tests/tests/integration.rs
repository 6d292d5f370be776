//! Integration tests for end-to-end schedule execution.
//!
//! These tests verify the full pipeline:
//! build graph → validate → simplify → level → dispatch on a real pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use prism_sched::{
    DependencyGraph, RunStatus, TaskError, TaskFn, TaskId, TaskOutcome, TaskSet, WorkerPool,
};

use prism_tests::{init_test_logging, ExecutionProbe, TestHarness};

/// Build → validate → simplify → level → run, on the diamond-with-shortcut
/// shape: the shortcut edge is stripped by reduction, the schedule still
/// orders every task correctly and all tasks complete.
#[test]
fn test_full_pipeline() {
    init_test_logging();

    let mut graph = DependencyGraph::new(4);
    graph.add_edge(TaskId(0), TaskId(1));
    graph.add_edge(TaskId(0), TaskId(2));
    graph.add_edge(TaskId(1), TaskId(3));
    graph.add_edge(TaskId(2), TaskId(3));
    graph.add_edge(TaskId(0), TaskId(3)); // implied by either branch

    assert!(!graph.has_cycle());
    assert_eq!(graph.remove_redundant().unwrap(), 1);
    assert!(!graph.has_edge(TaskId(0), TaskId(3)));
    assert!(graph.is_reachable(TaskId(0), TaskId(3)));

    let schedule = graph.build_levels().unwrap();
    assert_eq!(schedule.level_count(), 3);

    let harness = TestHarness::new(4);
    let probe = ExecutionProbe::new(&schedule);
    let report = harness.run(&schedule, probe.tasks(4));

    assert_eq!(report.status, RunStatus::Completed);
    assert!(report.outcomes.iter().all(|o| *o == TaskOutcome::Completed));
    assert!(probe.violations().is_empty(), "{:?}", probe.violations());
    assert_eq!(probe.order().len(), 4);
    assert_eq!(probe.order()[0], 0);
    assert_eq!(probe.order()[3], 3);
}

/// Level barriers hold under a wide graph with more tasks than workers.
#[test]
fn test_level_barrier_under_load() {
    init_test_logging();

    // 3 waves of 16, each task in wave k depending on two tasks of wave k-1
    let width = 16;
    let task_count = width * 3;
    let mut edges = Vec::new();
    for wave in 1..3 {
        for i in 0..width {
            let from_base = (wave - 1) * width;
            edges.push((from_base + i, wave * width + i));
            edges.push((from_base + (i + 1) % width, wave * width + i));
        }
    }

    let schedule = TestHarness::schedule(task_count, &edges);
    assert_eq!(schedule.level_count(), 3);

    let harness = TestHarness::new(4);
    let probe = ExecutionProbe::new(&schedule);
    let report = harness.run(&schedule, probe.tasks(task_count));

    assert_eq!(report.status, RunStatus::Completed);
    assert!(probe.violations().is_empty(), "{:?}", probe.violations());
    assert_eq!(probe.order().len(), task_count);
}

/// A shutdown requested from inside a task cancels the rest of the
/// schedule instead of hanging the countdown.
#[test]
fn test_cancellation_mid_schedule() {
    init_test_logging();

    let harness = TestHarness::new(2);
    let schedule = TestHarness::schedule(3, &[(0, 1), (1, 2)]);

    let pool = Arc::clone(harness.pool());
    let executed = Arc::new(AtomicUsize::new(0));

    let tasks: TaskSet = vec![
        {
            let executed = Arc::clone(&executed);
            Box::new(move |_ctx: &prism_sched::TaskContext| {
                executed.fetch_add(1, Ordering::SeqCst);
                pool.request_shutdown();
                Ok(())
            }) as TaskFn
        },
        {
            let executed = Arc::clone(&executed);
            Box::new(move |_ctx: &prism_sched::TaskContext| {
                executed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as TaskFn
        },
        {
            let executed = Arc::clone(&executed);
            Box::new(move |_ctx: &prism_sched::TaskContext| {
                executed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }) as TaskFn
        },
    ];

    let report = harness.run(&schedule, tasks);

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(executed.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcomes[0], TaskOutcome::Completed);
    assert_eq!(report.outcomes[1], TaskOutcome::Skipped);
    assert_eq!(report.outcomes[2], TaskOutcome::Skipped);
}

/// One failing task neither blocks its level nor later levels by default.
#[test]
fn test_failure_policy_end_to_end() {
    init_test_logging();

    // {0, 1} -> 2; task 1 fails
    let schedule = TestHarness::schedule(3, &[(0, 2), (1, 2)]);
    let harness = TestHarness::new(2);

    let tasks: TaskSet = vec![
        Box::new(|_: &prism_sched::TaskContext| Ok(())) as TaskFn,
        Box::new(|_: &prism_sched::TaskContext| Err(TaskError::new("shader miscompiled")))
            as TaskFn,
        Box::new(|_: &prism_sched::TaskContext| Ok(())) as TaskFn,
    ];

    let report = harness.run(&schedule, tasks);

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.outcomes[0], TaskOutcome::Completed);
    assert!(report.outcomes[1].is_failed());
    // The level after the failure still ran
    assert_eq!(report.outcomes[2], TaskOutcome::Completed);
}

/// Startup rendezvous: every worker has reported ready by the time
/// construction returns, every time.
#[test]
fn test_startup_rendezvous_under_stress() {
    for _ in 0..20 {
        let harness = TestHarness::new(4);
        assert_eq!(harness.pool().ready_workers(), 4);
    }
}

/// Task bodies observe a worker identity; the coordinating thread does not.
#[test]
fn test_worker_identity_from_tasks() {
    let harness = TestHarness::new(3);
    let schedule = TestHarness::schedule(6, &[]);

    let ids = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let tasks: TaskSet = (0..6)
        .map(|_| {
            let ids = Arc::clone(&ids);
            Box::new(move |ctx: &prism_sched::TaskContext| {
                ids.lock().push((ctx.worker, WorkerPool::current_worker()));
                Ok(())
            }) as TaskFn
        })
        .collect();

    let report = harness.run(&schedule, tasks);
    assert_eq!(report.status, RunStatus::Completed);

    assert_eq!(WorkerPool::current_worker(), None);
    assert!(harness.pool().is_main_thread());

    let ids = ids.lock();
    assert_eq!(ids.len(), 6);
    for &(ctx_worker, current) in ids.iter() {
        assert!(ctx_worker < 3);
        assert_eq!(current, Some(ctx_worker));
    }
}

/// Independent pools coexist; joining one leaves the other usable.
#[test]
fn test_independent_pools() {
    let a = TestHarness::new(2);
    let b = TestHarness::new(2);

    let schedule = TestHarness::schedule(2, &[(0, 1)]);
    let probe_a = ExecutionProbe::new(&schedule);
    let probe_b = ExecutionProbe::new(&schedule);

    let report_a = a.run(&schedule, probe_a.tasks(2));
    drop(a);

    let report_b = b.run(&schedule, probe_b.tasks(2));

    assert_eq!(report_a.status, RunStatus::Completed);
    assert_eq!(report_b.status, RunStatus::Completed);
    assert_eq!(probe_b.order(), vec![0, 1]);
}
