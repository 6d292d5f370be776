//! Fixed worker pool
//!
//! A set of long-lived worker threads created once and kept alive for the
//! lifetime of the pool, avoiding per-frame thread creation cost. Workers
//! block on a shared queue when idle. Pools are plain objects with an
//! explicit construction/teardown lifecycle; tests construct independent
//! pools side by side.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, trace};

use crate::error::Result;

/// A unit of queued work. Receives the identity of the worker running it.
pub(crate) type Job = Box<dyn FnOnce(usize) + Send>;

thread_local! {
    static WORKER_ID: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads. Fixed for the pool's lifetime.
    pub workers: usize,
    /// Prefix for worker thread names (`{name}-{id}`).
    pub name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            name: "prism-worker".into(),
        }
    }
}

/// State shared between the pool handle and its workers.
pub(crate) struct PoolShared {
    /// Set at most once per pool lifetime; read by workers between tasks
    /// and by the dispatcher between levels.
    shutdown: AtomicBool,
    /// Number of workers that have reported ready since startup.
    ready: AtomicUsize,
}

impl PoolShared {
    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// A fixed set of persistent worker threads consuming queued jobs.
///
/// Construction blocks until every worker has started and recorded its
/// identity (a rendezvous, not a race). Teardown ([`WorkerPool::join`],
/// also run on drop) closes the queue, lets outstanding work drain and
/// waits for every worker thread to exit, so no worker outlives the pool.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    sender: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
    owner: ThreadId,
}

impl WorkerPool {
    /// Spawn the configured number of workers and wait for all of them to
    /// report ready.
    ///
    /// # Panics
    ///
    /// Panics if `config.workers` is zero. A pool with no workers could
    /// accept jobs but never run them.
    pub fn new(config: PoolConfig) -> Result<Self> {
        assert!(config.workers > 0, "worker pool requires at least one worker");

        let (sender, receiver) = unbounded::<Job>();
        let shared = Arc::new(PoolShared {
            shutdown: AtomicBool::new(false),
            ready: AtomicUsize::new(0),
        });
        let rendezvous = Arc::new((Mutex::new(0usize), Condvar::new()));

        let mut handles = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let receiver = receiver.clone();
            let shared = Arc::clone(&shared);
            let rendezvous = Arc::clone(&rendezvous);
            let handle = thread::Builder::new()
                .name(format!("{}-{id}", config.name))
                .spawn(move || {
                    WORKER_ID.with(|cell| cell.set(Some(id)));
                    shared.ready.fetch_add(1, Ordering::SeqCst);
                    {
                        let (lock, condvar) = &*rendezvous;
                        let mut started = lock.lock();
                        *started += 1;
                        condvar.notify_all();
                    }
                    trace!(worker = id, "worker started");
                    worker_loop(id, &receiver);
                    trace!(worker = id, "worker exited");
                })?;
            handles.push(handle);
        }

        // Rendezvous: return only once every worker is live
        {
            let (lock, condvar) = &*rendezvous;
            let mut started = lock.lock();
            while *started < config.workers {
                condvar.wait(&mut started);
            }
        }

        info!(workers = config.workers, "worker pool started");
        Ok(Self {
            shared,
            sender: Some(sender),
            handles,
            workers: config.workers,
            owner: thread::current().id(),
        })
    }

    /// Number of worker threads the pool was configured with.
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Number of workers that have reported ready. Equals
    /// [`WorkerPool::worker_count`] from the moment construction returns.
    pub fn ready_workers(&self) -> usize {
        self.shared.ready.load(Ordering::SeqCst)
    }

    /// Queue a job for execution on some worker.
    ///
    /// Returns `false` if the pool has already been joined; the job is
    /// dropped unexecuted in that case.
    pub fn submit(&self, job: impl FnOnce(usize) + Send + 'static) -> bool {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Request cooperative shutdown.
    ///
    /// Necessary but not sufficient for teardown: work already queued still
    /// drains, and [`WorkerPool::join`] still has to reap the threads. The
    /// flag is observed by jobs between tasks and by the dispatcher between
    /// levels.
    pub fn request_shutdown(&self) {
        if !self.shared.shutdown.swap(true, Ordering::Release) {
            debug!("shutdown requested");
        }
    }

    /// True once [`WorkerPool::request_shutdown`] has been called.
    pub fn shutdown_requested(&self) -> bool {
        self.shared.shutdown_requested()
    }

    /// Close the queue and wait for every worker thread to exit.
    ///
    /// Outstanding jobs drain before the workers stop. Idempotent; also
    /// invoked on drop.
    pub fn join(&mut self) {
        if let Some(sender) = self.sender.take() {
            self.shared.shutdown.store(true, Ordering::Release);
            // Closing the queue is what wakes idle workers
            drop(sender);
            for handle in self.handles.drain(..) {
                let _ = handle.join();
            }
            info!("worker pool joined");
        }
    }

    /// True on the thread that constructed the pool.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Identity of the calling worker within its pool, or `None` on
    /// threads that are not pool workers.
    pub fn current_worker() -> Option<usize> {
        WORKER_ID.with(Cell::get)
    }

    pub(crate) fn shared(&self) -> &Arc<PoolShared> {
        &self.shared
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}

/// Blocking wait on the shared queue, one job at a time. The loop ends when
/// the queue has been closed and fully drained; the shutdown flag alone
/// never abandons queued work.
fn worker_loop(id: usize, receiver: &Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        job(id);
    }
}
