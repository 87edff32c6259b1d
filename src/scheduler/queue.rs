//! Job queue - deduplicated, microtask-batched flushing.
//!
//! # Flow
//!
//! ```text
//! queue_job(a) ─┐                         ┌─► run a
//! queue_job(b) ─┼─► pending {a, b} ──tick─┤
//! queue_job(a) ─┘   (one flush queued)    └─► run b
//! ```
//!
//! - The first `queue_job` since the last flush finished raises the flushing
//!   flag and queues one flush on the microtask queue.
//! - A flush drains a snapshot of the pending set. Jobs queued while it runs
//!   wait for the next flush, which is queued as soon as this one ends.
//! - The flag is lowered by a drop guard, so a failing or panicking job never
//!   wedges the scheduler.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use spark_signals::flush_sync;
use tracing::{debug, error, trace};

use super::config::{ErrorPolicy, SchedulerConfig};
use super::job::{Job, JobId};
use super::microtask::MicrotaskQueue;
use crate::error::{FlushError, RuntimeError};

// =============================================================================
// Flush Report
// =============================================================================

/// Outcome of one flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Jobs that were started (including ones that failed).
    pub executed: usize,
    /// Jobs pushed back to the next flush by [`ErrorPolicy::Abort`].
    pub carried_over: usize,
    pub failures: Vec<RuntimeError>,
}

impl FlushReport {
    /// Whether every job in the flush succeeded.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Batches jobs into microtask-deferred flushes.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    config: SchedulerConfig,
    microtasks: MicrotaskQueue,
    pending: RefCell<IndexMap<JobId, Job>>,
    flushing: Cell<bool>,
    /// Bumped at every flush and reset; a queued flush from an older epoch is stale.
    epoch: Cell<u64>,
    /// Runs per job across back-to-back flushes.
    chain: RefCell<HashMap<JobId, usize>>,
    /// Failures from microtask flushes, handed out by `tick()`.
    failures: RefCell<Vec<RuntimeError>>,
}

impl Scheduler {
    /// Scheduler with the default config and its own microtask queue.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Scheduler with `config` and its own microtask queue.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::with_microtasks(MicrotaskQueue::new(), config)
    }

    /// Build a scheduler that flushes on a shared microtask queue.
    pub fn with_microtasks(microtasks: MicrotaskQueue, config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                config,
                microtasks,
                pending: RefCell::new(IndexMap::new()),
                flushing: Cell::new(false),
                epoch: Cell::new(0),
                chain: RefCell::new(HashMap::new()),
                failures: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// The microtask queue flushes are deferred to.
    pub fn microtasks(&self) -> &MicrotaskQueue {
        &self.inner.microtasks
    }

    /// Request that `job` runs in the next flush.
    ///
    /// Never runs anything synchronously. Queueing a job that is already
    /// pending is a no-op.
    pub fn queue_job(&self, job: Job) {
        let id = job.id();
        let inserted = {
            let mut pending = self.inner.pending.borrow_mut();
            if pending.contains_key(&id) {
                false
            } else {
                pending.insert(id, job);
                true
            }
        };
        trace!(job = %id, inserted, "queue job");

        if !self.inner.flushing.get() {
            self.schedule_flush();
        }
    }

    /// Microtask checkpoint: let pending reactive effects settle, then run
    /// queued microtasks (and with them any scheduled flush).
    ///
    /// Returns the failures of every flush that ran.
    pub fn tick(&self) -> Result<(), FlushError> {
        flush_sync();
        self.inner.microtasks.run();

        let failures = mem::take(&mut *self.inner.failures.borrow_mut());
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }

    /// Flush synchronously, without waiting for the microtask checkpoint.
    pub fn flush_now(&self) -> FlushReport {
        self.flush()
    }

    /// Whether a flush is queued or running.
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Number of distinct jobs waiting for a flush.
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Whether `job` (by identity) is waiting for a flush.
    pub fn is_pending(&self, job: &Job) -> bool {
        self.inner.pending.borrow().contains_key(&job.id())
    }

    /// Drop pending jobs and lower the flag. A flush already on the
    /// microtask queue becomes a no-op.
    ///
    /// Render effects whose jobs are dropped stay waiting and ignore writes
    /// until their job runs again (`ComponentInstance::force_update`).
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.pending.borrow_mut().clear();
        inner.chain.borrow_mut().clear();
        inner.failures.borrow_mut().clear();
        inner.epoch.set(inner.epoch.get() + 1);
        inner.flushing.set(false);
    }

    fn schedule_flush(&self) {
        self.inner.flushing.set(true);
        let epoch = self.inner.epoch.get();
        let weak = Rc::downgrade(&self.inner);

        self.inner.microtasks.queue(move || {
            let Some(inner) = weak.upgrade() else { return };
            if inner.epoch.get() != epoch {
                return;
            }

            let scheduler = Scheduler { inner };
            let report = scheduler.flush();
            if !report.failures.is_empty() {
                scheduler.inner.failures.borrow_mut().extend(report.failures);
            }
        });
    }

    fn flush(&self) -> FlushReport {
        let inner = &self.inner;
        inner.epoch.set(inner.epoch.get() + 1);
        inner.flushing.set(true);

        let jobs: Vec<Job> = mem::take(&mut *inner.pending.borrow_mut())
            .into_values()
            .collect();
        debug!(jobs = jobs.len(), "flush start");

        let _guard = FlushGuard { scheduler: self };
        let mut report = FlushReport::default();
        let mut remaining = jobs.into_iter();

        while let Some(job) = remaining.next() {
            let id = job.id();
            if let Err(err) = self.enter_chain(id) {
                error!(job = %id, error = %err, "dropping runaway job");
                report.failures.push(err);
                continue;
            }

            report.executed += 1;
            let result = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
                .unwrap_or_else(|payload| Err(RuntimeError::from_panic(payload)));

            let Err(err) = result else { continue };
            error!(job = %id, error = %err, "job failed during flush");
            report.failures.push(err);

            if inner.config.error_policy == ErrorPolicy::Abort {
                let rest: Vec<Job> = remaining.by_ref().collect();
                report.carried_over = rest.len();
                self.requeue_front(rest);
                break;
            }
        }

        debug!(
            executed = report.executed,
            failed = report.failures.len(),
            carried_over = report.carried_over,
            "flush end"
        );
        report
    }

    fn enter_chain(&self, id: JobId) -> Result<(), RuntimeError> {
        let limit = self.inner.config.recursion_limit;
        let mut chain = self.inner.chain.borrow_mut();
        let runs = chain.entry(id).or_insert(0);
        *runs += 1;
        if *runs > limit {
            Err(RuntimeError::RecursionLimit { limit })
        } else {
            Ok(())
        }
    }

    fn requeue_front(&self, jobs: Vec<Job>) {
        let mut pending = self.inner.pending.borrow_mut();
        let queued_meanwhile = mem::take(&mut *pending);
        pending.extend(jobs.into_iter().map(|job| (job.id(), job)));
        for (id, job) in queued_meanwhile {
            pending.entry(id).or_insert(job);
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_len())
            .field("flushing", &self.is_flushing())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Lowers the flushing flag on every exit path and queues the next flush
/// when jobs arrived during this one.
struct FlushGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let inner = &self.scheduler.inner;
        inner.flushing.set(false);

        if inner.pending.borrow().is_empty() {
            inner.chain.borrow_mut().clear();
        } else {
            self.scheduler.schedule_flush();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_job(count: &Rc<Cell<usize>>) -> Job {
        let count = count.clone();
        Job::from_fn(move || count.set(count.get() + 1))
    }

    #[test]
    fn test_queue_job_is_deferred() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));

        scheduler.queue_job(counter_job(&count));
        assert_eq!(count.get(), 0);
        assert!(scheduler.is_flushing());
        assert_eq!(scheduler.microtasks().len(), 1);

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 1);
        assert!(!scheduler.is_flushing());
    }

    #[test]
    fn test_same_job_runs_once() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let job = counter_job(&count);

        for _ in 0..5 {
            scheduler.queue_job(job.clone());
        }
        assert_eq!(scheduler.pending_len(), 1);
        // One flush queued, not five
        assert_eq!(scheduler.microtasks().len(), 1);

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_distinct_jobs_share_one_flush_in_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first_log = log.clone();
        let second_log = log.clone();
        scheduler.queue_job(Job::from_fn(move || first_log.borrow_mut().push("first")));
        scheduler.queue_job(Job::from_fn(move || second_log.borrow_mut().push("second")));

        let report = scheduler.flush_now();
        assert_eq!(report.executed, 2);
        assert!(report.is_ok());
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_state_recovers_after_panicking_job() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));

        scheduler.queue_job(Job::from_fn(|| panic!("render blew up")));
        scheduler.queue_job(counter_job(&count));

        let err = scheduler.tick().unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert!(matches!(err.failures[0], RuntimeError::JobPanicked(_)));

        // Continue policy: the second job still ran
        assert_eq!(count.get(), 1);
        assert!(!scheduler.is_flushing());
        assert_eq!(scheduler.pending_len(), 0);

        // And the scheduler keeps working
        scheduler.queue_job(counter_job(&count));
        scheduler.tick().unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_error_result_is_reported() {
        let scheduler = Scheduler::new();
        scheduler.queue_job(Job::new(|| Err(RuntimeError::Patch("detached".into()))));

        let report = scheduler.flush_now();
        assert_eq!(report.executed, 1);
        assert!(matches!(report.failures.as_slice(), [RuntimeError::Patch(_)]));
        assert!(!scheduler.is_flushing());
    }

    #[test]
    fn test_abort_policy_carries_jobs_over() {
        let config = SchedulerConfig::default().with_error_policy(ErrorPolicy::Abort);
        let scheduler = Scheduler::with_config(config);
        let count = Rc::new(Cell::new(0));

        scheduler.queue_job(Job::new(|| Err(RuntimeError::Patch("first fails".into()))));
        scheduler.queue_job(counter_job(&count));

        let report = scheduler.flush_now();
        assert_eq!(report.executed, 1);
        assert_eq!(report.carried_over, 1);
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending_len(), 1);
        assert!(scheduler.is_flushing());

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[test]
    fn test_job_queued_during_flush_waits_for_next_flush() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));
        let follow_up = counter_job(&count);

        let inner_scheduler = scheduler.clone();
        scheduler.queue_job(Job::from_fn(move || inner_scheduler.queue_job(follow_up.clone())));

        let report = scheduler.flush_now();
        assert_eq!(report.executed, 1);
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending_len(), 1);
        // Next flush is already queued
        assert!(scheduler.is_flushing());

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 1);
        assert!(!scheduler.is_flushing());
    }

    #[test]
    fn test_self_requeueing_job_hits_recursion_limit() {
        let config = SchedulerConfig::default().with_recursion_limit(3);
        let scheduler = Scheduler::with_config(config);
        let runs = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Job>>> = Rc::new(RefCell::new(None));

        let job = {
            let scheduler = scheduler.clone();
            let runs = runs.clone();
            let slot = slot.clone();
            Job::from_fn(move || {
                runs.set(runs.get() + 1);
                let me = slot.borrow().clone();
                if let Some(me) = me {
                    scheduler.queue_job(me);
                }
            })
        };
        *slot.borrow_mut() = Some(job.clone());

        scheduler.queue_job(job);
        let err = scheduler.tick().unwrap_err();

        assert_eq!(runs.get(), 3);
        assert!(matches!(err.failures.as_slice(), [RuntimeError::RecursionLimit { limit: 3 }]));
        assert!(!scheduler.is_flushing());
        assert_eq!(scheduler.pending_len(), 0);

        // Break the test-only cycle
        slot.borrow_mut().take();
    }

    #[test]
    fn test_stale_flush_after_flush_now_is_skipped() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));

        scheduler.queue_job(counter_job(&count));
        scheduler.flush_now();
        assert_eq!(count.get(), 1);

        let second = counter_job(&count);
        scheduler.queue_job(second);
        // Two flushes on the queue: the stale one and the fresh one
        assert_eq!(scheduler.microtasks().len(), 2);

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_reset_drops_pending_jobs() {
        let scheduler = Scheduler::new();
        let count = Rc::new(Cell::new(0));

        scheduler.queue_job(counter_job(&count));
        scheduler.reset();
        assert_eq!(scheduler.pending_len(), 0);
        assert!(!scheduler.is_flushing());

        scheduler.tick().unwrap();
        assert_eq!(count.get(), 0);

        // Queueing after reset schedules a fresh flush
        scheduler.queue_job(counter_job(&count));
        scheduler.tick().unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_shared_microtask_queue() {
        let microtasks = MicrotaskQueue::new();
        let scheduler = Scheduler::with_microtasks(microtasks.clone(), SchedulerConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));

        let task_log = log.clone();
        microtasks.queue(move || task_log.borrow_mut().push("task"));
        let job_log = log.clone();
        scheduler.queue_job(Job::from_fn(move || job_log.borrow_mut().push("job")));

        scheduler.tick().unwrap();
        assert_eq!(*log.borrow(), vec!["task", "job"]);
    }
}
