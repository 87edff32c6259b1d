//! Tracked effects with a pluggable scheduler.
//!
//! spark-signals effects re-run themselves as soon as a dependency changes.
//! Render jobs need a different contract: run once synchronously while
//! tracking, and on invalidation hand a stable [`Job`] to a scheduler instead
//! of re-running in place.
//!
//! The adapter gets there with a short-lived spark effect (the tracker):
//!
//! ```text
//! track()  ──► effect_root { effect_sync(first run: call f, reads become deps) }
//!                              │
//!   dep write ─────────────────┘ re-run: scheduler(job), reads nothing
//!
//! job.run() ──► stop old tracker, track() again
//! ```
//!
//! The tracker's re-run reads nothing, so it drops its dependencies and
//! further writes before the job runs do not schedule it again. It also means
//! a job that never runs (dropped by `Scheduler::reset` or the recursion
//! limit) leaves the effect deaf until someone runs the job again; see
//! [`EffectHandle::is_waiting`].
//!
//! Trackers live in their own root scope and run synchronously, so an effect
//! created from inside another one (a child mounted from a parent's hook, a
//! mount inside `spark_signals::batch`) still runs before `run_tracked_effect`
//! returns and is not torn down when the outer effect re-runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use spark_signals::{effect_root, effect_sync, with_context, AnySource};
use tracing::trace;

use crate::error::RuntimeError;
use crate::scheduler::Job;

type EffectFn = dyn Fn() -> Result<(), RuntimeError>;
type SchedulerFn = dyn Fn(Job);

struct TrackedEffect {
    func: Box<EffectFn>,
    scheduler: Box<SchedulerFn>,
    job: RefCell<Option<Job>>,
    stop_tracker: RefCell<Option<Box<dyn FnOnce()>>>,
    stopped: Cell<bool>,
    /// Invalidated, job not run yet. The tracker holds no dependencies meanwhile.
    waiting: Cell<bool>,
}

impl TrackedEffect {
    /// Run `func` under a fresh tracker.
    fn track(self: &Rc<Self>) -> Result<(), RuntimeError> {
        if self.stopped.get() {
            return Ok(());
        }
        self.dispose_tracker();
        self.waiting.set(false);

        let outcome: Rc<RefCell<Option<Result<(), RuntimeError>>>> = Rc::new(RefCell::new(None));
        let outcome_slot = outcome.clone();
        let weak = Rc::downgrade(self);

        // Root scope: survives re-runs of whatever effect is running right now.
        // Sync child: runs before `effect_root` returns, even inside a batch.
        let stop = detached(move || {
            effect_root(move || {
                let first_run = Cell::new(true);
                let _ = effect_sync(move || {
                    let Some(this) = weak.upgrade() else { return };

                    if first_run.replace(false) {
                        // Panics must not unwind through the reactive runtime
                        let result = panic::catch_unwind(AssertUnwindSafe(|| (this.func)()))
                            .unwrap_or_else(|payload| Err(RuntimeError::from_panic(payload)));
                        *outcome_slot.borrow_mut() = Some(result);
                    } else {
                        this.invalidate();
                    }
                });
            })
        });
        *self.stop_tracker.borrow_mut() = Some(Box::new(stop));

        outcome
            .borrow_mut()
            .take()
            .unwrap_or(Err(RuntimeError::EffectNotRun))
    }

    fn invalidate(&self) {
        if self.stopped.get() {
            return;
        }
        self.waiting.set(true);
        let job = self.job.borrow().clone();
        if let Some(job) = job {
            trace!(job = %job.id(), "effect invalidated");
            (self.scheduler)(job);
        }
    }

    fn dispose_tracker(&self) {
        let stop = self.stop_tracker.borrow_mut().take();
        if let Some(stop) = stop {
            stop();
        }
    }
}

/// Run `f` outside the dependency collection of the effect that is running.
///
/// Creating a sync effect inside a running one resets the outer effect's
/// collected dependencies and inherits its untracking flag. Both are saved
/// here and restored afterwards, also on unwind.
fn detached<T>(f: impl FnOnce() -> T) -> T {
    struct Restore {
        deps: Option<Vec<Rc<dyn AnySource>>>,
        skipped: usize,
        untracking: bool,
    }

    impl Drop for Restore {
        fn drop(&mut self) {
            let deps = self.deps.take().unwrap_or_default();
            with_context(|ctx| {
                ctx.swap_new_deps(deps);
                ctx.set_skipped_deps(self.skipped);
                ctx.set_untracking(self.untracking);
            });
        }
    }

    let _restore = with_context(|ctx| Restore {
        deps: Some(ctx.swap_new_deps(Vec::new())),
        skipped: ctx.get_skipped_deps(),
        untracking: ctx.set_untracking(false),
    });
    f()
}

impl Drop for TrackedEffect {
    fn drop(&mut self) {
        self.stopped.set(true);
        if let Some(stop) = self.stop_tracker.get_mut().take() {
            stop();
        }
    }
}

// =============================================================================
// Effect Handle
// =============================================================================

/// Owner of a tracked effect. Dropping it stops the effect.
pub struct EffectHandle {
    inner: Rc<TrackedEffect>,
}

impl EffectHandle {
    /// The job handed to the scheduler on invalidation.
    ///
    /// The same job (same identity) is returned for the whole life of the effect.
    pub fn job(&self) -> Option<Job> {
        self.inner.job.borrow().clone()
    }

    /// Stop tracking. Pending jobs already queued become no-ops.
    pub fn stop(&self) {
        self.inner.stopped.set(true);
        self.inner.dispose_tracker();
    }

    /// Whether the effect is still tracking.
    pub fn is_active(&self) -> bool {
        !self.inner.stopped.get()
    }

    /// Whether the effect was invalidated and its job has not run since.
    ///
    /// While waiting the effect holds no dependencies: only running the job
    /// makes it react to writes again. A job the scheduler discards (reset,
    /// recursion limit) leaves the effect waiting until the job is run by hand.
    pub fn is_waiting(&self) -> bool {
        self.inner.waiting.get()
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("active", &self.is_active())
            .field("waiting", &self.is_waiting())
            .finish()
    }
}

/// Run `f` once, synchronously, tracking every reactive read it performs.
///
/// When any of those reads is later invalidated by a write, `scheduler` is
/// called with the effect's job instead of re-running `f`. Running that job
/// re-runs `f` and re-tracks its dependencies.
///
/// Returns the handle together with the result of the first run, so a failed
/// first run still leaves a live effect that later writes can retry.
pub fn run_tracked_effect<F, S>(f: F, scheduler: S) -> (EffectHandle, Result<(), RuntimeError>)
where
    F: Fn() -> Result<(), RuntimeError> + 'static,
    S: Fn(Job) + 'static,
{
    let inner = Rc::new(TrackedEffect {
        func: Box::new(f),
        scheduler: Box::new(scheduler),
        job: RefCell::new(None),
        stop_tracker: RefCell::new(None),
        stopped: Cell::new(false),
        waiting: Cell::new(false),
    });

    let weak = Rc::downgrade(&inner);
    let job = Job::new(move || match weak.upgrade() {
        Some(effect) => effect.track(),
        None => Ok(()),
    });
    *inner.job.borrow_mut() = Some(job);

    let first_run = inner.track();
    (EffectHandle { inner }, first_run)
}

// =============================================================================
// Tests
// =============================================================================
