//! Microtask queue - the single cooperative suspension point.
//!
//! Work queued here runs after the current synchronous code returns, when the
//! host calls [`MicrotaskQueue::run`] (usually through `Scheduler::tick`).
//! Tasks queued while the queue is draining run in the same drain, after
//! everything queued before them.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred tasks. Clones share the same queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl MicrotaskQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `task` to the next checkpoint.
    pub fn queue(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Drain the queue, including tasks queued by running tasks.
    ///
    /// Returns the number of tasks run.
    pub fn run(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop outside the borrow so a task can queue more work
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else { break };
            task();
            ran += 1;
        }
        ran
    }

    /// Tasks waiting for the next checkpoint.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no task is waiting.
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drop every pending task without running it.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}
