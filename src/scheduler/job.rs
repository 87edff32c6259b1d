//! Jobs - shared, identity-compared units of deferred work.

use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;

/// Identity of a job: the address of its shared closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{:x}", self.0)
    }
}

/// A unit of work the scheduler can run.
///
/// Clones share the closure and therefore the identity; queueing several
/// clones of one job before a flush runs it once.
#[derive(Clone)]
pub struct Job {
    run: Rc<dyn Fn() -> Result<(), RuntimeError>>,
}

impl Job {
    /// Create a fallible job.
    pub fn new(f: impl Fn() -> Result<(), RuntimeError> + 'static) -> Self {
        Self { run: Rc::new(f) }
    }

    /// Create a job that cannot fail.
    pub fn from_fn(f: impl Fn() + 'static) -> Self {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    /// Identity shared by every clone of this job.
    pub fn id(&self) -> JobId {
        JobId(Rc::as_ptr(&self.run) as *const () as usize)
    }

    /// Run the job once.
    pub fn run(&self) -> Result<(), RuntimeError> {
        (self.run)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Job").field(&self.id()).finish()
    }
}
