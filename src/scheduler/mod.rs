//! Job Scheduler - batches render jobs into microtask-deferred flushes.
//!
//! - [`Scheduler`] - pending job set, flushing flag, flush loop
//! - [`Job`] - identity-compared unit of work
//! - [`MicrotaskQueue`] - where flushes wait for the next checkpoint
//!
//! # Example
//!
//! ```ignore
//! use spark_mount::scheduler::{Job, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let job = Job::from_fn(|| println!("rendered"));
//!
//! scheduler.queue_job(job.clone());
//! scheduler.queue_job(job); // same job, still one run
//!
//! scheduler.tick()?; // prints "rendered" once
//! ```

mod config;
mod job;
mod microtask;
mod queue;

pub use config::{ErrorPolicy, SchedulerConfig};
pub use job::{Job, JobId};
pub use microtask::MicrotaskQueue;
pub use queue::{FlushReport, Scheduler};
