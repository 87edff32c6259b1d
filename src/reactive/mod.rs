//! Reactivity bindings - reactive objects and scheduler-driven effects.
//!
//! Both sit on top of [spark-signals](https://github.com/RLabs-Inc/spark-signals):
//! - [`ReactiveObject`] - string-keyed state, one signal per field
//! - [`run_tracked_effect`] - tracked function whose re-runs go through a scheduler
//!
//! # Example
//!
//! ```ignore
//! use serde_json::json;
//! use spark_mount::reactive::{reactive, run_tracked_effect};
//!
//! let state = reactive(json!({ "count": 0 }).as_object().cloned().unwrap());
//! let reader = state.clone();
//!
//! let (handle, first_run) = run_tracked_effect(
//!     move || {
//!         println!("count = {:?}", reader.get("count"));
//!         Ok(())
//!     },
//!     |job| scheduler.queue_job(job),
//! );
//!
//! state.set("count", 1); // job queued, not run
//! ```

mod effect;
mod object;

pub use effect::{run_tracked_effect, EffectHandle};
pub use object::{reactive, shallow_reactive, Depth, ReactiveObject};
