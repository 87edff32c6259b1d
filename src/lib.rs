//! # spark-mount
//!
//! Component mounting for a reactive UI runtime.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained
//! reactivity.
//!
//! ## Architecture
//!
//! A component is a render function over reactive state. Mounting one creates
//! an instance, renders it once and hands the tree to a [`Renderer`]. The
//! render job records what it read; writes to any of it queue the job on the
//! [`Scheduler`], which runs each queued job once per flush:
//!
//! ```text
//! state.set() → tracker invalidated → queue_job → tick() → flush → render → patch
//! ```
//!
//! The host drives time: nothing re-renders until it calls [`Scheduler::tick`].
//!
//! ## Modules
//!
//! - [`component`] - Descriptors, instances, render context, the mounter
//! - [`reactive`] - Reactive objects and scheduler-driven effects
//! - [`scheduler`] - Deduplicating job queue and microtask checkpoint
//! - [`renderer`] - The `Renderer` trait, a terminal renderer and a recording one
//! - [`error`] - Runtime and flush errors

pub mod component;
pub mod error;
pub mod reactive;
pub mod renderer;
pub mod scheduler;

// Re-export commonly used items
pub use component::{
    resolve_props, Attrs, ComponentDescriptor, ComponentInstance, LifecyclePhase, MountVNode,
    Mounter, Props, PropsSchema, RenderContext, SetOutcome,
};

pub use error::{FlushError, RuntimeError};

pub use reactive::{reactive, run_tracked_effect, shallow_reactive, EffectHandle, ReactiveObject};

pub use renderer::{Frame, PatchCall, RecordingRenderer, Renderer, TerminalRenderer, Viewport};

pub use scheduler::{
    ErrorPolicy, FlushReport, Job, JobId, MicrotaskQueue, Scheduler, SchedulerConfig,
};
