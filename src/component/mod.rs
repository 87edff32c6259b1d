//! Components - descriptors, instances and the mounter that connects them.
//!
//! - [`ComponentDescriptor`] - render function, state factory, hooks, props schema
//! - [`MountVNode`] - a descriptor plus the incoming properties to mount it with
//! - [`ComponentInstance`] - reactive state, props and the last rendered tree
//! - [`RenderContext`] - the view render functions and hooks read and write through
//! - [`Mounter`] - creates instances and wires their render job to a scheduler
//!
//! # Lifecycle
//!
//! ```text
//! before_create → created → before_mount → mounted → (before_update → updated)*
//! ```

mod context;
mod descriptor;
mod instance;
mod mount;
mod props;
mod vnode;

pub use context::{RenderContext, SetOutcome};
pub use descriptor::{
    BeforeCreateHook, ComponentDescriptor, DataFn, Hook, LifecycleHooks, RenderFn,
};
pub use instance::{ComponentInstance, LifecyclePhase};
pub use mount::Mounter;
pub use props::{resolve_props, Attrs, Props, PropsSchema};
pub use vnode::MountVNode;
