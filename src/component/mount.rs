//! Component Mounter - turns a vnode into a live, reactive component.
//!
//! # Mount sequence
//!
//! ```text
//! before_create ─► data() ─► resolve_props ─► instance ─► created
//!                                                            │
//!            ┌───────────────────── render job ◄─────────────┘
//!            │
//!            ├─ first run:  render ─► before_mount ─► patch(None, new) ─► mounted
//!            └─ later runs: render ─► before_update ─► patch(Some(old), new) ─► updated
//! ```
//!
//! The first run happens inside `mount_component`. Later runs are triggered by
//! writes to anything the previous run read, and go through the [`Scheduler`],
//! so several writes in one turn produce a single re-render.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use serde_json::json;
//! use spark_mount::component::{ComponentDescriptor, Mounter, MountVNode};
//! use spark_mount::renderer::{Frame, TerminalRenderer, Viewport};
//! use spark_mount::scheduler::Scheduler;
//!
//! let counter = Rc::new(
//!     ComponentDescriptor::new(|ctx, _state| {
//!         Frame::text(format!("count: {}", ctx.get("count").unwrap_or_default()))
//!     })
//!     .with_data(|| json!({ "count": 0 })),
//! );
//!
//! let scheduler = Scheduler::new();
//! let mounter = Mounter::new(Rc::new(TerminalRenderer::stdout()), scheduler.clone());
//! let mut vnode = MountVNode::new(counter);
//! mounter.mount_component(&mut vnode, Viewport::default(), None)?;
//!
//! vnode.component.as_ref().unwrap().state().set("count", 1);
//! scheduler.tick()?; // one re-render
//! ```

use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::context::RenderContext;
use super::descriptor::{ComponentDescriptor, Hook};
use super::instance::ComponentInstance;
use super::props::{resolve_props, Attrs};
use super::vnode::MountVNode;
use crate::error::RuntimeError;
use crate::reactive::{reactive, run_tracked_effect, shallow_reactive};
use crate::renderer::Renderer;
use crate::scheduler::Scheduler;

/// Mounts components against one renderer, batching updates on one scheduler.
pub struct Mounter<R: Renderer> {
    renderer: Rc<R>,
    scheduler: Scheduler,
}

impl<R: Renderer> Mounter<R> {
    /// Mounter that patches through `renderer` and queues updates on `scheduler`.
    pub fn new(renderer: Rc<R>, scheduler: Scheduler) -> Self {
        Self { renderer, scheduler }
    }

    /// Renderer shared by every mounted component.
    pub fn renderer(&self) -> &Rc<R> {
        &self.renderer
    }

    /// Scheduler render jobs are queued on.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Create the instance for `vnode`, render it and patch it into
    /// `container` at `anchor`.
    ///
    /// On return `vnode.component` holds the instance, even when the first
    /// patch failed. A failed first render leaves the instance in
    /// [`LifecyclePhase::Created`](super::LifecyclePhase::Created) and the
    /// next write it depends on retries the mount.
    ///
    /// Returns the incoming properties the descriptor does not declare.
    pub fn mount_component(
        &self,
        vnode: &mut MountVNode<R::Node>,
        container: R::Container,
        anchor: Option<R::Anchor>,
    ) -> Result<Attrs, RuntimeError> {
        let descriptor = vnode.component_type.clone();
        let name: Rc<str> = Rc::from(descriptor.display_name());

        if let Some(hook) = &descriptor.hooks.before_create {
            hook();
        }

        let state = reactive(initial_state(&descriptor, &name));
        let (props, attrs) = resolve_props(&descriptor.props, vnode.props.as_ref());
        let instance =
            Rc::new(ComponentInstance::new(name.clone(), state, shallow_reactive(props)));
        vnode.component = Some(instance.clone());

        call_hook(descriptor.hooks.created.as_ref(), instance.context());

        let scheduler = self.scheduler.clone();
        let job = render_job(
            Rc::downgrade(&instance),
            descriptor,
            self.renderer.clone(),
            container,
            anchor,
        );
        let (effect, first_run) = run_tracked_effect(job, move |job| scheduler.queue_job(job));
        instance.attach_render_effect(effect);

        if let Err(err) = first_run {
            warn!(component = %name, error = %err, "first render failed");
            return Err(err);
        }

        debug!(component = %name, attrs = attrs.len(), "component mounted");
        Ok(attrs)
    }
}

impl<R: Renderer> fmt::Debug for Mounter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounter")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Call `data()`, falling back to empty state when it is absent or not an object.
fn initial_state<N: 'static>(
    descriptor: &ComponentDescriptor<N>,
    name: &str,
) -> Map<String, Value> {
    let Some(data) = &descriptor.data else {
        return Map::new();
    };

    match data() {
        Value::Object(map) => map,
        other => {
            warn!(
                component = name,
                returned = %other,
                "data() must return an object, using empty state"
            );
            Map::new()
        }
    }
}

fn call_hook(hook: Option<&Hook>, ctx: &RenderContext) {
    if let Some(hook) = hook {
        hook(ctx);
    }
}

/// The component's render job: render, patch, run hooks, keep the new tree.
///
/// Holds the instance weakly; once the instance is gone the job does nothing.
fn render_job<R: Renderer>(
    instance: Weak<ComponentInstance<R::Node>>,
    descriptor: Rc<ComponentDescriptor<R::Node>>,
    renderer: Rc<R>,
    container: R::Container,
    anchor: Option<R::Anchor>,
) -> impl Fn() -> Result<(), RuntimeError> + 'static {
    move || {
        let Some(instance) = instance.upgrade() else {
            return Ok(());
        };
        let ctx = instance.context();
        let hooks = &descriptor.hooks;

        let next = (descriptor.render)(ctx, instance.state());

        if !instance.is_mounted() {
            call_hook(hooks.before_mount.as_ref(), ctx);
            renderer.patch(None, &next, &container, anchor.as_ref())?;
            call_hook(hooks.mounted.as_ref(), ctx);
            instance.mark_mounted();
        } else {
            call_hook(hooks.before_update.as_ref(), ctx);
            {
                let previous = instance.sub_tree();
                renderer.patch(previous.as_ref(), &next, &container, anchor.as_ref())?;
            }
            call_hook(hooks.updated.as_ref(), ctx);
            instance.record_update();
            debug!(
                component = ctx.component_name(),
                updates = instance.update_count(),
                "component updated"
            );
        }

        instance.replace_sub_tree(next);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
