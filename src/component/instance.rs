//! Component instances - the live state behind one mounted vnode.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use super::context::RenderContext;
use crate::error::RuntimeError;
use crate::reactive::{EffectHandle, ReactiveObject};

/// Where an instance is in its life.
///
/// ```text
/// Created ──first render──► Mounted ──update──► Updated ──update──► Updated …
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// State and props resolved, first render not (successfully) done yet.
    Created,
    /// First patch done, no update yet.
    Mounted,
    /// At least one update patch done.
    Updated,
}

/// A mounted (or mounting) component.
pub struct ComponentInstance<N: 'static> {
    state: ReactiveObject,
    props: ReactiveObject,
    is_mounted: Cell<bool>,
    sub_tree: RefCell<Option<N>>,
    update_count: Cell<usize>,
    context: RenderContext,
    render_effect: RefCell<Option<EffectHandle>>,
}

impl<N: 'static> ComponentInstance<N> {
    pub(crate) fn new(name: Rc<str>, state: ReactiveObject, props: ReactiveObject) -> Self {
        let context = RenderContext::new(name, state.clone(), props.clone());
        Self {
            state,
            props,
            is_mounted: Cell::new(false),
            sub_tree: RefCell::new(None),
            update_count: Cell::new(0),
            context,
            render_effect: RefCell::new(None),
        }
    }

    /// Deeply reactive component state.
    pub fn state(&self) -> &ReactiveObject {
        &self.state
    }

    /// Shallow reactive declared props. Parent-side writes here re-render.
    pub fn props(&self) -> &ReactiveObject {
        &self.props
    }

    /// Render context over state and props.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Whether the first patch has succeeded.
    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    /// The most recently patched output tree.
    pub fn sub_tree(&self) -> Ref<'_, Option<N>> {
        self.sub_tree.borrow()
    }

    /// Number of completed update patches.
    pub fn update_count(&self) -> usize {
        self.update_count.get()
    }

    pub fn phase(&self) -> LifecyclePhase {
        match (self.is_mounted(), self.update_count()) {
            (false, _) => LifecyclePhase::Created,
            (true, 0) => LifecyclePhase::Mounted,
            (true, _) => LifecyclePhase::Updated,
        }
    }

    /// Whether the render job is still reacting to state changes.
    pub fn is_reactive(&self) -> bool {
        self.render_effect
            .borrow()
            .as_ref()
            .is_some_and(EffectHandle::is_active)
    }

    /// Whether a state change queued a re-render that has not run yet.
    ///
    /// Stays true when the scheduler dropped the queued job (`Scheduler::reset`,
    /// recursion limit). Such a component ignores further writes until
    /// [`force_update`](Self::force_update) runs it.
    pub fn is_update_pending(&self) -> bool {
        self.render_effect
            .borrow()
            .as_ref()
            .is_some_and(EffectHandle::is_waiting)
    }

    /// Run the render job now, outside the scheduler, and re-track its reads.
    pub fn force_update(&self) -> Result<(), RuntimeError> {
        let job = self.render_effect.borrow().as_ref().and_then(EffectHandle::job);
        match job {
            Some(job) => job.run(),
            None => Ok(()),
        }
    }

    pub(crate) fn attach_render_effect(&self, effect: EffectHandle) {
        *self.render_effect.borrow_mut() = Some(effect);
    }

    pub(crate) fn mark_mounted(&self) {
        self.is_mounted.set(true);
    }

    pub(crate) fn record_update(&self) {
        self.update_count.set(self.update_count.get() + 1);
    }

    pub(crate) fn replace_sub_tree(&self, tree: N) {
        *self.sub_tree.borrow_mut() = Some(tree);
    }
}

impl<N: 'static> fmt::Debug for ComponentInstance<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("component", &self.context.component_name())
            .field("phase", &self.phase())
            .field("state", &self.state)
            .field("props", &self.props)
            .finish()
    }
}
