//! Recording renderer - keeps every patch call for later inspection.

use std::cell::RefCell;
use std::fmt;

use tracing::trace;

use super::Renderer;
use crate::error::RuntimeError;

/// One recorded `patch` call.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchCall<N> {
    pub old: Option<N>,
    pub new: N,
    pub container: String,
    pub anchor: Option<String>,
}

impl<N> PatchCall<N> {
    /// Whether this call created output rather than reconciling it.
    pub fn is_mount(&self) -> bool {
        self.old.is_none()
    }
}

/// Renderer that records calls instead of producing output.
///
/// Containers and anchors are plain strings. A failure can be armed with
/// [`fail_next`](RecordingRenderer::fail_next) to exercise error paths.
pub struct RecordingRenderer<N> {
    calls: RefCell<Vec<PatchCall<N>>>,
    next_failure: RefCell<Option<String>>,
}

impl<N: Clone + 'static> RecordingRenderer<N> {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_failure: RefCell::new(None),
        }
    }

    /// All successful calls, oldest first.
    pub fn calls(&self) -> Vec<PatchCall<N>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn last_call(&self) -> Option<PatchCall<N>> {
        self.calls.borrow().last().cloned()
    }

    /// Make the next `patch` fail with `reason` without recording it.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.next_failure.borrow_mut() = Some(reason.into());
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl<N: Clone + 'static> Default for RecordingRenderer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone + 'static> Renderer for RecordingRenderer<N> {
    type Node = N;
    type Container = String;
    type Anchor = String;

    fn patch(
        &self,
        old: Option<&N>,
        new: &N,
        container: &String,
        anchor: Option<&String>,
    ) -> Result<(), RuntimeError> {
        if let Some(reason) = self.next_failure.borrow_mut().take() {
            return Err(RuntimeError::Patch(reason));
        }

        trace!(container = %container, mount = old.is_none(), "recorded patch");
        self.calls.borrow_mut().push(PatchCall {
            old: old.cloned(),
            new: new.clone(),
            container: container.clone(),
            anchor: anchor.cloned(),
        });
        Ok(())
    }
}

impl<N> fmt::Debug for RecordingRenderer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingRenderer")
            .field("calls", &self.calls.borrow().len())
            .finish()
    }
}
