//! Renderers - the patch side of mounting.
//!
//! The mounter never touches output directly. It hands each rendered tree to
//! a [`Renderer`]:
//!
//! ```text
//! first render:  patch(None,      new, container, anchor)   create
//! later renders: patch(Some(old), new, container, anchor)   reconcile
//! ```
//!
//! - [`TerminalRenderer`] - writes line frames to a terminal, diffing line by line
//! - [`RecordingRenderer`] - records every call, for tests and tooling

mod recording;
mod terminal;

pub use recording::{PatchCall, RecordingRenderer};
pub use terminal::{Frame, TerminalRenderer, Viewport};

use crate::error::RuntimeError;

/// Materializes or reconciles output trees.
///
/// `Container` and `Anchor` are opaque to the mounter and passed through
/// untouched.
pub trait Renderer: 'static {
    /// Output tree produced by render functions.
    type Node: 'static;
    /// Where trees are materialized.
    type Container: 'static;
    /// Position inside the container.
    type Anchor: 'static;

    /// Bring the output from `old` (or nothing) to `new`.
    fn patch(
        &self,
        old: Option<&Self::Node>,
        new: &Self::Node,
        container: &Self::Container,
        anchor: Option<&Self::Anchor>,
    ) -> Result<(), RuntimeError>;
}
