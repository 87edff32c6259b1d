//! Line-diff terminal renderer.
//!
//! Output trees are [`Frame`]s: lists of text lines. The renderer keeps no
//! frame of its own; the mounter passes the previous frame to `patch`.
//!
//! # Algorithm
//!
//! 1. For each line of the new frame:
//!    - If the previous frame has the same text at that row: skip
//!    - Otherwise: move there, clear to end of line, print
//! 2. Clear rows the previous frame used but the new one does not
//! 3. Flush output (single write)

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tracing::trace;

use super::Renderer;
use crate::error::RuntimeError;

// =============================================================================
// Frame
// =============================================================================

/// Rendered output for the terminal: one string per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    /// Frame from a sequence of lines.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `text` on newlines.
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::new(text.as_ref().lines())
    }

    /// Lines top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of rows the frame occupies.
    pub fn height(&self) -> usize {
        self.lines.len()
    }
}

/// Top-left corner of the region a component draws into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    pub row: u16,
    pub col: u16,
}

impl Viewport {
    /// Viewport whose top-left cell is (`row`, `col`), zero based.
    pub fn at(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

// =============================================================================
// TerminalRenderer
// =============================================================================

/// Renders frames to any writer using crossterm commands.
///
/// The anchor is a row offset inside the viewport.
pub struct TerminalRenderer<W: Write> {
    output: RefCell<W>,
    lines_written: Cell<usize>,
}

impl<W: Write> TerminalRenderer<W> {
    /// Renderer writing to `output`.
    pub fn new(output: W) -> Self {
        Self {
            output: RefCell::new(output),
            lines_written: Cell::new(0),
        }
    }

    /// Total rows printed since creation. Skipped (unchanged) rows do not count.
    pub fn lines_written(&self) -> usize {
        self.lines_written.get()
    }

    /// Inspect the writer.
    pub fn with_output<T>(&self, f: impl FnOnce(&W) -> T) -> T {
        f(&self.output.borrow())
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.output.into_inner()
    }
}

impl TerminalRenderer<io::Stdout> {
    /// Renderer writing to the process stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + 'static> Renderer for TerminalRenderer<W> {
    type Node = Frame;
    type Container = Viewport;
    type Anchor = u16;

    fn patch(
        &self,
        old: Option<&Frame>,
        new: &Frame,
        container: &Viewport,
        anchor: Option<&u16>,
    ) -> Result<(), RuntimeError> {
        let top = container.row.saturating_add(anchor.copied().unwrap_or(0));
        let mut output = self.output.borrow_mut();
        let mut written = 0;

        for (offset, line) in new.lines.iter().enumerate() {
            let unchanged = old
                .and_then(|previous| previous.lines.get(offset))
                .is_some_and(|previous| previous == line);
            if unchanged {
                continue;
            }

            let row = row_at(top, offset)?;
            queue!(
                output,
                MoveTo(container.col, row),
                Clear(ClearType::UntilNewLine),
                Print(line)
            )?;
            written += 1;
        }

        // Rows the new frame no longer covers
        if let Some(previous) = old {
            for offset in new.height()..previous.height() {
                let row = row_at(top, offset)?;
                queue!(output, MoveTo(container.col, row), Clear(ClearType::UntilNewLine))?;
            }
        }

        output.flush()?;
        self.lines_written.set(self.lines_written.get() + written);

        trace!(top, written, mount = old.is_none(), "terminal patch");
        Ok(())
    }
}

impl<W: Write> fmt::Debug for TerminalRenderer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalRenderer")
            .field("lines_written", &self.lines_written.get())
            .finish()
    }
}

/// Absolute row of line `offset`, or an error past the last terminal row.
fn row_at(top: u16, offset: usize) -> Result<u16, RuntimeError> {
    u16::try_from(offset)
        .ok()
        .and_then(|offset| top.checked_add(offset))
        .ok_or_else(|| RuntimeError::Patch(format!("line {offset} falls outside the terminal")))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(renderer: &TerminalRenderer<Vec<u8>>) -> String {
        renderer.with_output(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    #[test]
    fn test_frame_from_text() {
        let frame = Frame::text("count: 0\nlabel: clicks");
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.lines()[1], "label: clicks");
    }

    #[test]
    fn test_first_patch_writes_every_line() {
        let renderer = TerminalRenderer::new(Vec::new());
        let frame = Frame::new(["title", "count: 0"]);

        renderer.patch(None, &frame, &Viewport::default(), None).unwrap();

        let out = printed(&renderer);
        assert!(out.contains("title"));
        assert!(out.contains("count: 0"));
        assert_eq!(renderer.lines_written(), 2);
    }

    #[test]
    fn test_update_rewrites_changed_lines_only() {
        let renderer = TerminalRenderer::new(Vec::new());
        let viewport = Viewport::at(2, 4);
        let before = Frame::new(["title", "count: 0"]);
        let after = Frame::new(["title", "count: 1"]);

        renderer.patch(None, &before, &viewport, None).unwrap();
        renderer.patch(Some(&before), &after, &viewport, None).unwrap();

        let out = printed(&renderer);
        assert_eq!(out.matches("title").count(), 1);
        assert!(out.contains("count: 1"));
        assert_eq!(renderer.lines_written(), 3);
    }

    #[test]
    fn test_shrinking_frame_clears_leftover_rows() {
        let renderer = TerminalRenderer::new(Vec::new());
        let viewport = Viewport::default();
        let before = Frame::new(["a", "b", "c"]);
        let after = Frame::new(["a"]);

        renderer.patch(None, &before, &viewport, None).unwrap();
        let before_len = renderer.with_output(Vec::len);
        renderer.patch(Some(&before), &after, &viewport, None).unwrap();

        // Two clear sequences were emitted, no text
        let tail = renderer.with_output(|bytes| {
            String::from_utf8_lossy(&bytes[before_len..]).into_owned()
        });
        assert!(!tail.contains('b'));
        assert!(!tail.is_empty());
        assert_eq!(renderer.lines_written(), 3);
    }

    #[test]
    fn test_anchor_offsets_rows() {
        let renderer = TerminalRenderer::new(Vec::new());
        let frame = Frame::new(["x"]);

        renderer.patch(None, &frame, &Viewport::at(1, 0), Some(&3)).unwrap();

        // Row 1 + anchor 3 = row 4, printed 1-based by the escape sequence
        assert!(printed(&renderer).contains("\u{1b}[5;1H"));
    }

    #[test]
    fn test_row_overflow_is_an_error() {
        assert!(row_at(u16::MAX, 1).is_err());
        assert_eq!(row_at(10, 2).unwrap(), 12);
    }
}
