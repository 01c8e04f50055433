//! Rendering of chat messages into a fixed-height terminal region.
//!
//! ## Design
//! - `RenderSink` is the only thing the session knows about the display.
//! - `DisplayBuffer` holds entries in arrival order and is bounded by rows,
//!   not by count: an entry wraps at the viewport width and may take several
//!   rows.
//! - After every push the oldest entries are dropped until the rest fit. A
//!   lone entry taller than the viewport is kept.
//! - Chat text is untrusted. Control characters (escape sequences, CTCP
//!   `\x01` markers) are stripped when an entry is built, so what is measured
//!   is exactly what is drawn.

use std::collections::VecDeque;
use std::io::Write;

use colored::*;
use tracing::warn;

use crate::theme::Theme;

/// Consumer of parsed chat messages.
///
/// Implementations must accept any input, including an empty body, and must
/// not fail: the session calls this once per chat line and never waits on it.
pub trait RenderSink {
    fn render(&mut self, username: &str, body: &str);
}

/// One rendered chat message, with control characters removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub username: String,
    pub body: String,
}

impl Entry {
    pub fn new(username: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            username: strip_control(username.into()),
            body: strip_control(body.into()),
        }
    }

    /// Rows this entry occupies when drawn as `username: body` and wrapped at
    /// `cols` columns. Always at least one.
    pub fn height(&self, cols: usize) -> usize {
        let cols = cols.max(1);
        let width = self.username.chars().count() + 2 + self.body.chars().count();
        width.div_ceil(cols).max(1)
    }
}

fn strip_control(text: String) -> String {
    if text.chars().any(char::is_control) {
        text.chars().filter(|c| !c.is_control()).collect()
    } else {
        text
    }
}

/// Ordered, height-bounded list of rendered entries.
#[derive(Debug, Clone)]
pub struct DisplayBuffer {
    rows: usize,
    cols: usize,
    entries: VecDeque<Entry>,
    height: usize,
}

impl DisplayBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols: cols.max(1),
            entries: VecDeque::new(),
            height: 0,
        }
    }

    /// Append an entry and evict from the front until the content fits.
    /// Returns the evicted entries, oldest first.
    pub fn push(&mut self, entry: Entry) -> Vec<Entry> {
        self.height += entry.height(self.cols);
        self.entries.push_back(entry);

        let mut evicted = Vec::new();
        while self.height > self.rows && self.entries.len() > 1 {
            if let Some(oldest) = self.entries.pop_front() {
                self.height -= oldest.height(self.cols);
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total rows currently occupied.
    pub fn total_height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// Draws the display buffer to a terminal, redrawing the whole region after
/// each message.
pub struct TerminalSink<W: Write> {
    out: W,
    buffer: DisplayBuffer,
    theme: Theme,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, buffer: DisplayBuffer, theme: Theme) -> Self {
        Self { out, buffer, theme }
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self) -> std::io::Result<()> {
        // Clear screen and home the cursor.
        write!(self.out, "\x1b[2J\x1b[H")?;
        for (i, entry) in self.buffer.entries().enumerate() {
            // No newline after the last entry, or a full region scrolls.
            if i > 0 {
                writeln!(self.out)?;
            }
            write!(
                self.out,
                "{}: {}",
                entry.username.color(self.theme.username_color()).bold(),
                entry.body.color(self.theme.body_color()),
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn render(&mut self, username: &str, body: &str) {
        self.buffer.push(Entry::new(username, body));
        if let Err(e) = self.redraw() {
            warn!(error = %e, "failed to draw chat display");
        }
    }
}
