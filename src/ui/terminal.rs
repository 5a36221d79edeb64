//! Terminal view.
//!
//! Bubbles are printed as labelled blocks. When the output is a terminal the
//! view rewrites the newest bubble in place and puts the status line in the
//! window title; otherwise it degrades to plain appended lines.
//!
//! In-place rewriting assumes nothing else reaches the terminal between a
//! placeholder and its replacement. Callers whose logs share the terminal at
//! debug level should turn it off with [`TerminalView::with_in_place`].

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::cursor::MoveToPreviousLine;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType, SetTitle};
use tracing::debug;

use super::{BubbleHandle, BubbleKind, ChatView};

const USER_LABEL: &str = "you";
const ASSISTANT_LABEL: &str = "advisor";
const PROMPT: &str = "› ";

/// Bookkeeping for one printed bubble.
#[derive(Debug, Clone, Copy)]
struct Printed {
    kind: BubbleKind,
    rows: u16,
}

/// Writes the conversation to a terminal (or any writer).
#[derive(Debug)]
pub struct TerminalView<W: Write> {
    out: W,
    ansi: bool,
    in_place: bool,
    width: u16,
    bubbles: Vec<Printed>,
    /// Something other than the newest bubble was printed after it.
    tail_dirty: bool,
}

impl TerminalView<Stdout> {
    /// View over stdout, using ANSI control only when stdout is a terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let out = io::stdout();
        let ansi = out.is_terminal();
        let width = crossterm::terminal::size().map_or(80, |(cols, _)| cols);
        Self::new(out, ansi, width)
    }
}

impl<W: Write> TerminalView<W> {
    #[must_use]
    pub fn new(out: W, ansi: bool, width: u16) -> Self {
        Self {
            out,
            ansi,
            in_place: ansi,
            width: width.max(1),
            bubbles: Vec::new(),
            tail_dirty: false,
        }
    }

    /// Allow or forbid rewriting the newest bubble in place. Only honoured
    /// when ANSI control is available.
    #[must_use]
    pub fn with_in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place && self.ansi;
        self
    }

    /// Consume the view and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_bubble(&mut self, kind: BubbleKind, text: &str) -> io::Result<u16> {
        let label = match kind {
            BubbleKind::User => USER_LABEL,
            BubbleKind::Assistant => ASSISTANT_LABEL,
        };

        if self.ansi {
            let styled = match kind {
                BubbleKind::User => label.blue().bold(),
                BubbleKind::Assistant => label.cyan().bold(),
            };
            queue!(self.out, PrintStyledContent(styled), Print(": "))?;
        } else {
            queue!(self.out, Print(label), Print(": "))?;
        }
        queue!(self.out, Print(text), Print("\n"))?;

        Ok(rendered_rows(label.len() + 2, text, self.width))
    }

    fn try_append(&mut self, kind: BubbleKind, text: &str) -> io::Result<()> {
        let rows = self.print_bubble(kind, text)?;
        self.bubbles.push(Printed { kind, rows });
        self.tail_dirty = false;
        self.out.flush()
    }

    fn try_replace(&mut self, handle: BubbleHandle, text: &str) -> io::Result<()> {
        let Some(&printed) = self.bubbles.get(handle.index()) else {
            return Ok(());
        };
        let is_tail = handle.index() + 1 == self.bubbles.len();

        if self.in_place && is_tail && !self.tail_dirty {
            queue!(
                self.out,
                MoveToPreviousLine(printed.rows),
                Clear(ClearType::FromCursorDown)
            )?;
            let rows = self.print_bubble(printed.kind, text)?;
            self.bubbles[handle.index()].rows = rows;
        } else {
            // Older bubbles have scrolled past; show the update as a new line.
            self.print_bubble(printed.kind, text)?;
            self.tail_dirty = true;
        }
        self.out.flush()
    }

    fn try_prompt(&mut self) -> io::Result<()> {
        queue!(self.out, Print(PROMPT))?;
        self.tail_dirty = true;
        self.out.flush()
    }

    fn report(result: io::Result<()>) {
        if let Err(err) = result {
            debug!(name: "ui.terminal.write_failed", error = %err, "Terminal write failed");
        }
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn append_bubble(&mut self, kind: BubbleKind, text: &str) -> BubbleHandle {
        let result = self.try_append(kind, text);
        Self::report(result);
        BubbleHandle::new(self.bubbles.len().saturating_sub(1))
    }

    fn replace_bubble(&mut self, handle: BubbleHandle, text: &str) {
        let result = self.try_replace(handle, text);
        Self::report(result);
    }

    fn scroll_to_latest(&mut self) {
        // The terminal follows its own output.
        let result = self.out.flush();
        Self::report(result);
    }

    fn clear_input(&mut self) {
        // Lines are consumed from stdin as a whole; nothing is left to clear.
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if enabled {
            let result = self.try_prompt();
            Self::report(result);
        }
    }

    fn set_status(&mut self, text: &str) {
        if self.ansi {
            let result = queue!(self.out, SetTitle(text)).and_then(|()| self.out.flush());
            Self::report(result);
        }
    }
}

/// Number of terminal rows a bubble occupies once wrapped.
fn rendered_rows(label_width: usize, text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let mut rows = 0usize;
    for (i, line) in text.split('\n').enumerate() {
        let mut cols = line.chars().count();
        if i == 0 {
            cols += label_width;
        }
        rows += cols.div_ceil(width).max(1);
    }
    u16::try_from(rows).unwrap_or(u16::MAX)
}
