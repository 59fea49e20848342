// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Indentation-tracking text sink shared by the language providers.
//!
//! Indent guards hold an `Rc<Cell<usize>>` rather than a borrow, so a guard
//! can stay alive while the writer keeps being used mutably.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub(crate) struct SourceWriter<W> {
    out: W,
    depth: Rc<Cell<usize>>,
    unit: &'static str,
    at_line_start: bool,
}

impl<W: fmt::Write> SourceWriter<W> {
    pub(crate) fn new(out: W, unit: &'static str) -> Self {
        Self {
            out,
            depth: Rc::new(Cell::new(0)),
            unit,
            at_line_start: true,
        }
    }

    /// Writes `text`, indenting first when at the start of a non-blank line.
    pub(crate) fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }
        if self.at_line_start {
            for _ in 0..self.depth.get() {
                self.out.write_str(self.unit)?;
            }
            self.at_line_start = false;
        }
        self.out.write_str(text)
    }

    pub(crate) fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.newline()
    }

    /// Ends the current line. Never emits trailing indentation.
    pub(crate) fn newline(&mut self) -> fmt::Result {
        self.out.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    pub(crate) fn indent(&self) -> IndentGuard {
        self.depth.set(self.depth.get() + 1);
        IndentGuard {
            depth: Rc::clone(&self.depth),
        }
    }

    /// Runs `body` one level deeper.
    pub(crate) fn indented<F>(&mut self, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        let _guard = self.indent();
        body(self)
    }

    /// Writes `items` joined by `separator` on the current line.
    pub(crate) fn write_separated<I, F>(&mut self, items: I, separator: &str, mut item: F) -> fmt::Result
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> fmt::Result,
    {
        for (idx, value) in items.into_iter().enumerate() {
            if idx > 0 {
                self.write(separator)?;
            }
            item(self, value)?;
        }
        Ok(())
    }

    pub(crate) fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        match args.as_str() {
            Some(text) => self.write(text),
            None => self.write(&args.to_string()),
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

pub(crate) struct IndentGuard {
    depth: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// `writeln!` for a [`SourceWriter`].
macro_rules! src_writeln {
    ($w:expr, $($arg:tt)*) => {{
        $w.write_fmt(format_args!($($arg)*)).and_then(|()| $w.newline())
    }};
}
pub(crate) use src_writeln;
