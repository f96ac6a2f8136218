//! Grouping of output lines into compiler messages.

use super::message::is_excerpt_line;

/// Whether `line` opens a new message.
///
/// A message starts at a line whose first character is not whitespace,
/// unless the line is part of a source excerpt (`12 | foo`, `  |`).
#[must_use]
pub fn starts_block(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace()) && !is_excerpt_line(line)
}

/// Accumulates lines until the next message boundary.
///
/// Joining every emitted block with `\n`, including the block returned by
/// [`BlockBuffer::finish`], reproduces the pushed lines exactly.
#[derive(Debug, Default)]
pub struct BlockBuffer {
    current: String,
    lines: usize,
}

impl BlockBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one line, returning the block it completes, if any.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let completed = if self.lines > 0 && starts_block(line) {
            self.lines = 0;
            Some(std::mem::take(&mut self.current))
        } else {
            None
        };

        if self.lines > 0 {
            self.current.push('\n');
        }
        self.current.push_str(line);
        self.lines += 1;
        completed
    }

    /// Push a batch of lines, returning every completed block in order.
    pub fn push_lines<I>(&mut self, lines: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.push_line(line.as_ref()))
            .collect()
    }

    /// Flush at end of stream.
    ///
    /// `remainder` is the unterminated tail of the stream (see
    /// [`LineBuffer::take_remainder`](super::LineBuffer::take_remainder)); it is
    /// pushed as a final line when non-empty. The pending block is always
    /// returned last, even when empty.
    pub fn finish(&mut self, remainder: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        if !remainder.is_empty() {
            blocks.extend(self.push_line(remainder));
        }
        self.lines = 0;
        blocks.push(std::mem::take(&mut self.current));
        blocks
    }

    /// Whether any line is waiting in the pending block.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}
