//! Reassembly of raw output chunks into lines.

/// End-of-line sequence emitted by build tools on this platform.
#[cfg(windows)]
pub const EOL: &[u8] = b"\r\n";
/// End-of-line sequence emitted by build tools on this platform.
#[cfg(not(windows))]
pub const EOL: &[u8] = b"\n";

/// Splits a byte stream into complete lines.
///
/// Only the platform [`EOL`] sequence separates lines; a stray `\r` on Unix
/// stays part of the line text. The trailing partial line is carried over to
/// the next chunk and is never flushed implicitly: call
/// [`LineBuffer::take_remainder`] once the stream has ended.
#[derive(Debug)]
pub struct LineBuffer {
    carry: Vec<u8>,
    eol: &'static [u8],
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create a buffer splitting on the platform end-of-line sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_eol(EOL)
    }

    /// Create a buffer splitting on a custom end-of-line sequence.
    ///
    /// An empty sequence falls back to the platform default.
    #[must_use]
    pub fn with_eol(eol: &'static [u8]) -> Self {
        let eol = if eol.is_empty() { EOL } else { eol };
        Self {
            carry: Vec::new(),
            eol,
        }
    }

    /// Feed a chunk and return every line it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // A separator may straddle the previous chunk boundary.
        let rescan = self.carry.len().saturating_sub(self.eol.len() - 1);
        self.carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut cursor = rescan;
        while let Some(offset) = find(&self.carry[cursor..], self.eol) {
            let end = cursor + offset;
            lines.push(String::from_utf8_lossy(&self.carry[start..end]).into_owned());
            start = end + self.eol.len();
            cursor = start;
        }
        self.carry.drain(..start);
        lines
    }

    /// Whether a partial line is waiting for its terminator.
    #[must_use]
    pub fn has_remainder(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Take the trailing partial line, leaving the buffer empty.
    pub fn take_remainder(&mut self) -> String {
        let rest = std::mem::take(&mut self.carry);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
