//! Block streams over a child process output pipe.

use std::collections::VecDeque;
use std::io;

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{BlockBuffer, LineBuffer};

/// Size of a single read from an output pipe.
pub const READ_CHUNK_SIZE: usize = 8192;

/// Which pipe a block was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Stdout,
    Stderr,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// One reassembled message block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBlock {
    pub origin: Origin,
    pub text: String,
}

/// Pull-based reader turning a byte pipe into message blocks.
///
/// At end of input, and after a read error, the pending block and any
/// unterminated line are flushed before the stream ends. A read error is
/// reported after that flush.
#[derive(Debug)]
pub struct BlockReader<R> {
    reader: R,
    chunk: Vec<u8>,
    lines: LineBuffer,
    blocks: BlockBuffer,
    ready: VecDeque<String>,
    failure: Option<io::Error>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> BlockReader<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_line_buffer(reader, LineBuffer::new())
    }

    /// Use a custom line splitter, e.g. one with a non-platform separator.
    #[must_use]
    pub fn with_line_buffer(reader: R, lines: LineBuffer) -> Self {
        Self {
            reader,
            chunk: vec![0; READ_CHUNK_SIZE],
            lines,
            blocks: BlockBuffer::new(),
            ready: VecDeque::new(),
            failure: None,
            finished: false,
        }
    }

    /// Read until the next block is complete.
    ///
    /// Returns `None` once the flushed final block has been handed out.
    pub async fn next_block(&mut self) -> Option<io::Result<String>> {
        loop {
            if let Some(block) = self.ready.pop_front() {
                return Some(Ok(block));
            }
            if let Some(err) = self.failure.take() {
                return Some(Err(err));
            }
            if self.finished {
                return None;
            }

            match self.reader.read(&mut self.chunk).await {
                Ok(0) => self.finish(),
                Ok(n) => {
                    let lines = self.lines.push(&self.chunk[..n]);
                    self.ready.extend(self.blocks.push_lines(lines));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.failure = Some(e);
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        let tail = self.lines.take_remainder();
        self.ready.extend(self.blocks.finish(&tail));
    }
}

/// Stream the message blocks read from `reader`, tagged with `origin`.
pub fn block_stream<R>(reader: R, origin: Origin) -> impl Stream<Item = io::Result<OutputBlock>>
where
    R: AsyncRead + Unpin,
{
    blocks_from(BlockReader::new(reader), origin)
}

/// Stream the blocks of an already configured [`BlockReader`].
pub fn blocks_from<R>(
    reader: BlockReader<R>,
    origin: Origin,
) -> impl Stream<Item = io::Result<OutputBlock>>
where
    R: AsyncRead + Unpin,
{
    futures_util::stream::unfold(reader, move |mut reader| async move {
        let item = reader.next_block().await?;
        Some((item.map(|text| OutputBlock { origin, text }), reader))
    })
}
