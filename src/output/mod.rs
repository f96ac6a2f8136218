//! Build output reassembly and parsing.
//!
//! Raw pipe bytes flow through [`LineBuffer`] and [`BlockBuffer`] into
//! message blocks, stdout and stderr are fanned in by [`StreamMerger`], and
//! each block is parsed by [`parse_message`] and [`parse_progress`].

mod blocks;
mod lines;
mod merge;
mod message;
mod stream;

pub use blocks::*;
pub use lines::*;
pub use merge::*;
pub use message::*;
pub use stream::*;
