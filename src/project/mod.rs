//! Project manifest access and build target resolution.

mod manifest;
mod target;

pub use manifest::*;
pub use target::*;
