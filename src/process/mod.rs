//! Build tool process spawning, supervision and cancellation.

mod events;
mod runner;
mod spawn;
mod state;

pub use events::*;
pub use runner::*;
pub use spawn::*;
pub use state::*;
