//! haskell-build - Run Haskell build tools and turn their output into diagnostics.

pub mod builders;
pub mod config;
pub mod display;
pub mod output;
pub mod process;
pub mod project;
