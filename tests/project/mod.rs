//! Project and target resolution tests.

mod target_test;
