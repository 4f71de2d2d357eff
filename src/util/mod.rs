//! Shared helpers

pub mod time;
pub mod vector;
