//! Command handlers.
//!
//! Each handler takes the composed [`CliContext`](crate::bootstrap::CliContext)
//! and the command's arguments; all wiring happens in bootstrap.

pub mod read;
pub mod select;
pub mod settings;
pub mod voices;
