//! Utility functions
//!
//! Shared helpers used across the crate.

pub mod input;
pub mod logging;
