//! Shared utilities for antoine
//!
//! Small, dependency-light helpers used across the antoine workspace:
//! XDG directory resolution and crash-safe file writes.

pub mod atomic_file;
pub mod xdg;

pub use atomic_file::*;
pub use xdg::*;
