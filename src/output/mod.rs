//! Output writers for profile data.
//!
//! This module handles writing data to disk in various formats:
//! - JSON profiles (tree snapshot, hot paths, timer totals)
//! - Folded stacks for flamegraph tooling

pub mod folded;
pub mod json;

// Re-export main functions
pub use folded::{folded_to_string, parse_folded, read_folded, write_folded};
pub use json::{profile_to_string, read_profile, validate_path, write_profile};
