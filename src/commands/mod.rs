//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod merge;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use merge::{execute_merge, merge_samples, validate_args};
pub use models::{MergeArgs, MergeReport};
pub use utils::{display_schema, display_version, validate_profile_file};
