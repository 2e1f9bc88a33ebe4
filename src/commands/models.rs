use crate::utils::config::DEFAULT_TOP_PATHS;
use std::path::PathBuf;

/// Arguments for the merge command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct MergeArgs {
    /// Recorded samples (JSON)
    pub input: PathBuf,

    /// Output path for JSON profile
    pub output_json: PathBuf,

    /// Output path for folded stacks (optional)
    pub output_folded: Option<PathBuf>,

    /// Number of top hot paths to include in profile
    pub top_paths: usize,

    /// Threads feeding the tree concurrently
    pub workers: usize,

    /// Keep only the innermost frames of deeper stacks
    pub max_stack_depth: Option<usize>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for MergeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("samples.json"),
            output_json: PathBuf::from("profile.json"),
            output_folded: None,
            top_paths: DEFAULT_TOP_PATHS,
            workers: 1,
            max_stack_depth: None,
            print_summary: false,
        }
    }
}

/// What a merge produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub total_samples: u64,
    pub node_count: usize,
    pub unique_stacks: usize,
    pub output_json: PathBuf,
    pub output_folded: Option<PathBuf>,
}
