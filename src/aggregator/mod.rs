//! Aggregation of stack samples into a merged stack tree and its metrics.
//!
//! This module provides:
//! - The merged stack tree shared by samplers (merge + snapshot)
//! - Collapsed stack format (for flamegraph tooling)
//! - Hot path analysis, sample distribution and per-timer totals

pub mod merged_tree;
pub mod metrics;
pub mod node;
pub mod stack_builder;

// Re-export main types and functions
pub use merged_tree::{MergedStackTree, TreeStats};
pub use metrics::{
    calculate_hot_paths, calculate_sample_distribution, calculate_timer_totals, SampleDistribution,
};
pub use node::MergedStackTreeNode;
pub use stack_builder::{build_collapsed_stacks, CollapsedStack};
