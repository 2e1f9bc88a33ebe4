//! Calculate metrics and hot paths from merged stack trees.
//!
//! Hot paths are the call paths where the most samples ended.
//! These are the primary targets for optimization.

use super::node::MergedStackTreeNode;
use super::stack_builder::CollapsedStack;
use crate::parser::schema::HotPath;
use log::debug;
use std::collections::BTreeMap;

/// Calculate hot paths from collapsed stacks
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `stacks` - Collapsed stacks from stack_builder
/// * `total_samples` - Samples merged into the tree
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths, sorted by sample count (descending)
pub fn calculate_hot_paths(
    stacks: &[CollapsedStack],
    total_samples: u64,
    top_n: usize,
) -> Vec<HotPath> {
    debug!("Calculating top {} hot paths from {} stacks", top_n, stacks.len());

    // Stacks are already sorted by weight from stack_builder
    stacks
        .iter()
        .take(top_n)
        .map(|stack| create_hot_path(stack, total_samples))
        .collect()
}

/// Create a HotPath from a CollapsedStack
///
/// **Public** - internal conversion, exposed for tests
pub fn create_hot_path(stack: &CollapsedStack, total_samples: u64) -> HotPath {
    HotPath {
        stack: stack.stack.clone(),
        samples: stack.weight,
        percentage: percentage_of(stack.weight, total_samples),
    }
}

fn percentage_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Calculate sample distribution statistics
///
/// **Public** - provides summary statistics
pub fn calculate_sample_distribution(stacks: &[CollapsedStack]) -> SampleDistribution {
    if stacks.is_empty() {
        return SampleDistribution::default();
    }

    let total: u64 = stacks.iter().map(|s| s.weight).sum();
    let count = stacks.len();
    let mean = total / count as u64;

    let mut weights: Vec<u64> = stacks.iter().map(|s| s.weight).collect();
    weights.sort_unstable();
    let median = weights[weights.len() / 2];

    // Top 10% of stacks (input is sorted heaviest first)
    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent_samples: u64 = stacks
        .iter()
        .take(top_10_percent_count)
        .map(|s| s.weight)
        .sum();

    SampleDistribution {
        total_samples: total,
        stack_count: count,
        mean_samples_per_stack: mean,
        median_samples_per_stack: median,
        top_10_percent_samples,
        top_10_percent_percentage: percentage_of(top_10_percent_samples, total),
    }
}

/// Sample distribution statistics
///
/// **Public** - returned from calculate_sample_distribution
#[derive(Debug, Clone, Default)]
pub struct SampleDistribution {
    /// Total samples across all stacks
    pub total_samples: u64,

    /// Number of unique stacks
    pub stack_count: usize,

    pub mean_samples_per_stack: u64,

    pub median_samples_per_stack: u64,

    /// Samples ending in the top 10% of stacks
    pub top_10_percent_samples: u64,

    /// Percentage of total samples in top 10%
    pub top_10_percent_percentage: f64,
}

impl SampleDistribution {
    /// Returns true if top 10% of stacks hold >80% of samples
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} samples | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_samples,
            self.stack_count,
            self.mean_samples_per_stack,
            self.median_samples_per_stack,
            self.top_10_percent_percentage
        )
    }
}

/// Samples spent under each timer
///
/// A sample counts once per timer even when nested nodes on its path carry
/// the same timer name; it is counted at the outermost tagged node.
pub fn calculate_timer_totals(root: &MergedStackTreeNode) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    let mut active: Vec<&str> = Vec::new();
    accumulate_timers(root, &mut active, &mut totals);
    totals
}

fn accumulate_timers<'a>(
    node: &'a MergedStackTreeNode,
    active: &mut Vec<&'a str>,
    totals: &mut BTreeMap<String, u64>,
) {
    let before = active.len();
    for name in &node.timer_names {
        if !active.contains(&name.as_str()) {
            *totals.entry(name.clone()).or_insert(0) += node.sample_count;
            active.push(name);
        }
    }
    for child in &node.children {
        accumulate_timers(child, active, totals);
    }
    active.truncate(before);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::frame::{StackFrame, ThreadState};

    #[test]
    fn test_calculate_hot_paths() {
        let stacks = vec![
            CollapsedStack::new("main;execute".to_string(), 50),
            CollapsedStack::new("main;storage".to_string(), 30),
            CollapsedStack::new("main;compute".to_string(), 20),
        ];

        let hot_paths = calculate_hot_paths(&stacks, 100, 2);

        assert_eq!(hot_paths.len(), 2);
        assert_eq!(hot_paths[0].stack, "main;execute");
        assert_eq!(hot_paths[0].samples, 50);
        assert_eq!(hot_paths[0].percentage, 50.0);
    }

    #[test]
    fn test_calculate_sample_distribution() {
        let stacks = vec![
            CollapsedStack::new("stack1".to_string(), 8000),
            CollapsedStack::new("stack2".to_string(), 1000),
            CollapsedStack::new("stack3".to_string(), 500),
            CollapsedStack::new("stack4".to_string(), 500),
        ];

        let dist = calculate_sample_distribution(&stacks);

        assert_eq!(dist.total_samples, 10000);
        assert_eq!(dist.stack_count, 4);
        assert_eq!(dist.mean_samples_per_stack, 2500);
        assert!(!dist.is_highly_concentrated()); // Top stack has exactly 80%
    }

    #[test]
    fn test_sample_distribution_empty() {
        let dist = calculate_sample_distribution(&[]);
        assert_eq!(dist.total_samples, 0);
        assert_eq!(dist.stack_count, 0);
    }

    #[test]
    fn test_create_hot_path_zero_total() {
        let stack = CollapsedStack::new("test;path".to_string(), 25);
        let hot_path = create_hot_path(&stack, 0);
        assert_eq!(hot_path.percentage, 0.0);
    }

    #[test]
    fn test_timer_totals_count_nested_timer_once() {
        let tagged = |method: &str,
                      count: u64,
                      timers: &[&str],
                      children: Vec<MergedStackTreeNode>| MergedStackTreeNode {
            frame: Some(StackFrame::new("Db", method, None, 1)),
            sample_count: count,
            timer_names: timers.iter().map(|t| t.to_string()).collect(),
            leaf_thread_state: children.is_empty().then_some(ThreadState::Runnable),
            children,
        };

        let root = MergedStackTreeNode::synthetic_root(vec![tagged(
            "outer",
            4,
            &["db query"],
            vec![tagged("inner", 3, &["db query", "db open"], vec![])],
        )]);

        let totals = calculate_timer_totals(&root);
        assert_eq!(totals.get("db query"), Some(&4));
        assert_eq!(totals.get("db open"), Some(&3));
    }
}
