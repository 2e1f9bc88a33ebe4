//! Build collapsed stack format from a merged stack tree snapshot.
//!
//! Collapsed stacks are the interchange format of flamegraph tooling.
//! Format: "outer;inner;leaf weight"
//!
//! Example: "Thread.run;Service.handle;DbClient.execute 42"
//! This means: 42 samples ended in DbClient.execute called along that path.

use super::node::MergedStackTreeNode;
use log::debug;
use std::collections::HashMap;

/// A single collapsed stack entry
///
/// **Public** - used by the folded writer and metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string
    pub stack: String,

    /// Weight (samples that ended on this stack)
    pub weight: u64,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    ///
    /// **Public** - constructor
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Format as the standard collapsed stack line
    ///
    /// Format: "stack weight"
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }

    /// Innermost frame label of the stack
    pub fn leaf(&self) -> &str {
        self.stack.rsplit(';').next().unwrap_or(&self.stack)
    }
}

/// Build collapsed stacks from a tree snapshot
///
/// **Public** - main entry point for stack building
///
/// # Arguments
/// * `root` - Snapshot from `MergedStackTree::root_node`
///
/// # Returns
/// One collapsed stack per distinct leaf path, sorted by weight (descending)
///
/// # Algorithm
/// 1. Walk every leaf of the tree with its path from the outermost frame
/// 2. Join the `Class.method` labels of the path
/// 3. Weight the path by the leaf's sample count
/// 4. Aggregate identical labels (leaves split by thread state or line fold here)
pub fn build_collapsed_stacks(root: &MergedStackTreeNode) -> Vec<CollapsedStack> {
    // stack_string -> total_weight, insertion order kept for stable output
    let mut stack_map: HashMap<String, u64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    root.visit_leaf_paths(|path, leaf| {
        let stack = path.iter().map(|f| f.label()).collect::<Vec<_>>().join(";");
        let weight = stack_map.entry(stack.clone()).or_insert_with(|| {
            order.push(stack);
            0
        });
        *weight += leaf.sample_count;
    });

    let mut stacks: Vec<CollapsedStack> = order
        .into_iter()
        .map(|stack| {
            let weight = stack_map.get(&stack).copied().unwrap_or(0);
            CollapsedStack::new(stack, weight)
        })
        .collect();

    stacks.sort_by(|a, b| b.weight.cmp(&a.weight));

    debug!("Built {} unique collapsed stacks", stacks.len());

    stacks
}
