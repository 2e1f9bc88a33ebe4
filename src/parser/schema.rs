//! Output JSON schema definitions for profile data.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::node::MergedStackTreeNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level profile structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Schema version for compatibility checking
    pub version: String,

    /// Where the samples came from (input file, sampler name)
    pub source: String,

    /// Non-empty samples merged into the tree
    pub total_samples: u64,

    /// Real nodes in the tree (synthetic root excluded)
    pub node_count: usize,

    /// Deepest stack seen
    pub max_depth: usize,

    /// Snapshot of the merged tree under its synthetic root
    pub root: MergedStackTreeNode,

    /// Top hot paths (ranked by samples)
    pub hot_paths: Vec<HotPath>,

    /// Samples spent under each timer name
    #[serde(default)]
    pub timer_totals: BTreeMap<String, u64>,

    /// Timestamp when profile was generated
    pub generated_at: String,
}

/// A hot path (collapsed call path with the samples that ended there)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotPath {
    /// Collapsed stack representation (e.g., "Main.main;Service.run")
    pub stack: String,

    /// Samples that ended on this path
    pub samples: u64,

    /// Percentage of total samples
    pub percentage: f64,
}
