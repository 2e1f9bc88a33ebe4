//! Stack Sampler
//!
//! Merged stack tree profiler for sampled thread stacks.
//!
//! A sampling driver captures the stacks of the threads of interest at a
//! fixed interval. Each capture is stripped of the synthetic marker frames
//! the instrumentation layer injects (their timer names are kept as tags)
//! and merged into a prefix tree counting how many samples went through
//! every call path. Readers take snapshots of that tree at any time.
//!
//! ```no_run
//! use stack_sampler::aggregator::MergedStackTree;
//! use stack_sampler::parser::{StackFrame, StackOrder, StackSample, ThreadState};
//!
//! let tree = MergedStackTree::new();
//! let sample = StackSample::new(
//!     vec![StackFrame::new("Main", "main", Some("Main.java".into()), 3)],
//!     StackOrder::LeafFirst,
//!     ThreadState::Runnable,
//! );
//! tree.add_stack_trace(&sample)?;
//! let root = tree.root_node()?;
//! assert_eq!(root.sample_count, 1);
//! # Ok::<(), stack_sampler::utils::TreeError>(())
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod sampler;
pub mod utils;
