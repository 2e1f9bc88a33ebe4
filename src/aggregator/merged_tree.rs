//! Merged stack tree built from sampled stack traces.
//!
//! Samples are merged into a prefix tree over root-to-leaf call paths. Path
//! equality also depends on the role of a node: a node that ended a sample
//! (a leaf, carrying the thread state seen there) is never reused as an
//! interior node and vice versa, and leaves are split per thread state.
//!
//! Nodes live in an arena and reference their children by index. One tree
//! is shared by every sampling driver of a capture session; merges are
//! serialized behind the tree's write lock, snapshots share the read lock.

use super::node::MergedStackTreeNode;
use crate::parser::frame::{AnnotatedFrame, StackFrame, StackSample, ThreadState};
use crate::parser::marker::{strip_synthetic_frames, MarkerPattern};
use crate::utils::error::TreeError;
use log::debug;
use std::collections::TryReserveError;
use std::fmt;
use std::sync::RwLock;

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug)]
struct NodeRecord {
    frame: StackFrame,
    sample_count: u64,
    timer_names: Vec<String>,
    leaf_thread_state: Option<ThreadState>,
    children: Vec<NodeId>,
}

impl NodeRecord {
    fn new(annotated: &AnnotatedFrame) -> Self {
        let mut record = Self {
            frame: annotated.frame.clone(),
            sample_count: 1,
            timer_names: Vec::with_capacity(annotated.timer_names.len()),
            leaf_thread_state: None,
            children: Vec::new(),
        };
        record.add_absent_timer_names(&annotated.timer_names);
        record
    }

    fn add_absent_timer_names(&mut self, names: &[String]) {
        for name in names {
            if !self.timer_names.contains(name) {
                self.timer_names.push(name.clone());
            }
        }
    }

    /// Leaf positions only match leaves with the same thread state, other
    /// positions only match nodes that never ended a sample
    fn matches(&self, frame: &StackFrame, leaf: bool, thread_state: ThreadState) -> bool {
        match (self.leaf_thread_state, leaf) {
            (Some(state), true) => state == thread_state && self.frame == *frame,
            (None, false) => self.frame == *frame,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<NodeRecord>,
    roots: Vec<NodeId>,
    samples: u64,
}

impl Arena {
    fn node(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeRecord {
        &mut self.nodes[id.0]
    }

    fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => &self.node(id).children,
            None => &self.roots,
        }
    }

    /// Merge one root-first, non-empty sample
    ///
    /// The matched prefix is resolved and node, child-link and timer-name
    /// capacity reserved before any count or link changes, so a failed
    /// reservation leaves the tree's contents as they were.
    fn merge(
        &mut self,
        frames: &[AnnotatedFrame],
        thread_state: ThreadState,
    ) -> Result<(), TreeError> {
        let leaf_index = frames.len() - 1;

        let mut matched: Vec<NodeId> = Vec::new();
        for (index, annotated) in frames.iter().enumerate() {
            let leaf = index == leaf_index;
            let found = self
                .children_of(matched.last().copied())
                .iter()
                .copied()
                .find(|&id| self.node(id).matches(&annotated.frame, leaf, thread_state));
            match found {
                Some(id) => matched.push(id),
                None => break,
            }
        }

        let remaining = &frames[matched.len()..];
        if !remaining.is_empty() {
            let allocation_failed = |_: TryReserveError| TreeError::AllocationFailed {
                requested: remaining.len(),
            };
            self.nodes.try_reserve(remaining.len()).map_err(allocation_failed)?;
            let link = match matched.last().copied() {
                Some(parent) => self.node_mut(parent).children.try_reserve(1),
                None => self.roots.try_reserve(1),
            };
            link.map_err(allocation_failed)?;
        }

        for (&id, annotated) in matched.iter().zip(frames) {
            let node = self.node_mut(id);
            let absent = annotated
                .timer_names
                .iter()
                .filter(|name| !node.timer_names.contains(*name))
                .count();
            node.timer_names
                .try_reserve(absent)
                .map_err(|_: TryReserveError| TreeError::AllocationFailed { requested: absent })?;
        }

        for (&id, annotated) in matched.iter().zip(frames) {
            let node = self.node_mut(id);
            node.sample_count += 1;
            node.add_absent_timer_names(&annotated.timer_names);
        }

        let mut parent = matched.last().copied();
        for (offset, annotated) in remaining.iter().enumerate() {
            let id = NodeId(self.nodes.len());
            let mut record = NodeRecord::new(annotated);
            if matched.len() + offset == leaf_index {
                record.leaf_thread_state = Some(thread_state);
            }
            self.nodes.push(record);
            match parent {
                Some(p) => self.node_mut(p).children.push(id),
                None => self.roots.push(id),
            }
            parent = Some(id);
        }

        debug!(
            "Merged {}-frame sample: {} matched, {} new node(s)",
            frames.len(),
            matched.len(),
            remaining.len()
        );

        self.samples += 1;
        Ok(())
    }

    fn project(&self, id: NodeId) -> MergedStackTreeNode {
        let record = self.node(id);
        MergedStackTreeNode {
            frame: Some(record.frame.clone()),
            sample_count: record.sample_count,
            timer_names: record.timer_names.clone(),
            leaf_thread_state: record.leaf_thread_state,
            children: record.children.iter().map(|&child| self.project(child)).collect(),
        }
    }
}

/// Size counters of a tree at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Non-empty samples merged so far
    pub samples: u64,
    pub nodes: usize,
    pub roots: usize,
}

/// Merged stack tree shared by all samplers of one capture session
///
/// Either thread-specific (tied to one trace) or global across threads.
pub struct MergedStackTree {
    arena: RwLock<Arena>,
    markers: MarkerPattern,
}

impl Default for MergedStackTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MergedStackTree {
    pub fn new() -> Self {
        Self::with_marker_pattern(MarkerPattern::default())
    }

    pub fn with_marker_pattern(markers: MarkerPattern) -> Self {
        Self {
            arena: RwLock::new(Arena::default()),
            markers,
        }
    }

    pub fn marker_pattern(&self) -> &MarkerPattern {
        &self.markers
    }

    /// Normalize a raw sample and merge it
    ///
    /// Marker stripping runs before the lock is taken.
    pub fn add_stack_trace(&self, sample: &StackSample) -> Result<(), TreeError> {
        let frames = strip_synthetic_frames(&sample.frames, sample.order, &self.markers);
        self.add_to_stack_tree(&frames, sample.thread_state)
    }

    /// Merge an already normalized sample, frames ordered root first
    ///
    /// An empty sample is ignored.
    pub fn add_to_stack_tree(
        &self,
        frames: &[AnnotatedFrame],
        thread_state: ThreadState,
    ) -> Result<(), TreeError> {
        if frames.is_empty() {
            debug!("Ignoring empty stack sample");
            return Ok(());
        }
        let mut arena = self.arena.write().map_err(|_| TreeError::LockPoisoned)?;
        arena.merge(frames, thread_state)
    }

    /// Snapshot of the whole tree under a frame-less synthetic root
    pub fn root_node(&self) -> Result<MergedStackTreeNode, TreeError> {
        let arena = self.arena.read().map_err(|_| TreeError::LockPoisoned)?;
        let children = arena.roots.iter().map(|&id| arena.project(id)).collect();
        Ok(MergedStackTreeNode::synthetic_root(children))
    }

    pub fn stats(&self) -> Result<TreeStats, TreeError> {
        let arena = self.arena.read().map_err(|_| TreeError::LockPoisoned)?;
        Ok(TreeStats {
            samples: arena.samples,
            nodes: arena.nodes.len(),
            roots: arena.roots.len(),
        })
    }

    pub fn sample_count(&self) -> Result<u64, TreeError> {
        self.stats().map(|s| s.samples)
    }

    pub fn node_count(&self) -> Result<usize, TreeError> {
        self.stats().map(|s| s.nodes)
    }

    pub fn is_empty(&self) -> Result<bool, TreeError> {
        self.stats().map(|s| s.roots == 0)
    }
}

impl fmt::Debug for MergedStackTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("MergedStackTree");
        match self.stats() {
            Ok(stats) => out
                .field("samples", &stats.samples)
                .field("nodes", &stats.nodes)
                .field("roots", &stats.roots),
            Err(_) => out.field("state", &"poisoned"),
        };
        out.field("markers", &self.markers).finish()
    }
}
