//! Read-only snapshot of a merged stack tree.
//!
//! Nodes here are owned copies taken at snapshot time. Nothing done to them
//! reaches back into the live tree.

use crate::parser::frame::{StackFrame, ThreadState};
use serde::{Deserialize, Serialize};

/// One (frame, position) of the merged tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedStackTreeNode {
    /// Absent only on the synthetic root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<StackFrame>,

    /// Number of samples whose path went through this node
    pub sample_count: u64,

    /// Union of the timer names seen on matching samples
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timer_names: Vec<String>,

    /// Thread state of the samples that ended here, set on leaf nodes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_thread_state: Option<ThreadState>,

    /// Children in discovery order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MergedStackTreeNode>,
}

impl MergedStackTreeNode {
    /// Frame-less root wrapping all true roots
    pub fn synthetic_root(children: Vec<MergedStackTreeNode>) -> Self {
        Self {
            frame: None,
            sample_count: children.iter().map(|c| c.sample_count).sum(),
            timer_names: Vec::new(),
            leaf_thread_state: None,
            children,
        }
    }

    pub fn is_synthetic_root(&self) -> bool {
        self.frame.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf_thread_state.is_some()
    }

    /// Longest frame path below (and including) this node
    pub fn max_depth(&self) -> usize {
        let own = usize::from(self.frame.is_some());
        own + self.children.iter().map(Self::max_depth).max().unwrap_or(0)
    }

    /// Number of real (framed) nodes in this subtree
    pub fn node_count(&self) -> usize {
        let own = usize::from(self.frame.is_some());
        own + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    pub fn has_timer(&self, name: &str) -> bool {
        self.timer_names.iter().any(|t| t == name)
    }

    /// Copy of this subtree with siblings ordered by descending sample count
    ///
    /// Ties keep discovery order.
    pub fn sorted_by_sample_count(&self) -> Self {
        let mut children: Vec<Self> = self
            .children
            .iter()
            .map(Self::sorted_by_sample_count)
            .collect();
        children.sort_by(|a, b| b.sample_count.cmp(&a.sample_count));
        Self {
            children,
            ..self.shallow_clone()
        }
    }

    /// Call `visit` for every leaf node with the frames from the outermost
    /// caller down to (and including) that leaf
    pub fn visit_leaf_paths<F>(&self, mut visit: F)
    where
        F: FnMut(&[&StackFrame], &MergedStackTreeNode),
    {
        let mut path = Vec::new();
        self.visit_leaf_paths_inner(&mut path, &mut visit);
    }

    fn visit_leaf_paths_inner<'a, F>(&'a self, path: &mut Vec<&'a StackFrame>, visit: &mut F)
    where
        F: FnMut(&[&StackFrame], &MergedStackTreeNode),
    {
        if let Some(frame) = &self.frame {
            path.push(frame);
        }
        if self.is_leaf() {
            visit(path, self);
        }
        for child in &self.children {
            child.visit_leaf_paths_inner(path, visit);
        }
        if self.frame.is_some() {
            path.pop();
        }
    }

    fn shallow_clone(&self) -> Self {
        Self {
            frame: self.frame.clone(),
            sample_count: self.sample_count,
            timer_names: self.timer_names.clone(),
            leaf_thread_state: self.leaf_thread_state,
            children: Vec::new(),
        }
    }
}
