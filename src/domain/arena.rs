//! Arena storage for the counter tree.
//!
//! Nodes live in a generational arena and refer to each other through
//! [`NodeId`] handles. A branch owns its children (removing it removes the
//! whole subtree); the parent handle is only used for upward walks and
//! never keeps a node alive. Handles to removed nodes resolve to `None`.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Count, Entry, EntryKind};
use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node in the counter tree.
pub type NodeId = Index;

/// Variant-specific part of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodePayload {
    /// Module, package, source file or class: carries counters, may have children.
    Branch { kind: EntryKind, counts: Count },
    /// Function: no counters, never has children.
    Leaf,
}

/// Tree node in the arena-based hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    name: String,
    payload: NodePayload,
    /// Index of parent node in the arena, None for the root
    parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in insertion order
    children: Vec<NodeId>,
}

impl TreeNode {
    /// Node for `entry` without its nested entries.
    fn from_entry(entry: &Entry, parent: Option<NodeId>) -> Self {
        let payload = if entry.kind.is_leaf() {
            NodePayload::Leaf
        } else {
            NodePayload::Branch {
                kind: entry.kind,
                counts: entry.count(),
            }
        };
        Self {
            name: entry.name.clone(),
            payload,
            parent,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        match self.payload {
            NodePayload::Branch { kind, .. } => kind,
            NodePayload::Leaf => EntryKind::Function,
        }
    }

    /// Current counters; leaves always report zero.
    pub fn counts(&self) -> Count {
        match self.payload {
            NodePayload::Branch { counts, .. } => counts,
            NodePayload::Leaf => Count::ZERO,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.payload, NodePayload::Leaf)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add `delta` to the counters. Returns false for leaves, which have none.
    pub(crate) fn apply_delta(&mut self, delta: Count) -> bool {
        match &mut self.payload {
            NodePayload::Branch { counts, .. } => {
                *counts += delta;
                true
            }
            NodePayload::Leaf => false,
        }
    }
}

/// Arena-backed tree of [`TreeNode`]s with a single root.
#[derive(Debug, Default)]
pub struct CounterArena {
    arena: Arena<TreeNode>,
    root: Option<NodeId>,
}

impl CounterArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Arena holding a single root node built from `entry` (nested entries ignored).
    pub fn with_root(entry: &Entry) -> (Self, NodeId) {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode::from_entry(entry, None));
        (
            Self {
                arena,
                root: Some(root),
            },
            root,
        )
    }

    /// Insert a node for `entry` (without nested entries) as the last child of
    /// `parent`, or as the root when `parent` is None.
    #[instrument(level = "trace", skip(self, entry), fields(name = %entry.name))]
    pub fn insert_node(&mut self, entry: &Entry, parent: Option<NodeId>) -> DomainResult<NodeId> {
        if let Some(parent_idx) = parent {
            let parent_node = self.arena.get(parent_idx).ok_or(DomainError::StaleNode)?;
            if parent_node.is_leaf() {
                return Err(DomainError::NotABranch(parent_node.name.clone()));
            }
        }

        let node_idx = self.arena.insert(TreeNode::from_entry(entry, parent));
        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(node_idx),
            None => self.root = Some(node_idx),
        }
        Ok(node_idx)
    }

    /// Unlink `idx` from its parent and drop it together with its subtree.
    ///
    /// Returns the former parent and the position the node had among its
    /// siblings.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: NodeId) -> DomainResult<(NodeId, usize)> {
        let node = self.arena.get(idx).ok_or(DomainError::StaleNode)?;
        let parent_idx = node
            .parent
            .ok_or_else(|| DomainError::RootDetach(node.name.clone()))?;

        let parent = self
            .arena
            .get_mut(parent_idx)
            .ok_or(DomainError::StaleNode)?;
        let position = parent
            .children
            .iter()
            .position(|&c| c == idx)
            .ok_or(DomainError::StaleNode)?;
        parent.children.remove(position);

        let doomed: Vec<NodeId> = self.iter_postorder_from(idx).map(|(i, _)| i).collect();
        for i in doomed {
            self.arena.remove(i);
        }
        Ok((parent_idx, position))
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Depth-first, pre-order search for the first node called `name` within
    /// the subtree rooted at `from` (`from` itself included).
    #[instrument(level = "trace", skip(self))]
    pub fn locate(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.iter_from(from)
            .find(|(_, node)| node.name == name)
            .map(|(idx, _)| idx)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    pub fn iter_from(&self, start: NodeId) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(start))
    }

    pub fn iter_postorder_from(&self, start: NodeId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, Some(start))
    }
}

/// Pre-order iterator: node first, then its children left to right.
pub struct TreeIterator<'a> {
    arena: &'a CounterArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a CounterArena, start: Option<NodeId>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Post-order iterator: children before their parent.
pub struct PostOrderIterator<'a> {
    arena: &'a CounterArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a CounterArena, start: Option<NodeId>) -> Self {
        Self {
            arena,
            stack: start.map(|s| (s, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if visited {
                    return Some((current_idx, node));
                }
                self.stack.push((current_idx, true));
                for &child in node.children.iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}
