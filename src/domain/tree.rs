//! Live structure tree: mutation operations and delta propagation.
//!
//! All mutations are addressed by node *names*. Every operation first locates
//! a named scope node (usually a module or directory) from the root and then
//! searches for its target inside that scope. Names are not unique, so the
//! first pre-order match wins; this narrows the ambiguity but does not remove
//! it. When a named node cannot be found the operation does nothing.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, instrument, trace};

use crate::domain::arena::{CounterArena, NodeId, TreeIterator, TreeNode};
use crate::domain::entities::{Count, Entry, EntryKind};
use crate::domain::error::{DomainError, DomainResult};

/// Change notification for tree observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    /// `node` was inserted as child number `index` of `parent`.
    Inserted {
        parent: NodeId,
        index: usize,
        node: NodeId,
    },
    /// `node` (and its subtree) was removed from position `index` of `parent`.
    Removed {
        parent: NodeId,
        index: usize,
        node: NodeId,
    },
    /// Name or counters of `node` changed.
    Changed { node: NodeId },
}

/// Aggregate tree of structure counters.
///
/// Single writer: all mutation goes through `&mut self`. Readers use the
/// read accessors between mutations and may subscribe to [`TreeChange`]
/// notifications.
#[derive(Debug)]
pub struct StructureTree {
    arena: CounterArena,
    root: NodeId,
    observers: Vec<Sender<TreeChange>>,
}

impl StructureTree {
    /// Build the tree from `base`. The root always becomes a module, whatever
    /// kind `base` declares; its counters are taken from `base` as they are.
    #[instrument(level = "debug", skip(base), fields(root = %base.name))]
    pub fn new(base: &Entry) -> DomainResult<Self> {
        let root_entry = Entry::new(
            EntryKind::Module,
            base.name.clone(),
            base.class_count,
            base.function_count,
            Vec::new(),
        );
        let (arena, root) = CounterArena::with_root(&root_entry);
        let mut tree = Self {
            arena,
            root,
            observers: Vec::new(),
        };
        for nested in &base.nested {
            tree.materialize(root, nested)?;
        }
        debug!("built structure tree with {} nodes", tree.arena.len());
        Ok(tree)
    }

    /// Build the tree and return it together with a change receiver for a
    /// renderer.
    pub fn with_observer(base: &Entry) -> DomainResult<(Self, Receiver<TreeChange>)> {
        let mut tree = Self::new(base)?;
        let receiver = tree.subscribe();
        Ok((tree, receiver))
    }

    /// Register a new observer. Dropped receivers are pruned lazily.
    pub fn subscribe(&mut self) -> Receiver<TreeChange> {
        let (sender, receiver) = mpsc::channel();
        self.observers.push(sender);
        receiver
    }

    // ------------------------------------------------------------
    // Mutation API
    // ------------------------------------------------------------

    /// Create a subtree for `entry` as the last child of the node named
    /// `parent_name` and add the entry's counters to every ancestor.
    #[instrument(level = "debug", skip(self, entry), fields(entry = %entry.name))]
    pub fn create_child_node(&mut self, parent_name: &str, entry: &Entry) -> DomainResult<()> {
        let Some(parent) = self.locate_from_root(parent_name) else {
            return Ok(());
        };
        self.materialize(parent, entry)?;
        self.sift_deltas_up(Some(parent), entry.count());
        Ok(())
    }

    /// Replace the node named like `modified` inside `parent_name` by a fresh
    /// subtree for `modified`, adjusting ancestors by the difference.
    #[instrument(level = "debug", skip(self, modified), fields(entry = %modified.name))]
    pub fn update_existing_file_node_by_contents(
        &mut self,
        parent_name: &str,
        modified: &Entry,
    ) -> DomainResult<()> {
        let Some(node) = self.locate_within(parent_name, &modified.name) else {
            return Ok(());
        };
        let old = self.node_ref(node)?;
        let parent = old
            .parent()
            .ok_or_else(|| DomainError::RootDetach(old.name().to_string()))?;

        // old minus new; ancestors move by the negation
        let delta = old.counts() - modified.count();

        self.materialize(parent, modified)?;
        self.sift_deltas_up(Some(parent), Count::ZERO - delta);
        self.remove_subtree(node)
    }

    /// Rename the node `previous_name` found inside `parent_name`.
    #[instrument(level = "debug", skip(self))]
    pub fn rename_node(
        &mut self,
        parent_name: &str,
        previous_name: &str,
        new_name: &str,
    ) -> DomainResult<()> {
        let Some(node) = self.locate_within(parent_name, previous_name) else {
            return Ok(());
        };
        self.arena
            .get_node_mut(node)
            .ok_or(DomainError::StaleNode)?
            .set_name(new_name);
        self.notify(TreeChange::Changed { node });
        Ok(())
    }

    /// Delete the node `node_name` found inside `parent_name`, subtracting its
    /// counters from every ancestor.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_child_node(&mut self, parent_name: &str, node_name: &str) -> DomainResult<()> {
        let Some(node) = self.locate_within(parent_name, node_name) else {
            return Ok(());
        };
        let target = self.node_ref(node)?;
        let live_parent = target
            .parent()
            .ok_or_else(|| DomainError::RootDetach(target.name().to_string()))?;
        let counts = target.counts();

        self.sift_deltas_up(Some(live_parent), Count::ZERO - counts);
        self.remove_subtree(node)
    }

    // ------------------------------------------------------------
    // Read API
    // ------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.arena.get_node(self.root)
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get_node(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(TreeNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(TreeNode::children).unwrap_or(&[])
    }

    /// Pre-order iteration over the whole tree.
    pub fn iter(&self) -> TreeIterator<'_> {
        self.arena.iter()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// First node called `name` in pre-order from the root.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.locate_from_root(name)
    }

    /// First node called `name` inside the first node called `scope`.
    pub fn find_within(&self, scope: &str, name: &str) -> Option<NodeId> {
        self.locate_within(scope, name)
    }

    /// Names from the root down to `id`, inclusive.
    pub fn path_of(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(idx) = current {
            match self.node(idx) {
                Some(node) => {
                    names.push(node.name());
                    current = node.parent();
                }
                None => break,
            }
        }
        names.reverse();
        names
    }

    /// Recompute every branch's counters from the structure and report the
    /// branches whose stored counters disagree, as `(node, stored, expected)`.
    ///
    /// A function leaf contributes one function, a class contributes its own
    /// counters plus one class, any other branch contributes its counters.
    /// Diagnostic only: nothing is corrected.
    pub fn recount(&self) -> Vec<(NodeId, Count, Count)> {
        let mut mismatches = Vec::new();
        for (idx, node) in self.arena.iter_postorder_from(self.root) {
            if node.is_leaf() {
                continue;
            }
            let expected: Count = node
                .children()
                .iter()
                .filter_map(|&c| self.node(c))
                .map(Self::contribution)
                .sum();
            if expected != node.counts() {
                mismatches.push((idx, node.counts(), expected));
            }
        }
        mismatches
    }

    fn contribution(node: &TreeNode) -> Count {
        match node.kind() {
            EntryKind::Function => Count::new(0, 1),
            EntryKind::Class => node.counts() + Count::new(1, 0),
            _ => node.counts(),
        }
    }

    // ------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------

    fn node_ref(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena.get_node(id).ok_or(DomainError::StaleNode)
    }

    fn locate_from_root(&self, name: &str) -> Option<NodeId> {
        let found = self.arena.locate(self.root, name);
        if found.is_none() {
            debug!("lookup miss: no node named '{}'", name);
        }
        found
    }

    fn locate_within(&self, scope_name: &str, name: &str) -> Option<NodeId> {
        let scope = self.locate_from_root(scope_name)?;
        let found = self.arena.locate(scope, name);
        if found.is_none() {
            debug!("lookup miss: no node named '{}' inside '{}'", name, scope_name);
        }
        found
    }

    /// Append `entry` and, recursively, its nested entries below `parent`.
    /// Counters are copied from the entries; ancestors are not touched.
    fn materialize(&mut self, parent: NodeId, entry: &Entry) -> DomainResult<NodeId> {
        let node = self.arena.insert_node(entry, Some(parent))?;
        let index = self.node_ref(parent)?.children().len() - 1;
        self.notify(TreeChange::Inserted {
            parent,
            index,
            node,
        });
        if !entry.kind.is_leaf() {
            for nested in &entry.nested {
                self.materialize(node, nested)?;
            }
        }
        Ok(node)
    }

    /// Add `delta` to `from` and every ancestor up to the root.
    fn sift_deltas_up(&mut self, from: Option<NodeId>, delta: Count) {
        if delta.is_zero() {
            return;
        }
        let mut current = from;
        while let Some(idx) = current {
            let Some(node) = self.arena.get_node_mut(idx) else {
                break;
            };
            node.apply_delta(delta);
            current = node.parent();
            trace!("applied delta ({}) to '{}'", delta, node.name());
            self.notify(TreeChange::Changed { node: idx });
        }
    }

    fn remove_subtree(&mut self, node: NodeId) -> DomainResult<()> {
        let (parent, index) = self.arena.detach(node)?;
        self.notify(TreeChange::Removed {
            parent,
            index,
            node,
        });
        Ok(())
    }

    fn notify(&mut self, change: TreeChange) {
        self.observers
            .retain(|observer| observer.send(change).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> StructureTree {
        StructureTree::new(&Entry::aggregate(
            EntryKind::Module,
            "P",
            vec![Entry::aggregate(
                EntryKind::Package,
                "pkg",
                vec![Entry::source_file(
                    "A.java",
                    vec![Entry::class("Foo", vec![Entry::function("bar")])],
                )],
            )],
        ))
        .unwrap()
    }

    fn counts_of(tree: &StructureTree, name: &str) -> Count {
        tree.node(tree.find(name).unwrap()).unwrap().counts()
    }

    #[test]
    fn given_base_entry_with_other_kind_when_constructing_then_root_is_module() {
        let tree = StructureTree::new(&Entry::new(EntryKind::Package, "x", 0, 0, vec![])).unwrap();
        assert_eq!(tree.root_node().unwrap().kind(), EntryKind::Module);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn given_nested_entries_when_constructing_then_preserves_order() {
        let tree = scenario_a();
        let names: Vec<&str> = tree.iter().map(|(_, n)| n.name()).collect();
        assert_eq!(names, vec!["P", "pkg", "A.java", "Foo", "bar"]);
        assert!(tree.node(tree.find("bar").unwrap()).unwrap().is_leaf());
    }

    #[test]
    fn given_leaf_scope_when_creating_child_then_fails_fast() {
        let mut tree = scenario_a();
        let result = tree.create_child_node("bar", &Entry::function("baz"));
        assert_eq!(result, Err(DomainError::NotABranch("bar".to_string())));
    }

    #[test]
    fn given_root_as_target_when_deleting_then_errors_without_change() {
        let mut tree = scenario_a();
        let result = tree.delete_child_node("P", "P");
        assert!(matches!(result, Err(DomainError::RootDetach(_))));
        assert_eq!(counts_of(&tree, "P"), Count::new(1, 1));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_observer_when_creating_then_reports_insertions_and_changes() {
        let (mut tree, rx) = StructureTree::with_observer(&Entry::aggregate(
            EntryKind::Module,
            "P",
            vec![Entry::aggregate(EntryKind::Package, "pkg", vec![])],
        ))
        .unwrap();
        let entry = Entry::source_file("B.java", vec![Entry::class("B", vec![])]);
        tree.create_child_node("pkg", &entry).unwrap();

        let changes: Vec<TreeChange> = rx.try_iter().collect();
        let pkg = tree.find("pkg").unwrap();
        let file = tree.find("B.java").unwrap();
        assert_eq!(
            changes[0],
            TreeChange::Inserted {
                parent: pkg,
                index: 0,
                node: file
            }
        );
        assert!(matches!(changes[1], TreeChange::Inserted { parent, .. } if parent == file));
        assert_eq!(changes[2], TreeChange::Changed { node: pkg });
        assert_eq!(changes[3], TreeChange::Changed { node: tree.root() });
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn given_zero_delta_when_creating_then_no_counter_notifications() {
        let (mut tree, rx) = StructureTree::with_observer(&Entry::aggregate(
            EntryKind::Module,
            "P",
            vec![Entry::aggregate(EntryKind::Package, "pkg", vec![])],
        ))
        .unwrap();
        tree.create_child_node("pkg", &Entry::aggregate(EntryKind::Package, "empty", vec![]))
            .unwrap();
        let changes: Vec<TreeChange> = rx.try_iter().collect();
        assert_eq!(changes.len(), 1);
        assert!(matches!(changes[0], TreeChange::Inserted { .. }));
    }

    #[test]
    fn given_dropped_observer_when_mutating_then_is_pruned() {
        let (mut tree, rx) = StructureTree::with_observer(&Entry::aggregate(
            EntryKind::Module,
            "P",
            vec![],
        ))
        .unwrap();
        drop(rx);
        tree.create_child_node("P", &Entry::aggregate(EntryKind::Package, "pkg", vec![]))
            .unwrap();
        assert!(tree.observers.is_empty());
    }

    #[test]
    fn given_node_when_asking_path_then_lists_names_from_root() {
        let tree = scenario_a();
        assert_eq!(
            tree.path_of(tree.find("bar").unwrap()),
            vec!["P", "pkg", "A.java", "Foo", "bar"]
        );
    }

    #[test]
    fn given_consistent_tree_when_recounting_then_reports_nothing() {
        assert!(scenario_a().recount().is_empty());
    }

    #[test]
    fn given_producer_mismatch_when_recounting_then_reports_branch() {
        let tree = StructureTree::new(&Entry::new(
            EntryKind::Module,
            "P",
            5,
            5,
            vec![Entry::aggregate(EntryKind::Package, "pkg", vec![])],
        ))
        .unwrap();
        let mismatches = tree.recount();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0], (tree.root(), Count::new(5, 5), Count::ZERO));
    }
}
