//! Tree rendering for the terminal.
//!
//! Presentation metadata per kind lives here, not in the domain.

use termtree::Tree;

use crate::config::RenderConfig;
use crate::domain::{EntryKind, NodeId, StructureTree, TreeChange, TreeNode};

/// Short tag shown in front of a node name.
pub fn kind_tag(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Module => "[M]",
        EntryKind::Package => "[P]",
        EntryKind::SourceFile => "[F]",
        EntryKind::Class => "[C]",
        EntryKind::Function => "[f]",
    }
}

/// One-line label of a node: tag, name and, for branches, the counters.
pub fn label(node: &TreeNode, opts: &RenderConfig) -> String {
    let mut label = format!("{} {}", kind_tag(node.kind()), node.name());
    if opts.show_counts && !node.is_leaf() {
        let counts = node.counts();
        label.push_str(&format!(
            " | Classes: {} | Methods: {}",
            counts.class_count, counts.function_count
        ));
    }
    label
}

/// Convert the tree into a printable `termtree::Tree`.
pub fn to_termtree(tree: &StructureTree, opts: &RenderConfig) -> Tree<String> {
    fn build(tree: &StructureTree, idx: NodeId, opts: &RenderConfig, parent: &mut Tree<String>) {
        for &child_idx in tree.children(idx) {
            if let Some(child) = tree.node(child_idx) {
                if child.is_leaf() && !opts.show_functions {
                    continue;
                }
                let mut child_tree = Tree::new(label(child, opts));
                build(tree, child_idx, opts, &mut child_tree);
                parent.push(child_tree);
            }
        }
    }

    match tree.root_node() {
        Some(root) => {
            let mut rendered = Tree::new(label(root, opts));
            build(tree, tree.root(), opts, &mut rendered);
            rendered
        }
        None => Tree::new("Empty tree".to_string()),
    }
}

/// Human-readable description of a change notification.
///
/// Removed nodes no longer resolve, so only their former parent is named.
pub fn describe_change(tree: &StructureTree, change: &TreeChange) -> String {
    let name = |id: NodeId| {
        tree.node(id)
            .map(|n| n.name().to_string())
            .unwrap_or_else(|| "<removed>".to_string())
    };
    match *change {
        TreeChange::Inserted {
            parent,
            index,
            node,
        } => format!("inserted {} at {}[{}]", name(node), name(parent), index),
        TreeChange::Removed { parent, index, .. } => {
            format!("removed {}[{}]", name(parent), index)
        }
        TreeChange::Changed { node } => match tree.node(node) {
            Some(n) if !n.is_leaf() => format!("changed {} ({})", n.name(), n.counts()),
            _ => format!("changed {}", name(node)),
        },
    }
}
