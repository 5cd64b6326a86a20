//! Domain layer: entities and the live counter tree
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod tree;

pub use arena::{CounterArena, NodeId, TreeNode};
pub use entities::{Count, Entry, EntryKind};
pub use error::{DomainError, DomainResult};
pub use tree::{StructureTree, TreeChange};
