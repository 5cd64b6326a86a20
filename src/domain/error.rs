//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Contract violations inside the counter tree.
///
/// Lookup misses are not errors: mutation operations silently do nothing when
/// a named node cannot be found. These variants are only produced when a
/// lookup resolves to a node that cannot take part in the requested operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node '{0}' is a function leaf and cannot hold children")]
    NotABranch(String),

    #[error("root node '{0}' cannot be detached or replaced")]
    RootDetach(String),

    #[error("stale node handle")]
    StaleNode,
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
