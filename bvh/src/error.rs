use lbvh_utils::AllocError;
use thiserror::Error;

/// Reasons a build can refuse to produce a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("unsupported dimension {dim}, only 2 and 3 are encodable")]
    UnsupportedDimension { dim: usize },

    #[error("{count} primitives do not fit the 32-bit node index space")]
    TooManyPrimitives { count: usize },

    #[error(transparent)]
    Allocation(#[from] AllocError),
}

/// A broken structural invariant of a built tree.
///
/// Only produced by [`crate::RadixTree::verify`]; a correct build never yields one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("array `{name}` has length {len}, expected {expected}")]
    ArrayLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("root has parent {parent}")]
    RootHasParent { parent: u32 },

    #[error("internal node {node} has child {child} outside the node space")]
    ChildOutOfRange { node: u32, child: u32 },

    #[error("node {node} has parent {found}, expected {expected}")]
    ParentMismatch { node: u32, found: u32, expected: u32 },

    #[error("node {node} is referenced {count} times as a child")]
    Coverage { node: u32, count: u32 },

    #[error("box of internal node {node} is not the union of its children")]
    BoxMismatch { node: u32 },

    #[error("leaf slots {slot} and {next} are out of order")]
    Unsorted { slot: u32, next: u32 },

    #[error("primitive {primitive} appears {count} times among the leaves")]
    LeafPermutation { primitive: u32, count: u32 },
}
