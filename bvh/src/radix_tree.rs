//! Flat, index-linked binary radix tree over Morton-sorted leaves.
//!
//! Nodes share one index space: internal node `i` is `i`, leaf slot `j` is
//! `inner_len + j`. The root is therefore always node `0` when the tree is
//! not empty, an internal node for two or more leaves and the only leaf
//! otherwise.

use crate::{Aabb, InvariantViolation};

/// Parent of the root.
pub const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct RadixTree<const D: usize> {
    pub(crate) left_children: Vec<u32>,
    pub(crate) right_children: Vec<u32>,
    pub(crate) parents: Vec<u32>,
    pub(crate) inner_aabbs: Vec<Aabb<D>>,

    pub(crate) leafs: Vec<u32>,
    pub(crate) mcodes: Vec<u32>,
    pub(crate) leaf_aabbs: Vec<Aabb<D>>,
}

impl<const D: usize> RadixTree<D> {
    /// Bytes held by the arrays of a tree over `size` leaves.
    pub fn footprint(size: usize) -> usize {
        let inner = size.saturating_sub(1);
        let index = std::mem::size_of::<u32>();
        let aabb = std::mem::size_of::<Aabb<D>>();

        inner * (2 * index + aabb) + (size + inner) * index + size * (2 * index + aabb)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leafs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leafs.is_empty()
    }

    pub fn inner_len(&self) -> usize {
        self.left_children.len()
    }

    pub fn node_count(&self) -> usize {
        self.parents.len()
    }

    pub fn root(&self) -> Option<u32> {
        if self.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn is_leaf(&self, node: u32) -> bool {
        node as usize >= self.inner_len()
    }

    /// Sorted leaf slot of `node`, `None` for internal nodes.
    pub fn leaf_slot(&self, node: u32) -> Option<usize> {
        (node as usize).checked_sub(self.inner_len())
    }

    pub fn leaf_node(&self, slot: usize) -> u32 {
        (self.inner_len() + slot) as u32
    }

    pub fn children(&self, inner: u32) -> (u32, u32) {
        (
            self.left_children[inner as usize],
            self.right_children[inner as usize],
        )
    }

    pub fn parent(&self, node: u32) -> Option<u32> {
        match self.parents[node as usize] {
            NO_PARENT => None,
            parent => Some(parent),
        }
    }

    pub fn node_bounds(&self, node: u32) -> &Aabb<D> {
        match self.leaf_slot(node) {
            Some(slot) => &self.leaf_aabbs[slot],
            None => &self.inner_aabbs[node as usize],
        }
    }

    pub fn left_children(&self) -> &[u32] {
        &self.left_children
    }

    pub fn right_children(&self) -> &[u32] {
        &self.right_children
    }

    pub fn parents(&self) -> &[u32] {
        &self.parents
    }

    pub fn inner_aabbs(&self) -> &[Aabb<D>] {
        &self.inner_aabbs
    }

    /// Original primitive index of every sorted leaf slot.
    pub fn leafs(&self) -> &[u32] {
        &self.leafs
    }

    pub fn mcodes(&self) -> &[u32] {
        &self.mcodes
    }

    pub fn leaf_aabbs(&self) -> &[Aabb<D>] {
        &self.leaf_aabbs
    }

    /// Checks every structural invariant of a finished tree.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let size = self.len();
        let inner = size.saturating_sub(1);
        let total = size + inner;

        let lengths = [
            ("left_children", self.left_children.len(), inner),
            ("right_children", self.right_children.len(), inner),
            ("inner_aabbs", self.inner_aabbs.len(), inner),
            ("parents", self.parents.len(), total),
            ("mcodes", self.mcodes.len(), size),
            ("leaf_aabbs", self.leaf_aabbs.len(), size),
        ];
        for (name, len, expected) in lengths {
            if len != expected {
                return Err(InvariantViolation::ArrayLength {
                    name,
                    len,
                    expected,
                });
            }
        }

        if let Some(root) = self.root() {
            if let Some(parent) = self.parent(root) {
                return Err(InvariantViolation::RootHasParent { parent });
            }
        }

        let mut references = vec![0u32; total];
        for node in 0..inner as u32 {
            let (left, right) = self.children(node);
            for child in [left, right] {
                if child == 0 || child as usize >= total {
                    return Err(InvariantViolation::ChildOutOfRange { node, child });
                }
                references[child as usize] += 1;

                if self.parents[child as usize] != node {
                    return Err(InvariantViolation::ParentMismatch {
                        node: child,
                        found: self.parents[child as usize],
                        expected: node,
                    });
                }
            }

            let union = self.node_bounds(left).union_of(self.node_bounds(right));
            if !union.bitwise_eq(&self.inner_aabbs[node as usize]) {
                return Err(InvariantViolation::BoxMismatch { node });
            }
        }

        for (node, &count) in references.iter().enumerate().skip(1) {
            if count != 1 {
                return Err(InvariantViolation::Coverage {
                    node: node as u32,
                    count,
                });
            }
        }

        for slot in 1..size {
            let prev = (self.mcodes[slot - 1], self.leafs[slot - 1]);
            let next = (self.mcodes[slot], self.leafs[slot]);
            if prev >= next {
                return Err(InvariantViolation::Unsorted {
                    slot: (slot - 1) as u32,
                    next: slot as u32,
                });
            }
        }

        let mut seen = vec![0u32; size];
        for &primitive in &self.leafs {
            match seen.get_mut(primitive as usize) {
                Some(count) => *count += 1,
                None => {
                    return Err(InvariantViolation::LeafPermutation {
                        primitive,
                        count: 0,
                    })
                }
            }
        }
        if let Some((primitive, &count)) = seen.iter().enumerate().find(|&(_, &c)| c != 1) {
            return Err(InvariantViolation::LeafPermutation {
                primitive: primitive as u32,
                count,
            });
        }

        Ok(())
    }
}
