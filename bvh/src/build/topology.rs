use crate::radix_tree::NO_PARENT;
use crate::BuildError;
use lbvh_utils::{ExecutionPolicy, MemorySpace};
use std::sync::atomic::{AtomicU32, Ordering};

/// Child and parent links of a radix tree, indexed as in [`crate::RadixTree`].
pub(crate) struct Topology {
    pub left_children: Vec<u32>,
    pub right_children: Vec<u32>,
    pub parents: Vec<u32>,
}

/// Leaf range `[first, last]` owned by one internal node and its split.
///
/// Leaves `first..=split` go left, `split + 1..=last` go right.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct NodeDivision {
    pub first: u32,
    pub last: u32,
    pub split: u32,
}

impl NodeDivision {
    /// Length of the common prefix of the keys at sorted slots `j` and `k`.
    ///
    /// Equal codes continue the prefix with the slot indices themselves, which
    /// keeps every key distinct. `-1` when `k` is outside the table.
    fn calc_delta(codes: &[u32], j: i64, k: i64) -> i32 {
        if k < 0 || k >= codes.len() as i64 {
            return -1;
        }

        let l_code = codes[j as usize];
        let r_code = codes[k as usize];

        (if l_code == r_code {
            32 + ((j ^ k) as u32).leading_zeros()
        } else {
            (l_code ^ r_code).leading_zeros()
        }) as i32
    }

    pub fn divide_node(codes: &[u32], node_idx: usize) -> Self {
        let i = node_idx as i64;
        let d: i64 = if Self::calc_delta(codes, i, i + 1) > Self::calc_delta(codes, i, i - 1) {
            1
        } else {
            -1
        };

        // Upper bound for the range length, then binary search for the far end.
        let delta_min = Self::calc_delta(codes, i, i - d);
        let mut l_max: i64 = 2;
        while Self::calc_delta(codes, i, i + l_max * d) > delta_min {
            l_max *= 2;
        }

        let mut l = 0;
        let mut t = l_max / 2;
        while t >= 1 {
            if Self::calc_delta(codes, i, i + (l + t) * d) > delta_min {
                l += t;
            }
            t /= 2;
        }
        let j = i + l * d;

        // Last slot sharing more than the node's prefix with `i`.
        let delta_node = Self::calc_delta(codes, i, j);
        let mut s = 0;
        let mut t = l;
        loop {
            t = (t + 1) / 2;
            if Self::calc_delta(codes, i, i + (s + t) * d) > delta_node {
                s += t;
            }
            if t <= 1 {
                break;
            }
        }

        let gamma = i + s * d + d.min(0);

        NodeDivision {
            first: i.min(j) as u32,
            last: i.max(j) as u32,
            split: gamma as u32,
        }
    }
}

/// Links every internal node to its children, one independent task per node.
pub(crate) fn build_topology<E, M>(policy: &E, memory: &M, codes: &[u32]) -> Result<Topology, BuildError>
where
    E: ExecutionPolicy,
    M: MemorySpace,
{
    let size = codes.len();
    let inner = size.saturating_sub(1);

    let left = memory.allocate_with(inner, |_| AtomicU32::new(0))?;
    let right = memory.allocate_with(inner, |_| AtomicU32::new(0))?;
    let parents = memory.allocate_with(size + inner, |_| AtomicU32::new(NO_PARENT))?;

    // Every slot is written by exactly one task; the phase barrier publishes them.
    policy.for_all(inner, |node| {
        let div = NodeDivision::divide_node(codes, node);
        let leaf = |slot: u32| inner as u32 + slot;

        let l_child = if div.first == div.split {
            leaf(div.split)
        } else {
            div.split
        };
        let r_child = if div.last == div.split + 1 {
            leaf(div.split + 1)
        } else {
            div.split + 1
        };

        left[node].store(l_child, Ordering::Relaxed);
        right[node].store(r_child, Ordering::Relaxed);
        parents[l_child as usize].store(node as u32, Ordering::Relaxed);
        parents[r_child as usize].store(node as u32, Ordering::Relaxed);
    });

    Ok(Topology {
        left_children: left.into_iter().map(AtomicU32::into_inner).collect(),
        right_children: right.into_iter().map(AtomicU32::into_inner).collect(),
        parents: parents.into_iter().map(AtomicU32::into_inner).collect(),
    })
}
