use crate::{Aabb, BuildError};
use lbvh_utils::{ExecutionPolicy, MemorySpace};

/// Leaves in Morton order, co-indexed by sorted slot.
pub(crate) struct SortedLeaves<const D: usize> {
    pub leafs: Vec<u32>,
    pub mcodes: Vec<u32>,
    pub leaf_aabbs: Vec<Aabb<D>>,
}

/// Code in the high half, original index in the low half.
///
/// Every key is unique, so any sort yields the same order.
pub(crate) fn sort_key(code: u32, primitive: u32) -> u64 {
    ((code as u64) << 32) | primitive as u64
}

/// Orders primitives by `(code, original index)` and gathers their data.
///
/// Leaf boxes are grown by `padding` on the way.
pub(crate) fn sort_leaves<E, M, const D: usize>(
    policy: &E,
    memory: &M,
    codes: &[u32],
    aabbs: &[Aabb<D>],
    padding: f32,
) -> Result<SortedLeaves<D>, BuildError>
where
    E: ExecutionPolicy,
    M: MemorySpace,
{
    let size = codes.len();

    let mut keys = memory.allocate(size, 0u64)?;
    policy.for_each_mut(&mut keys, |i, key| *key = sort_key(codes[i], i as u32));
    policy.sort(&mut keys);

    let mut leafs = memory.allocate(size, 0u32)?;
    let mut mcodes = memory.allocate(size, 0u32)?;
    let mut leaf_aabbs = memory.allocate(size, Aabb::new())?;

    let keys = keys.as_slice();
    policy.for_each_mut(&mut leafs, |slot, leaf| *leaf = keys[slot] as u32);
    policy.for_each_mut(&mut mcodes, |slot, code| *code = (keys[slot] >> 32) as u32);
    policy.for_each_mut(&mut leaf_aabbs, |slot, aabb| {
        *aabb = aabbs[keys[slot] as u32 as usize];
        if padding != 0.0 {
            aabb.offset_by(padding);
        }
    });

    Ok(SortedLeaves {
        leafs,
        mcodes,
        leaf_aabbs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lbvh_utils::{Host, Sequential};

    #[test]
    fn orders_by_code_then_index() {
        let codes = [5, 1, 5, 0, 1];
        let aabbs: Vec<Aabb<2>> = (0..5).map(|i| Aabb::from_point([i as f32, 0.0])).collect();

        let sorted = sort_leaves(&Sequential, &Host, &codes, &aabbs, 0.0).unwrap();
        assert_eq!(sorted.leafs, vec![3, 1, 4, 0, 2]);
        assert_eq!(sorted.mcodes, vec![0, 1, 1, 5, 5]);
        assert_eq!(sorted.leaf_aabbs[0], aabbs[3]);
        assert_eq!(sorted.leaf_aabbs[4], aabbs[2]);
    }

    #[test]
    fn pads_leaf_boxes() {
        let aabbs = [Aabb::from_point([1.0, 1.0])];
        let sorted = sort_leaves(&Sequential, &Host, &[0], &aabbs, 0.25).unwrap();
        assert_eq!(sorted.leaf_aabbs[0], Aabb::from_corners([0.75, 0.75], [1.25, 1.25]));
    }

    #[test]
    fn key_keeps_code_order() {
        assert!(sort_key(1, u32::MAX) < sort_key(2, 0));
        assert!(sort_key(7, 3) < sort_key(7, 4));
    }
}
