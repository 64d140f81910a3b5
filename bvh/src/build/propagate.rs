use crate::radix_tree::NO_PARENT;
use crate::{Aabb, BuildError};
use lbvh_utils::{ExecutionPolicy, MemorySpace};
use std::sync::atomic::{AtomicU32, Ordering};

/// Box whose corners are stored as raw `f32` bits, writable through `&self`.
struct AtomicAabb<const D: usize> {
    min: [AtomicU32; D],
    max: [AtomicU32; D],
}

impl<const D: usize> AtomicAabb<D> {
    fn new() -> Self {
        let empty = Aabb::<D>::new();
        Self {
            min: std::array::from_fn(|axis| AtomicU32::new(empty.min[axis].to_bits())),
            max: std::array::from_fn(|axis| AtomicU32::new(empty.max[axis].to_bits())),
        }
    }

    fn store(&self, aabb: &Aabb<D>) {
        for axis in 0..D {
            self.min[axis].store(aabb.min[axis].to_bits(), Ordering::Relaxed);
            self.max[axis].store(aabb.max[axis].to_bits(), Ordering::Relaxed);
        }
    }

    fn load(&self) -> Aabb<D> {
        Aabb {
            min: std::array::from_fn(|axis| f32::from_bits(self.min[axis].load(Ordering::Relaxed))),
            max: std::array::from_fn(|axis| f32::from_bits(self.max[axis].load(Ordering::Relaxed))),
        }
    }

    fn into_aabb(self) -> Aabb<D> {
        Aabb {
            min: self.min.map(|bits| f32::from_bits(bits.into_inner())),
            max: self.max.map(|bits| f32::from_bits(bits.into_inner())),
        }
    }
}

/// Computes every internal box bottom-up, one walker per leaf.
///
/// Each walker increments the arrival counter of its parent. The first arrival
/// stops; the second sees its sibling's published box through the
/// acquire-release increment, merges both children and moves on. Each internal
/// box is thus written exactly once, by the last of its two children to finish.
pub(crate) fn propagate_bounds<E, M, const D: usize>(
    policy: &E,
    memory: &M,
    left_children: &[u32],
    right_children: &[u32],
    parents: &[u32],
    leaf_aabbs: &[Aabb<D>],
) -> Result<Vec<Aabb<D>>, BuildError>
where
    E: ExecutionPolicy,
    M: MemorySpace,
{
    let inner = left_children.len();
    let counters = memory.allocate_with(inner, |_| AtomicU32::new(0))?;
    let boxes = memory.allocate_with(inner, |_| AtomicAabb::<D>::new())?;

    let bounds_of = |node: u32| -> Aabb<D> {
        let node = node as usize;
        if node >= inner {
            leaf_aabbs[node - inner]
        } else {
            boxes[node].load()
        }
    };

    policy.for_all(leaf_aabbs.len(), |slot| {
        let mut node = inner + slot;
        loop {
            let parent = parents[node];
            if parent == NO_PARENT {
                break;
            }

            let parent = parent as usize;
            if counters[parent].fetch_add(1, Ordering::AcqRel) == 0 {
                break;
            }

            let merged = bounds_of(left_children[parent]).union_of(&bounds_of(right_children[parent]));
            boxes[parent].store(&merged);
            node = parent;
        }
    });

    debug_assert!(counters.iter().all(|c| c.load(Ordering::Relaxed) == 2));

    Ok(boxes.into_iter().map(AtomicAabb::into_aabb).collect())
}
