use crate::build::propagate::propagate_bounds;
use crate::build::sort::sort_leaves;
use crate::build::topology::build_topology;
use crate::morton::{bits_per_axis, centroid_bounds, MortonEncoder};
use crate::{Aabb, BuildError, Bvh, BvhBuilder, RadixTree};
use lbvh_utils::{ExecutionPolicy, Host, MemorySpace, Sequential};
use log::{debug, trace};

/// Largest input whose `2N - 1` nodes and sentinel fit a `u32` index.
pub const MAX_PRIMITIVES: usize = i32::MAX as usize;

/// Linear BVH builder: Morton codes, radix sort, Karras topology and
/// bottom-up box propagation, every phase run through `E`, every array
/// allocated in `M`.
#[derive(Debug, Clone)]
pub struct LbvhBuilder<E = Sequential, M = Host> {
    policy: E,
    memory: M,
    padding: f32,
}

impl Default for LbvhBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LbvhBuilder {
    pub fn new() -> Self {
        Self {
            policy: Sequential,
            memory: Host,
            padding: 0.0,
        }
    }
}

impl<E: ExecutionPolicy, M: MemorySpace> LbvhBuilder<E, M> {
    pub fn with_policy<P: ExecutionPolicy>(self, policy: P) -> LbvhBuilder<P, M> {
        LbvhBuilder {
            policy,
            memory: self.memory,
            padding: self.padding,
        }
    }

    pub fn with_memory<S: MemorySpace>(self, memory: S) -> LbvhBuilder<E, S> {
        LbvhBuilder {
            policy: self.policy,
            memory,
            padding: self.padding,
        }
    }

    /// Grows every leaf box by `padding` on all sides; `0.0` keeps boxes exact.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn policy(&self) -> &E {
        &self.policy
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }
}

impl<E, M, const D: usize> BvhBuilder<D> for LbvhBuilder<E, M>
where
    E: ExecutionPolicy,
    M: MemorySpace,
{
    fn build(&self, aabbs: &[Aabb<D>]) -> Result<Bvh<D>, BuildError> {
        if bits_per_axis(D).is_none() {
            return Err(BuildError::UnsupportedDimension { dim: D });
        }
        if aabbs.len() > MAX_PRIMITIVES {
            return Err(BuildError::TooManyPrimitives { count: aabbs.len() });
        }
        self.memory.reserve(RadixTree::<D>::footprint(aabbs.len()))?;

        let instant = std::time::Instant::now();

        let scene_box = centroid_bounds(&self.policy, aabbs);
        let encoder = MortonEncoder::new(&scene_box)?;
        let mut codes = self.memory.allocate(aabbs.len(), 0u32)?;
        encoder.encode_all(&self.policy, aabbs, &mut codes);
        trace!("encoded {} centroids within {}", aabbs.len(), scene_box);

        let sorted = sort_leaves(&self.policy, &self.memory, &codes, aabbs, self.padding)?;
        drop(codes);
        trace!("sorted {} leaves", sorted.leafs.len());

        let topology = build_topology(&self.policy, &self.memory, &sorted.mcodes)?;
        trace!("linked {} internal nodes", topology.left_children.len());

        let inner_aabbs = propagate_bounds(
            &self.policy,
            &self.memory,
            &topology.left_children,
            &topology.right_children,
            &topology.parents,
            &sorted.leaf_aabbs,
        )?;

        let tree = RadixTree {
            left_children: topology.left_children,
            right_children: topology.right_children,
            parents: topology.parents,
            inner_aabbs,
            leafs: sorted.leafs,
            mcodes: sorted.mcodes,
            leaf_aabbs: sorted.leaf_aabbs,
        };
        debug_assert_eq!(tree.verify(), Ok(()));

        debug!(
            "built lbvh over {} boxes with {} policy in {} ms",
            aabbs.len(),
            self.policy.name(),
            instant.elapsed().as_millis()
        );

        Ok(Bvh::new(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use lbvh_utils::{Bounded, Rayon, Threads};

    fn grid(count: usize) -> Vec<Aabb<3>> {
        (0..count)
            .map(|i| {
                let p = [(i % 7) as f32, ((i / 7) % 5) as f32, (i / 35) as f32];
                Aabb::from_corners(p, [p[0] + 0.5, p[1] + 0.5, p[2] + 0.5])
            })
            .collect()
    }

    #[test]
    fn builds_valid_trees_for_small_sizes() {
        for count in 0..40 {
            let bvh = LbvhBuilder::new().build(&grid(count)).unwrap();
            let tree = bvh.radix_tree();
            assert_eq!(tree.len(), count);
            assert_eq!(tree.inner_len(), count.saturating_sub(1));
            assert_eq!(tree.verify(), Ok(()));
        }
    }

    #[test]
    fn rejects_unencodable_dimensions() {
        let boxes = vec![Aabb::<4>::from_point([0.0; 4])];
        let err = LbvhBuilder::new().build(&boxes).unwrap_err();
        assert_eq!(err, BuildError::UnsupportedDimension { dim: 4 });

        let err = LbvhBuilder::new().build(&Vec::<Aabb<1>>::new()).unwrap_err();
        assert_eq!(err, BuildError::UnsupportedDimension { dim: 1 });
    }

    #[test]
    fn bounded_memory_refuses_large_trees() {
        let boxes = grid(100);
        let needed = RadixTree::<3>::footprint(boxes.len());

        let err = LbvhBuilder::new()
            .with_memory(Bounded::new(needed - 1))
            .build(&boxes)
            .unwrap_err();
        assert!(matches!(err, BuildError::Allocation(_)));

        let bvh = LbvhBuilder::new()
            .with_memory(Bounded::new(needed))
            .build(&boxes)
            .unwrap();
        assert_eq!(bvh.len(), 100);
    }

    #[test]
    fn padding_grows_leaves() {
        let boxes = vec![Aabb::from_point([0.0, 0.0]), Aabb::from_point([2.0, 0.0])];
        let bvh = LbvhBuilder::new().with_padding(0.5).build(&boxes).unwrap();
        assert_eq!(bvh.bounds(), Aabb::from_corners([-0.5, -0.5], [2.5, 0.5]));
        assert_eq!(bvh.find_containing([0.4f32, 0.4]).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn policies_build_identical_trees() {
        let boxes = grid(500);
        let reference = LbvhBuilder::new().build(&boxes).unwrap();

        let rayon = LbvhBuilder::new().with_policy(Rayon::new()).build(&boxes).unwrap();
        let threads = LbvhBuilder::new()
            .with_policy(Threads::with_workers(4))
            .build(&boxes)
            .unwrap();

        for bvh in [&rayon, &threads] {
            let (a, b) = (bvh.radix_tree(), reference.radix_tree());
            assert_eq!(a.left_children(), b.left_children());
            assert_eq!(a.right_children(), b.right_children());
            assert_eq!(a.parents(), b.parents());
            assert_eq!(a.leafs(), b.leafs());
            assert_eq!(a.mcodes(), b.mcodes());
            assert_eq!(a.inner_aabbs(), b.inner_aabbs());
        }
    }
}
