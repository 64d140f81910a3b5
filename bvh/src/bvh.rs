use crate::aabb::Bounds;
use crate::batch::{find_batch, CandidateList};
use crate::traversal::{nearest, Candidates};
use crate::{Aabb, RadixTree};
use lbvh_utils::ExecutionPolicy;

/// Built, immutable bounding volume hierarchy.
///
/// Every query answers in terms of the indices of the boxes the tree was
/// built from; the Morton order of the leaves never leaks out.
#[derive(Debug, Clone)]
pub struct Bvh<const D: usize> {
    tree: RadixTree<D>,
}

impl<const D: usize> Bvh<D> {
    pub(crate) fn new(tree: RadixTree<D>) -> Self {
        Self { tree }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn radix_tree(&self) -> &RadixTree<D> {
        &self.tree
    }

    /// Candidates for an arbitrary box predicate; a subtree is skipped as
    /// soon as its box fails.
    pub fn traverse<P>(&self, predicate: P) -> Candidates<'_, D, P>
    where
        P: FnMut(&Aabb<D>) -> bool,
    {
        Candidates::new(&self.tree, predicate)
    }

    /// Every box overlapping `query`, touching included.
    pub fn find_overlapping<'a>(&'a self, query: &'a Aabb<D>) -> impl Iterator<Item = usize> + 'a {
        self.traverse(move |node| node.intersects(query))
    }

    /// Every box containing `point`, boundary included.
    pub fn find_containing<P>(&self, point: P) -> impl Iterator<Item = usize> + '_
    where
        P: Into<[f32; D]>,
    {
        self.traverse(contains_point(point.into()))
    }

    /// Index minimizing `distance`, pruned with box distances to `point`.
    ///
    /// `distance(i)` must return the squared distance from `point` to
    /// primitive `i`; boxes only bound it from below.
    pub fn find_nearest<P, F>(&self, point: P, distance: F) -> Option<usize>
    where
        P: Into<[f32; D]>,
        F: FnMut(usize) -> f32,
    {
        nearest(&self.tree, point.into(), distance)
    }

    /// Containment candidates for many points at once.
    pub fn find_points<E, P>(&self, policy: &E, points: &[P]) -> CandidateList
    where
        E: ExecutionPolicy,
        P: Into<[f32; D]> + Copy + Sync,
    {
        find_batch(&self.tree, policy, points, |point| {
            let point: [f32; D] = (*point).into();
            move |node: &Aabb<D>| node.contains(point)
        })
    }

    /// Overlap candidates for many boxes at once.
    pub fn find_boxes<E>(&self, policy: &E, queries: &[Aabb<D>]) -> CandidateList
    where
        E: ExecutionPolicy,
    {
        find_batch(&self.tree, policy, queries, |query| {
            let query = *query;
            move |node: &Aabb<D>| node.intersects(&query)
        })
    }
}

fn contains_point<const D: usize>(point: [f32; D]) -> impl FnMut(&Aabb<D>) -> bool {
    move |node| node.contains(point)
}

impl<const D: usize> Bounds<D> for Bvh<D> {
    /// Root box, the empty box for an empty tree.
    fn bounds(&self) -> Aabb<D> {
        match self.tree.root() {
            Some(root) => *self.tree.node_bounds(root),
            None => Aabb::new(),
        }
    }
}
