//! Stack-based traversals over a finished [`RadixTree`].
//!
//! No traversal recurses. Keys are at most 64 bits long (Morton code plus the
//! slot tie-break), so no root-to-leaf path is longer than 65 nodes and a
//! fixed stack of [`TRAVERSAL_STACK_SIZE`] entries always suffices.

use crate::{Aabb, RadixTree};

pub const TRAVERSAL_STACK_SIZE: usize = 128;

/// Lazily yields the original index of every leaf whose box, and whose
/// ancestors' boxes, satisfy the predicate.
///
/// Order follows the tree, not the input. Each query owns its stack, so any
/// number of them may run over the same tree at once.
pub struct Candidates<'a, const D: usize, P> {
    tree: &'a RadixTree<D>,
    predicate: P,
    hit_stack: [u32; TRAVERSAL_STACK_SIZE],
    stack_ptr: usize,
}

impl<'a, const D: usize, P> Candidates<'a, D, P>
where
    P: FnMut(&Aabb<D>) -> bool,
{
    pub(crate) fn new(tree: &'a RadixTree<D>, mut predicate: P) -> Self {
        let mut hit_stack = [0; TRAVERSAL_STACK_SIZE];
        let mut stack_ptr = 0;

        if let Some(root) = tree.root() {
            if predicate(tree.node_bounds(root)) {
                hit_stack[0] = root;
                stack_ptr = 1;
            }
        }

        Self {
            tree,
            predicate,
            hit_stack,
            stack_ptr,
        }
    }

    fn push(&mut self, node: u32) {
        debug_assert!(self.stack_ptr < TRAVERSAL_STACK_SIZE, "traversal stack overflow");
        self.hit_stack[self.stack_ptr] = node;
        self.stack_ptr += 1;
    }
}

impl<'a, const D: usize, P> Iterator for Candidates<'a, D, P>
where
    P: FnMut(&Aabb<D>) -> bool,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.stack_ptr > 0 {
            self.stack_ptr -= 1;
            let node = self.hit_stack[self.stack_ptr];

            if let Some(slot) = self.tree.leaf_slot(node) {
                return Some(self.tree.leafs[slot] as usize);
            }

            // Right first so the left subtree is visited first.
            let (left, right) = self.tree.children(node);
            if (self.predicate)(self.tree.node_bounds(right)) {
                self.push(right);
            }
            if (self.predicate)(self.tree.node_bounds(left)) {
                self.push(left);
            }
        }

        None
    }
}

/// Branch and bound for the leaf minimizing `distance`.
///
/// `distance` receives an original index and must return a squared distance
/// no smaller than the squared distance from `point` to that leaf's box.
/// NaN distances never win.
pub(crate) fn nearest<const D: usize, F>(tree: &RadixTree<D>, point: [f32; D], mut distance: F) -> Option<usize>
where
    F: FnMut(usize) -> f32,
{
    let root = tree.root()?;

    let mut hit_stack = [(0u32, 0.0f32); TRAVERSAL_STACK_SIZE];
    let mut stack_ptr = 1;
    hit_stack[0] = (root, tree.node_bounds(root).distance_squared(point));

    let mut best: Option<(usize, f32)> = None;
    let prunes = |bound: f32, best: &Option<(usize, f32)>| matches!(best, Some((_, d)) if bound >= *d);

    while stack_ptr > 0 {
        stack_ptr -= 1;
        let (node, bound) = hit_stack[stack_ptr];
        if prunes(bound, &best) {
            continue;
        }

        if let Some(slot) = tree.leaf_slot(node) {
            let index = tree.leafs[slot] as usize;
            let d = distance(index);
            if d.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
            continue;
        }

        let (left, right) = tree.children(node);
        let left_bound = tree.node_bounds(left).distance_squared(point);
        let right_bound = tree.node_bounds(right).distance_squared(point);

        // Farther child goes down first so the nearer one is popped next.
        let (near, far) = if left_bound <= right_bound {
            ((left, left_bound), (right, right_bound))
        } else {
            ((right, right_bound), (left, left_bound))
        };
        for entry in [far, near] {
            if !prunes(entry.1, &best) {
                debug_assert!(stack_ptr < TRAVERSAL_STACK_SIZE, "traversal stack overflow");
                hit_stack[stack_ptr] = entry;
                stack_ptr += 1;
            }
        }
    }

    best.map(|(index, _)| index)
}
