use crate::traversal::Candidates;
use crate::{Aabb, RadixTree};
use lbvh_utils::ExecutionPolicy;

/// Candidates of many queries packed back to back.
///
/// Query `q` owns `candidates[offsets[q]..offsets[q] + counts[q]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    pub offsets: Vec<usize>,
    pub counts: Vec<usize>,
    pub candidates: Vec<usize>,
}

impl CandidateList {
    /// Number of queries.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, query: usize) -> &[usize] {
        let offset = self.offsets[query];
        &self.candidates[offset..offset + self.counts[query]]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.len()).map(move |query| self.get(query))
    }
}

/// Two passes over the queries: count, then fill the exclusive-scan offsets.
///
/// Traversal order is deterministic, so both passes see the same candidates.
pub(crate) fn find_batch<E, Q, B, P, const D: usize>(
    tree: &RadixTree<D>,
    policy: &E,
    queries: &[Q],
    predicate_for: B,
) -> CandidateList
where
    E: ExecutionPolicy,
    Q: Sync,
    B: Fn(&Q) -> P + Sync + Send,
    P: FnMut(&Aabb<D>) -> bool,
{
    let mut counts = vec![0usize; queries.len()];
    policy.for_each_mut(&mut counts, |q, count| {
        *count = Candidates::new(tree, predicate_for(&queries[q])).count();
    });

    let mut offsets = Vec::with_capacity(counts.len());
    let mut total = 0;
    for &count in &counts {
        offsets.push(total);
        total += count;
    }

    let mut candidates = vec![0usize; total];
    {
        let mut outputs: Vec<&mut [usize]> = Vec::with_capacity(counts.len());
        let mut rest = candidates.as_mut_slice();
        for &count in &counts {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(count);
            outputs.push(head);
            rest = tail;
        }

        policy.for_each_mut(&mut outputs, |q, out| {
            let found = Candidates::new(tree, predicate_for(&queries[q]));
            for (slot, index) in out.iter_mut().zip(found) {
                *slot = index;
            }
        });
    }

    CandidateList {
        offsets,
        counts,
        candidates,
    }
}
