//! Randomized checks of finished hierarchies against brute force.

use lbvh::{Aabb, Bounds, Bvh, BvhBuilder, ExecutionPolicy, LbvhBuilder, Rayon, Sequential, Threads};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_boxes<const D: usize>(rng: &mut SmallRng, count: usize) -> Vec<Aabb<D>> {
    (0..count)
        .map(|_| {
            let mut min = [0.0f32; D];
            let mut max = [0.0f32; D];
            for axis in 0..D {
                min[axis] = rng.gen_range(-100.0..100.0);
                max[axis] = min[axis] + rng.gen_range(0.0..8.0);
            }
            Aabb::from_corners(min, max)
        })
        .collect()
}

fn random_point<const D: usize>(rng: &mut SmallRng) -> [f32; D] {
    let mut point = [0.0f32; D];
    for value in point.iter_mut() {
        *value = rng.gen_range(-110.0..110.0);
    }
    point
}

fn build<E: ExecutionPolicy, const D: usize>(policy: E, boxes: &[Aabb<D>]) -> Bvh<D> {
    LbvhBuilder::new().with_policy(policy).build(boxes).unwrap()
}

fn sorted(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices
}

fn check_structure<const D: usize>(bvh: &Bvh<D>, boxes: &[Aabb<D>]) {
    let tree = bvh.radix_tree();
    assert_eq!(tree.len(), boxes.len());
    assert_eq!(tree.inner_len(), boxes.len().saturating_sub(1));
    assert_eq!(tree.verify(), Ok(()));

    for slot in 0..tree.len() {
        let primitive = tree.leafs()[slot] as usize;
        assert_eq!(tree.leaf_aabbs()[slot], boxes[primitive]);
    }

    let union = boxes.iter().fold(Aabb::new(), |acc, b| acc.union_of(b));
    if !boxes.is_empty() {
        assert_eq!(bvh.bounds(), union);
    }
}

fn check_queries<const D: usize>(bvh: &Bvh<D>, boxes: &[Aabb<D>], rng: &mut SmallRng) {
    let everything = Aabb::from_corners([-1e6; D], [1e6; D]);
    let all = sorted(bvh.find_overlapping(&everything).collect());
    assert_eq!(all, (0..boxes.len()).collect::<Vec<_>>());

    for query in random_boxes::<D>(rng, 20) {
        let expected: Vec<usize> = (0..boxes.len()).filter(|&i| boxes[i].intersects(&query)).collect();
        assert_eq!(sorted(bvh.find_overlapping(&query).collect()), expected);
    }

    for _ in 0..20 {
        let point = random_point::<D>(rng);
        let expected: Vec<usize> = (0..boxes.len()).filter(|&i| boxes[i].contains(point)).collect();
        assert_eq!(sorted(bvh.find_containing(point).collect()), expected);

        let found = bvh.find_nearest(point, |i| boxes[i].distance_squared(point));
        let brute = boxes
            .iter()
            .map(|b| b.distance_squared(point))
            .fold(None, |best: Option<f32>, d| Some(best.map_or(d, |b| b.min(d))));
        match (found, brute) {
            (Some(i), Some(d)) => assert_eq!(boxes[i].distance_squared(point), d),
            (None, None) => {}
            other => panic!("nearest disagrees with brute force: {:?}", other),
        }
    }
}

fn check_policy<E: ExecutionPolicy + Clone, const D: usize>(policy: E, seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for count in [0, 1, 2, 3, 17, 256, 3000] {
        let boxes = random_boxes::<D>(&mut rng, count);
        let bvh = build(policy.clone(), &boxes);
        check_structure(&bvh, &boxes);
        check_queries(&bvh, &boxes, &mut rng);
    }
}

#[test]
fn sequential_2d() {
    init();
    check_policy::<_, 2>(Sequential, 1);
}

#[test]
fn sequential_3d() {
    init();
    check_policy::<_, 3>(Sequential, 2);
}

#[test]
fn rayon_2d() {
    init();
    check_policy::<_, 2>(Rayon::new(), 3);
}

#[test]
fn rayon_3d() {
    init();
    check_policy::<_, 3>(Rayon::with_threads(3).unwrap(), 4);
}

#[test]
fn threads_2d() {
    init();
    check_policy::<_, 2>(Threads::new(), 5);
}

#[test]
fn threads_3d() {
    init();
    check_policy::<_, 3>(Threads::with_workers(5), 6);
}

#[test]
fn repeated_builds_are_identical() {
    init();
    let mut rng = SmallRng::seed_from_u64(7);
    let boxes = random_boxes::<3>(&mut rng, 5000);

    let first = build(Rayon::new(), &boxes);
    for _ in 0..4 {
        let again = build(Rayon::new(), &boxes);
        let (a, b) = (first.radix_tree(), again.radix_tree());
        assert_eq!(a.left_children(), b.left_children());
        assert_eq!(a.right_children(), b.right_children());
        assert_eq!(a.parents(), b.parents());
        assert_eq!(a.leafs(), b.leafs());
        assert!(a
            .inner_aabbs()
            .iter()
            .zip(b.inner_aabbs())
            .all(|(x, y)| x.bitwise_eq(y)));
    }
}

#[test]
fn coincident_centroids() {
    init();
    let boxes = vec![Aabb::from_corners([1.0, 1.0], [2.0, 2.0]); 100];
    for bvh in [build(Sequential, &boxes), build(Threads::with_workers(4), &boxes)] {
        check_structure(&bvh, &boxes);
        assert_eq!(bvh.radix_tree().leafs(), (0..100).collect::<Vec<u32>>().as_slice());
        assert_eq!(bvh.find_containing([1.5f32, 1.5]).count(), 100);
    }
}

#[test]
fn batch_queries_match_single_queries() {
    init();
    let mut rng = SmallRng::seed_from_u64(8);
    let boxes = random_boxes::<2>(&mut rng, 1000);
    let bvh = build(Rayon::new(), &boxes);

    let points: Vec<[f32; 2]> = (0..200).map(|_| random_point(&mut rng)).collect();
    let list = bvh.find_points(&Threads::with_workers(3), &points);
    for (q, &point) in points.iter().enumerate() {
        assert_eq!(list.get(q), bvh.find_containing(point).collect::<Vec<_>>().as_slice());
    }

    let queries = random_boxes::<2>(&mut rng, 200);
    let list = bvh.find_boxes(&Rayon::new(), &queries);
    for (q, query) in queries.iter().enumerate() {
        assert_eq!(list.get(q), bvh.find_overlapping(query).collect::<Vec<_>>().as_slice());
    }
}
