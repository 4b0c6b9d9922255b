use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use kd_index::{IndexLess, KdTree, RelaxedKdTree, SquareEuclidean, StaticRank};

type Relaxed = RelaxedKdTree<[f64; 2], u32, StaticRank<2>>;
type Strict = KdTree<[f64; 2], u32, StaticRank<2>, IndexLess>;

fn random_points(n: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)])
        .collect()
}

fn build_relaxed(points: &[[f64; 2]]) -> Relaxed {
    let mut tree = Relaxed::default();
    for (i, p) in points.iter().enumerate() {
        tree.insert(*p, i as u32);
    }
    tree
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let points = random_points(10_000, 42);

    c.bench_function("insert 10k (relaxed)", |b| {
        b.iter(|| build_relaxed(&points))
    });

    c.bench_function("bulk build 10k (strict)", |b| {
        b.iter(|| {
            points
                .iter()
                .enumerate()
                .map(|(i, p)| (*p, i as u32))
                .collect::<Strict>()
        })
    });

    let tree = build_relaxed(&points);

    c.bench_function("range query (relaxed)", |b| {
        b.iter(|| tree.range([200.0, 200.0], [300.0, 300.0]).count())
    });

    let origin = [512.3, 487.9];
    c.bench_function("nearest 10 (relaxed)", |b| {
        b.iter(|| {
            tree.neighbors(&origin, SquareEuclidean)
                .take(10)
                .map(|(d, _, _)| d)
                .sum::<f64>()
        })
    });

    c.bench_function("mixed insert/erase (relaxed)", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tree = build_relaxed(&points[..1000]);
        b.iter(|| {
            let p = [rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)];
            let pos = tree.insert(p, 0);
            tree.erase_at(pos).unwrap();
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
