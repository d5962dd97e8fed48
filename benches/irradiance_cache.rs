use criterion::{Criterion, BenchmarkId, black_box, criterion_main, criterion_group};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use fountain_gi::{Bounds3f, Point3f, Spectrum, Vec3f};
use fountain_gi::gi::octree::{CacheSettings, Octree};

fn random_floor_points(n: usize, rng: &mut Xoshiro256Plus) -> Vec<Point3f> {
    (0..n)
        .map(|_| Point3f::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), -1.0))
        .collect()
}

fn build_cache(size: usize) -> Octree {
    let bounds = Bounds3f::with_bounds(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
    let mut octree = Octree::new(bounds, CacheSettings::default());
    let mut rng = Xoshiro256Plus::seed_from_u64(1);
    for p in random_floor_points(size, &mut rng) {
        let r0 = rng.gen_range(0.01..2.0);
        octree.insert(p, Vec3f::unit_z(), r0, Spectrum::uniform(0.5));
    }
    octree
}

fn bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("IrradianceCache");
    let sizes = [16, 256, 4096];
    for size in &sizes {
        group.bench_with_input(BenchmarkId::new("Insert", size), size, |b, &size| {
            b.iter(|| build_cache(black_box(size)))
        });

        group.bench_with_input(BenchmarkId::new("Lookup", size), size, |b, &size| {
            let octree = build_cache(size);
            let mut rng = Xoshiro256Plus::seed_from_u64(2);
            let queries = random_floor_points(256, &mut rng);

            b.iter(|| {
                queries.iter()
                    .filter_map(|&p| octree.lookup(p, Vec3f::unit_z()))
                    .sum::<Spectrum>()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
