// Criterion benchmarks for the planning hot paths.
//
// Benchmarks:
//   - steepness_field:  full steepness computation over a 128x128 region
//   - nav_graph_build:  graph construction from the no-vegetation surface
//   - find_site:        one unoccupied 9x9 site search (candidates + scoring)
//   - plan_road:        corner-to-corner route on a fresh graph
//
// Run with: cargo bench -p plotwright_plan --bench site_search

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use plotwright_plan::config::PlannerConfig;
use plotwright_plan::prng::PlanRng;
use plotwright_plan::region::Region;
use plotwright_plan::site::SiteRequest;
use plotwright_plan::terrain::HeightMap;
use plotwright_plan::types::{Coord, Criterion as Elevation, Size};
use plotwright_plan::world::GridTerrain;

const SIZE: usize = 128;

fn terrain() -> GridTerrain {
    let heights = HeightMap::from_fn(SIZE, SIZE, |x, z| {
        let (x, z) = (x as f64, z as f64);
        64 + ((x / 11.0).sin() * 4.0 + (z / 17.0).cos() * 3.0) as i32
    });
    GridTerrain::from_heights(Coord::new(0, 0, 0), 128, &heights, "grass_block")
}

fn fresh_region(terrain: &GridTerrain) -> Region<GridTerrain> {
    match Region::covering(terrain.clone(), PlannerConfig::default()) {
        Ok(region) => region,
        Err(e) => panic!("bench region: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Benchmark: steepness field
// ---------------------------------------------------------------------------

fn bench_steepness(c: &mut Criterion) {
    let terrain = terrain();
    let mut region = fresh_region(&terrain);
    region.surface(Elevation::MotionBlockingNoTrees).unwrap();

    c.bench_function("steepness_field_128", |b| {
        b.iter(|| {
            region.invalidate_steepness();
            black_box(region.ensure_steepness().unwrap().len());
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark: nav graph construction
// ---------------------------------------------------------------------------

fn bench_nav_graph(c: &mut Criterion) {
    let terrain = terrain();
    let mut region = fresh_region(&terrain);
    region.ensure_steepness().unwrap();

    c.bench_function("nav_graph_build_128", |b| {
        b.iter(|| black_box(region.rebuild_graph().unwrap().edge_count()));
    });
}

// ---------------------------------------------------------------------------
// Benchmark: site search and routing
// ---------------------------------------------------------------------------

fn bench_find_site(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");
    group.sample_size(30);

    let terrain = terrain();
    let mut region = fresh_region(&terrain);
    region.ensure_graph().unwrap();
    let request = SiteRequest::new(Size::new(9, 9)).without_occupying();
    let mut rng = PlanRng::new(7);

    group.bench_function("find_site_9x9", |b| {
        b.iter(|| black_box(region.find_site(&request, &mut rng).ok()));
    });

    group.bench_function("plan_road_corner_to_corner", |b| {
        b.iter_with_setup(
            || {
                let mut region = fresh_region(&terrain);
                region.ensure_graph().unwrap();
                region
            },
            |mut region| {
                black_box(
                    region
                        .plan_road(Coord::new(2, 64, 2), Coord::new(125, 64, 125))
                        .map(|p| p.len()),
                )
            },
        );
    });

    group.finish();
}

criterion_group!(benches, bench_steepness, bench_nav_graph, bench_find_site);
criterion_main!(benches);
