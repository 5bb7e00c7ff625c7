use std::time::Duration;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use hrsw::Stopwatch;
use human_duration::human_duration;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use waypoint::algorithms::astar::SolverOutcome;
use waypoint::problems::street_map::NodeId;
use waypoint::problems::street_map::StreetMap;

/// Maximum time willing to wait for a single benchmark instance.
/// Experiments are carried out at least 5s and at least 100 times, so running a
/// 1s instance takes 1m40s.
const MAX_INSTANCE_TIME: Duration = Duration::from_secs(1);
const SIDES: [u32; 3] = [50, 100, 200];

fn astar(map: &StreetMap, start: NodeId, end: NodeId) -> usize {
    match map.shortest_path(start, end, MAX_INSTANCE_TIME) {
        Ok(solver) => solver.solution().len(),
        Err(_) => 0,
    }
}

fn sample_astar(c: &mut Criterion) {
    let mut group = c.benchmark_group("StreetMap A*");

    for side in SIDES {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(side));
        let map = StreetMap::random_grid(&mut rng, side, side);
        let corner_a: NodeId = 0;
        let corner_b: NodeId = NodeId::from(side * side - 1);
        let instance_name = format!("grid[{side}x{side}]");

        let mut stopwatch = Stopwatch::new_started();
        let outcome = map
            .shortest_path(corner_a, corner_b, MAX_INSTANCE_TIME)
            .map(|s| s.outcome());
        stopwatch.stop();
        if outcome != Ok(SolverOutcome::Solved) {
            log::warn!(
                "Skipping {instance_name} as it's not solved in time ({})",
                human_duration(&stopwatch.elapsed())
            );
            continue;
        }

        group.bench_with_input(
            BenchmarkId::new("A*", &instance_name),
            &(corner_a, corner_b),
            |b, &(s, e)| b.iter(|| astar(&map, s, e)),
        );
    }
    group.finish();
}

fn sample_closest(c: &mut Criterion) {
    let mut group = c.benchmark_group("StreetMap closest");

    for side in SIDES {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(side));
        let map = StreetMap::random_grid(&mut rng, side, side);
        let queries: Vec<(f64, f64)> = (0..1_000)
            .map(|_| {
                (
                    rng.random_range(-122.2900..-122.1000),
                    rng.random_range(37.8500..38.0000),
                )
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("closest", format!("grid[{side}x{side}]")),
            &queries,
            |b, queries| {
                b.iter(|| {
                    queries
                        .iter()
                        .filter_map(|&(lon, lat)| map.closest(lon, lat))
                        .count()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, sample_astar, sample_closest);
criterion_main!(benches);
