use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anstream::println;
use clap::Parser;
use hrsw::Stopwatch;
use human_duration::human_duration;
use owo_colors::OwoColorize;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use thousands::Separable;

use waypoint::algorithms::astar::SolverOutcome;
use waypoint::problems::street_map::StreetMap;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(long_version = waypoint::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, env = "LOGS", default_value = "/tmp/waypoint.org")]
    pub output: PathBuf,

    /// Streets along the longitude
    #[arg(long, default_value_t = 200u32)]
    pub width: u32,
    /// Streets along the latitude
    #[arg(long, default_value_t = 200u32)]
    pub height: u32,
    #[arg(long, env = "SEED", default_value_t = 0u64)]
    pub seed: u64,

    #[arg(long, default_value_t = 20u32)]
    pub num_routes: u32,
    /// Budget for each route, in milliseconds
    #[arg(long, default_value_t = 1_000u64)]
    pub timeout_ms: u64,

    /// Place-name prefixes to look up
    #[arg(long, default_values_t = ["peet".to_string(), "top".to_string(), "berkeley".to_string()])]
    pub prefixes: Vec<String>,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();
    args.color.write_global();
    println!("Logging to {:?}", args.output.yellow());

    let file = File::create(&args.output)?;
    let mut out = BufWriter::new(file);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    writeln!(out, "* Map")?;
    let mut build_stopwatch = Stopwatch::new_started();
    let map = StreetMap::random_grid(&mut rng, args.width, args.height);
    build_stopwatch.stop();
    writeln!(
        out,
        "{map} built in {}",
        human_duration(&build_stopwatch.elapsed())
    )?;
    println!("{}", map.green());

    writeln!(out, "* Names")?;
    for prefix in &args.prefixes {
        let names = map.locations_by_prefix(prefix);
        writeln!(out, "** {prefix:?}: {} matches", names.len())?;
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        for name in &unique {
            for location in map.locations(name) {
                writeln!(out, "  - {location}")?;
            }
        }
        println!("{}: {} places", prefix.cyan(), names.len());
    }

    writeln!(out, "* Routes")?;
    let timeout = Duration::from_millis(args.timeout_ms);
    let corners: Vec<(f64, f64)> = [map.node_ids().next(), map.node_ids().last()]
        .into_iter()
        .flatten()
        .filter_map(|id| map.position(id))
        .collect();
    let [(lon_a, lat_a), (lon_b, lat_b)] = corners[..] else {
        return Err(std::io::Error::other("The map has no nodes."));
    };
    let (lon_min, lon_max) = (lon_a.min(lon_b), lon_a.max(lon_b));
    let (lat_min, lat_max) = (lat_a.min(lat_b), lat_a.max(lat_b));

    let mut solved = 0u32;
    let mut explored = 0usize;
    for instance in 0..args.num_routes {
        let start = (
            rng.random_range(lon_min..=lon_max),
            rng.random_range(lat_min..=lat_max),
        );
        let end = (
            rng.random_range(lon_min..=lon_max),
            rng.random_range(lat_min..=lat_max),
        );
        let Some(solver) = map.route(start, end, timeout) else {
            writeln!(out, "** Route {instance}: no routable nodes")?;
            continue;
        };

        explored += solver.num_states_explored();
        writeln!(out, "** Route {instance}: {start:?} -> {end:?}")?;
        writeln!(out, "{solver}")?;
        match solver.outcome() {
            SolverOutcome::Solved => {
                solved += 1;
                writeln!(out, "#+begin_src ron\n{:?}\n#+end_src", solver.solution())?;
            }
            SolverOutcome::Unsolvable => println!("Route {instance}: {}", "unsolvable".yellow()),
            SolverOutcome::Timeout => println!("Route {instance}: {}", "timed out".red()),
        }
    }
    println!(
        "Solved {}/{} routes, exploring {} states",
        solved.green(),
        args.num_routes,
        explored.separate_with_commas()
    );

    Ok(())
}
