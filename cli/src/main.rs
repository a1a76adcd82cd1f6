//! Tools for inspecting road network files outside of a running simulation.

#[macro_use]
extern crate log;

mod random_walk;

use anyhow::{bail, Result};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use structopt::StructOpt;

use abstutil::prettyprint_usize;
use geom::Pt3D;
use road_network::raw::RawRoadNetwork;
use road_network::{NetworkConfig, RoadNetwork};

#[derive(StructOpt)]
#[structopt(name = "rncli", about = "Inspect road networks")]
enum Command {
    /// Print counts and basic stats about a road network
    Summary {
        /// The path to a JSON road network
        #[structopt()]
        input: String,
    },
    /// Fails if any segment refers to a waypoint or neighbor that doesn't exist
    Check {
        /// The path to a JSON road network
        #[structopt()]
        input: String,
    },
    /// Writes every waypoint and segment as GeoJSON, flattened onto the ground plane
    #[structopt(name = "export-debug")]
    ExportDebug {
        /// The path to a JSON road network
        #[structopt(long)]
        input: String,
        /// The GeoJSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Follows randomly chosen segments from a starting waypoint, printing where it goes
    RandomWalk {
        /// The path to a JSON road network
        #[structopt(long)]
        input: String,
        /// The name of the waypoint to start from
        #[structopt(long)]
        start: String,
        /// Stop after this many segments, or earlier at an end point
        #[structopt(long, default_value = "20")]
        steps: usize,
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
        /// The path to a JSON NetworkConfig. Defaults are used if omitted.
        #[structopt(long)]
        config: Option<String>,
    },
    /// Picks a waypoint for traffic to start from, near some position
    Nearby {
        /// The path to a JSON road network
        #[structopt(long)]
        input: String,
        #[structopt(long)]
        x: f64,
        #[structopt(long, default_value = "0")]
        y: f64,
        #[structopt(long)]
        z: f64,
        /// A seed for generating random numbers
        #[structopt(long, default_value = "42")]
        rng_seed: u64,
    },
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::Summary { input } => summary(input)?,
        Command::Check { input } => check(input)?,
        Command::ExportDebug { input, output } => export_debug(input, output)?,
        Command::RandomWalk {
            input,
            start,
            steps,
            rng_seed,
            config,
        } => random_walk::run(input, start, steps, rng_seed, config)?,
        Command::Nearby {
            input,
            x,
            y,
            z,
            rng_seed,
        } => nearby(input, Pt3D::new(x, y, z), rng_seed)?,
    }
    Ok(())
}

fn load(input: &str, config: NetworkConfig) -> Result<RoadNetwork> {
    let raw = RawRoadNetwork::load(input)?;
    Ok(RoadNetwork::new(raw, config))
}

fn summary(input: String) -> Result<()> {
    let map = load(&input, NetworkConfig::default())?;
    let segments = map.all_segments();
    println!(
        "{} waypoints, {} segments, driving on the {:?}",
        prettyprint_usize(map.all_waypoints().len()),
        prettyprint_usize(segments.len()),
        map.driving_side()
    );
    println!(
        "{} end points, {} via waypoints",
        prettyprint_usize(map.all_waypoints().iter().filter(|w| w.is_end_point()).count()),
        prettyprint_usize(map.all_waypoints().iter().filter(|w| w.is_via_wp()).count())
    );
    println!(
        "{} curved, {} jumps, {} without geometry",
        prettyprint_usize(segments.iter().filter(|s| s.has_via_waypoints()).count()),
        prettyprint_usize(segments.iter().filter(|s| s.is_jump).count()),
        prettyprint_usize(segments.iter().filter(|s| !s.has_geometry()).count())
    );
    let total: geom::Distance = segments.iter().map(|s| s.length()).sum();
    println!("{} of driveable length", total);
    Ok(())
}

fn check(input: String) -> Result<()> {
    let map = load(&input, NetworkConfig::default())?;
    let problems = map.unresolved_references();
    if problems.is_empty() {
        info!("All references in {} resolve", input);
        return Ok(());
    }
    for (segment, name) in &problems {
        println!("{} refers to unknown {}", segment, name);
    }
    bail!("{} unresolved references in {}", problems.len(), input);
}

fn export_debug(input: String, output: String) -> Result<()> {
    let map = load(&input, NetworkConfig::with_debug_drawing())?;
    match map.debug_drawing() {
        Some(drawing) => {
            abstutil::write_json(&output, &drawing.to_geojson())?;
            info!(
                "Wrote {} boxes and {} curves to {}",
                drawing.boxes().count(),
                drawing.curves().count(),
                output
            );
            Ok(())
        }
        None => bail!("Debug drawing wasn't enabled"),
    }
}

fn nearby(input: String, pos: Pt3D, rng_seed: u64) -> Result<()> {
    let map = load(&input, NetworkConfig::default())?;
    let mut rng = XorShiftRng::seed_from_u64(rng_seed);
    match map.random_nearby_waypoint(pos, &mut rng) {
        Some(id) => {
            println!("{}", map.get_w(id));
            Ok(())
        }
        None => bail!("No waypoint in {} has anywhere to go", input),
    }
}
