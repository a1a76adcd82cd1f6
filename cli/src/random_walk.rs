use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use road_network::{NetworkConfig, Segment};

pub fn run(
    input: String,
    start: String,
    steps: usize,
    rng_seed: u64,
    config: Option<String>,
) -> Result<()> {
    let config: NetworkConfig = match config {
        Some(path) => abstutil::read_json(&path).context("loading config")?,
        None => NetworkConfig::default(),
    };
    let map = crate::load(&input, config)?;
    let mut rng = XorShiftRng::seed_from_u64(rng_seed);

    let mut at = map
        .find_waypoint(&start)
        .with_context(|| format!("no waypoint named {} in {}", start, input))?;
    println!("Starting at {}", map.get_w(at));
    for step in 0..steps {
        let s = match map.next_segment(at, &[], &mut rng) {
            Some(s) => map.get_s(s),
            None => {
                println!("Reached end point {} after {} steps", map.get_w(at).name, step);
                return Ok(());
            }
        };
        describe(s);
        match s.to() {
            Some(to) => {
                at = to;
            }
            None => {
                warn!("{} leads to unknown {}, stopping", s, s.to_name);
                return Ok(());
            }
        }
    }
    println!("Stopped at {}", map.get_w(at));
    Ok(())
}

fn describe(s: &Segment) {
    if s.is_jump {
        println!("  jump along {} to {}", s.name, s.to_name);
    } else {
        println!(
            "  {} to {}: {} at {}, heading {}",
            s.name,
            s.to_name,
            s.length(),
            s.speed,
            s.heading(geom::Distance::ZERO)
        );
    }
}
