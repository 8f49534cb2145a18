//! Santa Fe style foraging with Genetic Network Programming.
//!
//! A population of random networks is decoded and each individual
//! learns the configured trail on its own, in parallel. The champion's
//! greedy walk is then replayed with its execution paths logged, and
//! its network is checkpointed in RON.
//!
//! Usage: `ant [config.toml]` (defaults to `ant.toml`). Log verbosity
//! is controlled through `RUST_LOG`.
mod config;
mod episode;
mod errors;
mod functions;
mod stats;
mod trail;

use config::RunConfig;
use errors::{AntError, Result};
use stats::Stats;
use trail::Trail;

use oxignp::network::render;
use oxignp::parameters::ParameterSchema;
use oxignp::{GnpContext, Individual, RandomStreams};

use log::{debug, error, info};
use rayon::prelude::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "ant.toml".into());
    if let Err(e) = run(&path) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(path: &str) -> Result<()> {
    let config = RunConfig::load(path)?;
    let trail: Trail = std::fs::read_to_string(&config.ant.trail)
        .map_err(|e| AntError::io(&config.ant.trail, e))?
        .parse()?;
    info!(
        "trail {}: {}x{} with {} food, {} moves",
        config.ant.trail.display(),
        trail.width(),
        trail.height(),
        trail.food(),
        config.ant.moves
    );

    let ctx = GnpContext::new(
        config.gnp.clone(),
        functions::library(config.ant.delayed_rewards),
        ParameterSchema::new(),
    )?;
    let size = config.ant.population.get();
    let mut streams = RandomStreams::new(config.ant.seed, size);
    let mut population = streams
        .as_mut_slice()
        .iter_mut()
        .map(|rng| Individual::random(&ctx, rng))
        .collect::<oxignp::Result<Vec<_>>>()?;

    let fitness = population
        .par_iter_mut()
        .zip(streams.as_mut_slice().par_iter_mut())
        .enumerate()
        .map(|(thread, (individual, rng))| {
            episode::evaluate(&ctx, individual, &trail, config.ant.moves, rng, thread)
        })
        .collect::<Result<Vec<usize>>>()?;

    if let Some(stats) = Stats::from(fitness.iter().map(|&f| f as f64)) {
        info!("food eaten over {} individuals: {:?}", size, stats);
    }

    let champion = fitness
        .iter()
        .enumerate()
        .max_by(|(i, a), (j, b)| a.cmp(b).then(j.cmp(i)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    info!("champion {} ate {} of {}", champion, fitness[champion], trail.food());

    let mut best = population[champion].clone();
    debug!("{}", render::network_dot(best.decoded_network()));
    let walk = episode::replay(&ctx, &mut best, &trail, config.ant.moves, streams.stream(champion))?;
    info!("champion walk, {} moves:\n{}", walk.moves(), walk);

    if let Some(checkpoint) = &config.ant.checkpoint {
        let state = best.state(&ctx, streams.stream(champion))?;
        let text = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())?;
        std::fs::write(checkpoint, text).map_err(|e| AntError::io(checkpoint, e))?;
        info!("champion written to {}", checkpoint.display());
    }
    Ok(())
}
