//! Fitness evaluation of individuals on a trail.
use crate::errors::Result;
use crate::trail::{Ant, Trail};

use oxignp::network::render;
use oxignp::{GnpContext, Individual, NodeEvaluation};

use log::{debug, info};
use rand::RngCore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    LearnExplore,
    Greedy,
}

/// Runs one evaluation call of the given phase.
fn step(
    ctx: &GnpContext<Ant>,
    individual: &mut Individual<Ant>,
    rng: &mut dyn RngCore,
    thread: usize,
    phase: Phase,
    ant: &mut Ant,
) -> Result<Vec<NodeEvaluation>> {
    let path = match phase {
        Phase::LearnExplore => individual.evaluate_learn_explore(ctx, rng, thread, None, ant)?,
        Phase::Greedy => individual.evaluate_dont_learn_dont_explore(ctx, rng, thread, ant)?,
    };
    Ok(path.to_vec())
}

/// Forages until moves or food run out, or an evaluation call makes
/// no move. Rewards owed by delayed moves are paid after every call.
/// `on_call` sees each call's visits and the ant after them.
fn forage(
    ctx: &GnpContext<Ant>,
    individual: &mut Individual<Ant>,
    rng: &mut dyn RngCore,
    thread: usize,
    phase: Phase,
    ant: &mut Ant,
    mut on_call: impl FnMut(&Individual<Ant>, &[NodeEvaluation], &Ant),
) -> Result<()> {
    let mut previous_moves = ant.moves();
    while ant.active() {
        let path = step(ctx, individual, rng, thread, phase, ant)?;
        on_call(individual, &path, ant);
        if ant.moves() == previous_moves {
            break;
        }
        previous_moves = ant.moves();
        for evaluation_id in ant.take_owed_rewards() {
            individual.set_delayed_reward(ctx, evaluation_id, Some(1.0))?;
        }
    }
    individual.after_evaluation();
    Ok(())
}

/// Lets the individual learn the trail while exploring, then walks it
/// greedily on a fresh copy. Returns the food eaten in the greedy walk.
pub fn evaluate(
    ctx: &GnpContext<Ant>,
    individual: &mut Individual<Ant>,
    trail: &Trail,
    moves: usize,
    rng: &mut dyn RngCore,
    thread: usize,
) -> Result<usize> {
    let mut ant = Ant::new(trail, moves);
    forage(ctx, individual, rng, thread, Phase::LearnExplore, &mut ant, |_, _, _| {})?;
    debug!(
        "thread {}: learning phase ate {} of {} in {} moves",
        thread,
        ant.eaten(),
        trail.food(),
        ant.moves()
    );

    let mut ant = Ant::new(trail, moves);
    forage(ctx, individual, rng, thread, Phase::Greedy, &mut ant, |_, _, _| {})?;
    Ok(ant.eaten())
}

/// Walks the trail greedily, logging every call's execution path,
/// and returns the ant at the end of the walk.
pub fn replay(
    ctx: &GnpContext<Ant>,
    individual: &mut Individual<Ant>,
    trail: &Trail,
    moves: usize,
    rng: &mut dyn RngCore,
) -> Result<Ant> {
    let mut ant = Ant::new(trail, moves);
    let mut call = 0;
    forage(ctx, individual, rng, 0, Phase::Greedy, &mut ant, |individual, path, ant| {
        call += 1;
        info!(
            "call {} (eaten {}, moves {}): {}",
            call,
            ant.eaten(),
            ant.moves(),
            render::execution_path_string(individual.decoded_network(), path)
        );
        debug!("{}", render::execution_path_dot(individual.decoded_network(), path));
    })?;
    Ok(ant)
}
