//! Network functions steering an [`Ant`].
use crate::trail::Ant;

use oxignp::functions::{
    Action, BranchNames, FunctionCall, FunctionLibrary, FunctionResult, GnpFunction, OneBranch,
    OneBranchDelayed,
};
use oxignp::parameters::SubnodeParameter;

/// Judgement on the cell ahead: `T` if it holds food, `F` otherwise.
#[derive(Clone, Copy, Debug)]
pub struct IfFoodAhead;

impl GnpFunction<Ant> for IfFoodAhead {
    fn setup_branches(&self, branches: &mut BranchNames) {
        branches.register("T");
        branches.register("F");
    }

    fn evaluate(&mut self, ant: &mut Ant, _: &FunctionCall<'_>) -> FunctionResult {
        FunctionResult::branch(if ant.food_ahead() { "T" } else { "F" })
    }

    fn reward_expected(&self) -> bool {
        false
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Food ahead?".into()
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<Ant>> {
        Box::new(*self)
    }
}

/// Steps forward, rewarded with 1 when food is eaten.
#[derive(Clone, Copy, Debug)]
pub struct Move;

impl Action<Ant> for Move {
    fn perform(&mut self, ant: &mut Ant, _: &FunctionCall<'_>) -> Option<f64> {
        ant.step().then(|| 1.0)
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Move".into()
    }
}

/// Steps forward. Evaluations that ate are recorded on the ant and
/// rewarded by the episode loop after the call returns.
#[derive(Clone, Copy, Debug)]
pub struct DelayedRewardMove;

impl Action<Ant> for DelayedRewardMove {
    fn perform(&mut self, ant: &mut Ant, call: &FunctionCall<'_>) -> Option<f64> {
        if ant.step() {
            ant.owe_reward(call.evaluation_id);
        }
        None
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Move (delayed)".into()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Left;

impl Action<Ant> for Left {
    fn perform(&mut self, ant: &mut Ant, _: &FunctionCall<'_>) -> Option<f64> {
        ant.turn_left();
        None
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Turn left".into()
    }

    fn reward_expected(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Right;

impl Action<Ant> for Right {
    fn perform(&mut self, ant: &mut Ant, _: &FunctionCall<'_>) -> Option<f64> {
        ant.turn_right();
        None
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Turn right".into()
    }

    fn reward_expected(&self) -> bool {
        false
    }
}

/// The ant's function set. Processing ids: 0 move, 1 left, 2 right.
pub fn library(delayed_rewards: bool) -> FunctionLibrary<Ant> {
    let library = FunctionLibrary::new().with_judgement(IfFoodAhead);
    let library = if delayed_rewards {
        library.with_processing(OneBranchDelayed(DelayedRewardMove))
    } else {
        library.with_processing(OneBranch(Move))
    };
    library
        .with_processing(OneBranch(Left))
        .with_processing(OneBranch(Right))
}
