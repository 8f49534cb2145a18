//! Shared fixtures for unit tests.

use crate::functions::{
    Action, BranchNames, FunctionCall, FunctionLibrary, FunctionResult, GnpFunction,
    OneBranchDelayed,
};
use crate::individual::NodeEvaluation;
use crate::network::NodeType;
use crate::parameters::{
    GeneDescriptor, MutationStrategy, ParameterSchema, ParameterSpec, SubnodeParameter,
};
use crate::{EvaluationId, GnpConfig, GnpContext, LearningConfig, SelectorConfig};

use std::num::NonZeroUsize;

/// Domain state of the fixtures: ids reported by delayed functions.
pub type TestState = Vec<EvaluationId>;

/// Value written by the function-changed hook of processing fixtures.
pub const HOOK_DEFAULT: i64 = 77;

/// Judgement function with outcomes `R1` and `R2`, always taking `R2`.
#[derive(Clone, Copy, Debug)]
pub struct AlwaysR2;

impl<S> GnpFunction<S> for AlwaysR2 {
    fn setup_branches(&self, branches: &mut BranchNames) {
        branches.register("R1");
        branches.register("R2");
    }

    fn evaluate(&mut self, _: &mut S, _: &FunctionCall<'_>) -> FunctionResult {
        FunctionResult::branch("R2")
    }

    fn reward_expected(&self) -> bool {
        false
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "AlwaysR2".into()
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<S>> {
        Box::new(*self)
    }
}

/// Processing function rewarding every call with 10.
#[derive(Clone, Copy, Debug)]
pub struct RewardTen;

impl<S> GnpFunction<S> for RewardTen {
    fn evaluate(&mut self, _: &mut S, _: &FunctionCall<'_>) -> FunctionResult {
        FunctionResult::reward(10.0)
    }

    fn reward_expected(&self) -> bool {
        true
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "RewardTen".into()
    }

    fn after_function_changed(&self, parameters: &mut [SubnodeParameter]) {
        parameters[0].set_int("i1", HOOK_DEFAULT);
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<S>> {
        Box::new(*self)
    }
}

/// Delayed-reward action recording its evaluation ids.
#[derive(Clone, Copy, Debug)]
pub struct Report;

impl Action<TestState> for Report {
    fn perform(&mut self, state: &mut TestState, call: &FunctionCall<'_>) -> Option<f64> {
        state.push(call.evaluation_id);
        None
    }

    fn name(&self, _: &[SubnodeParameter]) -> String {
        "Report".into()
    }
}

/// [`Report`] with the same function-changed hook as [`RewardTen`].
#[derive(Clone, Debug)]
pub struct DelayedReport(OneBranchDelayed<Report>);

impl GnpFunction<TestState> for DelayedReport {
    fn evaluate(&mut self, state: &mut TestState, call: &FunctionCall<'_>) -> FunctionResult {
        self.0.evaluate(state, call)
    }

    fn reward_expected(&self) -> bool {
        GnpFunction::<TestState>::reward_expected(&self.0)
    }

    fn is_delayed(&self) -> bool {
        GnpFunction::<TestState>::is_delayed(&self.0)
    }

    fn name(&self, parameters: &[SubnodeParameter]) -> String {
        GnpFunction::<TestState>::name(&self.0, parameters)
    }

    fn after_function_changed(&self, parameters: &mut [SubnodeParameter]) {
        parameters[0].set_int("i1", HOOK_DEFAULT);
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<TestState>> {
        Box::new(self.clone())
    }
}

/// Judgement id 0: [`AlwaysR2`]; processing ids 0: [`RewardTen`],
/// 1: [`DelayedReport`].
pub fn library() -> FunctionLibrary<TestState> {
    FunctionLibrary::new()
        .with_judgement(AlwaysR2)
        .with_processing(RewardTen)
        .with_processing(DelayedReport(OneBranchDelayed(Report)))
}

/// A two-integer parameter followed by an integer-and-float one.
pub fn schema() -> ParameterSchema {
    ParameterSchema::new()
        .parameter(
            ParameterSpec::new("ints")
                .gene(GeneDescriptor::integer("i1", -1, 100).with_probability(0.2))
                .gene(GeneDescriptor::integer("i2", -1, 100).with_probability(0.2)),
        )
        .parameter(
            ParameterSpec::new("mixed")
                .gene(GeneDescriptor::integer("i1", -1, 100).with_probability(0.2))
                .gene(
                    GeneDescriptor::float("d2", 0.0, 50.5)
                        .with_probability(0.2)
                        .with_strategy(MutationStrategy::Gauss {
                            stdev: 0.1,
                            out_of_bounds_retries: 20,
                            bounded: false,
                        }),
                ),
        )
}

/// Two judgement and three processing nodes of up to two subnodes.
pub fn config() -> GnpConfig {
    GnpConfig {
        judgement_node_count: 2,
        processing_node_count: 3,
        max_subnodes: NonZeroUsize::new(2).unwrap(),
        max_time: 20,
        judgement_time: 1,
        processing_time: 5,
        mutation_probability: 0.1,
        selector: SelectorConfig::EGreedy { epsilon: 0.1 },
        learning: LearningConfig::Sarsa {
            alpha: 0.5,
            gamma: 0.9,
        },
        ..GnpConfig::zero()
    }
}

pub fn context() -> GnpContext<TestState> {
    context_with(config())
}

pub fn context_with(config: GnpConfig) -> GnpContext<TestState> {
    GnpContext::new(config, library(), schema()).unwrap()
}

/// A path entry visiting subnode `subnode` of processing node `node`.
pub fn visit(node: usize, subnode: usize, evaluation_id: EvaluationId) -> NodeEvaluation {
    NodeEvaluation {
        node,
        node_type: NodeType::Processing,
        subnode,
        branch: subnode,
        q_at_exec: 0.0,
        evaluation_id,
        result: FunctionResult::default(),
    }
}
