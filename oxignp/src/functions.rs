//! The protocol through which networks invoke domain behaviour.
//!
//! Every subnode wraps an instance of a [`GnpFunction`]. Judgement
//! functions inspect the domain state and name the outcome (branch)
//! to follow; processing functions act on it and may return a reward.
//! Functions are registered once in a [`FunctionLibrary`], which
//! mints a fresh clone for every subnode referencing them.
mod library;

pub use library::{FunctionInstance, FunctionLibrary};

use crate::parameters::SubnodeParameter;
use crate::EvaluationId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Outcome name used by functions with a single branch.
pub const DEFAULT_BRANCH: &str = "n";

/// Per-call data handed to a function.
#[derive(Clone, Copy, Debug)]
pub struct FunctionCall<'a> {
    /// Id of the node visit within the current episode. Delayed
    /// reward functions report it back through
    /// [`Individual::set_delayed_reward`].
    ///
    /// [`Individual::set_delayed_reward`]: crate::Individual::set_delayed_reward
    pub evaluation_id: EvaluationId,
    /// Index of the worker thread running the evaluation.
    pub thread: usize,
    /// The subnode's decoded parameters.
    pub parameters: &'a [SubnodeParameter],
}

/// The result of a function evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    /// Name of the outcome to follow. `None` selects
    /// [`DEFAULT_BRANCH`].
    pub branch: Option<String>,
    /// Immediate reward, if any.
    pub reward: Option<f64>,
}

impl FunctionResult {
    /// A result following the named outcome, without reward.
    pub fn branch(name: impl Into<String>) -> FunctionResult {
        FunctionResult {
            branch: Some(name.into()),
            reward: None,
        }
    }

    /// A result following the default outcome with a reward.
    pub fn reward(reward: f64) -> FunctionResult {
        FunctionResult {
            branch: None,
            reward: Some(reward),
        }
    }

    /// Name of the outcome to follow.
    pub fn branch_name(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }
}

/// Ordered outcome names registered by a function.
///
/// # Examples
/// ```
/// use oxignp::functions::BranchNames;
///
/// let mut names = BranchNames::default();
/// assert_eq!(names.register("T"), 0);
/// assert_eq!(names.register("F"), 1);
/// assert_eq!(names.register("T"), 0);
/// assert_eq!(names.index_of("F"), Some(1));
/// assert_eq!(names.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BranchNames {
    names: Vec<String>,
    indices: HashMap<String, usize, RandomState>,
}

impl BranchNames {
    /// Registers an outcome, returning its index. Registering
    /// a name twice keeps the first index.
    pub fn register(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&index) = self.indices.get(&name) {
            return index;
        }
        let index = self.names.len();
        self.indices.insert(name.clone(), index);
        self.names.push(name);
        index
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A judgement or processing function invoked by subnodes.
///
/// `S` is the domain state passed through every evaluation.
pub trait GnpFunction<S>: Send + Sync {
    /// Registers the outcomes this function may return.
    /// Defaults to the single outcome [`DEFAULT_BRANCH`].
    fn setup_branches(&self, branches: &mut BranchNames) {
        branches.register(DEFAULT_BRANCH);
    }

    /// Runs the function against the domain state.
    fn evaluate(&mut self, state: &mut S, call: &FunctionCall<'_>) -> FunctionResult;

    /// Whether the function produces rewards worth learning from.
    fn reward_expected(&self) -> bool;

    /// Whether the reward is reported later, through
    /// [`Individual::set_delayed_reward`].
    ///
    /// [`Individual::set_delayed_reward`]: crate::Individual::set_delayed_reward
    fn is_delayed(&self) -> bool {
        false
    }

    /// Display name, possibly depending on parameter values.
    fn name(&self, parameters: &[SubnodeParameter]) -> String;

    /// Called when a subnode is bound to this function for the first
    /// time, or after its function id changed. May overwrite the
    /// parameters with function-specific defaults.
    fn after_function_changed(&self, _parameters: &mut [SubnodeParameter]) {}

    /// Clones the function into a fresh working instance.
    fn box_clone(&self) -> Box<dyn GnpFunction<S>>;
}

/// A single-outcome processing behaviour, adapted into a
/// [`GnpFunction`] by [`OneBranch`] or [`OneBranchDelayed`].
pub trait Action<S>: Clone + Send + Sync + 'static {
    /// Acts on the domain state, returning a reward if any.
    fn perform(&mut self, state: &mut S, call: &FunctionCall<'_>) -> Option<f64>;

    fn name(&self, parameters: &[SubnodeParameter]) -> String;

    fn reward_expected(&self) -> bool {
        true
    }
}

/// Adapts an [`Action`] into a function with a single outcome.
#[derive(Clone, Debug)]
pub struct OneBranch<A>(pub A);

impl<S, A: Action<S>> GnpFunction<S> for OneBranch<A> {
    fn evaluate(&mut self, state: &mut S, call: &FunctionCall<'_>) -> FunctionResult {
        FunctionResult {
            branch: None,
            reward: self.0.perform(state, call),
        }
    }

    fn reward_expected(&self) -> bool {
        self.0.reward_expected()
    }

    fn name(&self, parameters: &[SubnodeParameter]) -> String {
        self.0.name(parameters)
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<S>> {
        Box::new(self.clone())
    }
}

/// Adapts an [`Action`] into a single-outcome function whose
/// reward is injected after the fact. Any reward returned by
/// the action itself is ignored by the learner.
#[derive(Clone, Debug)]
pub struct OneBranchDelayed<A>(pub A);

impl<S, A: Action<S>> GnpFunction<S> for OneBranchDelayed<A> {
    fn evaluate(&mut self, state: &mut S, call: &FunctionCall<'_>) -> FunctionResult {
        FunctionResult {
            branch: None,
            reward: self.0.perform(state, call),
        }
    }

    fn reward_expected(&self) -> bool {
        self.0.reward_expected()
    }

    fn is_delayed(&self) -> bool {
        true
    }

    fn name(&self, parameters: &[SubnodeParameter]) -> String {
        self.0.name(parameters)
    }

    fn box_clone(&self) -> Box<dyn GnpFunction<S>> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Push(u32);

    impl Action<Vec<u32>> for Push {
        fn perform(&mut self, state: &mut Vec<u32>, _: &FunctionCall<'_>) -> Option<f64> {
            state.push(self.0);
            Some(self.0 as f64)
        }

        fn name(&self, _: &[SubnodeParameter]) -> String {
            format!("Push{}", self.0)
        }
    }

    fn call() -> FunctionCall<'static> {
        FunctionCall {
            evaluation_id: 4,
            thread: 0,
            parameters: &[],
        }
    }

    #[test]
    fn one_branch_registers_default() {
        let function = OneBranch(Push(3));
        let mut names = BranchNames::default();
        GnpFunction::<Vec<u32>>::setup_branches(&function, &mut names);
        assert_eq!(names.names(), ["n"]);
    }

    #[test]
    fn one_branch_forwards_reward() {
        let mut function = OneBranch(Push(3));
        let mut state = vec![];
        let result = function.evaluate(&mut state, &call());
        assert_eq!(result, FunctionResult::reward(3.0));
        assert_eq!(result.branch_name(), DEFAULT_BRANCH);
        assert_eq!(state, [3]);
        assert!(!GnpFunction::<Vec<u32>>::is_delayed(&function));
    }

    #[test]
    fn delayed_adapter() {
        let function = OneBranchDelayed(Push(1));
        assert!(GnpFunction::<Vec<u32>>::is_delayed(&function));
        assert!(GnpFunction::<Vec<u32>>::reward_expected(&function));
        let clone = GnpFunction::<Vec<u32>>::box_clone(&function);
        assert!(clone.is_delayed());
        assert_eq!(clone.name(&[]), "Push1");
    }

    #[test]
    fn result_branch_name() {
        assert_eq!(FunctionResult::branch("T").branch_name(), "T");
        assert_eq!(FunctionResult::default().branch_name(), "n");
    }
}
