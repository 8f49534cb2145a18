//! An implementation of Genetic Network Programming (GNP) with
//! online reinforcement learning of subnode values.
//!
//! A flat numeric genome is decoded into a directed graph of
//! judgement (decision) and processing (action) nodes. Each node
//! holds several alternative subnodes wrapping user-supplied
//! functions; an evaluation walks the graph under a time budget,
//! choosing a subnode at every visit through a pluggable selection
//! policy, and learns subnode values from the rewards emitted along
//! the way (SARSA, optionally with eligibility traces). Rewards may
//! also be delayed and injected later by the caller.
//!
//! Genetic operators and population management are left to the
//! surrounding evolutionary framework: this crate only decodes,
//! evaluates, learns and persists individual networks.
//!
//! # Example usage: a counter that is rewarded for incrementing
//! ```
//! use oxignp::functions::{Action, FunctionCall, FunctionLibrary, OneBranch};
//! use oxignp::parameters::ParameterSchema;
//! use oxignp::{GnpConfig, GnpContext, Individual, LearningConfig, RandomStreams, SelectorConfig};
//!
//! #[derive(Clone)]
//! struct Increment;
//!
//! impl Action<u32> for Increment {
//!     fn perform(&mut self, counter: &mut u32, _: &FunctionCall<'_>) -> Option<f64> {
//!         *counter += 1;
//!         Some(1.0)
//!     }
//!
//!     fn name(&self, _: &[oxignp::parameters::SubnodeParameter]) -> String {
//!         "Increment".into()
//!     }
//! }
//!
//! fn main() -> oxignp::Result<()> {
//!     let config = GnpConfig {
//!         processing_node_count: 4,
//!         max_time: 20,
//!         judgement_time: 1,
//!         processing_time: 5,
//!         selector: SelectorConfig::EGreedy { epsilon: 0.1 },
//!         learning: LearningConfig::Sarsa { alpha: 0.5, gamma: 0.9 },
//!         ..GnpConfig::zero()
//!     };
//!     let library: FunctionLibrary<u32> = FunctionLibrary::new().with_processing(OneBranch(Increment));
//!     let ctx = GnpContext::new(config, library, ParameterSchema::new())?;
//!
//!     let mut streams = RandomStreams::new(7, 1);
//!     let mut individual = Individual::random(&ctx, streams.stream(0))?;
//!
//!     let mut counter = 0;
//!     let path = individual.evaluate_learn_explore(&ctx, streams.stream(0), 0, None, &mut counter)?;
//!     assert_eq!(path.len(), 4);
//!     assert_eq!(counter, 4);
//!     individual.after_evaluation();
//!     Ok(())
//! }
//! ```

mod config;
mod context;
mod errors;
mod rng;

pub mod functions;
pub mod individual;
pub mod layout;
pub mod learning;
pub mod network;
pub mod parameters;
pub mod selection;
pub mod serialization;

#[cfg(test)]
mod testing;

pub use config::*;
pub use context::GnpContext;
pub use errors::*;
pub use individual::{Individual, NodeEvaluation};
pub use network::{Network, NodeType};
pub use rng::RandomStreams;

/// Index of a node within a network.
pub type NodeId = usize;
/// Index of a subnode within its node.
pub type SubnodeId = usize;
/// Index of a branch within its node.
pub type BranchId = usize;
/// Identifier of a node visit within an evaluation episode.
pub type EvaluationId = usize;
