//! Genome-owning individuals and the execution engine.

use crate::functions::FunctionResult;
use crate::learning::Reward;
use crate::network::{Mode, Network, NodeType};
use crate::{BranchId, EvaluationId, GnpContext, GnpError, NodeId, Result, SubnodeId};

use ahash::RandomState;
use log::{debug, trace};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet};

/// A single node visit of an execution path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeEvaluation {
    pub node: NodeId,
    pub node_type: NodeType,
    pub subnode: SubnodeId,
    pub branch: BranchId,
    /// Subnode value at the time of the visit.
    pub q_at_exec: f64,
    pub evaluation_id: EvaluationId,
    pub result: FunctionResult,
}

/// A reward awaiting its value.
#[derive(Clone, Debug)]
struct PendingReward {
    node: NodeId,
    subnode: SubnodeId,
    path: Vec<NodeEvaluation>,
}

/// A GNP individual: a genome, the network decoded from it,
/// and the bookkeeping of the current evaluation episode.
///
/// An episode spans any number of evaluation calls and is closed
/// by [`after_evaluation`]. Evaluation ids and delayed rewards live
/// until then, while the execution path starts over with every call.
/// Rewards are credited along the path of the call that earned them.
///
/// An individual must not be evaluated concurrently, but distinct
/// individuals may be evaluated in parallel, each with its own
/// random stream.
///
/// [`after_evaluation`]: Individual::after_evaluation
#[derive(Debug)]
pub struct Individual<S> {
    pub(crate) genome: Vec<f64>,
    pub(crate) network: Network<S>,
    pub(crate) initialize: bool,
    path: Vec<NodeEvaluation>,
    all_paths: Vec<Vec<NodeEvaluation>>,
    pending: HashMap<EvaluationId, PendingReward, RandomState>,
    execution_ids: HashSet<EvaluationId, RandomState>,
    evaluation_count: EvaluationId,
}

impl<S> Individual<S> {
    /// Creates an individual over `genome`, with freshly drawn
    /// node types and start node. The network is decoded on
    /// first use.
    ///
    /// # Errors
    /// Returns [`GnpError::GenomeLength`] if the genome does not
    /// match the context's gene layout.
    pub fn new(ctx: &GnpContext<S>, genome: Vec<f64>, rng: &mut dyn RngCore) -> Result<Individual<S>> {
        check_len(ctx, &genome)?;
        Ok(Individual::with_network(genome, Network::new(ctx.config(), rng)))
    }

    /// Creates an individual over a random genome.
    pub fn random(ctx: &GnpContext<S>, rng: &mut dyn RngCore) -> Result<Individual<S>> {
        let genome = ctx.layout().random_genome(rng);
        Individual::new(ctx, genome, rng)
    }

    pub(crate) fn with_network(genome: Vec<f64>, network: Network<S>) -> Individual<S> {
        Individual {
            genome,
            network,
            initialize: true,
            path: vec![],
            all_paths: vec![],
            pending: HashMap::default(),
            execution_ids: HashSet::default(),
            evaluation_count: 0,
        }
    }

    pub fn genome(&self) -> &[f64] {
        &self.genome
    }

    /// Mutable access to the genome. The network is
    /// re-decoded before the next evaluation.
    pub fn genome_mut(&mut self) -> &mut [f64] {
        self.initialize = true;
        &mut self.genome
    }

    /// Replaces the genome. The network is re-decoded
    /// before the next evaluation.
    pub fn set_genome(&mut self, ctx: &GnpContext<S>, genome: Vec<f64>) -> Result<()> {
        check_len(ctx, &genome)?;
        self.genome = genome;
        self.initialize = true;
        Ok(())
    }

    /// The network, decoded from the current genome if needed.
    pub fn network(&mut self, ctx: &GnpContext<S>, rng: &mut dyn RngCore) -> Result<&Network<S>> {
        self.prepare(ctx, rng)?;
        Ok(&self.network)
    }

    /// The network as last decoded, without checking the genome.
    pub fn decoded_network(&self) -> &Network<S> {
        &self.network
    }

    /// The execution path of the last evaluation call.
    pub fn execution_path(&self) -> &[NodeEvaluation] {
        &self.path
    }

    /// Every finished evaluation call's path of the current
    /// episode, when `store_all_execution_paths` is configured.
    pub fn all_execution_paths(&self) -> &[Vec<NodeEvaluation>] {
        &self.all_paths
    }

    pub fn clear_execution_paths(&mut self) {
        self.all_paths.clear();
    }

    /// Evaluation ids of delayed rewards still waiting for a value.
    pub fn pending_evaluation_ids(&self) -> impl Iterator<Item = EvaluationId> + '_ {
        self.execution_ids.iter().copied()
    }

    /// Number of node visits in the current episode.
    pub fn evaluation_count(&self) -> EvaluationId {
        self.evaluation_count
    }

    /// Evaluates the network, learning from rewards and
    /// exploring according to the selection policy. `probability`
    /// overrides the policy's exploration rate.
    ///
    /// Returns the visits made by this call.
    pub fn evaluate_learn_explore(
        &mut self,
        ctx: &GnpContext<S>,
        rng: &mut dyn RngCore,
        thread: usize,
        probability: Option<f64>,
        state: &mut S,
    ) -> Result<&[NodeEvaluation]> {
        let mode = Mode {
            learn: true,
            explore: true,
            probability,
        };
        self.evaluate(ctx, rng, thread, mode, state)
    }

    /// Evaluates the network greedily, learning from rewards.
    pub fn evaluate_learn_dont_explore(
        &mut self,
        ctx: &GnpContext<S>,
        rng: &mut dyn RngCore,
        thread: usize,
        state: &mut S,
    ) -> Result<&[NodeEvaluation]> {
        let mode = Mode {
            learn: true,
            explore: false,
            probability: None,
        };
        self.evaluate(ctx, rng, thread, mode, state)
    }

    /// Evaluates the network greedily, leaving values untouched.
    pub fn evaluate_dont_learn_dont_explore(
        &mut self,
        ctx: &GnpContext<S>,
        rng: &mut dyn RngCore,
        thread: usize,
        state: &mut S,
    ) -> Result<&[NodeEvaluation]> {
        let mode = Mode {
            learn: false,
            explore: false,
            probability: None,
        };
        self.evaluate(ctx, rng, thread, mode, state)
    }

    /// Closes the current episode. Execution paths, unresolved
    /// delayed rewards and evaluation ids are cleared.
    pub fn after_evaluation(&mut self) {
        self.path.clear();
        self.all_paths.clear();
        self.pending.clear();
        self.execution_ids.clear();
        self.evaluation_count = 0;
    }

    /// Supplies the value of a delayed reward.
    ///
    /// Unknown ids, including ids of already resolved rewards or
    /// of closed episodes, are ignored. A missing or zero value
    /// resolves the reward without learning from it.
    ///
    /// # Errors
    /// Returns [`GnpError::NonFiniteReward`] on NaN or infinite
    /// values; no subnode value is changed in that case.
    pub fn set_delayed_reward(
        &mut self,
        ctx: &GnpContext<S>,
        evaluation_id: EvaluationId,
        value: Option<f64>,
    ) -> Result<()> {
        let pending = match self.pending.remove(&evaluation_id) {
            Some(pending) => pending,
            None => return Ok(()),
        };
        self.execution_ids.remove(&evaluation_id);
        if let Some(value) = value.filter(|&v| v != 0.0) {
            let reward = Reward {
                node: pending.node,
                subnode: pending.subnode,
                path: &pending.path,
                evaluation_id,
                value: Some(value),
            };
            ctx.distributor().distribute(&reward, &mut self.network)?;
        }
        Ok(())
    }

    /// Decodes the genome if it may have changed since the last
    /// decode, resetting the episode when it does.
    pub(crate) fn prepare(&mut self, ctx: &GnpContext<S>, rng: &mut dyn RngCore) -> Result<()> {
        if self.initialize {
            if self.network.generate(ctx, &mut self.genome, rng, false)? {
                debug!("genome changed, episode reset");
                self.after_evaluation();
            }
            self.initialize = false;
        }
        Ok(())
    }

    fn evaluate(
        &mut self,
        ctx: &GnpContext<S>,
        rng: &mut dyn RngCore,
        thread: usize,
        mode: Mode,
        state: &mut S,
    ) -> Result<&[NodeEvaluation]> {
        self.prepare(ctx, rng)?;

        self.path.clear();
        let mut remaining = i64::from(ctx.config().max_time);
        let mut current = self.network.start_node();
        while remaining > 0 {
            let node = self.network.node_mut(current);
            let node_type = node.node_type();
            remaining -= i64::from(node_type.time_cost(ctx.config()));

            let evaluation_id = self.evaluation_count;
            let visit = match node.visit(ctx, rng, thread, mode, state, evaluation_id)? {
                Some(visit) => visit,
                None => break,
            };

            if mode.learn && visit.reward_expected {
                if visit.delayed {
                    self.pending.insert(
                        evaluation_id,
                        PendingReward {
                            node: current,
                            subnode: visit.subnode,
                            path: self.path.clone(),
                        },
                    );
                    self.execution_ids.insert(evaluation_id);
                } else if let Some(value) = visit.result.reward.filter(|&r| r != 0.0) {
                    let reward = Reward {
                        node: current,
                        subnode: visit.subnode,
                        path: &self.path,
                        evaluation_id,
                        value: Some(value),
                    };
                    ctx.distributor().distribute(&reward, &mut self.network)?;
                }
            }

            trace!(
                "visit {}: {:?} node {} subnode {} -> node {}",
                evaluation_id,
                node_type,
                current,
                visit.subnode,
                visit.target
            );
            self.path.push(NodeEvaluation {
                node: current,
                node_type,
                subnode: visit.subnode,
                branch: visit.branch,
                q_at_exec: visit.q_at_exec,
                evaluation_id,
                result: visit.result,
            });
            self.evaluation_count += 1;
            current = visit.target;
        }

        if ctx.config().store_all_execution_paths {
            self.all_paths.push(self.path.clone());
        }
        Ok(&self.path)
    }
}

impl<S> Clone for Individual<S> {
    /// Copies the genome and network. The copy starts
    /// with no evaluation in progress.
    fn clone(&self) -> Self {
        Individual {
            genome: self.genome.clone(),
            network: self.network.clone(),
            initialize: self.initialize,
            path: vec![],
            all_paths: vec![],
            pending: HashMap::default(),
            execution_ids: HashSet::default(),
            evaluation_count: 0,
        }
    }
}

fn check_len<S>(ctx: &GnpContext<S>, genome: &[f64]) -> Result<()> {
    let expected = ctx.layout().genome_len();
    if genome.len() == expected {
        Ok(())
    } else {
        Err(GnpError::GenomeLength {
            expected,
            actual: genome.len(),
        })
    }
}
