use super::{Branch, Subnode};

use crate::functions::{FunctionCall, FunctionResult};
use crate::selection;
use crate::{BranchId, GnpConfig, GnpContext, GnpError, NodeId, Result, SubnodeId};

use log::trace;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The role of a node in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Decision node: selects a branch, never rewarded directly.
    Judgement = 1,
    /// Action node: may emit rewards; one branch per subnode.
    Processing = 2,
}

impl NodeType {
    /// Numeric code used in text serialization.
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<NodeType> {
        match code {
            1 => Some(NodeType::Judgement),
            2 => Some(NodeType::Processing),
            _ => None,
        }
    }

    /// Time consumed by visiting a node of this type.
    pub fn time_cost(self, config: &GnpConfig) -> u32 {
        match self {
            NodeType::Judgement => config.judgement_time,
            NodeType::Processing => config.processing_time,
        }
    }

    pub(crate) fn symbol(self) -> char {
        match self {
            NodeType::Judgement => 'J',
            NodeType::Processing => 'P',
        }
    }
}

/// How an evaluation call treats exploration and learning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Mode {
    pub learn: bool,
    pub explore: bool,
    pub probability: Option<f64>,
}

/// The outcome of a single node visit.
#[derive(Clone, Debug)]
pub(crate) struct Visit {
    pub subnode: SubnodeId,
    pub branch: BranchId,
    pub target: NodeId,
    pub q_at_exec: f64,
    pub result: FunctionResult,
    pub delayed: bool,
    pub reward_expected: bool,
}

/// A network node: a set of alternative subnodes
/// and the branches leaving them.
#[derive(Debug)]
pub struct Node<S> {
    pub(super) id: NodeId,
    pub(super) node_type: NodeType,
    pub(super) start_gene: usize,
    pub(super) subnodes: Vec<Subnode<S>>,
    pub(super) branches: Vec<Branch>,
    pub(super) best_subnode: Option<SubnodeId>,
}

impl<S> Clone for Node<S> {
    fn clone(&self) -> Self {
        Node {
            id: self.id,
            node_type: self.node_type,
            start_gene: self.start_gene,
            subnodes: self.subnodes.clone(),
            branches: self.branches.clone(),
            best_subnode: self.best_subnode,
        }
    }
}

impl<S> Node<S> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Genome index of the node's subnode count gene.
    pub fn start_gene(&self) -> usize {
        self.start_gene
    }

    pub fn subnodes(&self) -> &[Subnode<S>] {
        &self.subnodes
    }

    /// Decoded branches, in id order. Judgement nodes may
    /// skip ids reserved for outcomes their functions lack.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.branches[i])
    }

    /// The value-maximal subnode (first one on ties).
    pub fn best_subnode(&self) -> Option<SubnodeId> {
        self.best_subnode
    }

    /// First branch id belonging to a subnode.
    pub fn branch_offset(&self, subnode: SubnodeId, max_judgement_outcomes: usize) -> BranchId {
        match self.node_type {
            NodeType::Judgement => subnode * max_judgement_outcomes,
            NodeType::Processing => subnode,
        }
    }

    pub(super) fn set_q(&mut self, subnode: SubnodeId, q: f64) {
        self.subnodes[subnode].q = q;
        self.refresh_best_subnode();
    }

    pub(super) fn refresh_best_subnode(&mut self) {
        self.best_subnode = if self.subnodes.is_empty() {
            None
        } else {
            Some(selection::best_subnode(self.subnodes.iter().map(|s| s.q)))
        };
    }

    /// Selects and runs a subnode, resolving the branch to follow.
    /// Returns `None` when a greedy visit lands on a negative value
    /// and only positive paths are allowed.
    pub(crate) fn visit(
        &mut self,
        ctx: &GnpContext<S>,
        rng: &mut dyn RngCore,
        thread: usize,
        mode: Mode,
        state: &mut S,
        evaluation_id: usize,
    ) -> Result<Option<Visit>> {
        let subnodes = &self.subnodes;
        let chosen = ctx.selector().select(
            subnodes.len(),
            &|i: SubnodeId| subnodes[i].q,
            self.best_subnode,
            rng,
            mode.explore,
            mode.probability,
        );
        let offset = self.branch_offset(chosen, ctx.layout().max_judgement_outcomes());
        let subnode = &mut self.subnodes[chosen];
        let q_at_exec = subnode.q;
        if !mode.explore && q_at_exec < 0.0 && ctx.config().positive_q_paths_only {
            trace!(
                "node {} subnode {} has negative value {}, stopping",
                self.id,
                chosen,
                q_at_exec
            );
            return Ok(None);
        }

        let call = FunctionCall {
            evaluation_id,
            thread,
            parameters: &subnode.parameters,
        };
        let (delayed, reward_expected) = {
            let function = subnode.function.function();
            (function.is_delayed(), function.reward_expected())
        };
        let result = subnode.function.function_mut().evaluate(state, &call);
        let function = subnode.function.function();

        let branch = subnode
            .function
            .branches()
            .index_of(result.branch_name())
            .map(|i| i + offset)
            .ok_or_else(|| GnpError::UnknownBranch {
                function: function.name(&subnode.parameters),
                branch: result.branch_name().to_string(),
            })?;
        let target = match self.branch(branch) {
            Some(b) => b.target,
            None => {
                return Err(GnpError::UnknownBranch {
                    function: self.subnodes[chosen].name(),
                    branch: result.branch_name().to_string(),
                })
            }
        };
        trace!(
            "node {} subnode {} took branch {} to node {}",
            self.id,
            chosen,
            branch,
            target
        );

        Ok(Some(Visit {
            subnode: chosen,
            branch,
            target,
            q_at_exec,
            result,
            delayed,
            reward_expected,
        }))
    }
}
