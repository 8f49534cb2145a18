//! The phenotype of a GNP genome: a directed graph of
//! judgement and processing nodes.
//!
//! Node types and the start node are drawn once, when a
//! [`Network`] is created, and never depend on genome content.
//! Everything else (subnodes, their functions and parameters,
//! branch targets) is decoded from the genome by
//! [`Network::generate`], which carries learned values over from
//! the previous decode and repairs illegal branch targets in place.
mod branch;
mod node;
pub mod render;
mod subnode;

pub use branch::Branch;
pub use node::{Node, NodeType};
pub use subnode::Subnode;

pub(crate) use node::{Mode, Visit};

use crate::learning::QValues;
use crate::parameters::SubnodeParameter;
use crate::rng::random_with_exclusion;
use crate::{GnpConfig, GnpContext, GnpError, NodeId, Result, SubnodeId};

use ahash::RandomState;
use log::debug;
use rand::seq::index;
use rand::{Rng, RngCore};

use std::collections::HashMap;

/// A decoded genetic network.
#[derive(Debug)]
pub struct Network<S> {
    node_types: Vec<NodeType>,
    start_node: NodeId,
    nodes: Vec<Node<S>>,
    decoded_genome: Option<Vec<f64>>,
}

impl<S> Clone for Network<S> {
    fn clone(&self) -> Self {
        Network {
            node_types: self.node_types.clone(),
            start_node: self.start_node,
            nodes: self.nodes.clone(),
            decoded_genome: self.decoded_genome.clone(),
        }
    }
}

impl<S> Network<S> {
    /// Creates an undecoded network, drawing the node type
    /// partition and the start node.
    ///
    /// Judgement node ids are sampled without repetition; the
    /// remaining ids are processing nodes. If the configuration
    /// requires it, the start node is redrawn until it is a
    /// judgement node.
    pub fn new(config: &GnpConfig, rng: &mut dyn RngCore) -> Network<S> {
        let node_count = config.node_count();
        let mut node_types = vec![NodeType::Processing; node_count];
        for id in index::sample(rng, node_count, config.judgement_node_count) {
            node_types[id] = NodeType::Judgement;
        }
        let mut start_node = rng.gen_range(0..node_count);
        while config.start_with_judgement && node_types[start_node] != NodeType::Judgement {
            start_node = rng.gen_range(0..node_count);
        }
        Network::from_parts(node_types, start_node)
    }

    /// Creates an undecoded network with a known type
    /// partition and start node.
    pub fn from_parts(node_types: Vec<NodeType>, start_node: NodeId) -> Network<S> {
        Network {
            node_types,
            start_node,
            nodes: vec![],
            decoded_genome: None,
        }
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.node_types
    }

    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    /// Decoded nodes, indexed by id. Empty until the
    /// first call to [`generate`].
    ///
    /// [`generate`]: Network::generate
    pub fn nodes(&self) -> &[Node<S>] {
        &self.nodes
    }

    /// # Panics
    /// Panics if the node does not exist.
    pub fn node(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<S> {
        &mut self.nodes[id]
    }

    /// Whether the network has been decoded at least once.
    pub fn is_decoded(&self) -> bool {
        self.decoded_genome.is_some()
    }

    /// Decodes `genome`, unless it equals the genome decoded last.
    /// Returns whether the network was rebuilt.
    ///
    /// Subnode values and function ids of the previous decode are
    /// carried over by (node, subnode) id. When a subnode is bound to
    /// a function for the first time, or its function id changed, the
    /// function's [`after_function_changed`] hook runs, unless
    /// `skip_function_changed` is set; parameter values it sets are
    /// written back into the genome. Branch targets pointing at their
    /// own node, outside the network, or (when nodes outnumber branch
    /// slots) at a sibling branch's target are redrawn and written
    /// back as well.
    ///
    /// # Errors
    /// Fails on a genome of the wrong length, out-of-range subnode
    /// counts, unknown function ids, or when no legal branch target
    /// is left. The network is unchanged on failure, but genes
    /// repaired before the failure keep their new values.
    ///
    /// [`after_function_changed`]: crate::functions::GnpFunction::after_function_changed
    pub fn generate(
        &mut self,
        ctx: &GnpContext<S>,
        genome: &mut [f64],
        rng: &mut dyn RngCore,
        skip_function_changed: bool,
    ) -> Result<bool> {
        let layout = ctx.layout();
        if genome.len() != layout.genome_len() {
            return Err(GnpError::GenomeLength {
                expected: layout.genome_len(),
                actual: genome.len(),
            });
        }
        if self.decoded_genome.as_deref() == Some(&*genome) {
            return Ok(false);
        }

        let carried: HashMap<(NodeId, SubnodeId), (f64, usize), RandomState> = self
            .nodes
            .iter()
            .flat_map(|node| {
                node.subnodes
                    .iter()
                    .map(move |sub| ((node.id, sub.id), (sub.q, sub.function_id)))
            })
            .collect();

        let mut nodes = Vec::with_capacity(self.node_types.len());
        for (id, &node_type) in self.node_types.iter().enumerate() {
            let mut node = decode_node(ctx, id, node_type, genome, &carried, skip_function_changed)?;
            repair_branches(ctx, &mut node, genome, rng)?;
            node.refresh_best_subnode();
            nodes.push(node);
        }
        debug!(
            "decoded network of {} nodes, {} values carried over",
            nodes.len(),
            carried.len()
        );

        self.nodes = nodes;
        self.decoded_genome = Some(genome.to_vec());
        Ok(true)
    }
}

impl<S> QValues for Network<S> {
    fn q(&self, node: NodeId, subnode: SubnodeId) -> f64 {
        self.nodes[node].subnodes[subnode].q
    }

    fn set_q(&mut self, node: NodeId, subnode: SubnodeId, q: f64) {
        self.nodes[node].set_q(subnode, q);
    }
}

fn decode_node<S>(
    ctx: &GnpContext<S>,
    id: NodeId,
    node_type: NodeType,
    genome: &mut [f64],
    carried: &HashMap<(NodeId, SubnodeId), (f64, usize), RandomState>,
    skip_function_changed: bool,
) -> Result<Node<S>> {
    let layout = ctx.layout();
    let start_gene = layout.node(id).start;
    let count = genome[start_gene] as i64;
    if count < 1 || count > layout.max_subnodes() as i64 {
        return Err(GnpError::InvalidSubnodeCount {
            node: id,
            count,
            max: layout.max_subnodes(),
        });
    }

    let function_gene = match node_type {
        NodeType::Judgement => 0,
        NodeType::Processing => 1,
    };
    let mut subnodes = Vec::with_capacity(count as usize);
    let mut branches = vec![];
    for s in 0..count as usize {
        let start = layout.subnode(id, s).start;
        let raw_id = genome[start + function_gene] as i64;
        let function = ctx.library().instantiate(node_type, raw_id)?;
        let function_id = raw_id as usize;

        let mut parameters: Vec<SubnodeParameter> = (0..ctx.schema().len())
            .map(|p| {
                SubnodeParameter::decode(
                    p,
                    ctx.schema().spec(p).clone(),
                    genome,
                    layout.parameter(id, s, p).start,
                )
            })
            .collect();

        let (q, changed) = match carried.get(&(id, s)) {
            Some(&(q, previous)) => (q, previous != function_id),
            None => (0.0, true),
        };
        if changed && !skip_function_changed {
            function.function().after_function_changed(&mut parameters);
        }
        for parameter in &mut parameters {
            parameter.write_back(genome);
        }

        let outcomes = match node_type {
            NodeType::Judgement => function.branches().len(),
            NodeType::Processing => 1,
        };
        let offset = match node_type {
            NodeType::Judgement => s * layout.max_judgement_outcomes(),
            NodeType::Processing => s,
        };
        for b in offset..offset + outcomes {
            let gene = layout.branch(id, b).start;
            branches.push(Branch {
                id: b,
                gene,
                target: genome[gene] as usize,
                subnode: s,
            });
        }

        subnodes.push(Subnode {
            id: s,
            start_gene: start,
            function_id,
            function,
            parameters,
            q,
        });
    }

    Ok(Node {
        id,
        node_type,
        start_gene,
        subnodes,
        branches,
        best_subnode: None,
    })
}

/// Redraws branch targets that loop back to their node, fall
/// outside the network, or (while nodes outnumber branch slots)
/// repeat a sibling's target.
fn repair_branches<S>(
    ctx: &GnpContext<S>,
    node: &mut Node<S>,
    genome: &mut [f64],
    rng: &mut dyn RngCore,
) -> Result<()> {
    let node_count = ctx.layout().node_count();
    let distinct = ctx.layout().branch_slots() < node_count;
    let mut used: Vec<NodeId> = vec![];
    for branch in &mut node.branches {
        let raw = genome[branch.gene];
        let legal = raw >= 0.0
            && (raw as usize) < node_count
            && branch.target != node.id
            && !used.contains(&branch.target);
        if !legal {
            let mut excluded = used.clone();
            excluded.push(node.id);
            excluded.sort_unstable();
            excluded.dedup();
            let target = random_with_exclusion(rng, 0, node_count - 1, &excluded).ok_or(
                GnpError::ExhaustedBranchTargets {
                    node: node.id,
                    branch: branch.id,
                    excluded: excluded.len(),
                    available: node_count,
                },
            )?;
            debug!(
                "node {} branch {}: target {} replaced by {}",
                node.id, branch.id, raw, target
            );
            branch.target = target;
            genome[branch.gene] = target as f64;
        }
        if distinct {
            used.push(branch.target);
        }
    }
    Ok(())
}
