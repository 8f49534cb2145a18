//! Mapping between network elements and genome positions.

use crate::network::{Network, NodeType};
use crate::parameters::{GeneKind, MutationSpec, MutationStrategy, ParameterSchema};
use crate::{BranchId, GnpConfig, NodeId, SubnodeId};

use ahash::RandomState;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// Identifies the genes backing a network element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneKey {
    /// The subnode count gene of a node.
    Node(NodeId),
    /// The judgement and processing function id genes of a subnode.
    Subnode(NodeId, SubnodeId),
    /// The genes of a subnode parameter.
    Parameter(NodeId, SubnodeId, usize),
    /// The target gene of a branch.
    Branch(NodeId, BranchId),
}

impl GeneKey {
    /// The node the key belongs to.
    pub fn node(&self) -> NodeId {
        match *self {
            GeneKey::Node(n)
            | GeneKey::Subnode(n, _)
            | GeneKey::Parameter(n, _, _)
            | GeneKey::Branch(n, _) => n,
        }
    }
}

impl fmt::Display for GeneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneKey::Node(n) => write!(f, "node {}", n),
            GeneKey::Subnode(n, s) => write!(f, "node {} subnode {}", n, s),
            GeneKey::Parameter(n, s, p) => write!(f, "node {} subnode {} parameter {}", n, s, p),
            GeneKey::Branch(n, b) => write!(f, "node {} branch {}", n, b),
        }
    }
}

/// A contiguous run of genes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneSpan {
    pub start: usize,
    pub len: usize,
}

impl GeneSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Mutation metadata for a region of the genome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub key: GeneKey,
    pub span: GeneSpan,
    pub kind: GeneKind,
    pub mutation: MutationSpec,
}

/// Sizes of the registered function sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCounts {
    pub judgement: usize,
    pub processing: usize,
    /// Largest number of outcomes of any judgement function.
    pub max_judgement_outcomes: usize,
}

/// The gene layout of every network decoded under a configuration.
///
/// Each node occupies a fixed-size block:
/// `[subnode count] ([judgement fn][processing fn][parameters…]) × max_subnodes`
/// followed by one target gene per branch slot. Judgement nodes
/// reserve `max_judgement_outcomes` branch slots per subnode;
/// processing nodes use one per subnode.
#[derive(Clone, Debug)]
pub struct GeneLayout {
    node_count: usize,
    max_subnodes: usize,
    branch_slots: usize,
    genes_per_subnode: usize,
    genes_per_node: usize,
    max_judgement_outcomes: usize,
    spans: HashMap<GeneKey, GeneSpan, RandomState>,
    segments: Vec<Segment>,
}

impl GeneLayout {
    /// Computes the layout for the given configuration,
    /// function sets and subnode parameters.
    ///
    /// # Examples
    /// ```
    /// use oxignp::layout::{FunctionCounts, GeneKey, GeneLayout, GeneSpan};
    /// use oxignp::parameters::{GeneDescriptor, ParameterSchema, ParameterSpec};
    /// use oxignp::GnpConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GnpConfig {
    ///     judgement_node_count: 1,
    ///     processing_node_count: 1,
    ///     max_subnodes: NonZeroUsize::new(2).unwrap(),
    ///     ..GnpConfig::zero()
    /// };
    /// let pair = |name: &str| {
    ///     ParameterSpec::new(name)
    ///         .gene(GeneDescriptor::integer("a", 0, 9))
    ///         .gene(GeneDescriptor::integer("b", 0, 9))
    /// };
    /// let schema = ParameterSchema::new().parameter(pair("p0")).parameter(pair("p1"));
    /// let counts = FunctionCounts { judgement: 1, processing: 1, max_judgement_outcomes: 2 };
    ///
    /// let layout = GeneLayout::new(&config, counts, &schema);
    /// assert_eq!(layout.genes_per_node(), 17);
    /// assert_eq!(layout.subnode(0, 1), GeneSpan { start: 7, len: 2 });
    /// assert_eq!(layout.parameter(0, 1, 1), GeneSpan { start: 11, len: 2 });
    /// assert_eq!(layout.branch(1, 0), GeneSpan { start: 30, len: 1 });
    /// assert_eq!(layout.locate(12), Some(GeneKey::Parameter(0, 1, 1)));
    /// ```
    pub fn new(config: &GnpConfig, counts: FunctionCounts, schema: &ParameterSchema) -> GeneLayout {
        let node_count = config.node_count();
        let max_subnodes = config.max_subnodes.get();
        let branch_slots = max_subnodes * counts.max_judgement_outcomes.max(1);
        let genes_per_subnode = 2 + schema.gene_count();
        let genes_per_node = 1 + max_subnodes * genes_per_subnode + branch_slots;

        let structural = |strategy, min: usize, max: usize| MutationSpec {
            strategy,
            probability: config.mutation_probability,
            min_gene: min as f64,
            max_gene: max as f64,
        };

        let mut spans = HashMap::with_hasher(RandomState::new());
        let mut segments = vec![];
        for n in 0..node_count {
            let base = n * genes_per_node;
            let span = GeneSpan { start: base, len: 1 };
            spans.insert(GeneKey::Node(n), span);
            segments.push(Segment {
                key: GeneKey::Node(n),
                span,
                kind: GeneKind::Integer,
                mutation: structural(MutationStrategy::IntegerRandomWalk, 1, max_subnodes),
            });

            for s in 0..max_subnodes {
                let start = base + 1 + s * genes_per_subnode;
                let key = GeneKey::Subnode(n, s);
                spans.insert(key, GeneSpan { start, len: 2 });
                for (offset, count) in [(0, counts.judgement), (1, counts.processing)] {
                    segments.push(Segment {
                        key,
                        span: GeneSpan { start: start + offset, len: 1 },
                        kind: GeneKind::Integer,
                        mutation: structural(
                            MutationStrategy::IntegerReset,
                            0,
                            count.saturating_sub(1),
                        ),
                    });
                }

                let mut gene = start + 2;
                for (p, spec) in schema.specs().enumerate() {
                    let key = GeneKey::Parameter(n, s, p);
                    spans.insert(key, GeneSpan { start: gene, len: spec.len() });
                    for descriptor in spec.genes() {
                        segments.push(Segment {
                            key,
                            span: GeneSpan { start: gene, len: 1 },
                            kind: descriptor.kind(),
                            mutation: *descriptor.mutation(),
                        });
                        gene += 1;
                    }
                }
            }

            for b in 0..branch_slots {
                let key = GeneKey::Branch(n, b);
                let span = GeneSpan {
                    start: base + 1 + max_subnodes * genes_per_subnode + b,
                    len: 1,
                };
                spans.insert(key, span);
                segments.push(Segment {
                    key,
                    span,
                    kind: GeneKind::Integer,
                    mutation: structural(
                        MutationStrategy::IntegerRandomWalk,
                        0,
                        node_count.saturating_sub(1),
                    ),
                });
            }
        }

        GeneLayout {
            node_count,
            max_subnodes,
            branch_slots,
            genes_per_subnode,
            genes_per_node,
            max_judgement_outcomes: counts.max_judgement_outcomes,
            spans,
            segments,
        }
    }

    /// Number of genes in a complete genome.
    pub fn genome_len(&self) -> usize {
        self.node_count * self.genes_per_node
    }

    pub fn genes_per_node(&self) -> usize {
        self.genes_per_node
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn max_subnodes(&self) -> usize {
        self.max_subnodes
    }

    /// Number of branch genes reserved per node.
    pub fn branch_slots(&self) -> usize {
        self.branch_slots
    }

    pub fn max_judgement_outcomes(&self) -> usize {
        self.max_judgement_outcomes
    }

    /// Span of the genes identified by `key`, if it is
    /// part of the layout.
    pub fn span(&self, key: GeneKey) -> Option<GeneSpan> {
        self.spans.get(&key).copied()
    }

    /// # Panics
    /// Panics if `node` is out of range.
    pub fn node(&self, node: NodeId) -> GeneSpan {
        self.spans[&GeneKey::Node(node)]
    }

    /// # Panics
    /// Panics if either id is out of range.
    pub fn subnode(&self, node: NodeId, subnode: SubnodeId) -> GeneSpan {
        self.spans[&GeneKey::Subnode(node, subnode)]
    }

    /// # Panics
    /// Panics if any id is out of range.
    pub fn parameter(&self, node: NodeId, subnode: SubnodeId, parameter: usize) -> GeneSpan {
        self.spans[&GeneKey::Parameter(node, subnode, parameter)]
    }

    /// # Panics
    /// Panics if either id is out of range.
    pub fn branch(&self, node: NodeId, branch: BranchId) -> GeneSpan {
        self.spans[&GeneKey::Branch(node, branch)]
    }

    /// Finds the most specific element backed by gene `gene`.
    pub fn locate(&self, gene: usize) -> Option<GeneKey> {
        if gene >= self.genome_len() {
            return None;
        }
        let n = gene / self.genes_per_node;
        let offset = gene % self.genes_per_node;
        if offset == 0 {
            return Some(GeneKey::Node(n));
        }
        let subnode_genes = self.max_subnodes * self.genes_per_subnode;
        if offset > subnode_genes {
            return Some(GeneKey::Branch(n, offset - 1 - subnode_genes));
        }
        let s = (offset - 1) / self.genes_per_subnode;
        let within = (offset - 1) % self.genes_per_subnode;
        if within < 2 {
            return Some(GeneKey::Subnode(n, s));
        }
        (0..)
            .map(|p| (p, self.spans.get(&GeneKey::Parameter(n, s, p))))
            .take_while(|(_, span)| span.is_some())
            .find(|(_, span)| span.map_or(false, |span| span.range().contains(&gene)))
            .map(|(p, _)| GeneKey::Parameter(n, s, p))
    }

    /// Mutation metadata of every genome region, in genome order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Generates a genome whose genes all lie within
    /// their segment bounds.
    pub fn random_genome(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        let mut genome = vec![0.0; self.genome_len()];
        for segment in &self.segments {
            let MutationSpec {
                min_gene, max_gene, ..
            } = segment.mutation;
            let max_gene = max_gene.max(min_gene);
            for gene in &mut genome[segment.span.range()] {
                *gene = match segment.kind {
                    GeneKind::Integer => {
                        rng.gen_range(min_gene as i64..=max_gene as i64) as f64
                    }
                    GeneKind::Float => rng.gen_range(min_gene..=max_gene),
                };
            }
        }
        genome
    }

    /// Renders every segment side by side with the value
    /// the network decoded from it.
    pub fn describe<S>(&self, genome: &[f64], network: &Network<S>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let genes = genome.get(segment.span.range()).unwrap_or(&[]);
            let decoded = match segment.key {
                GeneKey::Node(n) => network
                    .nodes()
                    .get(n)
                    .map(|node| format!("{:?}, {} subnodes", node.node_type(), node.subnodes().len())),
                GeneKey::Subnode(n, s) => network
                    .nodes()
                    .get(n)
                    .and_then(|node| node.subnodes().get(s).map(|sub| (node.node_type(), sub)))
                    .and_then(|(node_type, sub)| {
                        let judgement = segment.span.start == self.subnode(n, s).start;
                        (judgement == (node_type == NodeType::Judgement))
                            .then(|| format!("function {}", sub.function_id()))
                    }),
                GeneKey::Parameter(n, s, p) => network
                    .nodes()
                    .get(n)
                    .and_then(|node| node.subnodes().get(s))
                    .and_then(|sub| sub.parameters().get(p))
                    .map(|parameter| format!("{:?}", parameter.values())),
                GeneKey::Branch(n, b) => network
                    .nodes()
                    .get(n)
                    .and_then(|node| node.branch(b))
                    .map(|branch| format!("-> {}", branch.target())),
            };
            out.push_str(&format!(
                "{:>6} {:<32} {:?} | {}\n",
                segment.span.start,
                segment.key.to_string(),
                genes,
                decoded.as_deref().unwrap_or("-"),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layout() -> GeneLayout {
        let counts = FunctionCounts {
            judgement: 1,
            processing: 2,
            max_judgement_outcomes: 2,
        };
        GeneLayout::new(&testing::config(), counts, &testing::schema())
    }

    #[test]
    fn node_block() {
        let layout = layout();
        assert_eq!(layout.genes_per_node(), 17);
        assert_eq!(layout.node(0), GeneSpan { start: 0, len: 1 });
        assert_eq!(layout.subnode(0, 0), GeneSpan { start: 1, len: 2 });
        assert_eq!(layout.subnode(0, 1), GeneSpan { start: 7, len: 2 });
        assert_eq!(layout.parameter(0, 0, 0), GeneSpan { start: 3, len: 2 });
        assert_eq!(layout.parameter(0, 0, 1), GeneSpan { start: 5, len: 2 });
        assert_eq!(layout.parameter(0, 1, 0), GeneSpan { start: 9, len: 2 });
        assert_eq!(layout.parameter(0, 1, 1), GeneSpan { start: 11, len: 2 });
        for b in 0..4 {
            assert_eq!(layout.branch(0, b).start, 13 + b);
        }
        assert_eq!(layout.node(1).start, 17);
        assert_eq!(layout.span(GeneKey::Branch(0, 4)), None);
    }

    #[test]
    fn segments_cover_genome_once() {
        let layout = layout();
        let mut covered = vec![0; layout.genome_len()];
        for segment in layout.segments() {
            for gene in segment.span.range() {
                covered[gene] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn locate_inverts_spans() {
        let layout = layout();
        for segment in layout.segments() {
            for gene in segment.span.range() {
                assert_eq!(layout.locate(gene), Some(segment.key));
            }
        }
        assert_eq!(layout.locate(layout.genome_len()), None);
    }

    #[test]
    fn random_genome_within_bounds() {
        let layout = layout();
        let mut rng = StdRng::seed_from_u64(3);
        let genome = layout.random_genome(&mut rng);
        assert_eq!(genome.len(), layout.genome_len());
        for segment in layout.segments() {
            for &gene in &genome[segment.span.range()] {
                assert!(gene >= segment.mutation.min_gene);
                assert!(gene <= segment.mutation.max_gene);
            }
        }
    }

    #[test]
    fn structural_segment_bounds() {
        let layout = layout();
        let bounds = |start: usize| {
            let segment = layout
                .segments()
                .iter()
                .find(|s| s.span.start == start)
                .unwrap();
            (segment.mutation.strategy, segment.mutation.min_gene, segment.mutation.max_gene)
        };
        assert_eq!(bounds(0), (MutationStrategy::IntegerRandomWalk, 1.0, 2.0));
        assert_eq!(bounds(1), (MutationStrategy::IntegerReset, 0.0, 0.0));
        assert_eq!(bounds(2), (MutationStrategy::IntegerReset, 0.0, 1.0));
        assert_eq!(
            bounds(13),
            (
                MutationStrategy::IntegerRandomWalk,
                0.0,
                (layout.node_count() - 1) as f64
            )
        );
    }
}
