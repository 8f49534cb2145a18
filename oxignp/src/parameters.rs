//! Genome-backed subnode parameters.
//!
//! Every subnode carries the same ordered list of parameters,
//! described by a [`ParameterSchema`]. Each parameter is a
//! named group of genes whose values are handed to the subnode's
//! function on every evaluation. Gene descriptors also record
//! the mutation strategy and bounds that an external vector
//! mutation operator should apply to them; nothing in this crate
//! enforces those bounds.

use serde::{Deserialize, Serialize};

use std::sync::Arc;

/// The numeric interpretation of a gene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneKind {
    /// Read by truncation towards zero.
    Integer,
    /// Read as-is.
    Float,
}

/// Mutation strategies understood by vector mutation operators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MutationStrategy {
    /// Replace with a uniformly drawn float.
    Reset,
    /// Replace with a uniformly drawn integer.
    IntegerReset,
    /// Step the integer value up or down repeatedly.
    IntegerRandomWalk,
    /// Add gaussian noise.
    Gauss {
        stdev: f64,
        out_of_bounds_retries: u32,
        bounded: bool,
    },
}

/// Mutation metadata of a gene or gene segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationSpec {
    pub strategy: MutationStrategy,
    pub probability: f64,
    pub min_gene: f64,
    pub max_gene: f64,
}

/// Describes a single gene of a subnode parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneDescriptor {
    name: String,
    kind: GeneKind,
    mutation: MutationSpec,
}

impl GeneDescriptor {
    /// An integer gene in `min..=max`, mutated by reset.
    ///
    /// # Examples
    /// ```
    /// use oxignp::parameters::{GeneDescriptor, GeneKind, MutationStrategy};
    ///
    /// let gene = GeneDescriptor::integer("steps", -1, 100).with_probability(0.2);
    /// assert_eq!(gene.kind(), GeneKind::Integer);
    /// assert_eq!(gene.mutation().strategy, MutationStrategy::IntegerReset);
    /// assert_eq!(gene.mutation().max_gene, 100.0);
    /// ```
    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> GeneDescriptor {
        GeneDescriptor {
            name: name.into(),
            kind: GeneKind::Integer,
            mutation: MutationSpec {
                strategy: MutationStrategy::IntegerReset,
                probability: 0.0,
                min_gene: min as f64,
                max_gene: max as f64,
            },
        }
    }

    /// A float gene in `min..=max`, mutated by reset.
    pub fn float(name: impl Into<String>, min: f64, max: f64) -> GeneDescriptor {
        GeneDescriptor {
            name: name.into(),
            kind: GeneKind::Float,
            mutation: MutationSpec {
                strategy: MutationStrategy::Reset,
                probability: 0.0,
                min_gene: min,
                max_gene: max,
            },
        }
    }

    /// Sets the mutation probability.
    pub fn with_probability(mut self, probability: f64) -> GeneDescriptor {
        self.mutation.probability = probability;
        self
    }

    /// Sets the mutation strategy.
    pub fn with_strategy(mut self, strategy: MutationStrategy) -> GeneDescriptor {
        self.mutation.strategy = strategy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GeneKind {
        self.kind
    }

    pub fn mutation(&self) -> &MutationSpec {
        &self.mutation
    }
}

/// A named, ordered group of genes forming one parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    name: String,
    genes: Vec<GeneDescriptor>,
}

impl ParameterSpec {
    /// Creates a parameter with no genes.
    pub fn new(name: impl Into<String>) -> ParameterSpec {
        ParameterSpec {
            name: name.into(),
            genes: vec![],
        }
    }

    /// Appends a gene to the parameter.
    pub fn gene(mut self, gene: GeneDescriptor) -> ParameterSpec {
        self.genes.push(gene);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genes(&self) -> &[GeneDescriptor] {
        &self.genes
    }

    /// Number of genes used by the parameter.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    fn position(&self, gene: &str) -> Option<usize> {
        self.genes.iter().position(|g| g.name == gene)
    }
}

/// The parameters attached to every subnode, in order.
///
/// # Examples
/// ```
/// use oxignp::parameters::{GeneDescriptor, ParameterSchema, ParameterSpec};
///
/// let schema = ParameterSchema::new()
///     .parameter(
///         ParameterSpec::new("range")
///             .gene(GeneDescriptor::integer("low", -1, 100))
///             .gene(GeneDescriptor::integer("high", -1, 100)),
///     )
///     .parameter(ParameterSpec::new("weight").gene(GeneDescriptor::float("w", 0.0, 50.5)));
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.gene_count(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSchema {
    specs: Vec<Arc<ParameterSpec>>,
}

impl ParameterSchema {
    /// An empty schema: subnodes carry no parameters.
    pub fn new() -> ParameterSchema {
        ParameterSchema::default()
    }

    /// Appends a parameter to the schema.
    pub fn parameter(mut self, spec: ParameterSpec) -> ParameterSchema {
        self.specs.push(Arc::new(spec));
        self
    }

    /// Number of parameters per subnode.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Total genes used by the parameters of one subnode.
    pub fn gene_count(&self) -> usize {
        self.specs.iter().map(|s| s.len()).sum()
    }

    pub fn specs(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter().map(|s| s.as_ref())
    }

    pub(crate) fn spec(&self, index: usize) -> &Arc<ParameterSpec> {
        &self.specs[index]
    }
}

/// A decoded subnode parameter.
///
/// Values are copied out of the genome once at decode time.
/// Setters update the local copy and flag the parameter so the
/// new values are written back into the genome by the network
/// builder.
#[derive(Clone, Debug, PartialEq)]
pub struct SubnodeParameter {
    id: usize,
    start_gene: usize,
    spec: Arc<ParameterSpec>,
    values: Box<[f64]>,
    dirty: bool,
}

impl SubnodeParameter {
    pub(crate) fn decode(
        id: usize,
        spec: Arc<ParameterSpec>,
        genome: &[f64],
        start_gene: usize,
    ) -> SubnodeParameter {
        SubnodeParameter {
            id,
            start_gene,
            values: genome[start_gene..start_gene + spec.len()].into(),
            spec,
            dirty: false,
        }
    }

    /// Index of the parameter within its subnode.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Genome index of the parameter's first gene.
    pub fn start_gene(&self) -> usize {
        self.start_gene
    }

    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    /// Raw gene values, in descriptor order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of the named gene, truncated to an integer.
    pub fn int(&self, gene: &str) -> Option<i64> {
        self.float(gene).map(|v| v as i64)
    }

    /// Value of the named gene.
    pub fn float(&self, gene: &str) -> Option<f64> {
        self.spec.position(gene).map(|i| self.values[i])
    }

    /// Sets the named integer gene.
    /// Returns `false` if the parameter has no such gene.
    pub fn set_int(&mut self, gene: &str, value: i64) -> bool {
        self.set_float(gene, value as f64)
    }

    /// Sets the named gene.
    /// Returns `false` if the parameter has no such gene.
    pub fn set_float(&mut self, gene: &str, value: f64) -> bool {
        match self.spec.position(gene) {
            Some(i) => {
                self.values[i] = value;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Mirrors modified values into the genome.
    pub(crate) fn write_back(&mut self, genome: &mut [f64]) {
        if self.dirty {
            genome[self.start_gene..self.start_gene + self.values.len()]
                .copy_from_slice(&self.values);
            self.dirty = false;
        }
    }
}
