use crate::functions::FunctionInstance;
use crate::parameters::SubnodeParameter;
use crate::SubnodeId;

/// One alternative behaviour of a node, with its learned value.
#[derive(Debug)]
pub struct Subnode<S> {
    pub(super) id: SubnodeId,
    pub(super) start_gene: usize,
    pub(super) function_id: usize,
    pub(super) function: FunctionInstance<S>,
    pub(super) parameters: Vec<SubnodeParameter>,
    pub(super) q: f64,
}

impl<S> Clone for Subnode<S> {
    fn clone(&self) -> Self {
        Subnode {
            id: self.id,
            start_gene: self.start_gene,
            function_id: self.function_id,
            function: self.function.clone(),
            parameters: self.parameters.clone(),
            q: self.q,
        }
    }
}

impl<S> Subnode<S> {
    pub fn id(&self) -> SubnodeId {
        self.id
    }

    /// Genome index of the subnode's judgement function id gene.
    pub fn start_gene(&self) -> usize {
        self.start_gene
    }

    /// Id of the wrapped function within its node type.
    pub fn function_id(&self) -> usize {
        self.function_id
    }

    pub fn function(&self) -> &FunctionInstance<S> {
        &self.function
    }

    pub fn parameters(&self) -> &[SubnodeParameter] {
        &self.parameters
    }

    /// Current value estimate.
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Display name of the wrapped function.
    pub fn name(&self) -> String {
        self.function.function().name(&self.parameters)
    }
}
