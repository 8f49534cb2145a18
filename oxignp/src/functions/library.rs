use super::{BranchNames, GnpFunction};

use crate::layout::FunctionCounts;
use crate::network::NodeType;
use crate::{GnpError, Result};

use std::fmt;

/// A working function bound to a subnode, together
/// with the outcomes it registered.
pub struct FunctionInstance<S> {
    function: Box<dyn GnpFunction<S>>,
    branches: BranchNames,
}

impl<S> FunctionInstance<S> {
    fn new(function: Box<dyn GnpFunction<S>>) -> FunctionInstance<S> {
        let mut branches = BranchNames::default();
        function.setup_branches(&mut branches);
        FunctionInstance { function, branches }
    }

    pub fn function(&self) -> &dyn GnpFunction<S> {
        self.function.as_ref()
    }

    pub fn function_mut(&mut self) -> &mut dyn GnpFunction<S> {
        self.function.as_mut()
    }

    /// Outcomes registered by the function.
    pub fn branches(&self) -> &BranchNames {
        &self.branches
    }
}

impl<S> Clone for FunctionInstance<S> {
    fn clone(&self) -> Self {
        FunctionInstance {
            function: self.function.box_clone(),
            branches: self.branches.clone(),
        }
    }
}

impl<S> fmt::Debug for FunctionInstance<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInstance")
            .field("branches", &self.branches.names())
            .finish_non_exhaustive()
    }
}

/// The judgement and processing function prototypes
/// available to subnodes, indexed by function id.
///
/// # Examples
/// ```
/// use oxignp::functions::{Action, FunctionCall, FunctionLibrary, OneBranch};
/// use oxignp::parameters::SubnodeParameter;
/// use oxignp::NodeType;
///
/// #[derive(Clone)]
/// struct Noop;
///
/// impl Action<()> for Noop {
///     fn perform(&mut self, _: &mut (), _: &FunctionCall<'_>) -> Option<f64> {
///         None
///     }
///
///     fn name(&self, _: &[SubnodeParameter]) -> String {
///         "Noop".into()
///     }
/// }
///
/// let library: FunctionLibrary<()> = FunctionLibrary::new().with_processing(OneBranch(Noop));
/// assert_eq!(library.counts().processing, 1);
/// assert!(library.instantiate(NodeType::Processing, 0).is_ok());
/// assert!(library.instantiate(NodeType::Processing, 1).is_err());
/// assert!(library.instantiate(NodeType::Judgement, 0).is_err());
/// ```
pub struct FunctionLibrary<S> {
    judgement: Vec<FunctionInstance<S>>,
    processing: Vec<FunctionInstance<S>>,
}

impl<S> FunctionLibrary<S> {
    /// An empty library.
    pub fn new() -> FunctionLibrary<S> {
        FunctionLibrary {
            judgement: vec![],
            processing: vec![],
        }
    }

    /// Registers a judgement function under the next free id.
    pub fn with_judgement(mut self, function: impl GnpFunction<S> + 'static) -> FunctionLibrary<S> {
        self.judgement.push(FunctionInstance::new(Box::new(function)));
        self
    }

    /// Registers a processing function under the next free id.
    pub fn with_processing(mut self, function: impl GnpFunction<S> + 'static) -> FunctionLibrary<S> {
        self.processing.push(FunctionInstance::new(Box::new(function)));
        self
    }

    /// The registered prototypes of a node type, in id order.
    pub fn prototypes(&self, node_type: NodeType) -> &[FunctionInstance<S>] {
        match node_type {
            NodeType::Judgement => &self.judgement,
            NodeType::Processing => &self.processing,
        }
    }

    /// Largest number of outcomes registered by a judgement function.
    pub fn max_judgement_outcomes(&self) -> usize {
        self.judgement
            .iter()
            .map(|f| f.branches.len())
            .max()
            .unwrap_or(0)
    }

    pub fn counts(&self) -> FunctionCounts {
        FunctionCounts {
            judgement: self.judgement.len(),
            processing: self.processing.len(),
            max_judgement_outcomes: self.max_judgement_outcomes(),
        }
    }

    /// Mints a fresh working instance of the specified function,
    /// re-running its outcome registration.
    ///
    /// # Errors
    /// Returns [`GnpError::UnknownFunction`] if no function
    /// of that type is registered under `id`.
    pub fn instantiate(&self, node_type: NodeType, id: i64) -> Result<FunctionInstance<S>> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.prototypes(node_type).get(i))
            .map(|prototype| FunctionInstance::new(prototype.function.box_clone()))
            .ok_or(GnpError::UnknownFunction { node_type, id })
    }
}

impl<S> Default for FunctionLibrary<S> {
    fn default() -> Self {
        FunctionLibrary::new()
    }
}

impl<S> fmt::Debug for FunctionLibrary<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionLibrary")
            .field("judgement", &self.judgement)
            .field("processing", &self.processing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, TestState};

    fn library() -> FunctionLibrary<TestState> {
        testing::library()
    }

    #[test]
    fn counts() {
        let counts = library().counts();
        assert_eq!(counts.judgement, 1);
        assert_eq!(counts.processing, 2);
        assert_eq!(counts.max_judgement_outcomes, 2);
    }

    #[test]
    fn instances_reregister_branches() {
        let library = library();
        let instance = library.instantiate(NodeType::Judgement, 0).unwrap();
        assert_eq!(instance.branches().names(), ["R1", "R2"]);
        let instance = library.instantiate(NodeType::Processing, 1).unwrap();
        assert!(instance.function().is_delayed());
        assert_eq!(instance.branches().names(), ["n"]);
    }

    #[test]
    fn unknown_ids_rejected() {
        let library = library();
        for id in [-1, 2, 17] {
            assert!(matches!(
                library.instantiate(NodeType::Processing, id),
                Err(GnpError::UnknownFunction {
                    node_type: NodeType::Processing,
                    ..
                })
            ));
        }
    }
}
