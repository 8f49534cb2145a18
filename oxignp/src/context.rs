use crate::functions::FunctionLibrary;
use crate::layout::GeneLayout;
use crate::learning::{self, RewardDistributor};
use crate::parameters::ParameterSchema;
use crate::selection::{EGreedy, SubnodeSelector};
use crate::{GnpConfig, GnpError, Result, SelectorConfig};

use std::fmt;

/// Everything shared by the individuals of a run: configuration,
/// gene layout, function prototypes, subnode parameters and the
/// selection and learning policies.
///
/// A context is read-only once built, and may be shared by
/// reference across worker threads.
pub struct GnpContext<S> {
    config: GnpConfig,
    layout: GeneLayout,
    library: FunctionLibrary<S>,
    schema: ParameterSchema,
    selector: Box<dyn SubnodeSelector + Send + Sync>,
    distributor: Box<dyn RewardDistributor + Send + Sync>,
}

impl<S> GnpContext<S> {
    /// Validates the configuration and computes the gene layout.
    /// Policies are built from the configuration's selector and
    /// learning settings.
    ///
    /// # Errors
    /// Returns [`GnpError::Configuration`] if the configuration is
    /// invalid, or if a node type present in the network has no
    /// registered function.
    pub fn new(
        config: GnpConfig,
        library: FunctionLibrary<S>,
        schema: ParameterSchema,
    ) -> Result<GnpContext<S>> {
        config.validate()?;
        let counts = library.counts();
        if config.judgement_node_count > 0 && counts.judgement == 0 {
            return Err(GnpError::Configuration(
                "judgement nodes require at least one judgement function".into(),
            ));
        }
        if config.processing_node_count > 0 && counts.processing == 0 {
            return Err(GnpError::Configuration(
                "processing nodes require at least one processing function".into(),
            ));
        }

        let selector = match config.selector {
            SelectorConfig::EGreedy { epsilon } => Box::new(EGreedy::new(epsilon)),
        };
        Ok(GnpContext {
            layout: GeneLayout::new(&config, counts, &schema),
            distributor: learning::distributor(config.learning),
            selector,
            config,
            library,
            schema,
        })
    }

    /// Replaces the subnode selection policy.
    pub fn with_selector(mut self, selector: impl SubnodeSelector + Send + Sync + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Replaces the reward distribution policy.
    pub fn with_distributor(
        mut self,
        distributor: impl RewardDistributor + Send + Sync + 'static,
    ) -> Self {
        self.distributor = Box::new(distributor);
        self
    }

    pub fn config(&self) -> &GnpConfig {
        &self.config
    }

    pub fn layout(&self) -> &GeneLayout {
        &self.layout
    }

    pub fn library(&self) -> &FunctionLibrary<S> {
        &self.library
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn selector(&self) -> &dyn SubnodeSelector {
        self.selector.as_ref()
    }

    pub fn distributor(&self) -> &dyn RewardDistributor {
        self.distributor.as_ref()
    }
}

impl<S> fmt::Debug for GnpContext<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GnpContext")
            .field("config", &self.config)
            .field("library", &self.library)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
