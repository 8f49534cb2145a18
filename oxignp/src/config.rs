use crate::{GnpError, Result};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for network decoding,
/// evaluation and learning.
///
/// # Note
/// All quantities expressing probabilities or
/// learning rates should be in the range [0.0, 1.0].
/// [`validate`] rejects values outside of it.
///
/// [`validate`]: GnpConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GnpConfig {
    /// Number of judgement (decision) nodes.
    pub judgement_node_count: usize,
    /// Number of processing (action) nodes.
    pub processing_node_count: usize,
    /// Maximum number of subnodes per node. The
    /// subnode count gene of each node is read
    /// from the range `1..=max_subnodes`.
    pub max_subnodes: NonZeroUsize,
    /// Time budget of a single evaluation call.
    pub max_time: u32,
    /// Time consumed by visiting a judgement node.
    pub judgement_time: u32,
    /// Time consumed by visiting a processing node.
    pub processing_time: u32,
    /// Whether the start node must be a judgement node.
    pub start_with_judgement: bool,
    /// If set, non-exploring evaluations stop as soon as
    /// the selected subnode has a negative value.
    pub positive_q_paths_only: bool,
    /// Keep every finished execution path until cleared.
    pub store_all_execution_paths: bool,
    /// Mutation probability recorded for the structural
    /// (subnode count, function id, branch) gene segments.
    pub mutation_probability: f64,
    /// Subnode selection policy.
    pub selector: SelectorConfig,
    /// Reward distribution policy.
    pub learning: LearningConfig,
}

/// Available subnode selection policies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorConfig {
    /// Epsilon-greedy selection.
    EGreedy { epsilon: f64 },
}

/// Available reward distribution policies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningConfig {
    /// One-step SARSA.
    Sarsa { alpha: f64, gamma: f64 },
    /// SARSA(λ) with accumulating eligibility traces
    /// over the rewarded path prefix.
    SarsaWithEligibilityTraces { alpha: f64, gamma: f64, lambda: f64 },
}

impl GnpConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments,
    /// and does not pass [`validate`]. It is meant as a way to
    /// abbreviate configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use oxignp::GnpConfig;
    ///
    /// let config = GnpConfig {
    ///     judgement_node_count: 3,
    ///     processing_node_count: 4,
    ///     judgement_time: 1,
    ///     processing_time: 5,
    ///     max_time: 60,
    ///     // Default the rest...
    ///     ..GnpConfig::zero()
    /// };
    /// assert_eq!(config.node_count(), 7);
    /// assert!(config.validate().is_ok());
    /// ```
    ///
    /// [`validate`]: GnpConfig::validate
    pub const fn zero() -> GnpConfig {
        GnpConfig {
            judgement_node_count: 0,
            processing_node_count: 0,
            max_subnodes: NonZeroUsize::MIN,
            max_time: 0,
            judgement_time: 0,
            processing_time: 0,
            start_with_judgement: false,
            positive_q_paths_only: false,
            store_all_execution_paths: false,
            mutation_probability: 0.0,
            selector: SelectorConfig::EGreedy { epsilon: 0.0 },
            learning: LearningConfig::Sarsa {
                alpha: 0.0,
                gamma: 0.0,
            },
        }
    }

    /// Total number of nodes in a network.
    pub fn node_count(&self) -> usize {
        self.judgement_node_count + self.processing_node_count
    }

    /// Checks that the configuration describes a network
    /// that can be decoded and evaluated.
    ///
    /// # Errors
    /// Returns [`GnpError::Configuration`] if:
    /// - there are fewer than two nodes (branches would have
    ///   no legal target),
    /// - a node type time cost is zero (evaluation would never
    ///   exhaust its budget),
    /// - the start node must be a judgement node but there are none,
    /// - a probability or learning rate is outside [0.0, 1.0].
    pub fn validate(&self) -> Result<()> {
        if self.node_count() < 2 {
            return Err(GnpError::Configuration(format!(
                "at least 2 nodes are required, got {}",
                self.node_count()
            )));
        }
        if self.judgement_time == 0 || self.processing_time == 0 {
            return Err(GnpError::Configuration(
                "node time costs must be positive".into(),
            ));
        }
        if self.start_with_judgement && self.judgement_node_count == 0 {
            return Err(GnpError::Configuration(
                "start_with_judgement requires at least one judgement node".into(),
            ));
        }
        check_unit("mutation_probability", self.mutation_probability)?;
        match self.selector {
            SelectorConfig::EGreedy { epsilon } => check_unit("epsilon", epsilon)?,
        }
        match self.learning {
            LearningConfig::Sarsa { alpha, gamma } => {
                check_unit("alpha", alpha)?;
                check_unit("gamma", gamma)?;
            }
            LearningConfig::SarsaWithEligibilityTraces {
                alpha,
                gamma,
                lambda,
            } => {
                check_unit("alpha", alpha)?;
                check_unit("gamma", gamma)?;
                check_unit("lambda", lambda)?;
            }
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GnpError::Configuration(format!(
            "{} must be in [0.0, 1.0], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GnpConfig {
        GnpConfig {
            judgement_node_count: 2,
            processing_node_count: 2,
            judgement_time: 1,
            processing_time: 5,
            max_time: 20,
            ..GnpConfig::zero()
        }
    }

    #[test]
    fn zero_is_invalid() {
        assert!(GnpConfig::zero().validate().is_err());
    }

    #[test]
    fn valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_time_cost_rejected() {
        let config = GnpConfig {
            processing_time: 0,
            ..valid()
        };
        assert!(matches!(config.validate(), Err(GnpError::Configuration(_))));
    }

    #[test]
    fn judgement_start_requires_judgement_nodes() {
        let config = GnpConfig {
            judgement_node_count: 0,
            processing_node_count: 4,
            start_with_judgement: true,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn learning_rates_bounded() {
        let config = GnpConfig {
            learning: LearningConfig::SarsaWithEligibilityTraces {
                alpha: 0.5,
                gamma: 0.9,
                lambda: 1.5,
            },
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn serde_round_trip() {
        let config = GnpConfig {
            selector: SelectorConfig::EGreedy { epsilon: 0.1 },
            learning: LearningConfig::Sarsa {
                alpha: 0.5,
                gamma: 0.9,
            },
            ..valid()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"e_greedy\""));
        let parsed: GnpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
