//! Temporal-difference learning of subnode values.

use crate::individual::NodeEvaluation;
use crate::{EvaluationId, GnpError, LearningConfig, NodeId, Result, SubnodeId};

/// Read-write access to subnode values.
pub trait QValues {
    /// # Panics
    /// May panic if the node or subnode does not exist.
    fn q(&self, node: NodeId, subnode: SubnodeId) -> f64;

    /// # Panics
    /// May panic if the node or subnode does not exist.
    fn set_q(&mut self, node: NodeId, subnode: SubnodeId, q: f64);
}

/// A reward earned by a subnode visit.
#[derive(Clone, Debug)]
pub struct Reward<'a> {
    pub node: NodeId,
    pub subnode: SubnodeId,
    /// The execution path preceding the rewarded visit.
    pub path: &'a [NodeEvaluation],
    pub evaluation_id: EvaluationId,
    pub value: Option<f64>,
}

impl Reward<'_> {
    /// The reward value, if present and finite.
    ///
    /// # Errors
    /// Returns [`GnpError::MissingRewardValue`] or
    /// [`GnpError::NonFiniteReward`] otherwise.
    pub fn checked_value(&self) -> Result<f64> {
        match self.value {
            None => Err(GnpError::MissingRewardValue(self.evaluation_id)),
            Some(v) if !v.is_finite() => Err(GnpError::NonFiniteReward(v)),
            Some(v) => Ok(v),
        }
    }

    /// Index into `path` of the visit immediately preceding
    /// the rewarded one, if it is part of the path.
    fn predecessor(&self) -> Option<usize> {
        let first = self.path.first()?.evaluation_id;
        if self.evaluation_id <= first {
            return None;
        }
        let index = self.evaluation_id - 1 - first;
        (index < self.path.len()).then(|| index)
    }
}

/// Assigns credit for a reward to subnode values.
pub trait RewardDistributor {
    /// Updates `values` with the reward.
    ///
    /// # Errors
    /// Must fail without writing anything if the reward
    /// value is missing or not finite.
    fn distribute(&self, reward: &Reward<'_>, values: &mut dyn QValues) -> Result<()>;
}

/// Builds the distributor described by the configuration.
pub(crate) fn distributor(config: LearningConfig) -> Box<dyn RewardDistributor + Send + Sync> {
    match config {
        LearningConfig::Sarsa { alpha, gamma } => Box::new(Sarsa { alpha, gamma }),
        LearningConfig::SarsaWithEligibilityTraces {
            alpha,
            gamma,
            lambda,
        } => Box::new(SarsaWithEligibilityTraces {
            alpha,
            gamma,
            lambda,
        }),
    }
}

/// One-step SARSA.
///
/// The rewarded subnode's value is set to the reward, and the
/// preceding visit is moved towards `r + γ·Q` by a step of `α`.
///
/// # Examples
/// ```
/// use oxignp::learning::{QValues, Reward, RewardDistributor, Sarsa};
///
/// struct Single(f64);
///
/// impl QValues for Single {
///     fn q(&self, _: usize, _: usize) -> f64 {
///         self.0
///     }
///
///     fn set_q(&mut self, _: usize, _: usize, q: f64) {
///         self.0 = q;
///     }
/// }
///
/// let mut values = Single(0.0);
/// let reward = Reward { node: 0, subnode: 0, path: &[], evaluation_id: 0, value: Some(3.0) };
/// Sarsa { alpha: 0.5, gamma: 0.9 }.distribute(&reward, &mut values).unwrap();
/// assert_eq!(values.0, 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sarsa {
    pub alpha: f64,
    pub gamma: f64,
}

impl RewardDistributor for Sarsa {
    fn distribute(&self, reward: &Reward<'_>, values: &mut dyn QValues) -> Result<()> {
        let r = reward.checked_value()?;
        values.set_q(reward.node, reward.subnode, r);
        if let Some(index) = reward.predecessor() {
            let previous = &reward.path[index];
            let q_next = values.q(reward.node, reward.subnode);
            let q = values.q(previous.node, previous.subnode);
            values.set_q(
                previous.node,
                previous.subnode,
                q + self.alpha * (r + self.gamma * q_next - q),
            );
        }
        Ok(())
    }
}

/// SARSA(λ) over the rewarded path prefix.
///
/// A single TD error is computed against the preceding visit and
/// applied to every earlier visit of the path, scaled by an
/// eligibility factor decaying by `γ·λ` per step back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SarsaWithEligibilityTraces {
    pub alpha: f64,
    pub gamma: f64,
    pub lambda: f64,
}

impl RewardDistributor for SarsaWithEligibilityTraces {
    fn distribute(&self, reward: &Reward<'_>, values: &mut dyn QValues) -> Result<()> {
        let r = reward.checked_value()?;
        values.set_q(reward.node, reward.subnode, r);
        let index = match reward.predecessor() {
            Some(index) => index,
            None => return Ok(()),
        };

        let previous = &reward.path[index];
        let q_next = values.q(reward.node, reward.subnode);
        let delta = r + self.gamma * q_next - values.q(previous.node, previous.subnode);
        let mut eligibility = 1.0;
        for visit in reward.path[..=index].iter().rev() {
            let q = values.q(visit.node, visit.subnode);
            values.set_q(visit.node, visit.subnode, q + self.alpha * delta * eligibility);
            eligibility *= self.gamma * self.lambda;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    use ahash::RandomState;

    use std::collections::HashMap;

    #[derive(Default)]
    struct Table(HashMap<(NodeId, SubnodeId), f64, RandomState>);

    impl QValues for Table {
        fn q(&self, node: NodeId, subnode: SubnodeId) -> f64 {
            self.0.get(&(node, subnode)).copied().unwrap_or(0.0)
        }

        fn set_q(&mut self, node: NodeId, subnode: SubnodeId, q: f64) {
            self.0.insert((node, subnode), q);
        }
    }

    fn reward(path: &[NodeEvaluation], node: NodeId, value: f64) -> Reward<'_> {
        Reward {
            node,
            subnode: 0,
            path,
            evaluation_id: path.len(),
            value: Some(value),
        }
    }

    #[test]
    fn sarsa_two_step() {
        let path = [testing::visit(0, 0, 0)];
        let mut table = Table::default();
        let sarsa = Sarsa {
            alpha: 0.5,
            gamma: 0.9,
        };
        sarsa.distribute(&reward(&path, 1, 10.0), &mut table).unwrap();
        assert_eq!(table.q(1, 0), 10.0);
        assert_eq!(table.q(0, 0), 9.5);
    }

    #[test]
    fn sarsa_without_predecessor() {
        let mut table = Table::default();
        let sarsa = Sarsa {
            alpha: 0.5,
            gamma: 0.9,
        };
        sarsa.distribute(&reward(&[], 1, 4.0), &mut table).unwrap();
        assert_eq!(table.0.len(), 1);
        assert_eq!(table.q(1, 0), 4.0);
    }

    #[test]
    fn predecessor_follows_evaluation_ids() {
        // Path of an episode whose ids start at 5.
        let path = [testing::visit(3, 0, 5), testing::visit(4, 0, 6)];
        let reward = Reward {
            node: 1,
            subnode: 0,
            path: &path,
            evaluation_id: 7,
            value: Some(2.0),
        };
        let mut table = Table::default();
        Sarsa {
            alpha: 1.0,
            gamma: 0.0,
        }
        .distribute(&reward, &mut table)
        .unwrap();
        assert_eq!(table.q(4, 0), 2.0);
        assert_eq!(table.q(3, 0), 0.0);
    }

    #[test]
    fn eligibility_decays_backwards() {
        let path = [testing::visit(0, 0, 0), testing::visit(1, 0, 1)];
        let mut table = Table::default();
        let traces = SarsaWithEligibilityTraces {
            alpha: 0.5,
            gamma: 0.9,
            lambda: 0.8,
        };
        traces.distribute(&reward(&path, 2, 10.0), &mut table).unwrap();

        let delta = 10.0 + 0.9 * 10.0;
        assert_eq!(table.q(2, 0), 10.0);
        assert_eq!(table.q(1, 0), 0.5 * delta);
        assert_eq!(table.q(0, 0), 0.5 * delta * (0.9 * 0.8));
        assert!(table.q(0, 0).abs() < table.q(1, 0).abs());
    }

    #[test]
    fn non_finite_rewards_write_nothing() {
        let path = [testing::visit(0, 0, 0)];
        let distributors: [Box<dyn RewardDistributor>; 2] = [
            Box::new(Sarsa {
                alpha: 0.5,
                gamma: 0.9,
            }),
            Box::new(SarsaWithEligibilityTraces {
                alpha: 0.5,
                gamma: 0.9,
                lambda: 0.9,
            }),
        ];
        for distributor in &distributors {
            for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                let mut table = Table::default();
                assert!(matches!(
                    distributor.distribute(&reward(&path, 1, value), &mut table),
                    Err(GnpError::NonFiniteReward(_))
                ));
                assert!(table.0.is_empty());
            }
            let mut table = Table::default();
            let missing = Reward {
                value: None,
                ..reward(&path, 1, 0.0)
            };
            assert!(matches!(
                distributor.distribute(&missing, &mut table),
                Err(GnpError::MissingRewardValue(1))
            ));
            assert!(table.0.is_empty());
        }
    }
}
