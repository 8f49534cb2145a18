//! Subnode selection policies.

use crate::SubnodeId;

use rand::{Rng, RngCore};

/// Chooses which subnode of a node to execute.
pub trait SubnodeSelector {
    /// Selects one of a node's `count` subnodes, where `q` gives
    /// the value of a subnode by id.
    ///
    /// `best` is the node's cached value-maximal subnode, if known.
    /// `probability` overrides the policy's own exploration rate.
    /// Must be deterministic for a given random stream state.
    fn select(
        &self,
        count: usize,
        q: &dyn Fn(SubnodeId) -> f64,
        best: Option<SubnodeId>,
        rng: &mut dyn RngCore,
        explore: bool,
        probability: Option<f64>,
    ) -> SubnodeId;
}

/// Epsilon-greedy selection: the best subnode with probability
/// `1 - epsilon`, a uniformly random one otherwise.
///
/// # Examples
/// ```
/// use oxignp::selection::{EGreedy, SubnodeSelector};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let selector = EGreedy::new(0.5);
/// let mut rng = StdRng::seed_from_u64(0);
/// let q = [0.0, 2.0, 1.0];
/// // Without exploration the greediest subnode always wins.
/// for _ in 0..10 {
///     assert_eq!(selector.select(q.len(), &|i: usize| q[i], None, &mut rng, false, None), 1);
/// }
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EGreedy {
    epsilon: f64,
}

impl EGreedy {
    pub fn new(epsilon: f64) -> EGreedy {
        EGreedy { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl SubnodeSelector for EGreedy {
    fn select(
        &self,
        count: usize,
        q: &dyn Fn(SubnodeId) -> f64,
        best: Option<SubnodeId>,
        rng: &mut dyn RngCore,
        explore: bool,
        probability: Option<f64>,
    ) -> SubnodeId {
        let epsilon = if explore {
            probability.unwrap_or(self.epsilon)
        } else {
            0.0
        };
        if rng.gen::<f64>() < 1.0 - epsilon {
            best.unwrap_or_else(|| best_subnode((0..count).map(q)))
        } else {
            rng.gen_range(0..count)
        }
    }
}

/// Index of the first maximal value.
pub(crate) fn best_subnode(q_values: impl IntoIterator<Item = f64>) -> SubnodeId {
    let mut best = 0;
    let mut max = f64::MIN;
    for (i, q) in q_values.into_iter().enumerate() {
        if q > max {
            max = q;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn values(q: &[f64]) -> impl Fn(SubnodeId) -> f64 + '_ {
        move |i| q[i]
    }

    #[test]
    fn ties_go_to_lowest_id() {
        assert_eq!(best_subnode([1.0, 3.0, 3.0, -2.0]), 1);
        assert_eq!(best_subnode([-1.0, -1.0]), 0);
        assert_eq!(best_subnode(std::iter::empty()), 0);
    }

    #[test]
    fn cached_best_is_trusted() {
        let selector = EGreedy::new(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.select(2, &values(&[5.0, 0.0]), Some(1), &mut rng, true, None), 1);
    }

    #[test]
    fn full_exploration_is_uniform() {
        let selector = EGreedy::new(0.0);
        let mut rng = StdRng::seed_from_u64(2);
        let mut counts = [0; 3];
        for _ in 0..3000 {
            counts[selector.select(3, &values(&[9.0, 0.0, 0.0]), None, &mut rng, true, Some(1.0))] += 1;
        }
        assert!(counts.iter().all(|&c| c > 800), "{:?}", counts);
    }

    #[test]
    fn override_ignored_without_exploration() {
        let selector = EGreedy::new(1.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(selector.select(3, &values(&[0.0, 0.0, 4.0]), None, &mut rng, false, Some(1.0)), 2);
        }
    }

    #[test]
    fn deterministic_for_a_stream_state() {
        let selector = EGreedy::new(0.3);
        let q = [0.5, 0.1, 0.2, 0.4];
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| selector.select(q.len(), &values(&q), None, &mut rng, true, None))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(9), picks(9));
    }
}
