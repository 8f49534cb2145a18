use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A set of independent random streams,
/// one per worker thread.
///
/// Distinct individuals evaluated in parallel
/// must each be given a different stream, so that
/// results are reproducible regardless of scheduling.
///
/// # Examples
/// ```
/// use oxignp::RandomStreams;
/// use rand::Rng;
///
/// let mut a = RandomStreams::new(42, 2);
/// let mut b = RandomStreams::new(42, 2);
/// assert_eq!(a.stream(1).gen::<u64>(), b.stream(1).gen::<u64>());
/// ```
#[derive(Clone, Debug)]
pub struct RandomStreams {
    streams: Vec<StdRng>,
}

impl RandomStreams {
    /// Creates `count` streams derived from `seed`.
    /// Stream `i` is seeded with `seed + i`.
    pub fn new(seed: u64, count: usize) -> RandomStreams {
        RandomStreams {
            streams: (0..count as u64)
                .map(|i| StdRng::seed_from_u64(seed.wrapping_add(i)))
                .collect(),
        }
    }

    /// Creates `count` streams seeded from system entropy.
    pub fn from_entropy(count: usize) -> RandomStreams {
        RandomStreams {
            streams: (0..count).map(|_| StdRng::from_entropy()).collect(),
        }
    }

    /// Returns the stream of the specified thread.
    ///
    /// # Panics
    /// Panics if `thread` is not less than the number of streams.
    pub fn stream(&mut self, thread: usize) -> &mut StdRng {
        &mut self.streams[thread]
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether there are no streams.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Mutable access to all streams, in thread order.
    pub fn as_mut_slice(&mut self) -> &mut [StdRng] {
        &mut self.streams
    }
}

/// Draws uniformly from `start..=end`, skipping every
/// value in `exclude`.
///
/// `exclude` must be sorted, free of duplicates, and contained
/// in `start..=end`. Returns `None` if no value is left to draw.
pub(crate) fn random_with_exclusion<R>(
    rng: &mut R,
    start: usize,
    end: usize,
    exclude: &[usize],
) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let available = (end + 1).checked_sub(start)?.checked_sub(exclude.len())?;
    if available == 0 {
        return None;
    }
    let mut value = start + rng.gen_range(0..available);
    for &excluded in exclude {
        if value < excluded {
            break;
        }
        value += 1;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_never_returns_excluded() {
        let mut rng = StdRng::seed_from_u64(7);
        let exclude = [0, 3, 4, 9];
        for _ in 0..1000 {
            let value = random_with_exclusion(&mut rng, 0, 9, &exclude).unwrap();
            assert!(value <= 9);
            assert!(!exclude.contains(&value));
        }
    }

    #[test]
    fn exclusion_covers_remaining_values() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 5];
        for _ in 0..500 {
            seen[random_with_exclusion(&mut rng, 0, 4, &[1, 2]).unwrap()] = true;
        }
        assert_eq!(seen, [true, false, false, true, true]);
    }

    #[test]
    fn exhausted_pool() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(random_with_exclusion(&mut rng, 0, 2, &[0, 1, 2]), None);
        assert_eq!(random_with_exclusion(&mut rng, 0, 1, &[0, 1, 2]), None);
    }

    #[test]
    fn streams_are_independent() {
        let mut streams = RandomStreams::new(5, 2);
        let first: Vec<u32> = (0..4).map(|_| streams.stream(0).gen()).collect();
        let second: Vec<u32> = (0..4).map(|_| streams.stream(1).gen()).collect();
        assert_ne!(first, second);
        assert_eq!(streams.len(), 2);
    }
}
