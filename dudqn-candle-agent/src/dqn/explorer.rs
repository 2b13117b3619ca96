//! Exploration strategy of the agent.
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with linear decay.
///
/// Epsilon shrinks by `decay_rate` per [`decrement`](Self::decrement) and is
/// floored at `eps_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current exploration rate.
    pub epsilon: f64,

    /// Exploration floor.
    pub eps_min: f64,

    /// Decrement per learning step.
    pub decay_rate: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            eps_min: 0.01,
            decay_rate: 5e-7,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new(epsilon: f64, eps_min: f64, decay_rate: f64) -> Self {
        Self {
            epsilon,
            eps_min,
            decay_rate,
        }
    }

    /// Draws whether the next action is taken at random.
    pub fn is_random(&self, rng: &mut impl Rng) -> bool {
        rng.gen::<f64>() < self.epsilon
    }

    /// Takes an action for a single state.
    ///
    /// `greedy` computes the greedy action and is only evaluated when the
    /// action is not drawn at random.
    pub fn action(
        &self,
        n_actions: usize,
        rng: &mut impl Rng,
        greedy: impl FnOnce() -> Result<usize>,
    ) -> Result<usize> {
        if self.is_random(rng) {
            Ok(rng.gen_range(0..n_actions))
        } else {
            greedy()
        }
    }

    /// Decays epsilon linearly, never going below `eps_min`.
    pub fn decrement(&mut self) {
        self.epsilon = if self.epsilon > self.eps_min {
            (self.epsilon - self.decay_rate).max(self.eps_min)
        } else {
            self.eps_min
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};
    use std::cell::Cell;

    #[test]
    fn test_decrement() {
        let mut explorer = EpsilonGreedy::new(0.3, 0.1, 0.08);
        let mut history = vec![explorer.epsilon];
        for _ in 0..5 {
            explorer.decrement();
            history.push(explorer.epsilon);
        }

        assert!((history[1] - 0.22).abs() < 1e-12);
        assert!((history[2] - 0.14).abs() < 1e-12);
        // 0.14 - 0.08 would undershoot, so the floor applies.
        assert_eq!(&history[3..], &[0.1, 0.1, 0.1]);
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_greedy_and_random() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);

        // The greedy action is computed for every step when epsilon is zero.
        let greedy = EpsilonGreedy::new(0.0, 0.0, 0.0);
        let calls = Cell::new(0);
        for _ in 0..10 {
            let a = greedy.action(3, &mut rng, || {
                calls.set(calls.get() + 1);
                Ok(1)
            })?;
            assert_eq!(a, 1);
        }
        assert_eq!(calls.get(), 10);

        // Random actions cover the action space without the greedy computation.
        let random = EpsilonGreedy::new(1.0, 1.0, 0.0);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let a = random.action(3, &mut rng, || {
                calls.set(calls.get() + 1);
                Ok(0)
            })?;
            seen[a] = true;
        }
        assert_eq!(seen, [true, true, true]);
        assert_eq!(calls.get(), 10);

        Ok(())
    }
}
