//! Circular replay buffer with uniform sampling.
use super::{ReplayBufferConfig, Transition, TransitionBatch};
use crate::{DudqnError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use ndarray::{Array2, ArrayView1, Axis};
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A fixed-capacity replay buffer.
///
/// The five fields of a transition live in parallel arrays indexed by the
/// same slot. The write cursor `counter` is never reset; the slot written by
/// an insertion is `counter % capacity`.
pub struct ReplayBuffer {
    capacity: usize,
    state_dim: usize,
    counter: usize,
    states: Array2<f32>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    next_states: Array2<f32>,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Creates a buffer sampling with the given random number generator.
    pub fn with_rng(capacity: usize, state_dim: usize, rng: StdRng) -> Result<Self> {
        if capacity == 0 {
            return Err(
                DudqnError::InvalidConfig("replay buffer capacity must be positive".into()).into(),
            );
        }
        if state_dim == 0 {
            return Err(DudqnError::InvalidConfig("state dimension must be positive".into()).into());
        }

        Ok(Self {
            capacity,
            state_dim,
            counter: 0,
            states: Array2::zeros((capacity, state_dim)),
            actions: vec![0; capacity],
            rewards: vec![0.; capacity],
            dones: vec![false; capacity],
            next_states: Array2::zeros((capacity, state_dim)),
            rng,
        })
    }

    fn check_dim(&self, name: &str, v: &[f32]) -> Result<()> {
        if v.len() != self.state_dim {
            return Err(DudqnError::dimension_mismatch(name, self.state_dim, v.len()).into());
        }
        Ok(())
    }

    /// Writes a transition into slot `counter % capacity` and advances the cursor.
    pub fn store_transition(
        &mut self,
        state: &[f32],
        action: usize,
        reward: f32,
        done: bool,
        next_state: &[f32],
    ) -> Result<()> {
        self.check_dim("state", state)?;
        self.check_dim("next_state", next_state)?;

        let i = self.counter % self.capacity;
        self.states.row_mut(i).assign(&ArrayView1::from(state));
        self.actions[i] = action;
        self.rewards[i] = reward;
        self.dones[i] = done;
        self.next_states
            .row_mut(i)
            .assign(&ArrayView1::from(next_state));
        self.counter += 1;

        Ok(())
    }

    /// Samples `batch_size` distinct slots uniformly from the valid range.
    ///
    /// Fails with [`DudqnError::InsufficientData`] when fewer than
    /// `batch_size` transitions have been stored.
    pub fn sample_buffer(&mut self, batch_size: usize) -> Result<TransitionBatch> {
        let available = self.len();
        if batch_size > available {
            return Err(DudqnError::InsufficientData {
                requested: batch_size,
                available,
            }
            .into());
        }

        let ixs = index::sample(&mut self.rng, available, batch_size).into_vec();

        Ok(TransitionBatch {
            states: self.states.select(Axis(0), &ixs),
            actions: ixs.iter().map(|&ix| self.actions[ix]).collect(),
            rewards: ixs.iter().map(|&ix| self.rewards[ix]).collect(),
            dones: ixs.iter().map(|&ix| self.dones[ix]).collect(),
            next_states: self.next_states.select(Axis(0), &ixs),
            ixs,
        })
    }

    /// Returns `true` if a batch of `batch_size` can be sampled.
    pub fn is_ready(&self, batch_size: usize) -> bool {
        self.len() >= batch_size
    }

    /// Total number of insertions since construction.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Dimension of stored states.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Reads the transition stored in a valid slot.
    pub fn get(&self, slot: usize) -> Option<Transition> {
        if slot >= self.len() {
            return None;
        }

        Some(Transition {
            state: self.states.row(slot).to_vec(),
            action: self.actions[slot],
            reward: self.rewards[slot],
            done: self.dones[slot],
            next_state: self.next_states.row(slot).to_vec(),
        })
    }
}

impl ExperienceBufferBase for ReplayBuffer {
    type Item = Transition;

    /// Number of valid transitions, `min(counter, capacity)`.
    fn len(&self) -> usize {
        self.counter.min(self.capacity)
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.store_transition(&tr.state, tr.action, tr.reward, tr.done, &tr.next_state)
    }
}

impl ReplayBufferBase for ReplayBuffer {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch;

    fn build(config: &Self::Config) -> Result<Self> {
        Self::with_rng(
            config.capacity,
            config.state_dim,
            StdRng::seed_from_u64(config.seed),
        )
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample_buffer(size)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::TransitionBatchBase;
    use std::collections::HashSet;

    fn buffer(capacity: usize) -> ReplayBuffer {
        let config = ReplayBufferConfig::default()
            .capacity(capacity)
            .state_dim(3)
            .seed(7);
        ReplayBuffer::build(&config).unwrap()
    }

    fn fill(buffer: &mut ReplayBuffer, n: usize) {
        for i in 0..n {
            let s = vec![i as f32; 3];
            let s_next = vec![i as f32 + 0.5; 3];
            buffer
                .store_transition(&s, i % 4, i as f32 * 10.0, i % 3 == 0, &s_next)
                .unwrap();
        }
    }

    #[test]
    fn test_len_before_wraparound() {
        let mut buffer = buffer(8);
        assert!(buffer.is_empty());
        fill(&mut buffer, 5);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.counter(), 5);
        assert!(buffer.get(4).is_some());
        assert!(buffer.get(5).is_none());
    }

    #[test]
    fn test_wraparound() {
        let capacity = 8;
        let k = 3;
        let mut buffer = buffer(capacity);
        fill(&mut buffer, capacity + k);

        assert_eq!(buffer.len(), capacity);
        assert_eq!(buffer.counter(), capacity + k);

        // The latest insertion overwrote the slot written `capacity` insertions earlier.
        let last = capacity + k - 1;
        let tr = buffer.get(last % capacity).unwrap();
        assert_eq!(tr.state, vec![last as f32; 3]);
        assert_eq!(tr.action, last % 4);
        assert_eq!(tr.reward, last as f32 * 10.0);

        // Slots not yet overwritten keep the first round.
        let tr = buffer.get(k).unwrap();
        assert_eq!(tr.state, vec![k as f32; 3]);
    }

    #[test]
    fn test_sample_distinct_and_aligned() -> Result<()> {
        let mut buffer = buffer(16);
        fill(&mut buffer, 12);

        for _ in 0..20 {
            let batch = buffer.sample_buffer(12)?;
            assert_eq!(batch.len(), 12);

            let ixs: HashSet<_> = batch.ixs.iter().copied().collect();
            assert_eq!(ixs.len(), 12);

            for (i, &ix) in batch.ixs.iter().enumerate() {
                assert!(ix < 12);
                let v = batch.states[[i, 0]];
                assert_eq!(v, ix as f32);
                assert_eq!(batch.next_states[[i, 2]], ix as f32 + 0.5);
                assert_eq!(batch.actions[i], ix % 4);
                assert_eq!(batch.rewards[i], ix as f32 * 10.0);
                assert_eq!(batch.dones[i], ix % 3 == 0);
            }
        }

        Ok(())
    }

    #[test]
    fn test_sample_never_reads_unwritten_slots() -> Result<()> {
        let mut buffer = buffer(100);
        fill(&mut buffer, 5);

        for _ in 0..50 {
            let batch = buffer.sample_buffer(3)?;
            assert!(batch.ixs.iter().all(|&ix| ix < 5));
        }

        Ok(())
    }

    #[test]
    fn test_insufficient_data() {
        let mut buffer = buffer(10);
        fill(&mut buffer, 3);
        assert!(!buffer.is_ready(4));

        let err = buffer.sample_buffer(4).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DudqnError>(),
            Some(&DudqnError::InsufficientData {
                requested: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut buffer = buffer(4);
        let err = buffer
            .store_transition(&[0.0, 1.0], 0, 0.0, false, &[0.0, 1.0, 2.0])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DudqnError>(),
            Some(DudqnError::DimensionMismatch { .. })
        ));
        assert_eq!(buffer.counter(), 0);
    }

    #[test]
    fn test_push_item() -> Result<()> {
        let mut buffer = buffer(2);
        let tr = Transition::new(vec![1.0, 2.0, 3.0], 1, 0.5, true, vec![4.0, 5.0, 6.0]);
        buffer.push(tr.clone())?;
        assert_eq!(buffer.get(0), Some(tr));
        Ok(())
    }

    #[test]
    fn test_zero_capacity() {
        let config = ReplayBufferConfig::default().capacity(0);
        assert!(ReplayBuffer::build(&config).is_err());
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() -> Result<()> {
        let mut b1 = buffer(32);
        let mut b2 = buffer(32);
        fill(&mut b1, 32);
        fill(&mut b2, 32);
        assert_eq!(b1.sample_buffer(8)?.ixs, b2.sample_buffer(8)?.ixs);
        Ok(())
    }

    #[test]
    fn test_config_yaml() -> Result<()> {
        let config = ReplayBufferConfig::default().capacity(123).state_dim(4).seed(9);
        let dir = tempdir::TempDir::new("replay_buffer_config")?;
        let path = dir.path().join("replay_buffer.yaml");
        config.save(&path)?;
        assert_eq!(config, ReplayBufferConfig::load(&path)?);
        Ok(())
    }
}
