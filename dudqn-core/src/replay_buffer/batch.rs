//! Batch of transitions sampled from [`ReplayBuffer`](super::ReplayBuffer).
use crate::TransitionBatchBase;
use ndarray::Array2;

/// Transitions sampled from [`ReplayBuffer`](super::ReplayBuffer).
///
/// Row `i` of `states` and `next_states` and element `i` of the other fields
/// come from the same slot, `ixs[i]`.
#[derive(Clone, Debug)]
pub struct TransitionBatch {
    /// States, shape `(batch_size, state_dim)`.
    pub states: Array2<f32>,

    /// Actions.
    pub actions: Vec<usize>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Done flags.
    pub dones: Vec<bool>,

    /// Next states, shape `(batch_size, state_dim)`.
    pub next_states: Array2<f32>,

    /// Slot indices the transitions were read from.
    pub ixs: Vec<usize>,
}

impl TransitionBatchBase for TransitionBatch {
    type StateBatch = Array2<f32>;
    type ActBatch = Vec<usize>;

    fn unpack(
        self,
    ) -> (
        Self::StateBatch,
        Self::ActBatch,
        Vec<f32>,
        Vec<bool>,
        Self::StateBatch,
    ) {
        (
            self.states,
            self.actions,
            self.rewards,
            self.dones,
            self.next_states,
        )
    }

    fn len(&self) -> usize {
        self.rewards.len()
    }
}
