//! Batch.

/// A batch of transitions sampled from a replay buffer.
///
/// Element `i` of every field belongs to the same stored transition.
pub trait TransitionBatchBase {
    /// A set of states in a batch.
    type StateBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpack the data `(s_t, a_t, r_t, is_done_t, s_t+1)`.
    fn unpack(
        self,
    ) -> (
        Self::StateBatch,
        Self::ActBatch,
        Vec<f32>,
        Vec<bool>,
        Self::StateBatch,
    );

    /// Returns the number of transitions in the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch holds no transition.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
