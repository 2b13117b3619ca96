//! Replay buffer interface for reinforcement learning.
//!
//! Experience replay stores transitions produced by interaction with an
//! environment and hands out uniformly sampled batches for training. Two
//! interfaces split the responsibilities: [`ExperienceBufferBase`] is the
//! write side, [`ReplayBufferBase`] is the batch generation side.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    ///
    /// # Arguments
    ///
    /// * `tr` - The experience to store
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the number of experiences that can be sampled.
    fn len(&self) -> usize;

    /// Returns `true` if nothing can be sampled yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
///
/// # Associated Types
///
/// * `Config` - Configuration parameters for the buffer
/// * `Batch` - The type of batch generated for training
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of experiences for training.
    ///
    /// Implementations must fail rather than return a batch containing
    /// slots that were never written.
    ///
    /// # Arguments
    ///
    /// * `size` - The number of experiences to include in the batch
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
