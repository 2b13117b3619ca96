//! Core interfaces.
mod batch;
mod replay_buffer;
pub use batch::TransitionBatchBase;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
