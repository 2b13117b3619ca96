#![warn(missing_docs)]
//! Core components of the dueling double DQN agent.
//!
//! This crate has no tensor dependency. It provides the experience replay
//! memory, the interfaces it implements, the error type and the records
//! returned by learning steps.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{ExperienceBufferBase, ReplayBufferBase, TransitionBatchBase};
pub use error::DudqnError;
pub use replay_buffer::{ReplayBuffer, ReplayBufferConfig, Transition, TransitionBatch};
