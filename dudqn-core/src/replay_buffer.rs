//! Fixed-capacity experience replay memory.
//!
//! Transitions are written into five parallel arrays (states, actions,
//! rewards, done flags, next states) at slot `counter % capacity`, where
//! `counter` counts every insertion since construction. Only the first
//! `min(counter, capacity)` slots are ever sampled.
mod base;
mod batch;
mod config;
mod transition;
pub use base::ReplayBuffer;
pub use batch::TransitionBatch;
pub use config::ReplayBufferConfig;
pub use transition::Transition;
