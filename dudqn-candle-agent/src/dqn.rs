//! Dueling double DQN agent.
mod base;
mod config;
mod explorer;
mod model;
mod state;
pub use base::Dqn;
pub use config::DqnConfig;
pub use explorer::EpsilonGreedy;
pub use model::{DuelingModel, DuelingModelConfig};
pub use state::DqnState;
