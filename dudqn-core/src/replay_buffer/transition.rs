//! A single transition.
use serde::{Deserialize, Serialize};

/// A single step of interaction with an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State in which the action was taken.
    pub state: Vec<f32>,

    /// Index of the action, in `[0, n_actions)`.
    pub action: usize,

    /// Reward received after the action.
    pub reward: f32,

    /// `true` if `next_state` is terminal.
    pub done: bool,

    /// State reached after the action.
    pub next_state: Vec<f32>,
}

impl Transition {
    /// Creates a transition.
    pub fn new(
        state: Vec<f32>,
        action: usize,
        reward: f32,
        done: bool,
        next_state: Vec<f32>,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            done,
            next_state,
        }
    }
}
