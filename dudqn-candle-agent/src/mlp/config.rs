//! Configuration of the dueling MLP.
use crate::util::IoDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DuelingMlp`](super::DuelingMlp).
pub struct DuelingMlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) n_actions: usize,
}

impl DuelingMlpConfig {
    /// Creates configuration of the network.
    ///
    /// * `units` - Sizes of the shared hidden layers, at least one.
    pub fn new(in_dim: usize, units: Vec<usize>, n_actions: usize) -> Self {
        Self {
            in_dim,
            units,
            n_actions,
        }
    }
}

impl Default for DuelingMlpConfig {
    fn default() -> Self {
        Self::new(1, vec![512], 1)
    }
}

impl IoDim for DuelingMlpConfig {
    fn get_in_dim(&self) -> usize {
        self.in_dim
    }

    fn set_in_dim(&mut self, v: usize) {
        self.in_dim = v;
    }

    fn get_out_dim(&self) -> usize {
        self.n_actions
    }

    fn set_out_dim(&mut self, v: usize) {
        self.n_actions = v;
    }
}
