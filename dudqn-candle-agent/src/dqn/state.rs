//! Snapshot of the training progress.
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Training progress of [`Dqn`](super::Dqn).
///
/// Approximator checkpoints do not include it, so it is saved separately
/// when training is resumed later.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub struct DqnState {
    /// Exploration rate.
    pub epsilon: f64,

    /// Number of learning steps taken.
    pub learn_step_counter: usize,
}

impl DqnState {
    /// Loads [`DqnState`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let state = serde_yaml::from_reader(rdr)?;
        info!("Load agent state from {:?}", path_);
        Ok(state)
    }

    /// Saves [`DqnState`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save agent state into {:?}", path_);
        Ok(())
    }
}
