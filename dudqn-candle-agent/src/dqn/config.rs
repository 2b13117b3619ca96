//! Configuration of the dueling double DQN agent.
use crate::{model::ApproximatorConfig, util::CriticLoss, Device};
use anyhow::Result;
use dudqn_core::{DudqnError, ReplayBufferConfig};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Constructs [`Dqn`](super::Dqn).
///
/// `C` is the configuration of the value function approximator. The agent
/// forwards `lr`, `critic_loss`, the I/O dimensions and the checkpoint
/// location into it, once for the online network and once for the target.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C> {
    /// Configuration of the value function approximator.
    pub model_config: C,

    /// Discount factor, in `(0, 1]`.
    pub gamma: f64,

    /// Initial exploration rate.
    pub epsilon: f64,

    /// Learning rate, overriding the one in `model_config`.
    pub lr: f64,

    pub n_actions: usize,

    /// Dimension of state vectors.
    pub input_dims: usize,

    /// Capacity of the replay buffer.
    pub memory_size: usize,

    pub batch_size: usize,

    /// Exploration floor.
    pub eps_min: f64,

    /// Epsilon decrement per learning step.
    pub decay_rate: f64,

    /// Interval of target network synchronization in learning steps.
    pub replace: usize,

    /// Algorithm name, part of checkpoint names.
    pub algo: String,

    /// Environment name, part of checkpoint names.
    pub env_name: String,

    pub checkpoint_dir: PathBuf,

    #[serde(default)]
    pub critic_loss: CriticLoss,

    /// Seed of the exploration random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Defaults to CPU when not given.
    #[serde(default)]
    pub device: Option<Device>,
}

fn default_seed() -> u64 {
    42
}

impl<C: Default> Default for DqnConfig<C> {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            gamma: 0.99,
            epsilon: 1.0,
            lr: 1e-4,
            n_actions: 2,
            input_dims: 1,
            memory_size: 50_000,
            batch_size: 32,
            eps_min: 0.01,
            decay_rate: 5e-7,
            replace: 1000,
            algo: "DuelingDDQN".to_string(),
            env_name: "env".to_string(),
            checkpoint_dir: PathBuf::from("tmp/dqn"),
            critic_loss: CriticLoss::default(),
            seed: default_seed(),
            device: None,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: ApproximatorConfig + DeserializeOwned + Serialize,
{
    /// Sets the configuration of the value function approximator.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Initial exploration rate.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Learning rate of the online network.
    pub fn lr(mut self, v: f64) -> Self {
        self.lr = v;
        self
    }

    /// Number of discrete actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Dimension of state vectors.
    pub fn input_dims(mut self, v: usize) -> Self {
        self.input_dims = v;
        self
    }

    /// Capacity of the replay buffer.
    pub fn memory_size(mut self, v: usize) -> Self {
        self.memory_size = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Exploration floor.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Epsilon decrement per learning step.
    pub fn decay_rate(mut self, v: f64) -> Self {
        self.decay_rate = v;
        self
    }

    /// Interval of target network synchronization in learning steps.
    pub fn replace(mut self, v: usize) -> Self {
        self.replace = v;
        self
    }

    /// Algorithm name used in checkpoint names.
    pub fn algo(mut self, v: impl Into<String>) -> Self {
        self.algo = v.into();
        self
    }

    /// Environment name used in checkpoint names.
    pub fn env_name(mut self, v: impl Into<String>) -> Self {
        self.env_name = v.into();
        self
    }

    /// Directory of checkpoints.
    pub fn checkpoint_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = v.into();
        self
    }

    /// Training criterion.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Seed of the exploration random number generator.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Checks the hyperparameters.
    pub fn validate(&self) -> Result<(), DudqnError> {
        let invalid = |msg: String| Err(DudqnError::InvalidConfig(msg));

        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return invalid(format!("gamma must be in (0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) || !(0.0..=1.0).contains(&self.eps_min) {
            return invalid(format!(
                "epsilon ({}) and eps_min ({}) must be in [0, 1]",
                self.epsilon, self.eps_min
            ));
        }
        if self.epsilon < self.eps_min {
            return invalid(format!(
                "epsilon ({}) must not be below eps_min ({})",
                self.epsilon, self.eps_min
            ));
        }
        if self.decay_rate < 0.0 {
            return invalid(format!("decay_rate must be non-negative, got {}", self.decay_rate));
        }
        if self.lr <= 0.0 {
            return invalid(format!("lr must be positive, got {}", self.lr));
        }
        if self.n_actions == 0 || self.input_dims == 0 {
            return invalid("n_actions and input_dims must be positive".to_string());
        }
        if self.batch_size == 0 || self.batch_size > self.memory_size {
            return invalid(format!(
                "batch_size ({}) must be in [1, memory_size ({})]",
                self.batch_size, self.memory_size
            ));
        }
        if self.replace == 0 {
            return invalid("replace must be positive".to_string());
        }

        Ok(())
    }

    /// Checkpoint name of an approximator, e.g. `CartPole_DuelingDDQN_q_eval`.
    pub fn checkpoint_name(&self, role: &str) -> String {
        format!("{}_{}_{}", self.env_name, self.algo, role)
    }

    /// Approximator configuration with the agent-level settings forwarded.
    pub fn approximator_config(&self, role: &str) -> C {
        let mut config = self.model_config.clone();
        config.set_name(self.checkpoint_name(role));
        config.set_checkpoint_dir(self.checkpoint_dir.clone());
        config.set_learning_rate(self.lr);
        config.set_io_dims(self.input_dims, self.n_actions);
        config.set_critic_loss(self.critic_loss);
        config
    }

    /// Configuration of the replay buffer owned by the agent.
    pub fn replay_buffer_config(&self) -> ReplayBufferConfig {
        ReplayBufferConfig::default()
            .capacity(self.memory_size)
            .state_dim(self.input_dims)
            .seed(self.seed.wrapping_add(1))
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dqn::DuelingModelConfig,
        mlp::DuelingMlpConfig,
        opt::OptimizerConfig,
        util::IoDim,
    };
    use tempdir::TempDir;

    type Config = DqnConfig<DuelingModelConfig<DuelingMlpConfig>>;

    fn config() -> Config {
        let model_config = DuelingModelConfig::default()
            .q_config(DuelingMlpConfig::new(1, vec![64, 64], 1))
            .opt_config(OptimizerConfig::Adam { lr: 1.0 });
        DqnConfig::default()
            .model_config(model_config)
            .n_actions(3)
            .input_dims(5)
            .lr(5e-4)
            .env_name("Corridor")
            .checkpoint_dir("/tmp/ckpt")
            .critic_loss(CriticLoss::SmoothL1)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.eps_min, 0.01);
        assert_eq!(config.decay_rate, 5e-7);
        assert_eq!(config.replace, 1000);
        assert_eq!(config.checkpoint_dir, PathBuf::from("tmp/dqn"));
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());

        let cases = vec![
            config().gamma(0.0),
            config().gamma(1.5),
            config().epsilon(0.005),
            config().epsilon(1.5),
            config().decay_rate(-1.0),
            config().lr(0.0),
            config().n_actions(0),
            config().input_dims(0),
            config().batch_size(0),
            config().memory_size(10).batch_size(11),
            config().replace(0),
        ];
        for c in cases {
            assert!(matches!(c.validate(), Err(DudqnError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_forwarded_settings() {
        let config = config();
        let q_eval = config.approximator_config("q_eval");
        let q_next = config.approximator_config("q_next");

        assert_eq!(q_eval.name, "Corridor_DuelingDDQN_q_eval");
        assert_eq!(q_next.name, "Corridor_DuelingDDQN_q_next");
        assert_eq!(q_eval.checkpoint_dir, PathBuf::from("/tmp/ckpt"));
        assert_eq!(q_eval.opt_config.get_learning_rate(), 5e-4);
        assert_eq!(q_eval.critic_loss, CriticLoss::SmoothL1);

        let q_config = q_eval.q_config.as_ref().unwrap();
        assert_eq!(q_config.get_in_dim(), 5);
        assert_eq!(q_config.get_out_dim(), 3);
    }

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = config();

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = Config::load(&path)?;
        assert_eq!(config, config_);

        println!("{:?}", config);
        Ok(())
    }
}
