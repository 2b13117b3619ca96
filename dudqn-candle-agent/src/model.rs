//! Interfaces of the neural networks used by the agent.
use crate::util::{CriticLoss, NamedTensors};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use std::path::PathBuf;

/// Neural network model not owning its [`VarMap`] internally.
///
/// [`VarMap`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_map/struct.VarMap.html
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// A state-value and advantage estimator with its own optimizer.
///
/// The agent holds two instances, the online network and the target network,
/// and talks to them only through this trait. Gradients follow the
/// zero-grad/backward/step protocol: [`backward`](Self::backward) accumulates
/// into the stored gradients until [`zero_grad`](Self::zero_grad) clears them,
/// and [`step`](Self::step) applies what is stored.
pub trait ValueFunctionApproximator {
    /// Configuration from which the approximator is built.
    type Config: ApproximatorConfig;

    /// Builds the approximator on the given device.
    fn build(config: Self::Config, device: &Device) -> Result<Self>
    where
        Self: Sized;

    /// Maps a batch of states, shape `(batch_size, input_dims)`, to
    /// `(value, advantage)` with shapes `(batch_size, 1)` and
    /// `(batch_size, n_actions)`.
    fn forward(&self, states: &Tensor) -> Result<(Tensor, Tensor)>;

    /// Takes a snapshot of all trainable parameters.
    fn parameters(&self) -> Result<NamedTensors>;

    /// Overwrites all trainable parameters with a snapshot.
    fn load_parameters(&mut self, params: &NamedTensors) -> Result<()>;

    /// Discards accumulated gradients.
    fn zero_grad(&mut self);

    /// Backpropagates `loss` and accumulates the gradients.
    fn backward(&mut self, loss: &Tensor) -> Result<()>;

    /// Applies one optimizer step with the accumulated gradients.
    fn step(&mut self) -> Result<()>;

    /// Scalar loss between predictions and regression targets.
    fn criterion(&self, pred: &Tensor, target: &Tensor) -> Result<Tensor>;

    /// Saves the parameters to the checkpoint location of this approximator.
    fn save_checkpoint(&self) -> Result<()>;

    /// Loads the parameters from the checkpoint location of this approximator.
    fn load_checkpoint(&mut self) -> Result<()>;

    /// Device holding the parameters.
    fn device(&self) -> &Device;
}

/// Settings the agent forwards into an approximator configuration.
pub trait ApproximatorConfig: Clone {
    /// Sets the checkpoint name, e.g. `CartPole_DuelingDDQN_q_eval`.
    fn set_name(&mut self, name: String);

    /// Sets the directory holding checkpoints.
    fn set_checkpoint_dir(&mut self, dir: PathBuf);

    /// Overrides the learning rate of the optimizer.
    fn set_learning_rate(&mut self, lr: f64);

    /// Sets the state dimension and the number of actions.
    fn set_io_dims(&mut self, input_dims: usize, n_actions: usize);

    /// Sets the training criterion.
    fn set_critic_loss(&mut self, critic_loss: CriticLoss);
}
