//! Dueling double DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, state::DqnState};
use crate::{
    model::ValueFunctionApproximator,
    util::{argmax_rows, double_q_target, dueling_q},
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use dudqn_core::{
    record::{Record, RecordValue},
    DudqnError, ReplayBuffer, ReplayBufferBase, TransitionBatchBase,
};
use log::{debug, trace};
use ndarray::Array2;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};

/// Dueling double DQN agent.
///
/// Owns the replay buffer and two approximators, the online network `q_eval`
/// trained by [`learn`](Self::learn) and the target network `q_next` that is
/// only ever written by a full copy of `q_eval`.
pub struct Dqn<V>
where
    V: ValueFunctionApproximator,
{
    gamma: f64,
    n_actions: usize,
    input_dims: usize,
    batch_size: usize,
    replace_target_count: usize,
    learn_step_counter: usize,
    explorer: EpsilonGreedy,
    memory: ReplayBuffer,
    q_eval: V,
    q_next: V,
    device: Device,
    rng: SmallRng,
}

impl<V> Dqn<V>
where
    V: ValueFunctionApproximator,
    V::Config: DeserializeOwned + Serialize,
{
    /// Constructs the agent, building both approximators on the configured device.
    pub fn build(config: DqnConfig<V::Config>) -> Result<Self> {
        config.validate()?;
        let device = config.device.unwrap_or_default().open()?;
        let q_eval = V::build(config.approximator_config("q_eval"), &device)?;
        let q_next = V::build(config.approximator_config("q_next"), &device)?;
        let rng = SmallRng::seed_from_u64(config.seed);

        Self::from_parts(config, q_eval, q_next, rng)
    }

    /// Constructs the agent from prebuilt approximators and an exploration
    /// random number generator.
    pub fn from_parts(
        config: DqnConfig<V::Config>,
        q_eval: V,
        q_next: V,
        rng: SmallRng,
    ) -> Result<Self> {
        config.validate()?;
        let memory = ReplayBuffer::build(&config.replay_buffer_config())?;
        let device = q_eval.device().clone();

        Ok(Self {
            gamma: config.gamma,
            n_actions: config.n_actions,
            input_dims: config.input_dims,
            batch_size: config.batch_size,
            replace_target_count: config.replace,
            learn_step_counter: 0,
            explorer: EpsilonGreedy::new(config.epsilon, config.eps_min, config.decay_rate),
            memory,
            q_eval,
            q_next,
            device,
            rng,
        })
    }
}

impl<V> Dqn<V>
where
    V: ValueFunctionApproximator,
{
    /// Takes an action for a single observation with the epsilon-greedy policy.
    ///
    /// The greedy action is the argmax of the advantage output of the online
    /// network; ties go to the lowest index. Only the exploration random
    /// number generator advances.
    pub fn choose_action(&mut self, observation: &[f32]) -> Result<usize> {
        if observation.len() != self.input_dims {
            return Err(DudqnError::dimension_mismatch(
                "observation",
                self.input_dims,
                observation.len(),
            )
            .into());
        }

        let (q_eval, device, input_dims) = (&self.q_eval, &self.device, self.input_dims);
        self.explorer.action(self.n_actions, &mut self.rng, || {
            let state = Tensor::from_slice(observation, (1, input_dims), device)?;
            let (_, advantage) = q_eval.forward(&state)?;
            Ok(argmax_rows(&advantage)?[0] as usize)
        })
    }

    /// Stores a transition in the replay buffer.
    pub fn store_transition(
        &mut self,
        state: &[f32],
        action: usize,
        reward: f32,
        done: bool,
        next_state: &[f32],
    ) -> Result<()> {
        if action >= self.n_actions {
            return Err(DudqnError::InvalidAction {
                action,
                n_actions: self.n_actions,
            }
            .into());
        }
        self.memory
            .store_transition(state, action, reward, done, next_state)
    }

    /// Copies the online network into the target network when
    /// `learn_step_counter` is a multiple of the replace interval.
    pub fn replace_target_network(&mut self) -> Result<()> {
        if self.learn_step_counter % self.replace_target_count == 0 {
            let params = self.q_eval.parameters()?;
            self.q_next.load_parameters(&params)?;
            debug!(
                "Synchronized target network at learning step {}",
                self.learn_step_counter
            );
        }
        Ok(())
    }

    /// Decays epsilon by one step, floored at `eps_min`.
    pub fn decrement_epsilon(&mut self) {
        self.explorer.decrement();
    }

    fn to_tensor(&self, xs: Array2<f32>) -> Result<Tensor> {
        let shape = xs.dim();
        let data = xs.iter().copied().collect::<Vec<_>>();
        Ok(Tensor::from_vec(data, shape, &self.device)?)
    }

    /// Performs one learning step.
    ///
    /// Returns `Ok(None)` without any effect while the replay buffer holds
    /// fewer than `batch_size` transitions. Otherwise returns a record with
    /// `loss`, `epsilon` and `learn_step_counter` after the step.
    pub fn learn(&mut self) -> Result<Option<Record>> {
        if !self.memory.is_ready(self.batch_size) {
            return Ok(None);
        }

        self.q_eval.zero_grad();
        self.replace_target_network()?;

        let batch = self.memory.batch(self.batch_size)?;
        let batch_size = batch.len();
        let (states, actions, rewards, dones, next_states) = batch.unpack();
        let states = self.to_tensor(states)?;
        let next_states = self.to_tensor(next_states)?;
        let actions = {
            let actions = actions.into_iter().map(|a| a as u32).collect::<Vec<_>>();
            Tensor::from_vec(actions, (batch_size, 1), &self.device)?
        };
        let rewards = Tensor::from_vec(rewards, (batch_size,), &self.device)?;

        let (value_s, advantage_s) = self.q_eval.forward(&states)?;
        let (value_s_next, advantage_s_next) = self.q_next.forward(&next_states)?;
        let (value_s_eval, advantage_s_eval) = self.q_eval.forward(&next_states)?;

        let q_pred = dueling_q(&value_s, &advantage_s)?
            .gather(&actions, D::Minus1)?
            .squeeze(D::Minus1)?;
        let q_target = {
            let q_next = dueling_q(&value_s_next, &advantage_s_next)?.detach();
            let q_eval = dueling_q(&value_s_eval, &advantage_s_eval)?.detach();
            double_q_target(&rewards, &dones, &q_next, &q_eval, self.gamma)?.detach()
        };

        let loss = self.q_eval.criterion(&q_pred, &q_target)?;
        self.q_eval.backward(&loss)?;
        self.q_eval.step()?;

        self.learn_step_counter += 1;
        self.decrement_epsilon();

        let loss = loss.to_scalar::<f32>()?;
        trace!(
            "learn_step_counter = {}, loss = {}, epsilon = {}",
            self.learn_step_counter,
            loss,
            self.explorer.epsilon
        );

        Ok(Some(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("epsilon", RecordValue::Scalar(self.explorer.epsilon as f32)),
            (
                "learn_step_counter",
                RecordValue::Scalar(self.learn_step_counter as f32),
            ),
        ])))
    }

    /// Saves both approximators to their checkpoint locations.
    pub fn save_models(&self) -> Result<()> {
        self.q_eval.save_checkpoint()?;
        self.q_next.save_checkpoint()?;
        Ok(())
    }

    /// Loads both approximators from their checkpoint locations.
    pub fn load_models(&mut self) -> Result<()> {
        self.q_eval.load_checkpoint()?;
        self.q_next.load_checkpoint()?;
        Ok(())
    }

    /// Snapshot of the training progress.
    pub fn state(&self) -> DqnState {
        DqnState {
            epsilon: self.explorer.epsilon,
            learn_step_counter: self.learn_step_counter,
        }
    }

    /// Restores the training progress from a snapshot.
    pub fn restore_state(&mut self, state: DqnState) -> Result<()> {
        if state.epsilon < self.explorer.eps_min || state.epsilon > 1.0 {
            return Err(DudqnError::InvalidConfig(format!(
                "epsilon {} is outside [{}, 1]",
                state.epsilon, self.explorer.eps_min
            ))
            .into());
        }
        self.explorer.epsilon = state.epsilon;
        self.learn_step_counter = state.learn_step_counter;
        Ok(())
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.explorer.epsilon
    }

    /// Number of learning steps taken so far.
    pub fn learn_step_counter(&self) -> usize {
        self.learn_step_counter
    }

    /// Number of discrete actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// The replay buffer.
    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    /// The online network.
    pub fn q_eval(&self) -> &V {
        &self.q_eval
    }

    /// The target network.
    pub fn q_next(&self) -> &V {
        &self.q_next
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dqn::{DuelingModel, DuelingModelConfig},
        mlp::{DuelingMlp, DuelingMlpConfig},
        opt::OptimizerConfig,
    };
    use tempdir::TempDir;

    type Agent = Dqn<DuelingModel<DuelingMlp>>;

    fn config(dir: &std::path::Path) -> DqnConfig<DuelingModelConfig<DuelingMlpConfig>> {
        let model_config = DuelingModelConfig::default()
            .q_config(DuelingMlpConfig::new(1, vec![16], 1))
            .opt_config(OptimizerConfig::Sgd { lr: 0.01 });
        DqnConfig::default()
            .model_config(model_config)
            .n_actions(3)
            .input_dims(2)
            .memory_size(8)
            .batch_size(4)
            .replace(3)
            .epsilon(0.5)
            .eps_min(0.1)
            .decay_rate(0.1)
            .lr(0.01)
            .checkpoint_dir(dir)
    }

    fn fill(agent: &mut Agent, n: usize) -> Result<()> {
        for i in 0..n {
            let s = [i as f32, -(i as f32)];
            let s_ = [i as f32 + 1.0, -(i as f32) - 1.0];
            agent.store_transition(&s, i % 3, 1.0, i % 4 == 3, &s_)?;
        }
        Ok(())
    }

    #[test]
    fn test_build_rejects_invalid_config() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        assert!(Agent::build(config(dir.path()).gamma(0.0)).is_err());
        assert!(Agent::build(config(dir.path()).memory_size(2)).is_err());
        Ok(())
    }

    #[test]
    fn test_learn_is_noop_until_ready() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Agent::build(config(dir.path()))?;
        let params = agent.q_eval().parameters()?;

        fill(&mut agent, 3)?;
        assert!(agent.learn()?.is_none());
        assert_eq!(agent.learn_step_counter(), 0);
        assert_eq!(agent.epsilon(), 0.5);
        assert_eq!(params.abs_diff(&agent.q_eval().parameters()?)?, 0.0);

        fill(&mut agent, 1)?;
        let record = agent.learn()?.unwrap();
        assert_eq!(record.get_scalar("learn_step_counter")?, 1.0);
        assert!(record.get_scalar("loss")?.is_finite());
        assert!((record.get_scalar("epsilon")? - 0.4).abs() < 1e-6);

        Ok(())
    }

    #[test]
    fn test_epsilon_floor_through_learning() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Agent::build(config(dir.path()))?;
        fill(&mut agent, 8)?;

        let mut prev = agent.epsilon();
        for _ in 0..10 {
            agent.learn()?;
            assert!(agent.epsilon() <= prev);
            assert!(agent.epsilon() >= 0.1);
            prev = agent.epsilon();
        }
        assert_eq!(agent.epsilon(), 0.1);

        Ok(())
    }

    #[test]
    fn test_choose_action() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Agent::build(config(dir.path()).epsilon(0.0).eps_min(0.0))?;

        // Greedy actions follow the advantage output of the online network.
        let obs = [0.3, -0.7];
        let (_, adv) = agent
            .q_eval()
            .forward(&Tensor::from_slice(&obs, (1, 2), &Device::Cpu)?)?;
        let expected = argmax_rows(&adv)?[0] as usize;
        for _ in 0..5 {
            assert_eq!(agent.choose_action(&obs)?, expected);
        }

        // Choosing actions does not touch counters or epsilon.
        assert_eq!(agent.learn_step_counter(), 0);
        assert_eq!(agent.epsilon(), 0.0);
        assert_eq!(agent.memory().counter(), 0);

        assert!(agent.choose_action(&[0.0]).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_action() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Agent::build(config(dir.path()))?;
        let err = agent
            .store_transition(&[0.0, 0.0], 3, 0.0, false, &[0.0, 0.0])
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DudqnError>(),
            Some(&DudqnError::InvalidAction {
                action: 3,
                n_actions: 3
            })
        );
        assert_eq!(agent.memory().counter(), 0);
        Ok(())
    }

    #[test]
    fn test_state_snapshot() -> Result<()> {
        let dir = TempDir::new("dqn")?;
        let mut agent = Agent::build(config(dir.path()))?;
        fill(&mut agent, 4)?;
        agent.learn()?;
        agent.learn()?;

        let state = agent.state();
        assert_eq!(state.learn_step_counter, 2);

        let mut agent2 = Agent::build(config(dir.path()))?;
        agent2.restore_state(state)?;
        assert_eq!(agent2.state(), state);

        assert!(agent2
            .restore_state(DqnState {
                epsilon: 0.05,
                learn_step_counter: 0
            })
            .is_err());
        Ok(())
    }
}
