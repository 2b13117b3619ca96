//! Trains the agent on a short corridor walk.
//!
//! The agent starts at the left end of a corridor and has to reach the right
//! end. Observations are one-hot positions, action 0 moves left and action 1
//! moves right.
use anyhow::Result;
use clap::Parser;
use dudqn_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnState, DuelingModel, DuelingModelConfig},
    mlp::{DuelingMlp, DuelingMlpConfig},
    opt::OptimizerConfig,
    util::CriticLoss,
};
use log::info;

const N_ACTIONS: usize = 2;
const MEMORY_SIZE: usize = 10_000;
const BATCH_SIZE: usize = 32;
const GAMMA: f64 = 0.95;
const EPS_MIN: f64 = 0.05;
const DECAY_RATE: f64 = 1e-3;
const REPLACE: usize = 100;

type Agent = Dqn<DuelingModel<DuelingMlp>>;

/// Train a dueling double DQN agent on a corridor walk
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of cells in the corridor
    #[arg(long, default_value_t = 6)]
    length: usize,

    /// Number of training episodes
    #[arg(long, default_value_t = 200)]
    episodes: usize,

    /// Learning rate
    #[arg(long, default_value_t = 1e-3)]
    lr: f64,

    /// Seed of the exploration random number generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory of model checkpoints
    #[arg(long, default_value = "tmp/dqn")]
    checkpoint_dir: String,

    /// Use the smooth L1 loss instead of the mean squared error
    #[arg(long, default_value_t = false)]
    smooth_l1: bool,

    /// Load checkpoints and the agent state before training
    #[arg(long, default_value_t = false)]
    resume: bool,
}

struct Corridor {
    length: usize,
    pos: usize,
    steps: usize,
}

impl Corridor {
    fn new(length: usize) -> Self {
        Self {
            length,
            pos: 0,
            steps: 0,
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.pos = 0;
        self.steps = 0;
        self.obs()
    }

    fn obs(&self) -> Vec<f32> {
        let mut obs = vec![0f32; self.length];
        obs[self.pos] = 1.0;
        obs
    }

    /// Returns the next observation, the reward and the done flag.
    fn step(&mut self, action: usize) -> (Vec<f32>, f32, bool) {
        self.steps += 1;
        match action {
            0 => self.pos = self.pos.saturating_sub(1),
            _ => self.pos = (self.pos + 1).min(self.length - 1),
        }

        let goal = self.pos == self.length - 1;
        let reward = if goal { 1.0 } else { -0.01 };
        let done = goal || self.steps >= 4 * self.length;
        (self.obs(), reward, done)
    }
}

fn create_config(args: &Args) -> DqnConfig<DuelingModelConfig<DuelingMlpConfig>> {
    let model_config = DuelingModelConfig::default()
        .q_config(DuelingMlpConfig::new(args.length, vec![64, 64], N_ACTIONS))
        .opt_config(OptimizerConfig::Adam { lr: args.lr });
    let critic_loss = match args.smooth_l1 {
        true => CriticLoss::SmoothL1,
        false => CriticLoss::Mse,
    };

    DqnConfig::default()
        .model_config(model_config)
        .gamma(GAMMA)
        .epsilon(1.0)
        .lr(args.lr)
        .n_actions(N_ACTIONS)
        .input_dims(args.length)
        .memory_size(MEMORY_SIZE)
        .batch_size(BATCH_SIZE)
        .eps_min(EPS_MIN)
        .decay_rate(DECAY_RATE)
        .replace(REPLACE)
        .env_name(format!("Corridor{}", args.length))
        .checkpoint_dir(&args.checkpoint_dir)
        .critic_loss(critic_loss)
        .seed(args.seed)
}

fn run_episode(agent: &mut Agent, env: &mut Corridor, train: bool) -> Result<(f32, usize)> {
    let mut obs = env.reset();
    let mut ret = 0f32;
    loop {
        let action = agent.choose_action(&obs)?;
        let (next_obs, reward, done) = env.step(action);
        ret += reward;
        if train {
            agent.store_transition(&obs, action, reward, done, &next_obs)?;
            agent.learn()?;
        }
        if done {
            return Ok((ret, env.steps));
        }
        obs = next_obs;
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = create_config(&args);
    let state_path = config.checkpoint_dir.join("agent_state.yaml");
    let mut agent = Agent::build(config)?;
    let mut env = Corridor::new(args.length);

    if args.resume {
        agent.load_models()?;
        agent.restore_state(DqnState::load(&state_path)?)?;
    }

    let mut best = f32::MIN;
    for episode in 0..args.episodes {
        let (ret, steps) = run_episode(&mut agent, &mut env, true)?;
        if ret > best {
            best = ret;
            agent.save_models()?;
            agent.state().save(&state_path)?;
        }
        if episode % 10 == 0 {
            info!(
                "episode = {}, return = {:.2}, steps = {}, epsilon = {:.3}, learn_steps = {}",
                episode,
                ret,
                steps,
                agent.epsilon(),
                agent.learn_step_counter()
            );
        }
    }

    let (ret, steps) = run_episode(&mut agent, &mut env, false)?;
    info!("Evaluation: return = {:.2}, steps = {}", ret, steps);

    Ok(())
}
