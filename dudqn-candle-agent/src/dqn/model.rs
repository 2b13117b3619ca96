//! Dueling network approximator with its optimizer.
use crate::{
    model::{ApproximatorConfig, SubModel1, ValueFunctionApproximator},
    opt::{Optimizer, OptimizerConfig},
    util::{CriticLoss, IoDim, NamedTensors},
};
use anyhow::{bail, Context, Result};
use candle_core::{backprop::GradStore, DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("tmp/dqn")
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DuelingModel`].
pub struct DuelingModelConfig<Q> {
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
    #[serde(default)]
    pub(super) critic_loss: CriticLoss,
    #[serde(default)]
    pub(super) name: String,
    #[serde(default = "default_checkpoint_dir")]
    pub(super) checkpoint_dir: PathBuf,
}

impl<Q> Default for DuelingModelConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
            critic_loss: CriticLoss::default(),
            name: String::new(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

impl<Q> DuelingModelConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations of the dueling network.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the loss used as training criterion.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Constructs [`DuelingModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DuelingModelConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

impl<Q> ApproximatorConfig for DuelingModelConfig<Q>
where
    Q: IoDim + Clone,
{
    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_checkpoint_dir(&mut self, dir: PathBuf) {
        self.checkpoint_dir = dir;
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.opt_config = self.opt_config.clone().learning_rate(lr);
    }

    fn set_io_dims(&mut self, input_dims: usize, n_actions: usize) {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_in_dim(input_dims);
            q_config.set_out_dim(n_actions);
        }
    }

    fn set_critic_loss(&mut self, critic_loss: CriticLoss) {
        self.critic_loss = critic_loss;
    }
}

/// Dueling network owning its parameters, optimizer and criterion.
pub struct DuelingModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
{
    device: Device,
    varmap: VarMap,

    // Number of actions, the width of the advantage output.
    n_actions: usize,

    q: Q,
    opt: Optimizer,
    critic_loss: CriticLoss,
    grads: Option<GradStore>,
    name: String,
    checkpoint_dir: PathBuf,
}

impl<Q> DuelingModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
{
    /// Path of the checkpoint file, `checkpoint_dir/name`.
    pub fn checkpoint_file(&self) -> PathBuf {
        self.checkpoint_dir.join(&self.name)
    }

    /// Current learning rate of the optimizer.
    pub fn learning_rate(&self) -> f64 {
        self.opt.learning_rate()
    }
}

impl<Q> ValueFunctionApproximator for DuelingModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = (Tensor, Tensor)>,
    Q::Config: DeserializeOwned + Serialize + IoDim + Clone,
{
    type Config = DuelingModelConfig<Q::Config>;

    fn build(config: Self::Config, device: &Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let n_actions = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Q::build(vb, q_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device: device.clone(),
            varmap,
            n_actions,
            q,
            opt,
            critic_loss: config.critic_loss,
            grads: None,
            name: config.name,
            checkpoint_dir: config.checkpoint_dir,
        })
    }

    fn forward(&self, states: &Tensor) -> Result<(Tensor, Tensor)> {
        let (value, advantage) = self.q.forward(states)?;
        let (batch_size, _) = states.dims2()?;
        if value.dims() != [batch_size, 1] || advantage.dims() != [batch_size, self.n_actions] {
            bail!(
                "Unexpected output shapes: value {:?}, advantage {:?} for batch size {} and {} actions",
                value.dims(),
                advantage.dims(),
                batch_size,
                self.n_actions
            );
        }
        Ok((value, advantage))
    }

    fn parameters(&self) -> Result<NamedTensors> {
        NamedTensors::copy_from(&self.varmap)
    }

    fn load_parameters(&mut self, params: &NamedTensors) -> Result<()> {
        params.copy_to(&self.varmap)
    }

    fn zero_grad(&mut self) {
        self.grads = None;
    }

    fn backward(&mut self, loss: &Tensor) -> Result<()> {
        let mut grads = loss.backward()?;

        if let Some(prev) = self.grads.take() {
            for var in self.varmap.all_vars() {
                let t = var.as_tensor();
                let acc = match (prev.get(t), grads.get(t)) {
                    (Some(g_prev), Some(g_new)) => Some(g_prev.add(g_new)?),
                    (Some(g_prev), None) => Some(g_prev.clone()),
                    _ => None,
                };
                if let Some(acc) = acc {
                    grads.insert(t, acc);
                }
            }
        }

        self.grads = Some(grads);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        match &self.grads {
            Some(grads) => self.opt.step(grads),
            None => Ok(()),
        }
    }

    fn criterion(&self, pred: &Tensor, target: &Tensor) -> Result<Tensor> {
        self.critic_loss.loss(pred, target)
    }

    fn save_checkpoint(&self) -> Result<()> {
        fs::create_dir_all(&self.checkpoint_dir)?;
        let path = self.checkpoint_file();
        self.varmap.save(&path)?;
        info!("Save dueling model to {:?}", path);
        Ok(())
    }

    fn load_checkpoint(&mut self) -> Result<()> {
        let path = self.checkpoint_file();
        self.varmap.load(&path)?;
        info!("Load dueling model from {:?}", path);
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
