//! Utilities.
use anyhow::Result;
use candle_core::{shape::D, DType, Tensor};
use dudqn_core::DudqnError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

impl CriticLoss {
    /// Computes the mean loss between predictions and targets.
    pub fn loss(&self, pred: &Tensor, target: &Tensor) -> Result<Tensor> {
        match self {
            Self::Mse => Ok(candle_nn::loss::mse(pred, target)?),
            Self::SmoothL1 => Ok(smooth_l1_loss(pred, target)?),
        }
    }
}

/// Interface for handling input and output dimensions.
pub trait IoDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;

    /// Sets the input dimension.
    fn set_in_dim(&mut self, v: usize);

    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let device = x.device();
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?.to_device(device)?;
    let m2 = Tensor::try_from(1f32)?
        .to_device(device)?
        .broadcast_sub(&m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Recombines dueling outputs into action values.
///
/// `Q(s, a) = V(s) + (A(s, a) - mean_a' A(s, a'))`, where the mean is taken
/// per sample over the action axis. `value` has shape `(batch_size, 1)` and
/// `advantage` has shape `(batch_size, n_actions)`.
pub fn dueling_q(value: &Tensor, advantage: &Tensor) -> Result<Tensor> {
    let centered = advantage.broadcast_sub(&advantage.mean_keepdim(D::Minus1)?)?;
    Ok(value.broadcast_add(&centered)?)
}

/// Index of the largest element of every row; ties go to the first index.
pub fn argmax_rows(xs: &Tensor) -> Result<Vec<u32>> {
    let rows = xs.to_dtype(DType::F32)?.to_vec2::<f32>()?;

    Ok(rows
        .iter()
        .map(|row| {
            let mut best = 0;
            for (i, v) in row.iter().enumerate() {
                if *v > row[best] {
                    best = i;
                }
            }
            best as u32
        })
        .collect())
}

/// Sets the action values of terminal samples to exactly zero.
///
/// `q` has shape `(batch_size, n_actions)` and `dones` has `batch_size` flags.
pub fn mask_terminal(q: &Tensor, dones: &[bool]) -> Result<Tensor> {
    let (batch_size, n_actions) = q.dims2()?;
    if dones.len() != batch_size {
        return Err(DudqnError::dimension_mismatch("dones", batch_size, dones.len()).into());
    }

    let mask = dones
        .iter()
        .flat_map(|&d| std::iter::repeat(d as u8).take(n_actions))
        .collect::<Vec<_>>();
    let mask = Tensor::from_vec(mask, (batch_size, n_actions), q.device())?;

    Ok(mask.where_cond(&q.zeros_like()?, q)?)
}

/// Double DQN regression target.
///
/// The next action is selected by the online network (`q_online_next`) and
/// evaluated by the target network (`q_target_next`); terminal samples are
/// masked before the lookup, so their target equals the reward.
///
/// `target = reward + gamma * q_target_next[argmax_a q_online_next]`
pub fn double_q_target(
    reward: &Tensor,
    dones: &[bool],
    q_target_next: &Tensor,
    q_online_next: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let (batch_size, _) = q_target_next.dims2()?;
    let max_actions = argmax_rows(q_online_next)?;
    let max_actions = Tensor::from_vec(max_actions, (batch_size, 1), q_target_next.device())?;
    let q_next = mask_terminal(q_target_next, dones)?;
    let q_next = q_next.gather(&max_actions, D::Minus1)?.squeeze(D::Minus1)?;

    Ok(reward.add(&q_next.affine(gamma, 0.)?)?)
}
