//! Snapshots of model parameters.
use anyhow::{anyhow, bail, Result};
use candle_core::Tensor;
use candle_nn::VarMap;
use std::collections::HashMap;

/// Point-in-time copy of the variables of a [`VarMap`], keyed by name.
///
/// The tensors are detached deep copies, so later updates of the source
/// variables do not show up in the snapshot.
#[derive(Clone, Debug)]
pub struct NamedTensors {
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copies all variables of a [`VarMap`].
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let src = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("VarMap lock is poisoned"))?;
        let named_tensors = src
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.as_tensor().detach().copy()?)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { named_tensors })
    }

    /// Overwrites the variables of a [`VarMap`] with the snapshot.
    ///
    /// Both sides must hold the same variable names and shapes.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let dest = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("VarMap lock is poisoned"))?;
        if dest.len() != self.named_tensors.len() {
            bail!(
                "Parameter count mismatch: snapshot has {}, destination has {}",
                self.named_tensors.len(),
                dest.len()
            );
        }

        for (name, var) in dest.iter() {
            let src = self
                .named_tensors
                .get(name)
                .ok_or_else(|| anyhow!("Parameter {} is missing in the snapshot", name))?;
            var.set(&src.to_device(var.device())?)?;
        }

        Ok(())
    }

    /// Sum of absolute element-wise differences over all shared parameters.
    pub fn abs_diff(&self, other: &NamedTensors) -> Result<f32> {
        let mut total = 0f32;
        for (name, t) in self.named_tensors.iter() {
            let u = other
                .named_tensors
                .get(name)
                .ok_or_else(|| anyhow!("Parameter {} is missing", name))?;
            total += t
                .sub(&u.to_device(t.device())?)?
                .abs()?
                .sum_all()?
                .to_scalar::<f32>()?;
        }
        Ok(total)
    }

    /// Number of parameter tensors.
    pub fn len(&self) -> usize {
        self.named_tensors.len()
    }

    /// Returns `true` if the snapshot holds no tensor.
    pub fn is_empty(&self) -> bool {
        self.named_tensors.is_empty()
    }
}
