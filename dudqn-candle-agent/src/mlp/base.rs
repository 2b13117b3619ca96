use super::{mlp_forward, DuelingMlpConfig};
use crate::model::SubModel1;
use anyhow::{ensure, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns the shared hidden layers described by [`DuelingMlpConfig`].
fn create_linear_layers(
    prefix: &str,
    vs: VarBuilder,
    config: &DuelingMlpConfig,
) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| -> Result<Linear> { Ok(linear(w[0], w[1], vs.pp(format!("ln{}", i)))?) })
        .collect()
}

/// Multilayer perceptron with a shared ReLU trunk and two linear heads.
///
/// The value head has a single unit and the advantage head has one unit per
/// action. Recombination into action values is left to the caller.
pub struct DuelingMlp {
    _config: DuelingMlpConfig,
    device: Device,
    layers: Vec<Linear>,
    value: Linear,
    advantage: Linear,
}

impl SubModel1 for DuelingMlp {
    type Config = DuelingMlpConfig;
    type Input = Tensor;
    type Output = (Tensor, Tensor);

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let xs = xs.to_device(&self.device)?;
        let xs = mlp_forward(xs, &self.layers)?;
        let value = self.value.forward(&xs)?;
        let advantage = self.advantage.forward(&xs)?;
        Ok((value, advantage))
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        ensure!(!config.units.is_empty(), "DuelingMlp needs at least one hidden layer");
        ensure!(config.in_dim > 0, "input dimension must be positive");
        ensure!(config.n_actions > 0, "number of actions must be positive");

        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs.clone(), &config)?;
        let (value, advantage) = {
            let in_dim = *config.units.last().unwrap_or(&config.in_dim);
            let value = linear(in_dim, 1, vs.pp("value"))?;
            let advantage = linear(in_dim, config.n_actions, vs.pp("advantage"))?;
            (value, advantage)
        };

        Ok(Self {
            _config: config,
            device,
            layers,
            value,
            advantage,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_output_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = DuelingMlp::build(vb, DuelingMlpConfig::new(4, vec![16, 8], 3))?;

        let xs = Tensor::zeros((5, 4), DType::F32, &Device::Cpu)?;
        let (value, advantage) = mlp.forward(&xs)?;
        assert_eq!(value.dims(), &[5, 1]);
        assert_eq!(advantage.dims(), &[5, 3]);

        // Two shared layers and two heads, each with weight and bias.
        assert_eq!(varmap.all_vars().len(), 8);

        Ok(())
    }

    #[test]
    fn test_no_hidden_layer() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(DuelingMlp::build(vb, DuelingMlpConfig::new(4, vec![], 3)).is_err());
    }
}
