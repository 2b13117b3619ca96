//! Multilayer perceptron with dueling heads.
mod base;
mod config;
pub use base::DuelingMlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::DuelingMlpConfig;

fn mlp_forward(xs: Tensor, layers: &[Linear]) -> candle_core::Result<Tensor> {
    let mut xs = xs;
    for layer in layers.iter() {
        xs = layer.forward(&xs)?.relu()?;
    }
    Ok(xs)
}
