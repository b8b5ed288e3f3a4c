use crate::error::{NnError, Result};
use crate::layers::dense::ErrorSignal;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::NeuralNetwork;
use crate::optim::Optimizer;

/// Backpropagation with momentum and L2 weight decay.
///
/// Full-batch, mini-batch and online training all run through this one
/// path; they differ only in how many rows the caller puts in a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientDescent;

impl GradientDescent {
    pub fn new() -> GradientDescent {
        GradientDescent
    }
}

impl Optimizer for GradientDescent {
    fn run_batch(
        &self,
        network: &mut NeuralNetwork,
        inputs: &Matrix,
        targets: &Matrix,
        batch_ratio: f64,
        loss: LossType,
    ) -> Result<()> {
        let momentum = network.config().momentum_rate;
        // Scaled so one epoch applies the same total penalty whatever the batch size.
        let regularization = network.config().regularization_rate * batch_ratio;

        let layers = network.layers_mut();
        let (first, rest) = layers
            .split_first_mut()
            .ok_or_else(|| NnError::InvalidTopology("network has no layers".into()))?;

        // Forward pass; every layer caches its inputs and nets for this batch.
        let mut outputs = first.forward_signal(inputs)?;
        for layer in rest.iter_mut() {
            outputs = layer.forward_signal(&outputs)?;
        }

        let last = layers.len() - 1;
        layers[last].error_signal(ErrorSignal::Output { targets, outputs: &outputs, loss })?;

        // Hidden layers read the downstream weights before any update.
        for i in (0..last).rev() {
            let (head, tail) = layers.split_at_mut(i + 1);
            let downstream = &tail[0];
            head[i].error_signal(ErrorSignal::Hidden {
                downstream_errors: downstream.errors()?,
                downstream_weights: downstream.weights(),
            })?;
        }

        for layer in layers.iter_mut() {
            layer.update_weight(momentum, regularization)?;
        }
        Ok(())
    }
}
