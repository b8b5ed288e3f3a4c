use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::{NnError, Result};
use crate::layers::dense::{Layer, LayerKind};
use crate::math::matrix::Matrix;
use crate::network::config::NetworkConfig;
use crate::train::dataset::Sample;
use crate::train::loop_fn::train_loop;
use crate::train::report::Report;

/// Feedforward network: an ordered stack of layers plus the hyperparameters
/// used to train it.
///
/// The layers own their weights and forward caches, so a network must not
/// be trained from two places at once; use [`NeuralNetwork::deep_copy`] to
/// get an independent instance.
#[derive(Debug)]
pub struct NeuralNetwork {
    config: NetworkConfig,
    layers: Vec<Layer>,
    input_dimension: usize,
    output_dimension: usize,
    rng: StdRng,
}

impl NeuralNetwork {
    pub fn new(config: NetworkConfig) -> Result<NeuralNetwork> {
        config.validate()?;
        let rng = shuffle_rng(config.seed);
        Ok(NeuralNetwork {
            config,
            layers: Vec::new(),
            input_dimension: 0,
            output_dimension: 0,
            rng,
        })
    }

    /// Appends a layer. The first layer fixes the input dimension; every
    /// later one must take as many inputs as the current last layer has
    /// units. On failure the network is left unchanged.
    pub fn add_layer(&mut self, layer: Layer) -> Result<()> {
        if self.layers.is_empty() {
            self.input_dimension = layer.num_inputs();
        } else if layer.num_inputs() != self.output_dimension {
            return Err(NnError::LayerMismatch {
                expected: self.output_dimension,
                found: layer.num_inputs(),
            });
        }
        self.output_dimension = layer.num_units();
        debug!(
            units = layer.num_units(),
            inputs = layer.num_inputs(),
            kind = ?layer.kind(),
            "layer added"
        );
        self.layers.push(layer);
        Ok(())
    }

    /// Forward pass over a batch (one sample per row). Only the per-layer
    /// forward caches change.
    pub fn predict(&mut self, batch: &Matrix) -> Result<Matrix> {
        if self.layers.is_empty() {
            return Err(NnError::InvalidTopology("network has no layers".into()));
        }
        if batch.cols != self.input_dimension {
            return Err(NnError::InputDimension {
                context: "predict",
                expected: self.input_dimension,
                found: batch.cols,
            });
        }
        let mut current = self.layers[0].forward_signal(batch)?;
        for layer in &mut self.layers[1..] {
            current = layer.forward_signal(&current)?;
        }
        Ok(current)
    }

    /// `predict` for row vectors.
    pub fn predict_rows(&mut self, rows: &[Vec<f64>]) -> Result<Matrix> {
        let batch = Matrix::from_rows(rows)?;
        self.predict(&batch)
    }

    /// Trains on `training` until `max_epochs` or until the training loss
    /// drops to `min_error`, and returns the per-epoch report.
    pub fn fit(
        &mut self,
        training: &[Sample],
        validation: Option<&[Sample]>,
        test: Option<&[Sample]>,
        min_error: f64,
    ) -> Result<Report> {
        train_loop(self, training, validation, test, min_error)
    }

    /// Independent copy with its own weights and schedules. A seeded network
    /// copies its seed; an unseeded one draws fresh entropy.
    pub fn deep_copy(&self) -> NeuralNetwork {
        NeuralNetwork {
            config: self.config.clone(),
            layers: self.layers.iter().map(Layer::deep_copy).collect(),
            input_dimension: self.input_dimension,
            output_dimension: self.output_dimension,
            rng: shuffle_rng(self.config.seed),
        }
    }

    /// Checks that the stack can be trained: at least one layer, hidden
    /// layers first and a single output layer last.
    pub fn validate_topology(&self) -> Result<()> {
        let (last, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| NnError::InvalidTopology("network has no layers".into()))?;
        if last.kind() != LayerKind::Output {
            return Err(NnError::InvalidTopology("the last layer must be an output layer".into()));
        }
        if let Some(i) = hidden.iter().position(|l| l.kind() != LayerKind::Hidden) {
            return Err(NnError::InvalidTopology(format!(
                "layer {i} is an output layer but is followed by other layers"
            )));
        }
        Ok(())
    }

    pub fn update_learning_rates(&mut self, epoch: usize) {
        for layer in &mut self.layers {
            layer.update_learning_rate(epoch);
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Replaces the weights of layer `index`. The new matrix must have the
    /// layer's current shape, so the topology is fixed once assembled.
    pub fn set_layer_weights(&mut self, index: usize, weights: Matrix) -> Result<()> {
        let depth = self.layers.len();
        let layer = self.layers.get_mut(index).ok_or_else(|| {
            NnError::InvalidTopology(format!("no layer at index {index}, network has {depth}"))
        })?;
        layer.set_weights(weights)
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn output_dimension(&self) -> usize {
        self.output_dimension
    }

    /// Input width followed by each layer's unit count.
    pub fn topology(&self) -> Vec<usize> {
        if self.layers.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.input_dimension)
            .chain(self.layers.iter().map(Layer::num_units))
            .collect()
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

fn shuffle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
