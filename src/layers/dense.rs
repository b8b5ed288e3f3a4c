use std::sync::Arc;

use rand::Rng;

use crate::activation::activation::Activation;
use crate::error::{NnError, Result};
use crate::init::weight_init::WeightInit;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::optim::learning_rate::LearningRate;

/// Which error signal a layer computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Hidden,
    Output,
}

/// Where a layer is in its per-batch cycle.
///
/// `Idle → ForwardDone → ErrorComputed → Idle`. A forward pass is allowed from
/// any phase and restarts the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ForwardDone,
    ErrorComputed,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::ForwardDone => "waiting for its error signal",
            Phase::ErrorComputed => "waiting for its weight update",
        }
    }
}

/// Inputs to [`Layer::error_signal`], one variant per [`LayerKind`].
#[derive(Debug, Clone, Copy)]
pub enum ErrorSignal<'a> {
    Output {
        targets: &'a Matrix,
        outputs: &'a Matrix,
        loss: LossType,
    },
    Hidden {
        downstream_errors: &'a Matrix,
        downstream_weights: &'a Matrix,
    },
}

/// Fully-connected layer.
///
/// `weights` has shape `(units, inputs + 1)`; column 0 holds the biases. The
/// `inputs`/`net`/`errors`/`current_delta_w` caches describe the last batch
/// only and are guarded by `phase`.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    weights: Matrix,
    learning_rates: LearningRate,
    activation: Arc<dyn Activation>,
    inputs: Matrix,
    net: Matrix,
    errors: Matrix,
    current_delta_w: Matrix,
    old_delta_w: Matrix,
    phase: Phase,
}

impl Layer {
    pub fn new(
        kind: LayerKind,
        weights: Matrix,
        learning_rates: LearningRate,
        activation: Arc<dyn Activation>,
    ) -> Result<Layer> {
        if weights.cols == 0 || weights.rows == 0 {
            return Err(NnError::InvalidTopology(
                "a layer needs at least one unit and a bias column".into(),
            ));
        }
        if learning_rates.shape() != weights.shape() {
            return Err(NnError::ParameterShape {
                what: "learning-rate matrix",
                expected: weights.shape(),
                found: learning_rates.shape(),
            });
        }
        let (rows, cols) = weights.shape();
        Ok(Layer {
            kind,
            weights,
            learning_rates,
            activation,
            inputs: Matrix::default(),
            net: Matrix::default(),
            errors: Matrix::default(),
            current_delta_w: Matrix::zeros(rows, cols),
            old_delta_w: Matrix::zeros(rows, cols),
            phase: Phase::Idle,
        })
    }

    pub fn hidden(weights: Matrix, learning_rates: LearningRate, activation: Arc<dyn Activation>) -> Result<Layer> {
        Layer::new(LayerKind::Hidden, weights, learning_rates, activation)
    }

    pub fn output(weights: Matrix, learning_rates: LearningRate, activation: Arc<dyn Activation>) -> Result<Layer> {
        Layer::new(LayerKind::Output, weights, learning_rates, activation)
    }

    /// Builds a layer with freshly initialized weights.
    pub fn initialized<R: Rng>(
        kind: LayerKind,
        units: usize,
        inputs: usize,
        init: WeightInit,
        learning_rates: LearningRate,
        activation: Arc<dyn Activation>,
        rng: &mut R,
    ) -> Result<Layer> {
        Layer::new(kind, init.build(units, inputs, rng)?, learning_rates, activation)
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn num_units(&self) -> usize {
        self.weights.rows
    }

    /// Number of inputs, bias excluded.
    pub fn num_inputs(&self) -> usize {
        self.weights.cols - 1
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Replaces the weights with a matrix of the same shape.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        if weights.shape() != self.weights.shape() {
            return Err(NnError::ParameterShape {
                what: "weight matrix",
                expected: self.weights.shape(),
                found: weights.shape(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    pub fn learning_rates(&self) -> &LearningRate {
        &self.learning_rates
    }

    pub fn activation(&self) -> &Arc<dyn Activation> {
        &self.activation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Error signal of the last batch; only valid until the weight update.
    pub fn errors(&self) -> Result<&Matrix> {
        self.expect_phase(Phase::ErrorComputed, "read error signals")?;
        Ok(&self.errors)
    }

    /// Summed gradient of the last batch; only valid until the weight update.
    pub fn current_delta_w(&self) -> Result<&Matrix> {
        self.expect_phase(Phase::ErrorComputed, "read the accumulated gradient")?;
        Ok(&self.current_delta_w)
    }

    /// Last applied weight change (the momentum term of the next update).
    pub fn old_delta_w(&self) -> &Matrix {
        &self.old_delta_w
    }

    /// Propagates a batch (one sample per row) through the layer.
    pub fn forward_signal(&mut self, batch: &Matrix) -> Result<Matrix> {
        batch.check_rectangular()?;
        if batch.cols != self.num_inputs() {
            return Err(NnError::InputDimension {
                context: "layer input",
                expected: self.num_inputs(),
                found: batch.cols,
            });
        }
        self.inputs = batch.with_bias_column();
        self.net = self.inputs.dot(&self.weights.transpose());
        self.phase = Phase::ForwardDone;
        Ok(self.activation.output_matrix(&self.net))
    }

    /// Computes the per-sample deltas and sums their outer products with the
    /// bias-augmented inputs into `current_delta_w`.
    pub fn error_signal(&mut self, signal: ErrorSignal<'_>) -> Result<()> {
        self.expect_phase(Phase::ForwardDone, "compute an error signal")?;
        let upstream = match (self.kind, signal) {
            (LayerKind::Output, ErrorSignal::Output { targets, outputs, loss }) => {
                self.check_batch("targets", targets)?;
                self.check_batch("outputs", outputs)?;
                loss.derivative(outputs, targets)
            }
            (LayerKind::Hidden, ErrorSignal::Hidden { downstream_errors, downstream_weights }) => {
                if downstream_weights.cols != self.num_units() + 1 {
                    return Err(NnError::LayerMismatch {
                        expected: self.num_units(),
                        found: downstream_weights.cols.saturating_sub(1),
                    });
                }
                if downstream_errors.rows != self.net.rows
                    || downstream_errors.cols != downstream_weights.rows
                {
                    return Err(NnError::ParameterShape {
                        what: "downstream error matrix",
                        expected: (self.net.rows, downstream_weights.rows),
                        found: downstream_errors.shape(),
                    });
                }
                // The bias column has no upstream unit to send error to.
                downstream_errors.dot(&downstream_weights.without_first_column())
            }
            (LayerKind::Output, ErrorSignal::Hidden { .. }) => {
                return Err(NnError::InvalidState {
                    operation: "apply a hidden error signal",
                    phase: "an output layer",
                })
            }
            (LayerKind::Hidden, ErrorSignal::Output { .. }) => {
                return Err(NnError::InvalidState {
                    operation: "apply an output error signal",
                    phase: "a hidden layer",
                })
            }
        };

        self.errors = self.activation.derivative_matrix(&self.net).hadamard(&upstream);
        // errorsᵗ · inputs sums the per-sample outer products in one product.
        self.current_delta_w = self.errors.transpose().dot(&self.inputs);
        self.phase = Phase::ErrorComputed;
        Ok(())
    }

    /// `Δ = -(η ⊙ ΔW) + momentum·Δold - regularization·W`, then `W += Δ`.
    ///
    /// The penalty covers the bias column too.
    pub fn update_weight(&mut self, momentum_rate: f64, regularization_rate: f64) -> Result<()> {
        self.expect_phase(Phase::ErrorComputed, "update weights")?;
        let step = self.learning_rates.value().hadamard(&self.current_delta_w);
        let delta = &(&self.old_delta_w.scale(momentum_rate) - &step)
            - &self.weights.scale(regularization_rate);
        self.weights = &self.weights + &delta;
        self.old_delta_w = delta;
        self.phase = Phase::Idle;
        Ok(())
    }

    pub fn update_learning_rate(&mut self, epoch: usize) {
        self.learning_rates.update(epoch);
    }

    /// Independent copy: own weights and schedule, shared activation, empty
    /// caches and no momentum history.
    pub fn deep_copy(&self) -> Layer {
        let (rows, cols) = self.weights.shape();
        Layer {
            kind: self.kind,
            weights: self.weights.clone(),
            learning_rates: self.learning_rates.clone(),
            activation: Arc::clone(&self.activation),
            inputs: Matrix::default(),
            net: Matrix::default(),
            errors: Matrix::default(),
            current_delta_w: Matrix::zeros(rows, cols),
            old_delta_w: Matrix::zeros(rows, cols),
            phase: Phase::Idle,
        }
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(NnError::InvalidState { operation, phase: self.phase.label() })
        }
    }

    fn check_batch(&self, what: &'static str, m: &Matrix) -> Result<()> {
        let expected = (self.net.rows, self.num_units());
        if m.shape() != expected {
            return Err(NnError::ParameterShape { what, expected, found: m.shape() });
        }
        Ok(())
    }
}
