pub mod gradient_descent;
pub mod learning_rate;

use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::network::network::NeuralNetwork;

pub use gradient_descent::GradientDescent;
pub use learning_rate::{LearningRate, Schedule};

/// One forward + backward + update cycle over a batch.
pub trait Optimizer {
    /// `inputs` and `targets` hold one sample per row. `batch_ratio` is the
    /// batch's share of the whole training set.
    fn run_batch(
        &self,
        network: &mut NeuralNetwork,
        inputs: &Matrix,
        targets: &Matrix,
        batch_ratio: f64,
        loss: LossType,
    ) -> Result<()>;
}

/// Batching strategy, named after the usual convention:
///
/// - `FullBatch`  — one batch holding the whole training set.
/// - `MiniBatch`  — batches of the configured size.
/// - `Stochastic` — one sample per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    FullBatch,
    MiniBatch,
    Stochastic,
}

impl OptimizerKind {
    /// Rejects batch sizes the strategy cannot honour.
    pub fn validate_batch_size(&self, batch_size: usize) -> Result<()> {
        let valid = match self {
            OptimizerKind::Stochastic => batch_size == 1,
            OptimizerKind::FullBatch | OptimizerKind::MiniBatch => batch_size > 0,
        };
        if valid {
            Ok(())
        } else {
            Err(NnError::InvalidBatchSize { optimizer: self.name(), batch_size })
        }
    }

    pub fn effective_batch_size(&self, configured: usize, total_samples: usize) -> usize {
        match self {
            OptimizerKind::FullBatch => total_samples,
            OptimizerKind::MiniBatch => configured.min(total_samples),
            OptimizerKind::Stochastic => 1,
        }
    }

    pub fn optimizer(&self) -> GradientDescent {
        GradientDescent::new()
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::FullBatch => "full_batch",
            OptimizerKind::MiniBatch => "mini_batch",
            OptimizerKind::Stochastic => "stochastic",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = NnError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "batch" | "full_batch" => Ok(OptimizerKind::FullBatch),
            "mini_batch" | "minibatch" => Ok(OptimizerKind::MiniBatch),
            "sgd" | "stochastic" | "online" => Ok(OptimizerKind::Stochastic),
            _ => Err(NnError::unknown("optimizer", name)),
        }
    }
}
