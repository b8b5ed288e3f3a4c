use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;
use crate::loss::{BceLoss, HuberLoss, MaeLoss, MeeLoss, MseLoss};
use crate::math::matrix::Matrix;

/// Selects which loss function the training loop uses.
///
/// - `MeanSquaredError`    — pair with Identity or Sigmoid output.
/// - `MeanEuclideanError`  — multi-output regression; pair with Identity output.
/// - `MeanAbsoluteError`   — pair with Identity output.
/// - `Huber`               — Huber loss (δ=1.0); pair with Identity output.
/// - `BinaryCrossEntropy`  — pair with Sigmoid output.
///
/// Every variant reports the mean over samples and differentiates the
/// per-sample loss, one gradient row per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    MeanSquaredError,
    MeanEuclideanError,
    MeanAbsoluteError,
    Huber,
    BinaryCrossEntropy,
}

impl LossType {
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            LossType::MeanSquaredError   => MseLoss::loss(predicted, expected),
            LossType::MeanEuclideanError => MeeLoss::loss(predicted, expected),
            LossType::MeanAbsoluteError  => MaeLoss::loss(predicted, expected),
            LossType::Huber              => HuberLoss::loss(predicted, expected),
            LossType::BinaryCrossEntropy => BceLoss::loss(predicted, expected),
        }
    }

    pub fn derivative(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            LossType::MeanSquaredError   => MseLoss::derivative(predicted, expected),
            LossType::MeanEuclideanError => MeeLoss::derivative(predicted, expected),
            LossType::MeanAbsoluteError  => MaeLoss::derivative(predicted, expected),
            LossType::Huber              => HuberLoss::derivative(predicted, expected),
            LossType::BinaryCrossEntropy => BceLoss::derivative(predicted, expected),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LossType::MeanSquaredError   => "mean_squared_error",
            LossType::MeanEuclideanError => "mean_euclidean_error",
            LossType::MeanAbsoluteError  => "mean_absolute_error",
            LossType::Huber              => "huber",
            LossType::BinaryCrossEntropy => "binary_cross_entropy",
        }
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LossType {
    type Err = NnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "mean_squared_error" | "mse" => Ok(LossType::MeanSquaredError),
            "mean_euclidean_error" | "euclidean_loss" | "mee" => Ok(LossType::MeanEuclideanError),
            "mean_absolute_error" | "mae" => Ok(LossType::MeanAbsoluteError),
            "huber" => Ok(LossType::Huber),
            "binary_cross_entropy" | "bce" => Ok(LossType::BinaryCrossEntropy),
            _ => Err(NnError::unknown("loss function", name)),
        }
    }
}
