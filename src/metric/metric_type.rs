use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;
use crate::loss::{MaeLoss, MeeLoss, MseLoss};
use crate::math::matrix::Matrix;

/// Score reported next to the loss after every epoch.
///
/// Classification accuracy thresholds a single output column at 0.5 and
/// uses argmax when there are several output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ClassificationAccuracy,
    MeanEuclideanError,
    MeanSquaredError,
    MeanAbsoluteError,
}

impl MetricType {
    pub fn evaluate(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            MetricType::ClassificationAccuracy => accuracy(predicted, expected),
            MetricType::MeanEuclideanError => MeeLoss::loss(predicted, expected),
            MetricType::MeanSquaredError => MseLoss::loss(predicted, expected),
            MetricType::MeanAbsoluteError => MaeLoss::loss(predicted, expected),
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, MetricType::ClassificationAccuracy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetricType::ClassificationAccuracy => "classification_accuracy",
            MetricType::MeanEuclideanError => "mean_euclidean_error",
            MetricType::MeanSquaredError => "mean_squared_error",
            MetricType::MeanAbsoluteError => "mean_absolute_error",
        }
    }

    /// Resolves an optional metric; the empty string means "no metric".
    pub fn parse_optional(name: &str) -> Result<Option<MetricType>, NnError> {
        if name.is_empty() {
            Ok(None)
        } else {
            name.parse().map(Some)
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricType {
    type Err = NnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "classification_accuracy" | "accuracy" => Ok(MetricType::ClassificationAccuracy),
            "mean_euclidean_error" | "euclidean_loss" | "mee" => Ok(MetricType::MeanEuclideanError),
            "mean_squared_error" | "mse" => Ok(MetricType::MeanSquaredError),
            "mean_absolute_error" | "mae" => Ok(MetricType::MeanAbsoluteError),
            _ => Err(NnError::unknown("metric", name)),
        }
    }
}

/// Fraction of samples classified correctly.
fn accuracy(predicted: &Matrix, expected: &Matrix) -> f64 {
    let n = predicted.rows;
    if n == 0 {
        return 0.0;
    }
    let correct = predicted.iter_rows().zip(expected.iter_rows())
        .filter(|(p, y)| {
            if p.len() == 1 {
                (p[0] >= 0.5) == (y[0] >= 0.5)
            } else {
                argmax(p) == argmax(y)
            }
        })
        .count();
    correct as f64 / n as f64
}

/// Index of the maximum element in a slice.
fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
