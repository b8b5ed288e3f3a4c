use serde::{Serialize, Deserialize};

/// Everything measured at the end of one epoch.
///
/// The training loop builds one of these per completed epoch, logs it and
/// appends it to the run's `Report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Loss over the whole training set after this epoch's updates.
    pub training_loss: f64,
    /// Configured metric over the training set, if any.
    pub training_metric: Option<f64>,
    /// Loss over the validation set, if one was provided.
    pub validation_loss: Option<f64>,
    /// Configured metric over the validation set, if both exist.
    pub validation_metric: Option<f64>,
    /// Loss over the test set, if one was provided.
    pub test_loss: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
