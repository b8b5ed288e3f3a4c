use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::metric::metric_type::MetricType;
use crate::train::epoch_stats::EpochStats;

/// Append-only `(epoch, value)` series with strictly increasing epochs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<(usize, f64)>,
}

impl Series {
    pub fn push(&mut self, epoch: usize, value: f64) -> Result<()> {
        if let Some(&(last, _)) = self.points.last() {
            if epoch <= last {
                return Err(NnError::NonMonotonicEpoch { epoch, last });
            }
        }
        self.points.push((epoch, value));
        Ok(())
    }

    pub fn get(&self, epoch: usize) -> Option<f64> {
        self.points
            .binary_search_by_key(&epoch, |&(e, _)| e)
            .ok()
            .map(|i| self.points[i].1)
    }

    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|&(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|&(_, v)| v).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.points.iter().copied()
    }

    /// `(epoch, value)` of the smallest value; the earliest wins ties.
    pub fn min(&self) -> Option<(usize, f64)> {
        self.best_by(|candidate, best| candidate < best)
    }

    /// `(epoch, value)` of the largest value; the earliest wins ties.
    pub fn max(&self) -> Option<(usize, f64)> {
        self.best_by(|candidate, best| candidate > best)
    }

    fn best_by(&self, better: impl Fn(f64, f64) -> bool) -> Option<(usize, f64)> {
        self.points.iter().copied().fold(None, |best, point| match best {
            Some((_, value)) if !better(point.1, value) => best,
            _ => Some(point),
        })
    }
}

/// Per-epoch record of one `fit` call.
///
/// The "accuracy" series hold whatever metric the network was configured
/// with; they stay empty when it has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    max_epochs: usize,
    min_error: f64,
    metric: Option<MetricType>,
    training_error: Series,
    training_accuracy: Series,
    validation_error: Series,
    validation_accuracy: Series,
    test_error: Series,
    converged: bool,
}

impl Report {
    pub fn new(max_epochs: usize, min_error: f64, metric: Option<MetricType>) -> Report {
        Report {
            max_epochs,
            min_error,
            metric,
            training_error: Series::default(),
            training_accuracy: Series::default(),
            validation_error: Series::default(),
            validation_accuracy: Series::default(),
            test_error: Series::default(),
            converged: false,
        }
    }

    /// Appends every value present in `stats` under `stats.epoch`.
    pub fn record(&mut self, stats: &EpochStats) -> Result<()> {
        let epoch = stats.epoch;
        self.training_error.push(epoch, stats.training_loss)?;
        if let Some(v) = stats.training_metric {
            self.training_accuracy.push(epoch, v)?;
        }
        if let Some(v) = stats.validation_loss {
            self.validation_error.push(epoch, v)?;
        }
        if let Some(v) = stats.validation_metric {
            self.validation_accuracy.push(epoch, v)?;
        }
        if let Some(v) = stats.test_loss {
            self.test_error.push(epoch, v)?;
        }
        Ok(())
    }

    pub(crate) fn mark_converged(&mut self) {
        self.converged = true;
    }

    pub fn training_error(&self) -> &Series {
        &self.training_error
    }

    pub fn training_accuracy(&self) -> &Series {
        &self.training_accuracy
    }

    pub fn validation_error(&self) -> &Series {
        &self.validation_error
    }

    pub fn validation_accuracy(&self) -> &Series {
        &self.validation_accuracy
    }

    pub fn test_error(&self) -> &Series {
        &self.test_error
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn min_error(&self) -> f64 {
        self.min_error
    }

    pub fn metric(&self) -> Option<MetricType> {
        self.metric
    }

    pub fn epochs_run(&self) -> usize {
        self.training_error.len()
    }

    /// Whether training stopped because the loss reached `min_error`.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn final_training_error(&self) -> Option<f64> {
        self.training_error.last()
    }

    pub fn final_validation_error(&self) -> Option<f64> {
        self.validation_error.last()
    }

    pub fn final_validation_accuracy(&self) -> Option<f64> {
        self.validation_accuracy.last()
    }

    pub fn best_validation_error(&self) -> Option<(usize, f64)> {
        self.validation_error.min()
    }

    /// Best validation metric, honouring whether the metric grows or shrinks
    /// with quality.
    pub fn best_validation_accuracy(&self) -> Option<(usize, f64)> {
        match self.metric {
            Some(metric) if metric.higher_is_better() => self.validation_accuracy.max(),
            Some(_) => self.validation_accuracy.min(),
            None => None,
        }
    }

    /// Serializes the report to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
