use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::metric::metric_type::MetricType;
use crate::optim::OptimizerKind;

/// Training hyperparameters of a `NeuralNetwork`.
///
/// Validated once by `NeuralNetwork::new`; a network never changes them
/// afterwards, so build a fresh network to try other values.
///
/// # Fields
/// - `max_epochs`          — upper bound on full passes over the training data
/// - `optimizer`           — batching strategy; decides the effective batch size
/// - `loss`                — loss minimised and reported every epoch
/// - `metric`              — optional extra score reported every epoch
/// - `momentum_rate`       — fraction of the previous weight change carried over
/// - `regularization_rate` — L2 penalty per epoch, split across batches
/// - `batch_size`          — samples per batch for `MiniBatch`; must be 1 for `Stochastic`
/// - `seed`                — fixes the shuffling order; entropy-seeded when `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub max_epochs: usize,
    #[serde(default = "default_optimizer")]
    pub optimizer: OptimizerKind,
    #[serde(default = "default_loss")]
    pub loss: LossType,
    #[serde(default)]
    pub metric: Option<MetricType>,
    #[serde(default)]
    pub momentum_rate: f64,
    #[serde(default)]
    pub regularization_rate: f64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_optimizer() -> OptimizerKind {
    OptimizerKind::Stochastic
}

fn default_loss() -> LossType {
    LossType::MeanSquaredError
}

fn default_batch_size() -> usize {
    1
}

impl NetworkConfig {
    /// Online training with squared error, no momentum, no penalty.
    pub fn new(max_epochs: usize) -> Self {
        NetworkConfig {
            max_epochs,
            optimizer: default_optimizer(),
            loss: default_loss(),
            metric: None,
            momentum_rate: 0.0,
            regularization_rate: 0.0,
            batch_size: default_batch_size(),
            seed: None,
        }
    }

    /// Resolves every pluggable part by registry key and validates the result.
    /// An empty `metric` means no metric.
    pub fn from_names(
        max_epochs: usize,
        optimizer: &str,
        loss: &str,
        metric: &str,
        momentum_rate: f64,
        regularization_rate: f64,
        batch_size: usize,
    ) -> Result<Self> {
        let config = NetworkConfig {
            max_epochs,
            optimizer: optimizer.parse()?,
            loss: loss.parse()?,
            metric: MetricType::parse_optional(metric)?,
            momentum_rate,
            regularization_rate,
            batch_size,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_loss(mut self, loss: LossType) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_momentum(mut self, momentum_rate: f64) -> Self {
        self.momentum_rate = momentum_rate;
        self
    }

    pub fn with_regularization(mut self, regularization_rate: f64) -> Self {
        self.regularization_rate = regularization_rate;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(NnError::InvalidMaxEpochs(self.max_epochs));
        }
        self.optimizer.validate_batch_size(self.batch_size)?;
        if !(self.momentum_rate >= 0.0) {
            return Err(NnError::NegativeRate { name: "momentum_rate", value: self.momentum_rate });
        }
        if !(self.regularization_rate >= 0.0) {
            return Err(NnError::NegativeRate {
                name: "regularization_rate",
                value: self.regularization_rate,
            });
        }
        Ok(())
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads and validates a config written by `save_json`.
    pub fn load_json(path: &str) -> Result<NetworkConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: NetworkConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
