pub mod math;
pub mod activation;
pub mod error;
pub mod init;
pub mod layers;
pub mod loss;
pub mod metric;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::{Activation, ActivationFunction};
pub use error::{ErrorKind, NnError, Result};
pub use init::weight_init::WeightInit;
pub use layers::dense::{ErrorSignal, Layer, LayerKind, Phase};
pub use loss::loss_type::LossType;
pub use metric::metric_type::MetricType;
pub use network::{LayerSpec, NetworkConfig, NetworkSpec, NeuralNetwork};
pub use optim::{GradientDescent, LearningRate, Optimizer, OptimizerKind, Schedule};
pub use train::{Dataset, EpochStats, Report, Sample, Series, DEFAULT_MIN_ERROR};
