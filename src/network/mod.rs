pub mod config;
pub mod network;
pub mod spec;

pub use config::NetworkConfig;
pub use network::NeuralNetwork;
pub use spec::{NetworkSpec, LayerSpec};
