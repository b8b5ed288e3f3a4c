use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::activation::activation::{Activation, ActivationFunction};
use crate::error::Result;
use crate::init::weight_init::WeightInit;
use crate::layers::dense::{Layer, LayerKind};
use crate::network::config::NetworkConfig;
use crate::network::network::NeuralNetwork;
use crate::optim::learning_rate::{LearningRate, Schedule};

/// Describes one layer in a network specification.
///
/// Fields:
/// - `units`      — number of units in this layer
/// - `activation` — activation function applied to every unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: ActivationFunction,
}

/// A fully serializable description of a network: architecture, weight
/// initialization, learning-rate schedule and training hyperparameters.
///
/// This is what a search over candidate models enumerates; `build` turns
/// one candidate into a ready-to-fit network with freshly drawn weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the file stem when saving.
    pub name: String,
    pub input_size: usize,
    /// Hidden layers in forward order; may be empty.
    #[serde(default)]
    pub hidden: Vec<LayerSpec>,
    pub output: LayerSpec,
    pub init: WeightInit,
    /// Initial learning rate shared by every weight.
    pub learning_rate: f64,
    #[serde(default = "default_schedule")]
    pub schedule: Schedule,
    pub config: NetworkConfig,
}

fn default_schedule() -> Schedule {
    Schedule::Constant
}

/// Mixed into `config.seed` for weight initialization so that the weight
/// stream and the network's shuffle stream differ.
const INIT_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

impl NetworkSpec {
    /// Builds the network. With `config.seed` set, weights are drawn from
    /// `seed ^ INIT_SEED_SALT`; shuffling uses the plain seed.
    pub fn build(&self) -> Result<NeuralNetwork> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ INIT_SEED_SALT),
            None => StdRng::from_entropy(),
        };
        self.build_with_rng(&mut rng)
    }

    pub fn build_with_rng<R: Rng>(&self, rng: &mut R) -> Result<NeuralNetwork> {
        let mut network = NeuralNetwork::new(self.config.clone())?;
        let mut last_dim = self.input_size;

        let layers = self.hidden.iter()
            .map(|spec| (LayerKind::Hidden, spec))
            .chain(std::iter::once((LayerKind::Output, &self.output)));

        for (kind, spec) in layers {
            let learning_rates =
                LearningRate::scheduled(spec.units, last_dim, self.learning_rate, self.schedule)?;
            let activation: Arc<dyn Activation> = Arc::new(spec.activation);
            let layer = Layer::initialized(kind, spec.units, last_dim, self.init, learning_rates, activation, rng)?;
            network.add_layer(layer)?;
            last_dim = spec.units;
        }
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
