use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Weight initialization strategy.
///
/// Every variant produces a `(units, inputs + 1)` matrix whose column 0 holds
/// the bias weights. The fan-in used for scaling is `inputs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Samples from N(0, sqrt(1 / fan_in)). Suits Sigmoid/Tanh/Identity layers.
    Xavier,
    /// Samples from N(0, sqrt(2 / fan_in)). Suits ReLU layers.
    He,
    /// Uniform in `[low, high)`.
    RangedUniform { low: f64, high: f64 },
    /// Uniform in `[-1, 1)`.
    RandomUniform,
}

impl WeightInit {
    pub fn build<R: Rng>(&self, units: usize, inputs: usize, rng: &mut R) -> Result<Matrix> {
        if let WeightInit::RangedUniform { low, high } = *self {
            if !(low < high) {
                return Err(NnError::InvalidInitializer(format!(
                    "ranged_uniform needs low < high, got [{low}, {high})"
                )));
            }
        }
        let cols = inputs + 1;
        let fan_in = inputs.max(1) as f64;
        let mut res = Matrix::zeros(units, cols);
        for i in 0..units {
            for j in 0..cols {
                res.data[i][j] = match *self {
                    WeightInit::Xavier => sample_standard_normal(rng) * (1.0 / fan_in).sqrt(),
                    WeightInit::He => sample_standard_normal(rng) * (2.0 / fan_in).sqrt(),
                    WeightInit::RangedUniform { low, high } => rng.gen_range(low..high),
                    WeightInit::RandomUniform => rng.gen::<f64>() * 2.0 - 1.0,
                };
            }
        }
        Ok(res)
    }
}

/// `ranged_uniform` resolves to U(-0.7, 0.7).
impl FromStr for WeightInit {
    type Err = NnError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "xavier" | "glorot" => Ok(WeightInit::Xavier),
            "he" | "kaiming" => Ok(WeightInit::He),
            "ranged_uniform" => Ok(WeightInit::RangedUniform { low: -0.7, high: 0.7 }),
            "random_uniform" | "uniform" => Ok(WeightInit::RandomUniform),
            _ => Err(NnError::unknown("weight initializer", name)),
        }
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
