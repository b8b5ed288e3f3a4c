use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

use crate::error::NnError;
use crate::math::matrix::Matrix;

/// Element-wise activation applied by every unit of a layer.
///
/// Layers hold activations behind an `Arc`, so one instance may be shared by
/// several layers and by deep copies of them.
pub trait Activation: fmt::Debug + Send + Sync {
    fn output(&self, x: f64) -> f64;

    /// Derivative with respect to the pre-activation value `x`.
    fn derivative(&self, x: f64) -> f64;

    fn name(&self) -> &str;

    fn output_matrix(&self, net: &Matrix) -> Matrix {
        net.map(|x| self.output(x))
    }

    fn derivative_matrix(&self, net: &Matrix) -> Matrix {
        net.map(|x| self.derivative(x))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Identity,
    Sigmoid,
    Tanh,
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
        }
    }

    pub fn slope(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            },
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { 1.0 } else { alpha * E.powf(x) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (x + 0.044715 * x.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * x.powi(2));
                0.5 * tanh_inner + 0.5 * x * sech2 * d_inner + 0.5
            }
            ActivationFunction::Swish => {
                let sig = 1.0 / (1.0 + E.powf(-x));
                sig + x * sig * (1.0 - sig)
            }
        }
    }
}

impl Activation for ActivationFunction {
    fn output(&self, x: f64) -> f64 {
        self.function(x)
    }

    fn derivative(&self, x: f64) -> f64 {
        self.slope(x)
    }

    fn name(&self) -> &str {
        match self {
            ActivationFunction::Identity => "identity",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::LeakyReLU { .. } => "leaky_relu",
            ActivationFunction::Elu { .. } => "elu",
            ActivationFunction::Gelu => "gelu",
            ActivationFunction::Swish => "swish",
        }
    }
}

/// Parses a registry key. Parameterised variants get alpha = 0.01 (leaky)
/// and alpha = 1.0 (elu).
impl FromStr for ActivationFunction {
    type Err = NnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "identity" | "linear" => Ok(ActivationFunction::Identity),
            "sigmoid" | "logistic" => Ok(ActivationFunction::Sigmoid),
            "tanh" => Ok(ActivationFunction::Tanh),
            "relu" => Ok(ActivationFunction::ReLU),
            "leaky_relu" => Ok(ActivationFunction::LeakyReLU { alpha: 0.01 }),
            "elu" => Ok(ActivationFunction::Elu { alpha: 1.0 }),
            "gelu" => Ok(ActivationFunction::Gelu),
            "swish" => Ok(ActivationFunction::Swish),
            _ => Err(NnError::unknown("activation function", name)),
        }
    }
}
