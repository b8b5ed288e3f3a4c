use serde::{Serialize, Deserialize};
use std::str::FromStr;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// How a layer's learning rates evolve across epochs.
///
/// The schedule scales the initial per-weight rates by a factor that depends
/// only on how many epochs have completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    Constant,
    /// Linear interpolation from η₀ down to `final_fraction · η₀` over
    /// `decay_epochs`, flat afterwards.
    LinearDecay { final_fraction: f64, decay_epochs: usize },
    /// Multiply by `gamma` every `step_size` epochs.
    StepDecay { step_size: usize, gamma: f64 },
}

impl Schedule {
    /// Scale applied to the initial rates once `completed` epochs are done.
    pub fn factor(&self, completed: usize) -> f64 {
        match *self {
            Schedule::Constant => 1.0,
            Schedule::LinearDecay { final_fraction, decay_epochs } => {
                if completed >= decay_epochs {
                    final_fraction
                } else {
                    let alpha = completed as f64 / decay_epochs as f64;
                    (1.0 - alpha) + alpha * final_fraction
                }
            }
            Schedule::StepDecay { step_size, gamma } => {
                gamma.powi((completed / step_size) as i32)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Schedule::Constant => Ok(()),
            Schedule::LinearDecay { final_fraction, decay_epochs } => {
                if !(0.0..=1.0).contains(&final_fraction) {
                    return Err(NnError::InvalidSchedule(format!(
                        "final_fraction must be in [0, 1], got {final_fraction}"
                    )));
                }
                if decay_epochs == 0 {
                    return Err(NnError::InvalidSchedule("decay_epochs must be positive".into()));
                }
                Ok(())
            }
            Schedule::StepDecay { step_size, gamma } => {
                if step_size == 0 {
                    return Err(NnError::InvalidSchedule("step_size must be positive".into()));
                }
                if !(gamma > 0.0 && gamma <= 1.0) {
                    return Err(NnError::InvalidSchedule(format!(
                        "gamma must be in (0, 1], got {gamma}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Registry keys. Decaying schedules get defaults: `linear_decay` reaches 1%
/// of the initial rate after 100 epochs, `step_decay` halves every 10.
impl FromStr for Schedule {
    type Err = NnError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "constant" => Ok(Schedule::Constant),
            "linear_decay" | "linear" => {
                Ok(Schedule::LinearDecay { final_fraction: 0.01, decay_epochs: 100 })
            }
            "step_decay" | "step" => Ok(Schedule::StepDecay { step_size: 10, gamma: 0.5 }),
            _ => Err(NnError::unknown("learning-rate schedule", name)),
        }
    }
}

/// Per-weight learning rates of one layer plus the schedule that moves them.
///
/// Shape matches the layer's weight matrix, bias column included. Cloning
/// yields a fully independent schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRate {
    initial: Matrix,
    values: Matrix,
    schedule: Schedule,
}

impl LearningRate {
    pub fn new(initial: Matrix, schedule: Schedule) -> Result<LearningRate> {
        schedule.validate()?;
        if let Some(&value) = initial.data.iter().flatten().find(|&&x| !(x >= 0.0)) {
            return Err(NnError::NegativeRate { name: "learning rate", value });
        }
        Ok(LearningRate { values: initial.clone(), initial, schedule })
    }

    /// The same rate for every weight of a `(units, inputs + 1)` layer.
    pub fn constant(units: usize, inputs: usize, rate: f64) -> Result<LearningRate> {
        LearningRate::scheduled(units, inputs, rate, Schedule::Constant)
    }

    pub fn scheduled(units: usize, inputs: usize, rate: f64, schedule: Schedule) -> Result<LearningRate> {
        LearningRate::new(Matrix::filled(units, inputs + 1, rate), schedule)
    }

    pub fn value(&self) -> &Matrix {
        &self.values
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    /// Moves the rates to what they should be after `epoch` (0-based) has
    /// completed, i.e. the rates used during epoch `epoch + 1`.
    pub fn update(&mut self, epoch: usize) {
        let factor = self.schedule.factor(epoch + 1);
        self.values = self.initial.scale(factor);
    }
}
