use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// One `(input, target)` pair.
pub type Sample = (Vec<f64>, Vec<f64>);

/// Samples stacked into an input matrix and a target matrix, row `i` of
/// each belonging to sample `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Matrix,
    targets: Matrix,
}

impl Dataset {
    pub fn new(inputs: Matrix, targets: Matrix) -> Result<Dataset> {
        if inputs.rows == 0 {
            return Err(NnError::EmptyDataset);
        }
        if targets.rows != inputs.rows {
            return Err(NnError::ParameterShape {
                what: "target matrix",
                expected: (inputs.rows, targets.cols),
                found: targets.shape(),
            });
        }
        Ok(Dataset { inputs, targets })
    }

    pub fn from_samples(samples: &[Sample]) -> Result<Dataset> {
        let inputs: Vec<Vec<f64>> = samples.iter().map(|(x, _)| x.clone()).collect();
        let targets: Vec<Vec<f64>> = samples.iter().map(|(_, y)| y.clone()).collect();
        Dataset::new(Matrix::from_rows(&inputs)?, Matrix::from_rows(&targets)?)
    }

    pub fn len(&self) -> usize {
        self.inputs.rows
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.rows == 0
    }

    pub fn inputs(&self) -> &Matrix {
        &self.inputs
    }

    pub fn targets(&self) -> &Matrix {
        &self.targets
    }

    /// Fails unless inputs and targets have the given widths.
    pub fn check_dimensions(&self, context: &'static str, inputs: usize, targets: usize) -> Result<()> {
        if self.inputs.cols != inputs {
            return Err(NnError::InputDimension { context, expected: inputs, found: self.inputs.cols });
        }
        if self.targets.cols != targets {
            return Err(NnError::InputDimension { context, expected: targets, found: self.targets.cols });
        }
        Ok(())
    }

    /// A uniformly random permutation of the samples.
    pub fn shuffled<R: Rng>(&self, rng: &mut R) -> Dataset {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        Dataset {
            inputs: self.inputs.select_rows(&indices),
            targets: self.targets.select_rows(&indices),
        }
    }

    /// Contiguous `(inputs, targets)` windows of `batch_size` rows; the last
    /// one is shorter when the size does not divide the dataset.
    pub fn windows(&self, batch_size: usize) -> impl Iterator<Item = (Matrix, Matrix)> + '_ {
        let n = self.len();
        let batch_size = batch_size.max(1);
        (0..n).step_by(batch_size).map(move |start| {
            let end = (start + batch_size).min(n);
            (self.inputs.row_window(start, end), self.targets.row_window(start, end))
        })
    }
}
