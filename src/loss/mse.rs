use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Mean over samples of the squared error norm: (1/N)·Σ‖p - y‖²
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |a, b| (a - b).powi(2)).sum() / n
    }

    /// Per-output gradient: predicted - expected
    ///
    /// This is the gradient of ½‖p - y‖², the usual backprop convention;
    /// the factor 2 is left to the learning rate.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted - expected
    }
}
