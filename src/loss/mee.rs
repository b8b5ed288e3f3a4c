use crate::math::matrix::Matrix;

/// Mean Euclidean error, the usual score for multi-output regression.
pub struct MeeLoss;

impl MeeLoss {
    /// Scalar MEE: (1/N)·Σ‖p - y‖₂
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.rows as f64;
        predicted.iter_rows().zip(expected.iter_rows())
            .map(|(p, y)| row_norm(p, y))
            .sum::<f64>() / n
    }

    /// Per-sample gradient: (p - y) / ‖p - y‖, zero where the sample is exact.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let data = predicted.iter_rows().zip(expected.iter_rows())
            .map(|(p, y)| {
                let norm = row_norm(p, y);
                p.iter().zip(y.iter())
                    .map(|(a, b)| if norm > 0.0 { (a - b) / norm } else { 0.0 })
                    .collect()
            })
            .collect();
        Matrix::from_data(data)
    }
}

fn row_norm(p: &[f64], y: &[f64]) -> f64 {
    p.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt()
}
