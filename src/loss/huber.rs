use crate::math::matrix::Matrix;

pub struct HuberLoss;

// Fixed δ = 1.0 keeps the enum variant unit (no f64 field) → preserves Eq + Copy.
const DELTA: f64 = 1.0;

impl HuberLoss {
    /// Mean over samples of Σ h(predicted − expected)
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.rows as f64;
        predicted.zip_map(expected, |p, y| {
            let x = p - y;
            if x.abs() <= DELTA {
                0.5 * x * x
            } else {
                DELTA * (x.abs() - 0.5 * DELTA)
            }
        }).sum() / n
    }

    /// Per-output gradient: x  if |x| ≤ δ,  else δ·sign(x)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted.zip_map(expected, |p, y| {
            let x = p - y;
            if x.abs() <= DELTA { x } else { DELTA * x.signum() }
        })
    }
}
