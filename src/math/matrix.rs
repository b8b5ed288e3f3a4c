use serde::{Serialize, Deserialize};
use std::ops::{Add, Sub, Mul};

use crate::error::{NnError, Result};

/// Dense row-major matrix. Batches are stored one sample per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![value; cols]; rows]
        }
    }

    /// Builds a matrix from rows, rejecting ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
        let cols = rows.first().map_or(0, |r| r.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(NnError::RaggedRows { row: i, expected: cols, found: row.len() });
            }
        }
        Ok(Matrix { rows: rows.len(), cols, data: rows.to_vec() })
    }

    /// Trusted constructor for data whose rows are known to share a length.
    pub(crate) fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |r| r.len()),
            data
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Checks that the public fields still describe a rectangular matrix.
    pub fn check_rectangular(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(NnError::ParameterShape {
                what: "matrix",
                expected: (self.rows, self.cols),
                found: (self.data.len(), self.cols),
            });
        }
        match self.data.iter().position(|r| r.len() != self.cols) {
            Some(row) => Err(NnError::RaggedRows { row, expected: self.cols, found: self.data[row].len() }),
            None => Ok(()),
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Combines two same-shape matrices element by element.
    pub fn zip_map<F>(&self, other: &Matrix, functor: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        assert_eq!(self.shape(), other.shape(), "Matrices are of incorrect sizes");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(other.data.iter())
                .map(|(row_a, row_b)| {
                    row_a.iter().zip(row_b.iter()).map(|(&x, &y)| functor(x, y)).collect()
                })
                .collect(),
        }
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.zip_map(other, |x, y| x * y)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Matrix product without consuming either operand.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..res.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }

    /// Prepends a column of ones (the bias input).
    pub fn with_bias_column(&self) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols + 1,
            data: self.data.iter()
                .map(|row| std::iter::once(1.0).chain(row.iter().copied()).collect())
                .collect(),
        }
    }

    /// Drops column 0 (the bias weights of a weight matrix).
    pub fn without_first_column(&self) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols.saturating_sub(1),
            data: self.data.iter().map(|row| row.iter().skip(1).copied().collect()).collect(),
        }
    }

    /// Rows `start..end` as a new matrix.
    pub fn row_window(&self, start: usize, end: usize) -> Matrix {
        Matrix { rows: end - start, cols: self.cols, data: self.data[start..end].to_vec() }
    }

    /// Rows in the order given by `indices`.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data: indices.iter().map(|&i| self.data[i].clone()).collect(),
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(|r| r.as_slice())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(&rhs)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_data(rows.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn ragged_data_is_detected() {
        let mut a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert!(a.check_rectangular().is_ok());
        a.data[1].pop();
        assert!(matches!(
            a.check_rectangular(),
            Err(NnError::RaggedRows { row: 1, expected: 2, found: 1 })
        ));
        a.rows = 3;
        assert!(a.check_rectangular().is_err());
    }

    #[test]
    fn product_matches_hand_computation() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = m(&[&[5.0], &[6.0]]);
        assert_eq!(&a * &b, m(&[&[17.0], &[39.0]]));
    }

    #[test]
    fn bias_column_is_prepended() {
        let a = m(&[&[2.0, 3.0], &[4.0, 5.0]]);
        let with_bias = a.with_bias_column();
        assert_eq!(with_bias, m(&[&[1.0, 2.0, 3.0], &[1.0, 4.0, 5.0]]));
        assert_eq!(with_bias.without_first_column(), a);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, NnError::RaggedRows { row: 1, expected: 2, found: 1 }));
    }

    #[test]
    fn select_rows_follows_index_order() {
        let a = m(&[&[1.0], &[2.0], &[3.0]]);
        assert_eq!(a.select_rows(&[2, 0]), m(&[&[3.0], &[1.0]]));
        assert_eq!(a.row_window(1, 3), m(&[&[2.0], &[3.0]]));
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn mismatched_add_panics() {
        let _ = Matrix::zeros(2, 2) + Matrix::zeros(2, 3);
    }
}
