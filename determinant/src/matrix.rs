use std::ops::Range;

use crate::Error;

/// A square matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    order: usize,
    coefficients: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix of the given order from row-major coefficients.
    pub fn new(order: usize, coefficients: Vec<f64>) -> Result<Self, Error> {
        if order == 0 {
            return Err(Error::ZeroOrder);
        }
        let expected = order * order;
        if coefficients.len() != expected {
            return Err(Error::DimensionMismatch {
                order,
                expected,
                found: coefficients.len(),
            });
        }
        Ok(Self {
            order,
            coefficients,
        })
    }

    /// Creates a matrix from a list of rows, which must form a square.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        let order = rows.len();
        let coefficients: Vec<f64> = rows.into_iter().flatten().collect();
        Self::new(order, coefficients)
    }

    pub fn identity(order: usize) -> Result<Self, Error> {
        let mut coefficients = vec![0.0; order * order];
        for i in 0..order {
            coefficients[i * order + i] = 1.0;
        }
        Self::new(order, coefficients)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.order || col >= self.order {
            return None;
        }
        Some(self.coefficients[row * self.order + col])
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.coefficients.chunks_exact(self.order).nth(row)
    }
}

/// The ordered set of matrices processed in one run.
///
/// Every matrix shares the batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    order: usize,
    matrices: Vec<Matrix>,
}

impl Batch {
    pub fn new(order: usize, matrices: Vec<Matrix>) -> Result<Self, Error> {
        if order == 0 {
            return Err(Error::ZeroOrder);
        }
        if let Some(odd) = matrices.iter().find(|m| m.order() != order) {
            return Err(Error::MixedOrder {
                expected: order,
                found: odd.order(),
            });
        }
        Ok(Self { order, matrices })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn matrices(&self) -> &[Matrix] {
        &self.matrices
    }

    /// The matrices of one assignment block, or `None` past the end of the batch.
    pub fn slice(&self, range: Range<usize>) -> Option<&[Matrix]> {
        self.matrices.get(range)
    }
}
