//! Determinant engines.
//!
//! The default [`Engine::Cofactor`] expands along the first row once and
//! collapses every minor with Gaussian elimination, which reproduces the
//! reference results exactly. [`Engine::Elimination`] runs the elimination
//! on the whole matrix; it is cheaper but may differ in the last bits.
//!
//! Pivots are compared against exactly `0.0`: a matrix is only treated as
//! singular when partial pivoting finds no non-zero entry.

use std::fmt;

use clap::ValueEnum;

use crate::{Error, Matrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Engine {
    /// First-row cofactor expansion over eliminated minors.
    #[default]
    Cofactor,
    /// Gaussian elimination on the whole matrix.
    Elimination,
}

impl Engine {
    pub fn determinant(self, matrix: &Matrix) -> f64 {
        match self {
            Engine::Cofactor => cofactor_determinant(matrix),
            Engine::Elimination => elimination_determinant(matrix),
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            Engine::Cofactor => 0,
            Engine::Elimination => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, Error> {
        match tag {
            0 => Ok(Engine::Cofactor),
            1 => Ok(Engine::Elimination),
            other => Err(Error::UnknownEngine(other)),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Cofactor => write!(f, "cofactor"),
            Engine::Elimination => write!(f, "elimination"),
        }
    }
}

/// Expands along row 0; each minor is reduced by [`eliminate`].
///
/// One scratch buffer of `(n-1)²` values is reused for every minor.
pub fn cofactor_determinant(matrix: &Matrix) -> f64 {
    let n = matrix.order();
    let a = matrix.coefficients();
    if n == 1 {
        return a[0];
    }

    let dim = n - 1;
    let mut minor = vec![0.0; dim * dim];
    let mut det = 0.0;

    for col in 0..n {
        fill_minor(a, n, col, &mut minor);
        let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
        det += sign * a[col] * eliminate(dim, &mut minor);
    }

    det
}

pub fn elimination_determinant(matrix: &Matrix) -> f64 {
    let mut work = matrix.coefficients().to_vec();
    eliminate(matrix.order(), &mut work)
}

/// Copies `a` without row 0 and column `skip` into `minor`.
fn fill_minor(a: &[f64], n: usize, skip: usize, minor: &mut [f64]) {
    let mut k = 0;
    for row in a.chunks_exact(n).skip(1) {
        for (col, &value) in row.iter().enumerate() {
            if col != skip {
                minor[k] = value;
                k += 1;
            }
        }
    }
}

/// Gaussian elimination with partial pivoting, in place.
///
/// Returns the determinant of the `n×n` row-major matrix in `a`, or `0.0`
/// as soon as a pivot column has no non-zero entry.
fn eliminate(n: usize, a: &mut [f64]) -> f64 {
    let mut sign = 1.0;

    for k in 0..n.saturating_sub(1) {
        let mut pivot = k;
        let mut largest = a[k * n + k].abs();
        for row in k + 1..n {
            let candidate = a[row * n + k].abs();
            if candidate > largest {
                largest = candidate;
                pivot = row;
            }
        }

        if pivot != k {
            for col in k..n {
                a.swap(k * n + col, pivot * n + col);
            }
            sign = -sign;
        }

        let p = a[k * n + k];
        if p == 0.0 {
            return 0.0;
        }

        for row in k + 1..n {
            let factor = -a[row * n + k] / p;
            for col in k..n {
                let delta = factor * a[k * n + col];
                a[row * n + col] += delta;
            }
        }
    }

    (0..n).fold(sign, |det, i| det * a[i * n + i])
}
