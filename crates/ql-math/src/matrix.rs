//! A two-dimensional matrix of reals (translates `ql/math/matrix.hpp`).
//!
//! This is a thin newtype around `nalgebra::DMatrix<f64>` exposing the parts
//! of QuantLib's `Matrix` API used by the library: construction from flat
//! row- or column-major data, indexing, transpose, multiplication and a
//! checked inverse.

use nalgebra::DMatrix;
use ql_core::errors::{Error, Result};
use ql_core::Real;
use std::ops::{Index, IndexMut, Mul};

/// Reciprocal condition number below which a matrix is treated as singular.
pub const MIN_RECIPROCAL_CONDITION: Real = 1.0e-14;

/// A dynamically-sized 2D matrix of `Real` values (row-major access).
///
/// Corresponds to `QuantLib::Matrix`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create an identity matrix of size `n × n`.
    pub fn identity(n: usize) -> Self {
        Self(DMatrix::identity(n, n))
    }

    /// Create from a row-major data slice.
    ///
    /// # Errors
    /// Returns `Error::Precondition` unless `data.len() == rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Result<Self> {
        ql_core::ensure!(
            data.len() == rows * cols,
            "{rows}x{cols} matrix needs {} values, got {}",
            rows * cols,
            data.len()
        );
        Ok(Self(DMatrix::from_row_slice(rows, cols, data)))
    }

    /// Create from a column-major data slice (columns concatenated).
    ///
    /// # Errors
    /// Returns `Error::Precondition` unless `data.len() == rows * cols`.
    pub fn from_column_slice(rows: usize, cols: usize, data: &[Real]) -> Result<Self> {
        ql_core::ensure!(
            data.len() == rows * cols,
            "{rows}x{cols} matrix needs {} values, got {}",
            rows * cols,
            data.len()
        );
        Ok(Self(DMatrix::from_column_slice(rows, cols, data)))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// Return `true` if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.0.nrows() == self.0.ncols()
    }

    /// Borrow the inner `DMatrix`.
    pub fn inner(&self) -> &DMatrix<Real> {
        &self.0
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Determinant (only for square matrices).
    pub fn determinant(&self) -> Real {
        self.0.determinant()
    }

    /// Inverse, or `None` if the matrix is exactly singular or not square.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.clone().try_inverse().map(Self)
    }

    /// Reciprocal 2-norm condition number `σ_min / σ_max`.
    ///
    /// Zero for a singular matrix, one for an orthogonal matrix.
    pub fn reciprocal_condition(&self) -> Real {
        let sv = self.0.clone().singular_values();
        let max = sv.max();
        if max == 0.0 || !max.is_finite() {
            return 0.0;
        }
        sv.min() / max
    }

    /// Checked inverse.
    ///
    /// # Errors
    /// Returns `Error::Numerical` if the matrix is not square, contains
    /// non-finite entries, is singular, or its reciprocal condition number is
    /// below [`MIN_RECIPROCAL_CONDITION`].
    pub fn inverse(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(Error::Numerical(format!(
                "cannot invert a non-square {}x{} matrix",
                self.rows(),
                self.cols()
            )));
        }
        if let Some(((i, j), x)) = self.entries().find(|(_, x)| !x.is_finite()) {
            return Err(Error::Numerical(format!(
                "cannot invert a matrix with non-finite entry {x} at ({i}, {j})"
            )));
        }
        let rcond = self.reciprocal_condition();
        if rcond < MIN_RECIPROCAL_CONDITION {
            return Err(Error::Numerical(format!(
                "matrix is singular or ill-conditioned (reciprocal condition {rcond:e})"
            )));
        }
        let inv = self
            .try_inverse()
            .ok_or_else(|| Error::Numerical("LU decomposition failed".into()))?;
        if inv.entries().any(|(_, x)| !x.is_finite()) {
            return Err(Error::Numerical("inverse has non-finite entries".into()));
        }
        Ok(inv)
    }

    /// Iterate over `((row, col), value)` in row-major order.
    pub fn entries(&self) -> impl Iterator<Item = ((usize, usize), Real)> + '_ {
        let cols = self.cols();
        (0..self.rows() * cols).map(move |k| {
            let (i, j) = (k / cols, k % cols);
            ((i, j), self.0[(i, j)])
        })
    }

    /// Extract a column.
    pub fn column(&self, j: usize) -> Vec<Real> {
        self.0.column(j).iter().copied().collect()
    }

    /// `true` if both matrices have the same shape and every pair of entries
    /// differs by at most `tolerance`.
    pub fn is_close_to(&self, other: &Matrix, tolerance: Real) -> bool {
        self.0.shape() == other.0.shape()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<DMatrix<Real>> for Matrix {
    fn from(m: DMatrix<Real>) -> Self {
        Self(m)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.0[(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        &mut self.0[(i, j)]
    }
}

impl Mul for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: &Matrix) -> Matrix {
        Matrix(&self.0 * &rhs.0)
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.0.nrows() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for j in 0..self.0.ncols() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.0[(i, j)])?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
