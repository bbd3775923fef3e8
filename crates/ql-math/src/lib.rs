//! # ql-math
//!
//! Mathematical utilities: the `Matrix` newtype over nalgebra, 1D
//! interpolation and 1D root finding.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// 1D interpolation schemes.
pub mod interpolations;

/// Dense real matrix with checked inversion.
pub mod matrix;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use interpolations::{Interpolation1D, LinearInterpolation, LogLinearInterpolation};
pub use matrix::Matrix;
