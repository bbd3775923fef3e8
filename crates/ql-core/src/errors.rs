//! Error types for quantlib-rs.
//!
//! A single `thiserror`-derived enum covers every failure in the workspace.
//! The `ensure!` and `fail!` macros are shorthands for the
//! most common early returns.

use thiserror::Error;

/// The top-level error type used throughout quantlib-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// An operation was requested on a null / unset value.
    #[error("null value")]
    NullValue,

    /// Date-related error.
    #[error("date error: {0}")]
    Date(String),

    /// Inconsistent object graph detected while wiring objects together
    /// (wrong curve family, node/instrument count mismatch, empty handle).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dependent object failed to recalculate after an input was bumped.
    #[error("recalculation failed after bumping quote #{quote}: {reason}")]
    Recomputation {
        /// Position of the bumped quote.
        quote: usize,
        /// Underlying failure.
        reason: String,
    },

    /// A numerical routine (matrix inversion, decomposition) failed.
    #[error("numerical error: {0}")]
    Numerical(String),
}

/// Shorthand `Result` type used throughout quantlib-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::fail;
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
