//! # quantlib
//!
//! Bump-and-reprice sensitivities of bootstrapped yield curves, built on a
//! small Rust port of the [QuantLib](https://www.quantlib.org/) core.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! quantlib = "0.1"
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use quantlib::core::Handle;
//! use quantlib::quotes::{Quote, SimpleQuote};
//! use quantlib::termstructures::{
//!     CurveMap, DepositRateHelper, FraRateHelper, Interpolator, MultiCurveSensitivities,
//!     PiecewiseYieldCurve, RateHelper, YieldTermStructure,
//! };
//! use quantlib::time::{Actual360, Actual365Fixed, Date};
//!
//! let today = Date::from_ymd(2025, 1, 2).unwrap();
//! let m3 = Date::from_ymd(2025, 4, 2).unwrap();
//! let m6 = Date::from_ymd(2025, 7, 2).unwrap();
//!
//! let depo = Arc::new(SimpleQuote::new(0.030));
//! let fra3x6 = Arc::new(SimpleQuote::new(0.032));
//! let helpers: Vec<Arc<dyn RateHelper>> = vec![
//!     Arc::new(DepositRateHelper::new(Arc::clone(&depo), today, m3, Actual360).unwrap()),
//!     Arc::new(FraRateHelper::new(Arc::clone(&fra3x6), m3, m6, Actual360).unwrap()),
//! ];
//! let curve: Arc<dyn YieldTermStructure> =
//!     PiecewiseYieldCurve::new(today, helpers, Actual365Fixed, Interpolator::Linear).unwrap();
//!
//! let mut curves = CurveMap::new();
//! curves.insert("EUR-3M".into(), Handle::from_arc(curve));
//! let risk = MultiCurveSensitivities::new(curves).unwrap();
//!
//! let jacobian = risk.sensitivity().unwrap();
//! let hedge = risk.inverse_sensitivity().unwrap();
//! assert!((&jacobian * &hedge).is_close_to(&quantlib::math::Matrix::identity(2), 1e-8));
//! assert_eq!(depo.value(), Some(0.030));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, error definitions and the Observer / LazyObject patterns.
pub use ql_core as core;

/// Dates and day counters.
pub use ql_time as time;

/// Matrices, interpolation and root finding.
pub use ql_math as math;

/// Market quotes.
pub use ql_quotes as quotes;

/// Yield curves, rate helpers and multi-curve sensitivities.
pub use ql_termstructures as termstructures;
