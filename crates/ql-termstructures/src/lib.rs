//! # ql-termstructures
//!
//! Yield term structures, rate helpers, the lazily bootstrapped
//! `PiecewiseYieldCurve`, and `MultiCurveSensitivities`, the bump-and-reprice
//! Jacobian of curve zero rates with respect to market quotes.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Base trait for all term structures.
pub mod term_structure;

/// Yield (interest-rate) term structures.
pub mod yield_term_structure;

/// Constant forward-rate yield curve.
pub mod flat_forward;

/// Deposit, FRA and swap rate helpers used to calibrate bootstrapped curves.
pub mod rate_helpers;

/// Zero-rate curve bootstrapped from rate helpers.
pub mod piecewise_yield_curve;

/// Zero-rate/quote sensitivities across curves.
pub mod multicurve_sensitivities;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use flat_forward::FlatForward;
pub use multicurve_sensitivities::{CurveMap, MultiCurveSensitivities, BASIS_POINT};
pub use piecewise_yield_curve::{
    BootstrapTraits, BootstrappedCurve, CurveFamily, Interpolator, PiecewiseYieldCurve,
};
pub use rate_helpers::{BootstrapCurve, DepositRateHelper, FraRateHelper, RateHelper, SwapRateHelper};
pub use term_structure::TermStructure;
pub use yield_term_structure::{YieldTermStructure, YieldTermStructureData};
