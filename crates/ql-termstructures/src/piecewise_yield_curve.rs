//! Iterative bootstrap of a zero-rate curve
//! (translates `ql/termstructures/yield/piecewiseyieldcurve.hpp`).
//!
//! Given a set of [`RateHelper`]s the bootstrapper solves, pillar by pillar,
//! for the continuously-compounded zero rate that makes each helper's implied
//! quote match its market quote.
//!
//! The curve is a [`LazyObject`]: it registers with every helper's quote,
//! forgets its bootstrap whenever a quote moves, tells its own observers, and
//! re-bootstraps on the next read.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ql_quotes::SimpleQuote;
//! use ql_termstructures::piecewise_yield_curve::{Interpolator, PiecewiseYieldCurve};
//! use ql_termstructures::rate_helpers::{DepositRateHelper, RateHelper};
//! use ql_termstructures::YieldTermStructure;
//! use ql_time::{Actual360, Date};
//!
//! let ref_date = Date::from_ymd(2025, 1, 2).unwrap();
//! let quote = Arc::new(SimpleQuote::new(0.04));
//! let helpers: Vec<Arc<dyn RateHelper>> = vec![Arc::new(
//!     DepositRateHelper::new(
//!         Arc::clone(&quote),
//!         ref_date,
//!         Date::from_ymd(2025, 7, 2).unwrap(),
//!         Actual360,
//!     )
//!     .unwrap(),
//! )];
//! let curve = PiecewiseYieldCurve::new(ref_date, helpers, Actual360, Interpolator::Linear).unwrap();
//! let df = curve.discount(0.5).unwrap();
//!
//! quote.set_value(0.05);
//! assert!(curve.discount(0.5).unwrap() < df);
//! ```

use crate::rate_helpers::{BootstrapCurve, RateHelper};
use crate::term_structure::TermStructure;
use crate::yield_term_structure::{YieldTermStructure, YieldTermStructureData};
use ql_core::errors::{Error, Result};
use ql_core::patterns::lazy_object::{LazyObject, LazyState};
use ql_core::patterns::observable::{register_with, Observable, ObservableImpl, Observer};
use ql_core::{DiscountFactor, Rate, Real, Time};
use ql_math::solvers1d::brent;
use ql_math::{Interpolation1D, LinearInterpolation, LogLinearInterpolation};
use ql_time::{Date, DayCounter};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, trace};

/// Default accuracy for the bootstrap solver.
const BOOTSTRAP_ACCURACY: Real = 1.0e-12;

/// Minimum zero rate to search (−10 %).
const MIN_RATE: Rate = -0.10;

/// Maximum zero rate to search (+30 %).
const MAX_RATE: Rate = 0.30;

// ── Curve family ─────────────────────────────────────────────────────────────

/// The quantity a bootstrapped curve solves for at each pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BootstrapTraits {
    /// Continuously-compounded zero yields.
    ZeroYield,
}

/// Interpolation scheme between pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpolator {
    /// Linear in the bootstrapped quantity.
    Linear,
    /// Linear in the logarithm of the bootstrapped quantity.
    LogLinear,
}

impl Interpolator {
    /// Build an interpolation over `(xs, ys)`.
    pub fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>> {
        Ok(match self {
            Self::Linear => Box::new(LinearInterpolation::new(xs, ys)?),
            Self::LogLinear => Box::new(LogLinearInterpolation::new(xs, ys)?),
        })
    }
}

/// Concrete family of a bootstrapped curve (the `Traits` / `Interpolator`
/// pair of QuantLib's `PiecewiseYieldCurve<Traits, Interpolator>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurveFamily {
    /// Bootstrapped quantity.
    pub traits: BootstrapTraits,
    /// Interpolation between pillars.
    pub interpolator: Interpolator,
}

impl CurveFamily {
    /// Zero yields, linearly interpolated.
    pub const ZERO_YIELD_LINEAR: CurveFamily = CurveFamily {
        traits: BootstrapTraits::ZeroYield,
        interpolator: Interpolator::Linear,
    };
}

impl std::fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{:?}", self.traits, self.interpolator)
    }
}

/// Read access to the pillar structure of a bootstrapped curve.
///
/// Obtained through [`YieldTermStructure::as_bootstrapped`].
pub trait BootstrappedCurve: Send + Sync {
    /// The curve family.
    fn family(&self) -> CurveFamily;

    /// Node dates, reference date first. Fixed at construction, available
    /// without bootstrapping.
    fn pillar_dates(&self) -> &[Date];

    /// `(date, value)` nodes, reference date first. Bootstraps if needed.
    fn nodes(&self) -> Result<Vec<(Date, Real)>>;

    /// Calibrating instruments in bootstrap (pillar) order.
    fn instruments(&self) -> &[Arc<dyn RateHelper>];
}

// ── PiecewiseYieldCurve ──────────────────────────────────────────────────────

/// Result of one bootstrap.
#[derive(Debug)]
struct Bootstrapped {
    rates: Vec<Rate>,
    interp: Box<dyn Interpolation1D>,
}

/// A yield curve bootstrapped from market instruments.
///
/// Nodes sit on the reference date and on each distinct helper pillar; when
/// several helpers share a pillar, the first one in pillar order defines the
/// node. The reference-date rate is not calibrated and is kept equal to the
/// first pillar's rate.
///
/// Corresponds to `QuantLib::PiecewiseYieldCurve<ZeroYield, Interpolator>`.
#[derive(Debug)]
pub struct PiecewiseYieldCurve {
    data: YieldTermStructureData,
    interpolator: Interpolator,
    /// Helpers sorted by pillar date.
    instruments: Vec<Arc<dyn RateHelper>>,
    /// Node dates (first entry = reference date).
    dates: Vec<Date>,
    /// Time fractions corresponding to `dates`.
    times: Vec<Time>,
    /// For node `k >= 1`, the index in `instruments` of the helper solved there.
    node_helpers: Vec<usize>,
    min_rate: Rate,
    max_rate: Rate,
    accuracy: Real,
    lazy: LazyState,
    bootstrapped: RwLock<Option<Bootstrapped>>,
    observable: ObservableImpl,
}

impl PiecewiseYieldCurve {
    /// Create a curve over `helpers` and register it with their quotes.
    ///
    /// Nothing is solved until the curve is first read.
    ///
    /// # Errors
    /// Returns an error if no helpers are provided or a pillar date is not
    /// after the reference date.
    pub fn new(
        reference_date: Date,
        helpers: Vec<Arc<dyn RateHelper>>,
        day_counter: impl DayCounter + 'static,
        interpolator: Interpolator,
    ) -> Result<Arc<Self>> {
        Self::with_bounds(
            reference_date,
            helpers,
            day_counter,
            interpolator,
            MIN_RATE,
            MAX_RATE,
            BOOTSTRAP_ACCURACY,
        )
    }

    /// Create a curve with explicit solver bounds and accuracy.
    pub fn with_bounds(
        reference_date: Date,
        mut helpers: Vec<Arc<dyn RateHelper>>,
        day_counter: impl DayCounter + 'static,
        interpolator: Interpolator,
        min_rate: Rate,
        max_rate: Rate,
        accuracy: Real,
    ) -> Result<Arc<Self>> {
        ql_core::ensure!(!helpers.is_empty(), "at least one rate helper is required");
        ql_core::ensure!(
            min_rate < max_rate,
            "invalid solver bounds [{min_rate}, {max_rate}]"
        );

        let data = YieldTermStructureData::new(reference_date, day_counter);
        helpers.sort_by_key(|h| h.pillar_date());

        let mut dates = vec![reference_date];
        let mut times = vec![0.0];
        let mut node_helpers = Vec::with_capacity(helpers.len());
        for (i, helper) in helpers.iter().enumerate() {
            let pillar = helper.pillar_date();
            ql_core::ensure!(
                pillar > reference_date,
                "pillar date {pillar} is not after reference date {reference_date}"
            );
            if dates.last() == Some(&pillar) {
                continue;
            }
            times.push(data.day_counter.year_fraction(reference_date, pillar));
            dates.push(pillar);
            node_helpers.push(i);
        }

        let curve = Arc::new(Self {
            data,
            interpolator,
            instruments: helpers,
            dates,
            times,
            node_helpers,
            min_rate,
            max_rate,
            accuracy,
            lazy: LazyState::new(),
            bootstrapped: RwLock::new(None),
            observable: ObservableImpl::new(),
        });
        for helper in &curve.instruments {
            register_with(&curve, helper.quote().as_ref());
            if let Some(discount) = helper.discount_curve() {
                register_with(&curve, discount);
            }
        }
        Ok(curve)
    }

    /// Node dates (reference date first).
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Node times (0 first).
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Bootstrapped zero rates at each node.
    pub fn rates(&self) -> Result<Vec<Rate>> {
        self.with_results(|b| b.rates.clone())
    }

    fn with_results<R>(&self, f: impl FnOnce(&Bootstrapped) -> R) -> Result<R> {
        self.calculate()?;
        let guard = self
            .bootstrapped
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(f)
            .ok_or_else(|| Error::Runtime("curve frozen before its first bootstrap".into()))
    }

    /// Solve node `k`, with nodes `1..k` already in `rates`.
    fn solve_node(&self, k: usize, rates: &mut [Rate]) -> Result<Rate> {
        let helper = &self.instruments[self.node_helpers[k - 1]];
        let market_quote = helper.quote_value()?;
        let times = &self.times[..=k];
        let reference_date = self.data.reference_date;
        let day_counter = &*self.data.day_counter;

        brent(
            |r| {
                rates[k] = r;
                rates[0] = rates[1];
                let interp = self.interpolator.build(times, &rates[..=k])?;
                let view = BootstrapCurve {
                    reference_date,
                    day_counter,
                    times,
                    rates: &rates[..=k],
                    interp: &*interp,
                };
                Ok(helper.implied_quote(&view)? - market_quote)
            },
            self.min_rate,
            self.max_rate,
            self.accuracy,
        )
    }
}

impl LazyObject for PiecewiseYieldCurve {
    fn perform_calculations(&self) -> Result<()> {
        let mut rates = vec![0.0; self.dates.len()];
        for k in 1..self.dates.len() {
            let solved = self.solve_node(k, &mut rates).map_err(|e| {
                debug!(pillar = k, date = %self.dates[k], error = %e, "bootstrap failed");
                Error::Runtime(format!(
                    "bootstrap failed at pillar {k} ({}): {e}",
                    self.dates[k]
                ))
            })?;
            rates[k] = solved;
            rates[0] = rates[1];
            trace!(pillar = k, date = %self.dates[k], zero = solved, "pillar solved");
        }
        let interp = self.interpolator.build(&self.times, &rates)?;
        *self
            .bootstrapped
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Bootstrapped { rates, interp });
        Ok(())
    }

    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }
}

impl Observer for PiecewiseYieldCurve {
    fn update(&self) {
        self.invalidate();
        // Forwarded even when already stale.
        self.observable.notify();
    }
}

impl Observable for PiecewiseYieldCurve {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        self.observable.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        self.observable.unregister(observer);
    }

    fn notify_observers(&self) {
        self.observable.notify();
    }
}

impl TermStructure for PiecewiseYieldCurve {
    fn reference_date(&self) -> Date {
        self.data.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.data.day_counter
    }

    fn max_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }
}

impl YieldTermStructure for PiecewiseYieldCurve {
    fn zero_rate_impl(&self, t: Time) -> Result<Rate> {
        self.with_results(|b| b.interp.operator(t))
    }

    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        if t <= 0.0 {
            return Ok(1.0);
        }
        Ok((-self.zero_rate_impl(t)? * t).exp())
    }

    fn as_bootstrapped(&self) -> Option<&dyn BootstrappedCurve> {
        Some(self)
    }
}

impl BootstrappedCurve for PiecewiseYieldCurve {
    fn family(&self) -> CurveFamily {
        CurveFamily {
            traits: BootstrapTraits::ZeroYield,
            interpolator: self.interpolator,
        }
    }

    fn pillar_dates(&self) -> &[Date] {
        &self.dates
    }

    fn nodes(&self) -> Result<Vec<(Date, Real)>> {
        self.with_results(|b| self.dates.iter().copied().zip(b.rates.iter().copied()).collect())
    }

    fn instruments(&self) -> &[Arc<dyn RateHelper>] {
        &self.instruments
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_helpers::{DepositRateHelper, FraRateHelper, SwapRateHelper};
    use approx::assert_abs_diff_eq;
    use ql_core::handle::Handle;
    use ql_quotes::SimpleQuote;
    use ql_time::{Actual360, Actual365Fixed};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn deposit(rate: Real, start: Date, end: Date) -> (Arc<SimpleQuote>, Arc<dyn RateHelper>) {
        let q = Arc::new(SimpleQuote::new(rate));
        let h = DepositRateHelper::new(Arc::clone(&q), start, end, Actual360).unwrap();
        (q, Arc::new(h))
    }

    #[test]
    fn bootstrap_single_deposit() {
        let ref_date = date(2025, 1, 2);
        let mat = date(2025, 4, 2);
        let (_, h) = deposit(0.05, ref_date, mat);
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::Linear).unwrap();

        let tau = Actual360.year_fraction(ref_date, mat);
        let implied = (1.0 / curve.discount(tau).unwrap() - 1.0) / tau;
        assert_abs_diff_eq!(implied, 0.05, epsilon = 1e-10);
    }

    #[test]
    fn helpers_are_sorted_by_pillar() {
        let ref_date = date(2025, 1, 2);
        let (_, late) = deposit(0.045, ref_date, date(2025, 7, 2));
        let (_, early) = deposit(0.04, ref_date, date(2025, 4, 2));
        let curve =
            PiecewiseYieldCurve::new(ref_date, vec![late, early], Actual360, Interpolator::Linear).unwrap();

        assert_eq!(
            curve.dates(),
            &[ref_date, date(2025, 4, 2), date(2025, 7, 2)]
        );
        let pillars: Vec<Date> = curve.instruments().iter().map(|h| h.pillar_date()).collect();
        assert_eq!(pillars, vec![date(2025, 4, 2), date(2025, 7, 2)]);
    }

    #[test]
    fn deposit_and_fra_reprice() {
        let ref_date = date(2025, 1, 2);
        let d1 = date(2025, 7, 2);
        let d2 = date(2026, 1, 2);
        let (_, depo) = deposit(0.04, ref_date, d1);
        let fra: Arc<dyn RateHelper> = Arc::new(
            FraRateHelper::new(SimpleQuote::new(0.045), d1, d2, Actual360).unwrap(),
        );
        let curve = PiecewiseYieldCurve::new(
            ref_date,
            vec![depo, Arc::clone(&fra)],
            Actual365Fixed,
            Interpolator::Linear,
        )
        .unwrap();

        let df1 = curve.discount_date(d1).unwrap();
        let df2 = curve.discount_date(d2).unwrap();
        let tau = Actual360.year_fraction(d1, d2);
        assert_abs_diff_eq!((df1 / df2 - 1.0) / tau, 0.045, epsilon = 1e-10);
    }

    #[test]
    fn nodes_start_at_reference_date() {
        let ref_date = date(2025, 1, 2);
        let (_, h1) = deposit(0.03, ref_date, date(2025, 4, 2));
        let (_, h2) = deposit(0.035, ref_date, date(2025, 7, 2));
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h1, h2], Actual360, Interpolator::Linear).unwrap();

        let nodes = curve.nodes().unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].0, ref_date);
        assert_eq!(nodes[0].1, nodes[1].1);
        assert!(nodes[2].1 > nodes[1].1);
        assert_eq!(curve.family(), CurveFamily::ZERO_YIELD_LINEAR);
    }

    #[test]
    fn duplicate_pillars_share_a_node() {
        let ref_date = date(2025, 1, 2);
        let mat = date(2025, 4, 2);
        let (_, h1) = deposit(0.03, ref_date, mat);
        let (_, h2) = deposit(0.031, ref_date, mat);
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h1, h2], Actual360, Interpolator::Linear).unwrap();
        assert_eq!(curve.pillar_dates().len(), 2);
        assert_eq!(curve.instruments().len(), 2);
    }

    #[test]
    fn quote_change_invalidates_and_notifies() {
        struct Hits(AtomicU32);
        impl Observer for Hits {
            fn update(&self) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let ref_date = date(2025, 1, 2);
        let (q, h) = deposit(0.04, ref_date, date(2025, 7, 2));
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::Linear).unwrap();
        let hits = Arc::new(Hits(AtomicU32::new(0)));
        register_with(&hits, curve.as_ref());

        let z0 = curve.zero_rate(0.5).unwrap();
        assert!(curve.is_calculated());

        q.set_value(0.05);
        assert!(!curve.is_calculated());
        assert_eq!(hits.0.load(Ordering::Relaxed), 1);

        // Forwarded even though the curve is already stale.
        q.set_value(0.06);
        assert_eq!(hits.0.load(Ordering::Relaxed), 2);

        assert!(curve.zero_rate(0.5).unwrap() > z0);
    }

    #[test]
    fn discount_curve_change_invalidates_dependent_curve() {
        let ref_date = date(2025, 1, 2);
        let (disc_q, disc_h) = deposit(0.03, ref_date, date(2027, 1, 2));
        let discount: Arc<dyn YieldTermStructure> =
            PiecewiseYieldCurve::new(ref_date, vec![disc_h], Actual365Fixed, Interpolator::Linear).unwrap();

        let swap = SwapRateHelper::new(
            SimpleQuote::new(0.045),
            ref_date,
            vec![date(2026, 1, 2), date(2027, 1, 2)],
            Actual360,
        )
        .unwrap()
        .with_discount_curve(Handle::from_arc(discount))
        .unwrap();
        let (_, dep) = deposit(0.04, ref_date, date(2026, 1, 2));
        let forward =
            PiecewiseYieldCurve::new(ref_date, vec![dep, Arc::new(swap)], Actual365Fixed, Interpolator::Linear)
                .unwrap();

        let z0 = forward.zero_rate(2.0).unwrap();
        assert!(forward.is_calculated());

        disc_q.set_value(0.05);
        assert!(!forward.is_calculated());
        assert!((forward.zero_rate(2.0).unwrap() - z0).abs() > 1e-6);
    }

    #[test]
    fn out_of_bounds_quote_fails_then_recovers() {
        let ref_date = date(2025, 1, 2);
        let (q, h) = deposit(0.04, ref_date, date(2026, 1, 2));
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::Linear).unwrap();

        q.set_value(0.60);
        let err = curve.nodes().unwrap_err();
        assert!(matches!(err, Error::Runtime(ref m) if m.contains("bootstrap failed at pillar 1")));
        assert!(!curve.is_calculated());

        q.set_value(0.04);
        assert!(curve.nodes().is_ok());
    }

    #[test]
    fn empty_quote_fails_bootstrap() {
        let ref_date = date(2025, 1, 2);
        let (q, h) = deposit(0.04, ref_date, date(2025, 7, 2));
        let curve = PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::Linear).unwrap();
        q.reset();
        assert!(curve.discount(0.25).is_err());
    }

    #[test]
    fn construction_errors() {
        let ref_date = date(2025, 1, 2);
        assert!(PiecewiseYieldCurve::new(ref_date, vec![], Actual360, Interpolator::Linear).is_err());

        let (_, h) = deposit(0.04, date(2024, 12, 2), ref_date);
        assert!(PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::Linear).is_err());
    }

    #[test]
    fn log_linear_family() {
        let ref_date = date(2025, 1, 2);
        let (_, h) = deposit(0.04, ref_date, date(2025, 7, 2));
        let curve =
            PiecewiseYieldCurve::new(ref_date, vec![h], Actual360, Interpolator::LogLinear).unwrap();
        assert_eq!(curve.family().interpolator, Interpolator::LogLinear);
        assert_ne!(curve.family(), CurveFamily::ZERO_YIELD_LINEAR);
        assert_eq!(curve.family().to_string(), "ZeroYield/LogLinear");
    }
}
