//! Zero-rate/quote Jacobian of a set of bootstrapped curves
//! (translates `ql/termstructures/yield/multicurvesensitivities.hpp`).
//!
//! The engine concatenates the pillar nodes of every registered curve (the
//! reference-date node excluded) and the quotes of their calibrating
//! instruments, in curve-name order. It then bumps each quote by one basis
//! point, lets the curves re-bootstrap, and records the forward difference
//! of every node's zero rate:
//!
//! ```text
//! S[i][j] = (z_i(q_j + 1bp) - z_i(q_j)) / 1bp
//! ```
//!
//! `S` and its inverse are cached together and recomputed lazily after any
//! registered curve reports a change.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use ql_core::Handle;
//! use ql_quotes::SimpleQuote;
//! use ql_termstructures::multicurve_sensitivities::MultiCurveSensitivities;
//! use ql_termstructures::piecewise_yield_curve::{Interpolator, PiecewiseYieldCurve};
//! use ql_termstructures::rate_helpers::{DepositRateHelper, RateHelper};
//! use ql_termstructures::YieldTermStructure;
//! use ql_time::{Actual360, Date};
//!
//! let today = Date::from_ymd(2025, 1, 2).unwrap();
//! let helpers: Vec<Arc<dyn RateHelper>> = [(2025, 4, 2, 0.040), (2025, 7, 2, 0.042)]
//!     .into_iter()
//!     .map(|(y, m, d, r)| {
//!         let maturity = Date::from_ymd(y, m, d).unwrap();
//!         Arc::new(DepositRateHelper::new(SimpleQuote::new(r), today, maturity, Actual360).unwrap())
//!             as Arc<dyn RateHelper>
//!     })
//!     .collect();
//! let curve = PiecewiseYieldCurve::new(today, helpers, Actual360, Interpolator::Linear).unwrap();
//!
//! let mut curves = BTreeMap::new();
//! curves.insert("EUR-6M".to_string(), Handle::<dyn YieldTermStructure>::from_arc(curve));
//! let engine = MultiCurveSensitivities::new(curves).unwrap();
//!
//! let s = engine.sensitivity().unwrap();
//! assert_eq!((s.rows(), s.cols()), (2, 2));
//! ```

use crate::piecewise_yield_curve::{BootstrappedCurve, CurveFamily};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::errors::{Error, Result};
use ql_core::handle::Handle;
use ql_core::patterns::lazy_object::{LazyObject, LazyState};
use ql_core::patterns::observable::{register_with, Observer};
use ql_core::{Rate, Real};
use ql_math::Matrix;
use ql_quotes::{Quote, SimpleQuote};
use ql_time::Date;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Size of the quote bump (one basis point).
pub const BASIS_POINT: Real = 1.0e-4;

/// Curves to differentiate, keyed by name. Iteration (name) order fixes the
/// row and column order of the sensitivity matrix.
pub type CurveMap = BTreeMap<String, Handle<dyn YieldTermStructure>>;

/// A quote moved by one step for as long as the guard lives.
///
/// Dropping the guard restores the original value, on the error path too.
struct BumpedQuote<'a> {
    quote: &'a SimpleQuote,
    original: Real,
}

impl<'a> BumpedQuote<'a> {
    fn new(quote: &'a SimpleQuote, shift: Real) -> Result<Self> {
        let original = quote.value().ok_or(Error::NullValue)?;
        quote.set_value(original + shift);
        Ok(Self { quote, original })
    }
}

impl Drop for BumpedQuote<'_> {
    fn drop(&mut self) {
        self.quote.set_value(self.original);
    }
}

#[derive(Debug)]
struct Sensitivities {
    sensitivity: Matrix,
    inverse: Matrix,
}

/// Finite-difference sensitivities of curve zero rates to market quotes.
///
/// Corresponds to `QuantLib::MultiCurveSensitivities`.
#[derive(Debug)]
pub struct MultiCurveSensitivities {
    curves: Vec<(String, Arc<dyn YieldTermStructure>)>,
    quotes: Vec<Arc<SimpleQuote>>,
    lazy: LazyState,
    results: Mutex<Option<Sensitivities>>,
    calculations: AtomicUsize,
}

impl MultiCurveSensitivities {
    /// The curve family every registered curve must belong to.
    pub const REQUIRED_FAMILY: CurveFamily = CurveFamily::ZERO_YIELD_LINEAR;

    /// Build the engine over `curves` and register it with each of them.
    ///
    /// # Errors
    /// `Error::Configuration` if the map is empty, a handle is empty or is
    /// not a zero-yield, linearly interpolated piecewise curve, or a curve's
    /// number of non-reference nodes differs from its number of calibrating
    /// quotes.
    pub fn new(curves: CurveMap) -> Result<Arc<Self>> {
        if curves.is_empty() {
            return Err(Error::Configuration("no curves to differentiate".into()));
        }

        let mut resolved = Vec::with_capacity(curves.len());
        let mut quotes = Vec::new();
        let mut node_count = 0;
        for (name, handle) in &curves {
            let curve = handle
                .as_arc()
                .ok_or_else(|| Error::Configuration(format!("curve '{name}' is an empty handle")))?;
            let bootstrapped = checked_family(name, curve.as_ref())?;
            let nodes = bootstrapped.pillar_dates().len().saturating_sub(1);
            let instruments = bootstrapped.instruments();
            if nodes != instruments.len() {
                return Err(Error::Configuration(format!(
                    "curve '{name}' has {nodes} nodes but {} calibrating quotes",
                    instruments.len()
                )));
            }
            node_count += nodes;
            quotes.extend(instruments.iter().map(|helper| Arc::clone(helper.quote())));
            resolved.push((name.clone(), Arc::clone(curve)));
        }

        let engine = Arc::new(Self {
            curves: resolved,
            quotes,
            lazy: LazyState::new(),
            results: Mutex::new(None),
            calculations: AtomicUsize::new(0),
        });
        for handle in curves.values() {
            register_with(&engine, handle);
        }
        debug!(
            curves = engine.curves.len(),
            nodes = node_count,
            "multi-curve sensitivities set up"
        );
        Ok(engine)
    }

    /// `∂z_i/∂q_j` for every node `i` and quote `j`.
    pub fn sensitivity(&self) -> Result<Matrix> {
        self.with_results(|r| r.sensitivity.clone())
    }

    /// Inverse of [`sensitivity`][Self::sensitivity]: `∂q_j/∂z_i`.
    pub fn inverse_sensitivity(&self) -> Result<Matrix> {
        self.with_results(|r| r.inverse.clone())
    }

    /// Current non-reference nodes of every curve, in row order.
    pub fn nodes(&self) -> Result<Vec<(Date, Rate)>> {
        let mut nodes = Vec::with_capacity(self.quotes.len());
        for (name, curve) in &self.curves {
            let curve_nodes = checked_family(name, curve.as_ref())?.nodes()?;
            nodes.extend(curve_nodes.into_iter().skip(1));
        }
        Ok(nodes)
    }

    /// Calibrating quotes, in column order.
    pub fn quotes(&self) -> &[Arc<SimpleQuote>] {
        &self.quotes
    }

    /// Names of the registered curves, in the order their nodes appear.
    pub fn curve_names(&self) -> impl Iterator<Item = &str> {
        self.curves.iter().map(|(name, _)| name.as_str())
    }

    /// Number of completed recomputations.
    pub fn calculation_count(&self) -> usize {
        self.calculations.load(Ordering::Acquire)
    }

    fn zero_rates(&self) -> Result<Vec<Rate>> {
        Ok(self.nodes()?.into_iter().map(|(_, z)| z).collect())
    }

    fn with_results<R>(&self, f: impl FnOnce(&Sensitivities) -> R) -> Result<R> {
        self.calculate()?;
        let guard = self.results.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f).ok_or_else(|| {
            Error::Runtime("sensitivities frozen before their first calculation".into())
        })
    }
}

fn checked_family<'a>(
    name: &str,
    curve: &'a dyn YieldTermStructure,
) -> Result<&'a dyn BootstrappedCurve> {
    let bootstrapped = curve.as_bootstrapped().ok_or_else(|| {
        Error::Configuration(format!("curve '{name}' is not a piecewise bootstrapped curve"))
    })?;
    let family = bootstrapped.family();
    if family != MultiCurveSensitivities::REQUIRED_FAMILY {
        return Err(Error::Configuration(format!(
            "curve '{name}' is {family}, expected {}",
            MultiCurveSensitivities::REQUIRED_FAMILY
        )));
    }
    Ok(bootstrapped)
}

impl LazyObject for MultiCurveSensitivities {
    fn perform_calculations(&self) -> Result<()> {
        let base = self.zero_rates()?;
        let n = base.len();
        if n != self.quotes.len() {
            return Err(Error::Configuration(format!(
                "{n} curve nodes but {} calibrating quotes",
                self.quotes.len()
            )));
        }
        debug!(nodes = n, "computing zero-rate sensitivities");

        let mut columns = Vec::with_capacity(n * n);
        for (j, quote) in self.quotes.iter().enumerate() {
            let bumped = {
                let _bump = BumpedQuote::new(quote, BASIS_POINT)
                    .map_err(|e| Error::Recomputation { quote: j, reason: e.to_string() })?;
                self.zero_rates()
                    .map_err(|e| Error::Recomputation { quote: j, reason: e.to_string() })?
            };
            trace!(quote = j, "bumped and repriced");
            columns.extend(
                bumped
                    .iter()
                    .zip(&base)
                    .map(|(z1, z0)| (z1 - z0) / BASIS_POINT),
            );
        }

        let sensitivity = Matrix::from_column_slice(n, n, &columns)?;
        let inverse = sensitivity.inverse()?;
        *self.results.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Sensitivities { sensitivity, inverse });
        self.calculations.fetch_add(1, Ordering::AcqRel);
        debug!(nodes = n, "zero-rate sensitivities computed");
        Ok(())
    }

    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }
}

impl Observer for MultiCurveSensitivities {
    fn update(&self) {
        if self.invalidate() {
            trace!("sensitivities invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use crate::piecewise_yield_curve::{Interpolator, PiecewiseYieldCurve};
    use crate::rate_helpers::{DepositRateHelper, RateHelper};
    use approx::assert_abs_diff_eq;
    use ql_time::{Actual360, Actual365Fixed};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn deposit_curve(rates: &[(Date, Real)]) -> (Vec<Arc<SimpleQuote>>, Arc<dyn YieldTermStructure>) {
        let today = date(2025, 1, 2);
        let mut quotes = Vec::new();
        let mut helpers: Vec<Arc<dyn RateHelper>> = Vec::new();
        for &(maturity, rate) in rates {
            let q = Arc::new(SimpleQuote::new(rate));
            helpers.push(Arc::new(
                DepositRateHelper::new(Arc::clone(&q), today, maturity, Actual360).unwrap(),
            ));
            quotes.push(q);
        }
        let curve = PiecewiseYieldCurve::new(today, helpers, Actual365Fixed, Interpolator::Linear).unwrap();
        (quotes, curve)
    }

    fn curve_map(entries: Vec<(&str, Arc<dyn YieldTermStructure>)>) -> CurveMap {
        entries
            .into_iter()
            .map(|(name, curve)| (name.to_string(), Handle::from_arc(curve)))
            .collect()
    }

    #[test]
    fn bumped_quote_is_restored_on_drop() {
        let q = SimpleQuote::new(0.0312);
        {
            let _bump = BumpedQuote::new(&q, BASIS_POINT).unwrap();
            assert_abs_diff_eq!(q.value().unwrap(), 0.0313, epsilon = 1e-15);
        }
        assert_eq!(q.value(), Some(0.0312));
    }

    #[test]
    fn empty_quote_cannot_be_bumped() {
        let q = SimpleQuote::empty();
        assert!(matches!(BumpedQuote::new(&q, BASIS_POINT), Err(Error::NullValue)));
    }

    #[test]
    fn deposits_give_a_diagonal_matrix() {
        let (_, curve) = deposit_curve(&[(date(2025, 4, 2), 0.03), (date(2025, 7, 2), 0.032)]);
        let engine = MultiCurveSensitivities::new(curve_map(vec![("USD", curve)])).unwrap();

        let s = engine.sensitivity().unwrap();
        assert_abs_diff_eq!(s[(0, 1)], 0.0, epsilon = 1e-8);
        assert_abs_diff_eq!(s[(1, 0)], 0.0, epsilon = 1e-8);
        assert!(s[(0, 0)] > 0.9 && s[(0, 0)] < 1.1);
        assert!(s[(1, 1)] > 0.9 && s[(1, 1)] < 1.1);
    }

    #[test]
    fn rows_follow_curve_name_order() {
        let (_, b) = deposit_curve(&[(date(2025, 7, 2), 0.05)]);
        let (_, a) = deposit_curve(&[(date(2025, 4, 2), 0.02)]);
        let engine = MultiCurveSensitivities::new(curve_map(vec![("B", b), ("A", a)])).unwrap();

        assert_eq!(engine.curve_names().collect::<Vec<_>>(), vec!["A", "B"]);
        let nodes = engine.nodes().unwrap();
        assert_eq!(nodes[0].0, date(2025, 4, 2));
        assert_eq!(nodes[1].0, date(2025, 7, 2));
        assert_eq!(engine.quotes()[0].value(), Some(0.02));
        assert_eq!(engine.quotes()[1].value(), Some(0.05));
    }

    #[test]
    fn update_only_marks_stale() {
        let (_, curve) = deposit_curve(&[(date(2025, 4, 2), 0.03)]);
        let engine = MultiCurveSensitivities::new(curve_map(vec![("USD", curve)])).unwrap();

        engine.update();
        assert_eq!(engine.calculation_count(), 0);
        engine.sensitivity().unwrap();
        assert!(engine.is_calculated());
        engine.update();
        engine.update();
        assert!(!engine.is_calculated());
        assert_eq!(engine.calculation_count(), 1);
    }

    #[test]
    fn flat_curve_is_rejected() {
        let today = date(2025, 1, 2);
        let flat: Arc<dyn YieldTermStructure> =
            FlatForward::new(today, Arc::new(SimpleQuote::new(0.03)), Actual365Fixed);
        let err = MultiCurveSensitivities::new(curve_map(vec![("flat", flat)])).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("'flat'")));
    }

    /// Curve whose pillar layout is set independently of its helpers.
    #[derive(Debug)]
    struct SkewedCurve {
        pillars: Vec<Date>,
        helpers: Vec<Arc<dyn RateHelper>>,
        observable: ql_core::patterns::observable::ObservableImpl,
    }

    impl SkewedCurve {
        fn new(pillars: Vec<Date>, quotes: &[Real]) -> Arc<dyn YieldTermStructure> {
            let today = date(2025, 1, 2);
            let helpers = quotes
                .iter()
                .map(|&q| {
                    let helper =
                        DepositRateHelper::new(SimpleQuote::new(q), today, date(2025, 4, 2), Actual360).unwrap();
                    Arc::new(helper) as Arc<dyn RateHelper>
                })
                .collect();
            Arc::new(Self {
                pillars,
                helpers,
                observable: ql_core::patterns::observable::ObservableImpl::new(),
            })
        }
    }

    impl crate::term_structure::TermStructure for SkewedCurve {
        fn reference_date(&self) -> Date {
            self.pillars[0]
        }

        fn day_counter(&self) -> &dyn ql_time::DayCounter {
            &Actual365Fixed
        }

        fn max_date(&self) -> Date {
            Date::MAX
        }
    }

    impl YieldTermStructure for SkewedCurve {
        fn zero_rate_impl(&self, _t: ql_core::Time) -> Result<Rate> {
            Ok(0.03)
        }

        fn as_bootstrapped(&self) -> Option<&dyn BootstrappedCurve> {
            Some(self)
        }
    }

    impl ql_core::patterns::observable::Observable for SkewedCurve {
        fn register_observer(&self, observer: std::sync::Weak<dyn Observer>) {
            self.observable.register(observer);
        }

        fn unregister_observer(&self, observer: &std::sync::Weak<dyn Observer>) {
            self.observable.unregister(observer);
        }

        fn notify_observers(&self) {
            self.observable.notify();
        }
    }

    impl BootstrappedCurve for SkewedCurve {
        fn family(&self) -> CurveFamily {
            CurveFamily::ZERO_YIELD_LINEAR
        }

        fn pillar_dates(&self) -> &[Date] {
            &self.pillars
        }

        fn nodes(&self) -> Result<Vec<(Date, Real)>> {
            Ok(self.pillars.iter().map(|&d| (d, 0.03)).collect())
        }

        fn instruments(&self) -> &[Arc<dyn RateHelper>] {
            &self.helpers
        }
    }

    #[test]
    fn node_count_is_checked_per_curve() {
        let today = date(2025, 1, 2);
        // One node too many on "A" and one too few on "B": the totals agree.
        let a = SkewedCurve::new(vec![today, date(2025, 4, 2), date(2025, 7, 2)], &[0.03]);
        let b = SkewedCurve::new(vec![today, date(2025, 4, 2)], &[0.03, 0.031]);

        let err = MultiCurveSensitivities::new(curve_map(vec![("A", a), ("B", b)])).unwrap_err();
        assert_eq!(
            err,
            Error::Configuration("curve 'A' has 2 nodes but 1 calibrating quotes".into())
        );
    }

    #[test]
    fn empty_curve_map_is_rejected() {
        assert!(matches!(
            MultiCurveSensitivities::new(CurveMap::new()),
            Err(Error::Configuration(_))
        ));
    }
}
