//! Rate helpers for yield-curve bootstrapping
//! (translates `ql/termstructures/yield/ratehelpers.hpp`).
//!
//! A *rate helper* ties a market quote (deposit rate, FRA rate) to the
//! conventions needed to turn it into a constraint on the curve at its
//! *pillar date*. Helpers hold the quote through a shared handle, so moving
//! the quote moves every curve bootstrapped on it.
//!
//! A helper may also discount on another, already-built curve. The curve
//! being bootstrapped then depends on that curve as well as on its quotes.

use crate::yield_term_structure::YieldTermStructure;
use ql_core::errors::{Error, Result};
use ql_core::handle::Handle;
use ql_core::{DiscountFactor, Rate, Real, Time};
use ql_math::Interpolation1D;
use ql_quotes::{Quote, SimpleQuote};
use ql_time::{Date, DayCounter};
use std::sync::Arc;

// ── BootstrapCurve (temporary curve view used during bootstrap) ──────────────

/// The partially-built curve seen by a helper while its pillar is solved.
///
/// Holds the pillar times and zero rates solved so far together with an
/// interpolation rebuilt for every trial rate.
#[derive(Debug)]
pub struct BootstrapCurve<'a> {
    /// Reference date.
    pub reference_date: Date,
    /// Day counter for time conversion.
    pub day_counter: &'a dyn DayCounter,
    /// Pillar times (first entry = 0 for the reference date).
    pub times: &'a [Time],
    /// Continuously-compounded zero rates at each pillar.
    pub rates: &'a [Rate],
    /// Interpolation over `(times, rates)`.
    pub interp: &'a dyn Interpolation1D,
}

impl<'a> BootstrapCurve<'a> {
    /// Time from the reference date to `date`.
    pub fn time_from_reference(&self, date: Date) -> Time {
        self.day_counter.year_fraction(self.reference_date, date)
    }

    /// Continuously-compounded zero rate for a given time.
    pub fn zero_rate(&self, t: Time) -> Rate {
        if t <= 0.0 {
            return self.rates.first().copied().unwrap_or(0.0);
        }
        self.interp.operator(t)
    }

    /// Discount factor for a given time.
    pub fn discount(&self, t: Time) -> DiscountFactor {
        if t <= 0.0 {
            return 1.0;
        }
        (-self.zero_rate(t) * t).exp()
    }

    /// Discount factor for a given date.
    pub fn discount_date(&self, date: Date) -> DiscountFactor {
        self.discount(self.time_from_reference(date))
    }
}

// ── RateHelper trait ──────────────────────────────────────────────────────────

/// A single market quote that constrains the yield curve at a pillar date.
///
/// Corresponds to `QuantLib::RateHelper`.
pub trait RateHelper: std::fmt::Debug + Send + Sync {
    /// The pillar date, up to which this helper constrains the curve.
    fn pillar_date(&self) -> Date;

    /// The quote this helper is calibrated to.
    fn quote(&self) -> &Arc<SimpleQuote>;

    /// Current value of [`quote`][Self::quote].
    ///
    /// # Errors
    /// `Error::NullValue` if the quote is empty.
    fn quote_value(&self) -> Result<Real> {
        self.quote().value().ok_or(Error::NullValue)
    }

    /// External curve this helper discounts on, if any.
    ///
    /// Curves bootstrapped on the helper observe it.
    fn discount_curve(&self) -> Option<&Handle<dyn YieldTermStructure>> {
        None
    }

    /// The model-implied quote given the (partially bootstrapped) curve.
    ///
    /// The bootstrapper adjusts the zero rate at this helper's pillar until
    /// `implied_quote(curve) == quote_value()`.
    ///
    /// # Errors
    /// Fails if an external discount curve cannot be evaluated.
    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Result<Real>;
}

/// Simple-compounding rate implied by `curve` over `[start, end]`.
fn simple_forward(curve: &BootstrapCurve<'_>, start: Date, end: Date, tau: Time) -> Real {
    if tau <= 0.0 {
        return 0.0;
    }
    let df_start = curve.discount_date(start);
    let df_end = curve.discount_date(end);
    if df_end <= 0.0 {
        return 0.0;
    }
    (df_start / df_end - 1.0) / tau
}

// ── DepositRateHelper ─────────────────────────────────────────────────────────

/// A deposit (money-market) rate helper.
///
/// Constrains the curve at the deposit's maturity date; the implied quote is
/// the simple rate over `[settlement, maturity]`.
///
/// Corresponds to `QuantLib::DepositRateHelper`.
#[derive(Debug)]
pub struct DepositRateHelper {
    quote: Arc<SimpleQuote>,
    settlement_date: Date,
    maturity_date: Date,
    day_counter: Box<dyn DayCounter>,
}

impl DepositRateHelper {
    /// Create a deposit rate helper from explicit settlement and maturity dates.
    ///
    /// # Errors
    /// `Error::Precondition` if maturity is not after settlement.
    pub fn new(
        quote: impl Into<Arc<SimpleQuote>>,
        settlement_date: Date,
        maturity_date: Date,
        day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        ql_core::ensure!(
            maturity_date > settlement_date,
            "deposit maturity {maturity_date} must be after settlement {settlement_date}"
        );
        Ok(Self {
            quote: quote.into(),
            settlement_date,
            maturity_date,
            day_counter: Box::new(day_counter),
        })
    }

    /// The settlement date of the deposit.
    pub fn settlement_date(&self) -> Date {
        self.settlement_date
    }

    /// The maturity date of the deposit.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }
}

impl RateHelper for DepositRateHelper {
    fn pillar_date(&self) -> Date {
        self.maturity_date
    }

    fn quote(&self) -> &Arc<SimpleQuote> {
        &self.quote
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Result<Real> {
        let tau = self
            .day_counter
            .year_fraction(self.settlement_date, self.maturity_date);
        Ok(simple_forward(curve, self.settlement_date, self.maturity_date, tau))
    }
}

// ── FraRateHelper ─────────────────────────────────────────────────────────────

/// A forward-rate-agreement (FRA) rate helper.
///
/// Constrains the curve at the FRA maturity date; the implied quote is the
/// simple forward rate over `[value_date, maturity]`.
///
/// Corresponds to `QuantLib::FraRateHelper`.
#[derive(Debug)]
pub struct FraRateHelper {
    quote: Arc<SimpleQuote>,
    value_date: Date,
    maturity_date: Date,
    day_counter: Box<dyn DayCounter>,
}

impl FraRateHelper {
    /// Create a FRA rate helper from explicit value and maturity dates.
    ///
    /// # Errors
    /// `Error::Precondition` if maturity is not after the value date.
    pub fn new(
        quote: impl Into<Arc<SimpleQuote>>,
        value_date: Date,
        maturity_date: Date,
        day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        ql_core::ensure!(
            maturity_date > value_date,
            "FRA maturity {maturity_date} must be after value date {value_date}"
        );
        Ok(Self {
            quote: quote.into(),
            value_date,
            maturity_date,
            day_counter: Box::new(day_counter),
        })
    }

    /// The start of the FRA accrual period.
    pub fn value_date(&self) -> Date {
        self.value_date
    }

    /// The end of the FRA accrual period.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }
}

impl RateHelper for FraRateHelper {
    fn pillar_date(&self) -> Date {
        self.maturity_date
    }

    fn quote(&self) -> &Arc<SimpleQuote> {
        &self.quote
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Result<Real> {
        let tau = self
            .day_counter
            .year_fraction(self.value_date, self.maturity_date);
        Ok(simple_forward(curve, self.value_date, self.maturity_date, tau))
    }
}

// ── SwapRateHelper ────────────────────────────────────────────────────────────

/// A par-swap rate helper.
///
/// The fixed and floating legs share the accrual periods
/// `[start, p_1], [p_1, p_2], ..., [p_{n-1}, p_n]`. Floating rates are the
/// simple forwards of the curve being bootstrapped; cash flows are discounted
/// on the external discount curve when one is set, on the bootstrapped curve
/// otherwise. The implied quote is the fair fixed rate
///
/// ```text
/// sum(tau_i * F_i * D(p_i)) / sum(tau_i * D(p_i))
/// ```
///
/// Corresponds to `QuantLib::SwapRateHelper` with an exogenous discounting
/// curve.
#[derive(Debug)]
pub struct SwapRateHelper {
    quote: Arc<SimpleQuote>,
    start_date: Date,
    payment_dates: Vec<Date>,
    day_counter: Box<dyn DayCounter>,
    discount_curve: Option<Handle<dyn YieldTermStructure>>,
}

impl SwapRateHelper {
    /// Create a swap rate helper discounting on the bootstrapped curve itself.
    ///
    /// # Errors
    /// `Error::Precondition` if there are no payment dates or they are not
    /// strictly increasing after `start_date`.
    pub fn new(
        quote: impl Into<Arc<SimpleQuote>>,
        start_date: Date,
        payment_dates: Vec<Date>,
        day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        ql_core::ensure!(!payment_dates.is_empty(), "swap needs at least one payment date");
        let mut previous = start_date;
        for &date in &payment_dates {
            ql_core::ensure!(
                date > previous,
                "swap payment dates must increase after {start_date}, got {date} after {previous}"
            );
            previous = date;
        }
        Ok(Self {
            quote: quote.into(),
            start_date,
            payment_dates,
            day_counter: Box::new(day_counter),
            discount_curve: None,
        })
    }

    /// Discount cash flows on `curve` instead of the bootstrapped curve.
    ///
    /// # Errors
    /// `Error::Precondition` if the handle is empty.
    pub fn with_discount_curve(mut self, curve: Handle<dyn YieldTermStructure>) -> Result<Self> {
        ql_core::ensure!(!curve.is_empty(), "empty discount curve handle");
        self.discount_curve = Some(curve);
        Ok(self)
    }

    /// Start of the first accrual period.
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    /// Payment dates (end of each accrual period).
    pub fn payment_dates(&self) -> &[Date] {
        &self.payment_dates
    }
}

impl RateHelper for SwapRateHelper {
    fn pillar_date(&self) -> Date {
        self.payment_dates.last().copied().unwrap_or(self.start_date)
    }

    fn quote(&self) -> &Arc<SimpleQuote> {
        &self.quote
    }

    fn discount_curve(&self) -> Option<&Handle<dyn YieldTermStructure>> {
        self.discount_curve.as_ref()
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Result<Real> {
        let discounting = self
            .discount_curve
            .as_ref()
            .map(Handle::current_link)
            .transpose()?;

        let mut annuity = 0.0;
        let mut floating = 0.0;
        let mut accrual_start = self.start_date;
        for &payment in &self.payment_dates {
            let tau = self.day_counter.year_fraction(accrual_start, payment);
            let forward = simple_forward(curve, accrual_start, payment, tau);
            let df = match discounting {
                Some(external) => external.discount_date(payment)?,
                None => curve.discount_date(payment),
            };
            annuity += tau * df;
            floating += tau * forward * df;
            accrual_start = payment;
        }
        if annuity <= 0.0 {
            return Err(Error::Runtime(format!(
                "non-positive swap annuity {annuity} for pillar {}",
                self.pillar_date()
            )));
        }
        Ok(floating / annuity)
    }
}
