//! # ql-time
//!
//! Date and day-counter types.
//!
//! Calendars, schedules and business-day adjustment are not provided; dates
//! are plain calendar dates and all offsets are in calendar days.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `Date` type.
pub mod date;

/// `DayCounter` trait and built-in day-count conventions.
pub mod day_counter;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use date::Date;
pub use day_counter::{Actual360, Actual365Fixed, DayCounter};
