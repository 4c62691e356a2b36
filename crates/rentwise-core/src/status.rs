//! # Lease Status Engine
//!
//! Pure date arithmetic turning lease facts into a point-in-time snapshot.
//!
//! ```text
//! coverage_end_date = start_date + months_paid calendar months
//! days_remaining    = coverage_end_date - as_of        (signed)
//! status            = late      if days_remaining < 0
//!                     soon-due  if days_remaining <= threshold_days
//!                     up-to-date otherwise
//! ```
//!
//! Month addition clamps the day of month: 2025-01-31 + 1 month is
//! 2025-02-28. The threshold is always supplied by the caller.

use crate::primitives::DATE_FORMAT;
use crate::{Property, RentwiseError};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// STATUS
// =============================================================================

/// Three-state classification of a lease on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaseStatus {
    UpToDate,
    SoonDue,
    Late,
}

impl LeaseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpToDate => "up-to-date",
            Self::SoonDue => "soon-due",
            Self::Late => "late",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one lease against one `as_of` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Date through which rent has been paid.
    #[serde(rename = "end_date")]
    pub coverage_end_date: NaiveDate,
    /// `coverage_end_date - as_of` in days. Negative once late.
    pub days_remaining: i64,
    pub status: LeaseStatus,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, RentwiseError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| RentwiseError::InvalidDate(format!("'{}': {}", input, e)))
}

/// Advance `start_date` by `months_paid` whole calendar months.
pub fn coverage_end_date(
    start_date: NaiveDate,
    months_paid: i64,
) -> Result<NaiveDate, RentwiseError> {
    let months =
        u32::try_from(months_paid).map_err(|_| RentwiseError::InvalidCount(months_paid))?;
    start_date
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            RentwiseError::InvalidDate(format!(
                "{} + {} months is out of range",
                start_date, months
            ))
        })
}

/// Classify a signed day count against the reminder window.
#[must_use]
pub const fn classify(days_remaining: i64, threshold_days: u32) -> LeaseStatus {
    if days_remaining < 0 {
        LeaseStatus::Late
    } else if days_remaining <= threshold_days as i64 {
        LeaseStatus::SoonDue
    } else {
        LeaseStatus::UpToDate
    }
}

/// Compute the status snapshot of a lease.
///
/// # Errors
///
/// - `InvalidCount` if `months_paid` is negative (or beyond `u32`).
/// - `InvalidDate` if the coverage end date is not representable.
pub fn compute_status(
    start_date: NaiveDate,
    months_paid: i64,
    as_of: NaiveDate,
    threshold_days: u32,
) -> Result<StatusSnapshot, RentwiseError> {
    let end = coverage_end_date(start_date, months_paid)?;
    let days_remaining = end.signed_duration_since(as_of).num_days();

    Ok(StatusSnapshot {
        coverage_end_date: end,
        days_remaining,
        status: classify(days_remaining, threshold_days),
    })
}

/// Same as [`compute_status`] for a start date still in text form.
///
/// Fails with `InvalidDate` when `start_date` is not a well-formed
/// `YYYY-MM-DD` date.
pub fn compute_status_str(
    start_date: &str,
    months_paid: i64,
    as_of: NaiveDate,
    threshold_days: u32,
) -> Result<StatusSnapshot, RentwiseError> {
    compute_status(parse_date(start_date)?, months_paid, as_of, threshold_days)
}

/// Status snapshot of a stored property.
pub fn snapshot_for(
    property: &Property,
    as_of: NaiveDate,
    threshold_days: u32,
) -> Result<StatusSnapshot, RentwiseError> {
    compute_status(
        property.start_date,
        i64::from(property.months_paid),
        as_of,
        threshold_days,
    )
}

// =============================================================================
// TESTS
// =============================================================================
