//! # Property-Based Tests
//!
//! Invariants of the lease status engine and the reminder policy.

use chrono::{Datelike, NaiveDate};
use proptest::collection::vec;
use proptest::prelude::*;
use rentwise_core::{
    DashboardStats, LeaseStatus, Property, PropertyDraft, PropertyId, ReminderConfig, UserId,
    classify, compute_status, coverage_end_date, should_notify,
};

/// Any date between 1900 and 2200.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (693_596i32..803_533).prop_map(|n| NaiveDate::from_num_days_from_ce_opt(n).expect("in range"))
}

fn lease(id: u64, start: NaiveDate, months_paid: u32) -> Property {
    let mut p = Property::from_draft(
        PropertyId(id),
        UserId(1),
        PropertyDraft {
            name: format!("Unit {}", id),
            address: "1 Main St".to_string(),
            tenant_name: "Tenant".to_string(),
            tenant_email: None,
            monthly_rent: 100,
            start_date: start,
            notes: None,
        },
    );
    p.months_paid = months_paid;
    p
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Zero months paid means coverage ends on the start date.
    #[test]
    fn zero_months_ends_on_start(start in any_date()) {
        prop_assert_eq!(coverage_end_date(start, 0).expect("end"), start);
    }

    /// Paying more months never moves the coverage end backwards.
    #[test]
    fn coverage_is_monotonic(start in any_date(), a in 0i64..600, b in 0i64..600) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let end_lo = coverage_end_date(start, lo).expect("end");
        let end_hi = coverage_end_date(start, hi).expect("end");
        prop_assert!(end_lo <= end_hi);
    }

    /// Adding months keeps the day of month, clamped to the target month.
    #[test]
    fn day_of_month_is_kept_or_clamped(start in any_date(), months in 0i64..600) {
        let end = coverage_end_date(start, months).expect("end");
        prop_assert!(end.day() <= start.day());
        let total = start.month0() as i64 + months;
        prop_assert_eq!(end.year() as i64, start.year() as i64 + total / 12);
        prop_assert_eq!(end.month0() as i64, total % 12);
    }

    /// Negative month counts are always rejected.
    #[test]
    fn negative_months_rejected(start in any_date(), months in i64::MIN..0) {
        prop_assert!(coverage_end_date(start, months).is_err());
    }

    /// On the coverage end date itself the lease is soon due with zero days left.
    #[test]
    fn end_date_is_soon_due(start in any_date(), months in 0i64..240, threshold in 0u32..366) {
        let end = coverage_end_date(start, months).expect("end");
        let snapshot = compute_status(start, months, end, threshold).expect("status");
        prop_assert_eq!(snapshot.days_remaining, 0);
        prop_assert_eq!(snapshot.status, LeaseStatus::SoonDue);
    }

    /// Classification follows the sign and size of the day count.
    #[test]
    fn classify_partitions_day_counts(days in -10_000i64..10_000, threshold in 0u32..366) {
        let status = classify(days, threshold);
        let expected = if days < 0 {
            LeaseStatus::Late
        } else if days <= i64::from(threshold) {
            LeaseStatus::SoonDue
        } else {
            LeaseStatus::UpToDate
        };
        prop_assert_eq!(status, expected);
    }

    /// Each extra day of `as_of` takes exactly one day off the remaining count.
    #[test]
    fn days_remaining_tracks_as_of(
        start in any_date(),
        months in 0i64..120,
        offset in -400i64..400,
    ) {
        let as_of = start + chrono::Duration::days(offset);
        let next = as_of + chrono::Duration::days(1);
        let today = compute_status(start, months, as_of, 7).expect("status");
        let tomorrow = compute_status(start, months, next, 7).expect("status");
        prop_assert_eq!(today.days_remaining - 1, tomorrow.days_remaining);
    }

    /// Late leases and disabled configs never produce a reminder.
    #[test]
    fn no_reminder_when_late_or_disabled(
        days in -1000i64..1000,
        threshold in 0u32..366,
        enabled in any::<bool>(),
    ) {
        let config = ReminderConfig { threshold_days: threshold, enabled };
        let status = classify(days, threshold);
        let notify = should_notify(status, days, &config);

        if status == LeaseStatus::Late || !enabled {
            prop_assert!(!notify);
        }
        if notify {
            prop_assert!(days > 0 && days <= i64::from(threshold));
            prop_assert_eq!(status, LeaseStatus::SoonDue);
        }
    }

    /// Dashboard status counts always add up to the number of leases.
    #[test]
    fn dashboard_counts_partition_portfolio(
        leases in vec((any_date(), 0u32..36), 0..40),
        as_of in any_date(),
        threshold in 0u32..60,
    ) {
        let properties: Vec<Property> = leases
            .iter()
            .enumerate()
            .map(|(i, &(start, months))| lease(i as u64 + 1, start, months))
            .collect();

        let stats = DashboardStats::compute(&properties, as_of, threshold);
        prop_assert_eq!(stats.total_properties, properties.len());
        prop_assert_eq!(stats.unresolved, 0);
        prop_assert_eq!(stats.up_to_date + stats.soon_due + stats.late, properties.len());
        prop_assert_eq!(stats.total_monthly_rent, 100 * properties.len() as u64);
    }
}
