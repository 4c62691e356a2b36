//! # Dashboard Aggregates
//!
//! Portfolio-wide counters for the dashboard, computed from status
//! snapshots taken against one fixed date.

use crate::status::{LeaseStatus, snapshot_for};
use crate::Property;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_properties: usize,
    /// Sum of monthly rents (saturating).
    pub total_monthly_rent: u64,
    pub up_to_date: usize,
    pub soon_due: usize,
    pub late: usize,
    /// Leases whose status could not be computed. Counted in
    /// `total_properties` but in no status bucket.
    pub unresolved: usize,
}

impl DashboardStats {
    /// Aggregate `leases` as of `as_of`.
    ///
    /// A lease whose status cannot be computed lands in `unresolved` and
    /// never in a status bucket.
    #[must_use]
    pub fn compute<'a>(
        leases: impl IntoIterator<Item = &'a Property>,
        as_of: NaiveDate,
        threshold_days: u32,
    ) -> Self {
        let mut stats = Self::default();

        for property in leases {
            stats.total_properties += 1;
            stats.total_monthly_rent = stats
                .total_monthly_rent
                .saturating_add(property.monthly_rent);
            match snapshot_for(property, as_of, threshold_days).map(|s| s.status) {
                Ok(LeaseStatus::UpToDate) => stats.up_to_date += 1,
                Ok(LeaseStatus::SoonDue) => stats.soon_due += 1,
                Ok(LeaseStatus::Late) => stats.late += 1,
                Err(_) => stats.unresolved += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertyDraft, PropertyId, UserId};

    fn lease(id: u64, rent: u64, start: &str, months_paid: u32) -> Property {
        let mut p = Property::from_draft(
            PropertyId(id),
            UserId(1),
            PropertyDraft {
                name: "Unit".to_string(),
                address: "Somewhere".to_string(),
                tenant_name: "Tenant".to_string(),
                tenant_email: None,
                monthly_rent: rent,
                start_date: crate::status::parse_date(start).expect("date"),
                notes: None,
            },
        );
        p.months_paid = months_paid;
        p
    }

    #[test]
    fn empty_portfolio() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 28).expect("date");
        let stats = DashboardStats::compute(&Vec::<Property>::new(), as_of, 7);
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn counts_each_status() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 28).expect("date");
        let leases = [
            lease(1, 800, "2025-01-01", 1),  // soon due
            lease(2, 900, "2025-01-15", 0),  // late
            lease(3, 1000, "2025-01-01", 6), // up to date
        ];
        let stats = DashboardStats::compute(&leases, as_of, 7);

        assert_eq!(stats.total_properties, 3);
        assert_eq!(stats.total_monthly_rent, 2700);
        assert_eq!(stats.soon_due, 1);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.up_to_date, 1);
    }

    #[test]
    fn threshold_changes_classification() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");
        let leases = [lease(1, 500, "2025-01-01", 1)]; // 31 days left
        let narrow = DashboardStats::compute(&leases, as_of, 7);
        let wide = DashboardStats::compute(&leases, as_of, 31);
        assert_eq!(narrow.up_to_date, 1);
        assert_eq!(wide.soon_due, 1);
    }

    #[test]
    fn rent_total_saturates() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).expect("date");
        let leases = [lease(1, u64::MAX, "2025-01-01", 1), lease(2, 10, "2025-01-01", 1)];
        let stats = DashboardStats::compute(&leases, as_of, 7);
        assert_eq!(stats.total_monthly_rent, u64::MAX);
    }

    #[test]
    fn uncomputable_lease_is_unresolved() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 28).expect("date");
        let mut broken = lease(1, 700, "2025-01-01", 1);
        broken.start_date = NaiveDate::MAX;
        let leases = [broken, lease(2, 800, "2025-01-01", 1)];
        let stats = DashboardStats::compute(&leases, as_of, 7);

        assert_eq!(stats.total_properties, 2);
        assert_eq!(stats.unresolved, 1);
        assert_eq!(stats.soon_due, 1);
        assert_eq!(stats.up_to_date + stats.late, 0);
        assert_eq!(stats.total_monthly_rent, 1500);
    }
}
