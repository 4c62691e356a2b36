//! # Reminder Policy
//!
//! Decides which leases get a rent reminder.
//!
//! A reminder fires only while the lease is still covered and inside the
//! configured window: `0 < days_remaining <= threshold_days`. Late leases are
//! surfaced through their status but never re-notified.
//!
//! The policy carries no dispatch history. De-duplication (at most one
//! reminder per lease per day) is done by the caller, which passes the set of
//! leases already reminded on `as_of` into [`plan_sweep`].

use crate::primitives::{DEFAULT_THRESHOLD_DAYS, MAX_THRESHOLD_DAYS};
use crate::status::{LeaseStatus, StatusSnapshot, snapshot_for};
use crate::{Property, PropertyId, RentwiseError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Reminder settings. A singleton, changed only by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Days before the coverage end date during which a lease is soon due.
    pub threshold_days: u32,
    /// Gate on whether reminders fire at all.
    pub enabled: bool,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            enabled: true,
        }
    }
}

impl ReminderConfig {
    pub fn validate(&self) -> Result<(), RentwiseError> {
        if self.threshold_days > MAX_THRESHOLD_DAYS {
            return Err(RentwiseError::InvalidField {
                field: "threshold_days",
                reason: format!("exceeds maximum {} days", MAX_THRESHOLD_DAYS),
            });
        }
        Ok(())
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Whether a lease in this state should trigger a reminder.
#[must_use]
pub fn should_notify(status: LeaseStatus, days_remaining: i64, config: &ReminderConfig) -> bool {
    config.enabled
        && status != LeaseStatus::Late
        && days_remaining > 0
        && days_remaining <= i64::from(config.threshold_days)
}

// =============================================================================
// SWEEP PLANNING
// =============================================================================

/// A lease that should receive a reminder in this sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub property: Property,
    pub snapshot: StatusSnapshot,
}

/// Outcome of evaluating every lease against one fixed date.
#[derive(Debug, Default)]
pub struct SweepPlan {
    /// Leases evaluated without error.
    pub evaluated: usize,
    /// Leases that should be notified now, in property id order.
    pub due: Vec<DueReminder>,
    /// Leases that qualified but were already reminded on `as_of`.
    pub already_sent: usize,
    /// Leases whose status could not be computed.
    pub failures: Vec<(PropertyId, RentwiseError)>,
}

/// Evaluate `leases` against a single `as_of` date.
///
/// A failure on one lease is recorded and the sweep moves on.
pub fn plan_sweep<'a>(
    leases: impl IntoIterator<Item = &'a Property>,
    as_of: NaiveDate,
    config: &ReminderConfig,
    already_reminded: &BTreeSet<PropertyId>,
) -> SweepPlan {
    let mut plan = SweepPlan::default();

    for property in leases {
        let snapshot = match snapshot_for(property, as_of, config.threshold_days) {
            Ok(s) => s,
            Err(e) => {
                plan.failures.push((property.id, e));
                continue;
            }
        };
        plan.evaluated += 1;

        if !should_notify(snapshot.status, snapshot.days_remaining, config) {
            continue;
        }
        if already_reminded.contains(&property.id) {
            plan.already_sent += 1;
            continue;
        }
        plan.due.push(DueReminder {
            property: property.clone(),
            snapshot,
        });
    }

    plan.due.sort_by_key(|r| r.property.id);
    plan
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertyDraft, UserId};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
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
                monthly_rent: 1000,
                start_date: start,
                notes: None,
            },
        );
        p.months_paid = months_paid;
        p
    }

    #[test]
    fn default_config_matches_primitives() {
        let config = ReminderConfig::default();
        assert_eq!(config.threshold_days, 7);
        assert!(config.enabled);
    }

    #[test]
    fn oversized_threshold_rejected() {
        let config = ReminderConfig {
            threshold_days: MAX_THRESHOLD_DAYS + 1,
            enabled: true,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn notify_inside_window() {
        let config = ReminderConfig::default();
        assert!(should_notify(LeaseStatus::SoonDue, 1, &config));
        assert!(should_notify(LeaseStatus::SoonDue, 7, &config));
    }

    #[test]
    fn no_notify_on_due_day_or_after() {
        let config = ReminderConfig::default();
        assert!(!should_notify(LeaseStatus::SoonDue, 0, &config));
        assert!(!should_notify(LeaseStatus::Late, -1, &config));
    }

    #[test]
    fn no_notify_outside_window() {
        let config = ReminderConfig::default();
        assert!(!should_notify(LeaseStatus::UpToDate, 8, &config));
    }

    #[test]
    fn disabled_config_never_notifies() {
        let config = ReminderConfig {
            threshold_days: 30,
            enabled: false,
        };
        assert!(!should_notify(LeaseStatus::SoonDue, 3, &config));
    }

    #[test]
    fn plan_selects_only_due_leases() {
        let as_of = d(2025, 1, 28);
        let leases = vec![
            lease(1, d(2025, 1, 1), 1),  // ends 02-01, 4 days
            lease(2, d(2025, 1, 15), 0), // late
            lease(3, d(2025, 1, 1), 3),  // far away
        ];
        let plan = plan_sweep(&leases, as_of, &ReminderConfig::default(), &BTreeSet::new());

        assert_eq!(plan.evaluated, 3);
        assert_eq!(plan.due.len(), 1);
        assert_eq!(plan.due[0].property.id, PropertyId(1));
        assert_eq!(plan.due[0].snapshot.days_remaining, 4);
        assert!(plan.failures.is_empty());
    }

    #[test]
    fn plan_skips_already_reminded() {
        let leases = vec![lease(1, d(2025, 1, 1), 1)];
        let sent: BTreeSet<_> = [PropertyId(1)].into_iter().collect();
        let plan = plan_sweep(&leases, d(2025, 1, 28), &ReminderConfig::default(), &sent);

        assert!(plan.due.is_empty());
        assert_eq!(plan.already_sent, 1);
    }

    #[test]
    fn plan_continues_past_failing_lease() {
        let leases = vec![lease(1, NaiveDate::MAX, 1), lease(2, d(2025, 1, 1), 1)];
        let plan = plan_sweep(
            &leases,
            d(2025, 1, 28),
            &ReminderConfig::default(),
            &BTreeSet::new(),
        );

        assert_eq!(plan.failures.len(), 1);
        assert_eq!(plan.failures[0].0, PropertyId(1));
        assert_eq!(plan.due.len(), 1);
        assert_eq!(plan.due[0].property.id, PropertyId(2));
    }
}
