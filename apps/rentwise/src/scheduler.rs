//! # Reminder Scheduler
//!
//! Runs reminder sweeps over the whole portfolio.
//!
//! A sweep reads the clock once, plans under a read lock, delivers with no
//! lock held, then records deliveries under a short write lock. Sweeps are
//! serialized so a periodic tick and an ad hoc run never both send the same
//! reminder.

use crate::notify::{Notifier, ReminderNotice};
use chrono::NaiveDate;
use rentwise_core::{ActivityKind, Clock, NewActivity, Portfolio, PropertyId, RentwiseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub as_of: Option<NaiveDate>,
    pub evaluated: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub failed_evaluations: usize,
    pub failed_deliveries: usize,
    /// Due leases skipped because the tenant has no email address.
    #[serde(default)]
    pub no_recipient: usize,
}

/// Shared handle that runs sweeps against one portfolio.
#[derive(Clone)]
pub struct ReminderSweeper {
    portfolio: Arc<RwLock<Portfolio>>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    gate: Arc<Mutex<()>>,
}

impl ReminderSweeper {
    pub fn new(
        portfolio: Arc<RwLock<Portfolio>>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            portfolio,
            notifier,
            clock,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Run one sweep as of the clock's current date.
    ///
    /// Fails only when the portfolio itself cannot be read. Per-lease
    /// evaluation and delivery failures are logged and counted.
    pub async fn run(&self) -> Result<SweepReport, RentwiseError> {
        let _serial = self.gate.lock().await;

        let as_of = self.clock.today();
        let plan = self.portfolio.read().await.plan_reminders(as_of)?;

        let mut report = SweepReport {
            as_of: Some(as_of),
            evaluated: plan.evaluated,
            already_sent: plan.already_sent,
            failed_evaluations: plan.failures.len(),
            ..SweepReport::default()
        };

        for (id, error) in &plan.failures {
            tracing::warn!(
                event = "reminder_evaluation_failed",
                property_id = id.0,
                error = %error,
                "Skipping lease in reminder sweep"
            );
        }

        let mut delivered: Vec<(PropertyId, String)> = Vec::with_capacity(plan.due.len());
        for due in &plan.due {
            if due.property.tenant_email.is_none() {
                report.no_recipient += 1;
                tracing::debug!(
                    property_id = due.property.id.0,
                    "Due lease has no tenant email, reminder skipped"
                );
                continue;
            }
            let notice = ReminderNotice::render(due);
            match self.notifier.notify(&notice) {
                Ok(()) => delivered.push((notice.property_id, notice.subject)),
                Err(e) => {
                    report.failed_deliveries += 1;
                    tracing::warn!(
                        event = "reminder_delivery_failed",
                        property_id = notice.property_id.0,
                        error = %e,
                        "Reminder not delivered"
                    );
                }
            }
        }

        if !delivered.is_empty() {
            let now = self.clock.now();
            let mut portfolio = self.portfolio.write().await;
            for (id, subject) in delivered {
                if let Err(e) = portfolio.mark_reminded(id, as_of) {
                    tracing::error!(property_id = id.0, error = %e, "Failed to record reminder");
                    continue;
                }
                report.sent += 1;
                let entry = NewActivity::new(now, ActivityKind::ReminderSent, subject).on(id);
                if let Err(e) = portfolio.record_activity(entry) {
                    tracing::warn!(
                        property_id = id.0,
                        error = %e,
                        "Failed to log reminder activity"
                    );
                }
            }
        }

        tracing::info!(
            as_of = %as_of,
            evaluated = report.evaluated,
            sent = report.sent,
            already_sent = report.already_sent,
            failed_evaluations = report.failed_evaluations,
            failed_deliveries = report.failed_deliveries,
            no_recipient = report.no_recipient,
            "Reminder sweep finished"
        );

        Ok(report)
    }

    /// Sweep every `period`, starting immediately.
    pub fn spawn_periodic(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run().await {
                    tracing::error!(error = %e, "Reminder sweep failed");
                }
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
