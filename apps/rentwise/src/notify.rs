//! # Notifications
//!
//! Rendering and delivery of rent reminders.
//!
//! Delivery goes through the [`Notifier`] trait. The server wires in
//! [`LogNotifier`], which emits each reminder as a structured log event;
//! tests use [`MemoryNotifier`] to capture what would have been sent.

use chrono::NaiveDate;
use rentwise_core::{DueReminder, PropertyId};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no recipient address for property {0}")]
    NoRecipient(PropertyId),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

// =============================================================================
// REMINDER NOTICE
// =============================================================================

/// A rendered reminder, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotice {
    pub property_id: PropertyId,
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
}

impl ReminderNotice {
    /// Render the reminder for a due lease.
    pub fn render(reminder: &DueReminder) -> Self {
        let p = &reminder.property;
        let s = &reminder.snapshot;
        let day_word = if s.days_remaining == 1 { "day" } else { "days" };

        let subject = format!(
            "Rent reminder: {} due in {} {}",
            p.name, s.days_remaining, day_word
        );
        let body = format!(
            "Hello {},\n\n\
             Rent for {} ({}) is covered until {}.\n\
             The next payment of {} is due in {} {}.\n",
            p.tenant_name,
            p.name,
            p.address,
            s.coverage_end_date,
            p.monthly_rent,
            s.days_remaining,
            day_word,
        );

        Self {
            property_id: p.id,
            recipient: p.tenant_email.clone(),
            subject,
            body,
            end_date: s.coverage_end_date,
            days_remaining: s.days_remaining,
        }
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Delivers reminder notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &ReminderNotice) -> Result<(), NotifyError>;
}

/// Writes each reminder to the log instead of sending mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &ReminderNotice) -> Result<(), NotifyError> {
        let recipient = notice
            .recipient
            .as_deref()
            .ok_or(NotifyError::NoRecipient(notice.property_id))?;

        tracing::info!(
            event = "reminder_sent",
            property_id = notice.property_id.0,
            recipient,
            end_date = %notice.end_date,
            days_remaining = notice.days_remaining,
            subject = %notice.subject,
            "Rent reminder dispatched"
        );
        Ok(())
    }
}

/// Keeps notices in memory. Optionally fails for chosen properties.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<ReminderNotice>>,
    failing: Vec<PropertyId>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that reports a delivery failure for each id in `failing`.
    pub fn failing_for(failing: Vec<PropertyId>) -> Self {
        Self {
            sent: Mutex::default(),
            failing,
        }
    }

    /// Notices delivered so far, in delivery order.
    pub fn sent(&self) -> Vec<ReminderNotice> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &ReminderNotice) -> Result<(), NotifyError> {
        if self.failing.contains(&notice.property_id) {
            return Err(NotifyError::Delivery("simulated outage".to_string()));
        }
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(notice.clone());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
