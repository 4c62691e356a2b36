//! # Lease Store
//!
//! The persistence contract for Rentwise and its in-memory implementation.
//!
//! Stores hold raw facts only: properties with `start_date` and
//! `months_paid`, payments, users, settings, the activity log and the
//! reminder log. Nothing derived from the date is ever written.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::reminder::ReminderConfig;
use crate::{
    ActivityEntry, ActivityId, NewActivity, NewUser, Payment, PaymentId, Property, PropertyDraft,
    PropertyId, RentwiseError, User, UserId, normalize_email,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

// =============================================================================
// LEASESTORE TRAIT
// =============================================================================

/// The LeaseStore trait defines every storage operation the ledger needs.
///
/// All fallible operations return `Result<T, RentwiseError>` so in-memory
/// and persistent backends are interchangeable.
pub trait LeaseStore {
    /// Insert a new lease owned by `owner`. `months_paid` starts at zero.
    fn insert_property(
        &mut self,
        owner: UserId,
        draft: PropertyDraft,
    ) -> Result<Property, RentwiseError>;

    /// Get one property.
    fn get_property(&self, id: PropertyId) -> Result<Option<Property>, RentwiseError>;

    /// All properties in id order.
    fn list_properties(&self) -> Result<Vec<Property>, RentwiseError>;

    /// Replace the editable fields of a property. `months_paid` is kept.
    fn update_property(
        &mut self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Option<Property>, RentwiseError>;

    /// Delete a property with its payments and reminder log.
    /// Returns false if it did not exist.
    fn delete_property(&mut self, id: PropertyId) -> Result<bool, RentwiseError>;

    /// Add `months` to `months_paid` and append the payment, atomically.
    ///
    /// Returns `None` if the property does not exist.
    fn record_payment(
        &mut self,
        id: PropertyId,
        months: u32,
        recorded_on: NaiveDate,
    ) -> Result<Option<(Property, Payment)>, RentwiseError>;

    /// Payment history of a property, oldest first.
    fn payments_for(&self, id: PropertyId) -> Result<Vec<Payment>, RentwiseError>;

    /// Current reminder settings (defaults if never written).
    fn settings(&self) -> Result<ReminderConfig, RentwiseError>;

    /// Replace the reminder settings.
    fn put_settings(&mut self, config: ReminderConfig) -> Result<(), RentwiseError>;

    /// Create a user. Fails with `DuplicateEmail` if the email is taken.
    fn insert_user(&mut self, user: NewUser) -> Result<User, RentwiseError>;

    /// Find a user by email (case-insensitive).
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RentwiseError>;

    /// Get a user by id.
    fn get_user(&self, id: UserId) -> Result<Option<User>, RentwiseError>;

    /// Number of user accounts.
    fn user_count(&self) -> Result<usize, RentwiseError>;

    /// Append to the activity log.
    fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityEntry, RentwiseError>;

    /// The most recent `limit` activity entries, newest first.
    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, RentwiseError>;

    /// Date of the last reminder sent for a property.
    fn last_reminder(&self, id: PropertyId) -> Result<Option<NaiveDate>, RentwiseError>;

    /// Record that a reminder went out for a property on `on`.
    fn mark_reminded(&mut self, id: PropertyId, on: NaiveDate) -> Result<(), RentwiseError>;
}

/// Amount of a payment: `months * monthly_rent`, saturating.
#[must_use]
pub fn payment_amount(monthly_rent: u64, months: u32) -> u64 {
    monthly_rent.saturating_mul(u64::from(months))
}

/// New `months_paid` after a payment, rejecting overflow.
pub fn add_months(current: u32, months: u32) -> Result<u32, RentwiseError> {
    current
        .checked_add(months)
        .ok_or(RentwiseError::InvalidCount(i64::from(current) + i64::from(months)))
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store. Fast and volatile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    properties: BTreeMap<PropertyId, Property>,
    payments: BTreeMap<PaymentId, Payment>,
    users: BTreeMap<UserId, User>,
    /// Reverse lookup: normalized email -> UserId
    email_index: BTreeMap<String, UserId>,
    activity: BTreeMap<ActivityId, ActivityEntry>,
    reminders: BTreeMap<PropertyId, NaiveDate>,
    settings: Option<ReminderConfig>,
    next_property_id: u64,
    next_payment_id: u64,
    next_user_id: u64,
    next_activity_id: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Hand out the next id. Counters start at 0 but ids start at 1.
fn take_id(counter: &mut u64) -> u64 {
    if *counter == 0 {
        *counter = 1;
    }
    let id = *counter;
    *counter = counter.saturating_add(1);
    id
}

impl LeaseStore for MemoryStore {
    fn insert_property(
        &mut self,
        owner: UserId,
        draft: PropertyDraft,
    ) -> Result<Property, RentwiseError> {
        let id = PropertyId(take_id(&mut self.next_property_id));
        let property = Property::from_draft(id, owner, draft);
        self.properties.insert(id, property.clone());
        Ok(property)
    }

    fn get_property(&self, id: PropertyId) -> Result<Option<Property>, RentwiseError> {
        Ok(self.properties.get(&id).cloned())
    }

    fn list_properties(&self) -> Result<Vec<Property>, RentwiseError> {
        Ok(self.properties.values().cloned().collect())
    }

    fn update_property(
        &mut self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Option<Property>, RentwiseError> {
        Ok(self.properties.get_mut(&id).map(|p| {
            p.apply_draft(draft);
            p.clone()
        }))
    }

    fn delete_property(&mut self, id: PropertyId) -> Result<bool, RentwiseError> {
        if self.properties.remove(&id).is_none() {
            return Ok(false);
        }
        self.payments.retain(|_, p| p.property_id != id);
        self.reminders.remove(&id);
        Ok(true)
    }

    fn record_payment(
        &mut self,
        id: PropertyId,
        months: u32,
        recorded_on: NaiveDate,
    ) -> Result<Option<(Property, Payment)>, RentwiseError> {
        let Some(property) = self.properties.get_mut(&id) else {
            return Ok(None);
        };
        property.months_paid = add_months(property.months_paid, months)?;

        let payment = Payment {
            id: PaymentId(take_id(&mut self.next_payment_id)),
            property_id: id,
            months,
            amount: payment_amount(property.monthly_rent, months),
            recorded_on,
        };
        self.payments.insert(payment.id, payment.clone());
        Ok(Some((property.clone(), payment)))
    }

    fn payments_for(&self, id: PropertyId) -> Result<Vec<Payment>, RentwiseError> {
        Ok(self
            .payments
            .values()
            .filter(|p| p.property_id == id)
            .cloned()
            .collect())
    }

    fn settings(&self) -> Result<ReminderConfig, RentwiseError> {
        Ok(self.settings.unwrap_or_default())
    }

    fn put_settings(&mut self, config: ReminderConfig) -> Result<(), RentwiseError> {
        self.settings = Some(config);
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, RentwiseError> {
        let email = normalize_email(&user.email);
        if self.email_index.contains_key(&email) {
            return Err(RentwiseError::DuplicateEmail(email));
        }
        let id = UserId(take_id(&mut self.next_user_id));
        let stored = User {
            id,
            email: email.clone(),
            password_hash: user.password_hash,
            role: user.role,
        };
        self.users.insert(id, stored.clone());
        self.email_index.insert(email, id);
        Ok(stored)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RentwiseError> {
        Ok(self
            .email_index
            .get(&normalize_email(email))
            .and_then(|id| self.users.get(id))
            .cloned())
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, RentwiseError> {
        Ok(self.users.get(&id).cloned())
    }

    fn user_count(&self) -> Result<usize, RentwiseError> {
        Ok(self.users.len())
    }

    fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityEntry, RentwiseError> {
        let stored = ActivityEntry {
            id: ActivityId(take_id(&mut self.next_activity_id)),
            at: entry.at,
            user_id: entry.user_id,
            property_id: entry.property_id,
            kind: entry.kind,
            detail: entry.detail,
        };
        self.activity.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, RentwiseError> {
        Ok(self.activity.values().rev().take(limit).cloned().collect())
    }

    fn last_reminder(&self, id: PropertyId) -> Result<Option<NaiveDate>, RentwiseError> {
        Ok(self.reminders.get(&id).copied())
    }

    fn mark_reminded(&mut self, id: PropertyId, on: NaiveDate) -> Result<(), RentwiseError> {
        self.reminders.insert(id, on);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
