//! # redb-backed Lease Storage
//!
//! A disk-backed `LeaseStore` using the redb embedded database.
//!
//! redb provides:
//! - ACID transactions (a payment updates `months_paid` and appends the
//!   history row in one commit)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Rows are postcard-encoded. Id counters live in the `metadata` table so
//! they survive restarts and are never reused after a delete.

use crate::reminder::ReminderConfig;
use crate::store::{LeaseStore, add_months, payment_amount};
use crate::{
    ActivityEntry, ActivityId, NewActivity, NewUser, Payment, PaymentId, Property, PropertyDraft,
    PropertyId, RentwiseError, User, UserId, normalize_email,
};
use chrono::{Datelike, NaiveDate};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for properties: PropertyId(u64) -> serialized Property bytes
const PROPERTIES: TableDefinition<u64, &[u8]> = TableDefinition::new("properties");

/// Table for payments: (property_id, payment_id) -> serialized Payment bytes
/// The composite key keeps each property's history contiguous for range scans.
const PAYMENTS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("payments");

/// Table for users: UserId(u64) -> serialized User bytes
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Table for the email index: normalized email -> UserId(u64)
const EMAIL_INDEX: TableDefinition<&str, u64> = TableDefinition::new("email_index");

/// Table for the activity log: ActivityId(u64) -> serialized ActivityEntry bytes
const ACTIVITY: TableDefinition<u64, &[u8]> = TableDefinition::new("activity");

/// Table for the reminder log: PropertyId(u64) -> days from CE of last reminder
const REMINDERS: TableDefinition<u64, i32> = TableDefinition::new("reminders");

/// Table for singleton settings: key -> serialized bytes
const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const REMINDER_SETTINGS_KEY: &str = "reminder";
const NEXT_PROPERTY_ID: &str = "next_property_id";
const NEXT_PAYMENT_ID: &str = "next_payment_id";
const NEXT_USER_ID: &str = "next_user_id";
const NEXT_ACTIVITY_ID: &str = "next_activity_id";

fn io_err(e: impl std::fmt::Display) -> RentwiseError {
    RentwiseError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RentwiseError> {
    postcard::to_allocvec(value).map_err(|e| RentwiseError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RentwiseError> {
    postcard::from_bytes(bytes).map_err(|e| RentwiseError::SerializationError(e.to_string()))
}

/// Reserve the next id under `key`. Ids start at 1.
fn bump(meta: &mut Table<'_, &'static str, u64>, key: &str) -> Result<u64, RentwiseError> {
    let id = meta
        .get(key)
        .map_err(io_err)?
        .map(|v| v.value())
        .unwrap_or(1);
    meta.insert(key, id.saturating_add(1)).map_err(io_err)?;
    Ok(id)
}

/// A disk-backed lease store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RentwiseError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(PROPERTIES).map_err(io_err)?;
            let _ = write_txn.open_table(PAYMENTS).map_err(io_err)?;
            let _ = write_txn.open_table(USERS).map_err(io_err)?;
            let _ = write_txn.open_table(EMAIL_INDEX).map_err(io_err)?;
            let _ = write_txn.open_table(ACTIVITY).map_err(io_err)?;
            let _ = write_txn.open_table(REMINDERS).map_err(io_err)?;
            let _ = write_txn.open_table(SETTINGS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    fn read_row<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, u64, &'static [u8]>,
        id: u64,
    ) -> Result<Option<T>, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        match table.get(id).map_err(io_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// LEASESTORE TRAIT IMPLEMENTATION
// =============================================================================

impl LeaseStore for RedbStore {
    fn insert_property(
        &mut self,
        owner: UserId,
        draft: PropertyDraft,
    ) -> Result<Property, RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let property = {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let id = PropertyId(bump(&mut meta, NEXT_PROPERTY_ID)?);
            let property = Property::from_draft(id, owner, draft);

            let mut table = write_txn.open_table(PROPERTIES).map_err(io_err)?;
            table
                .insert(id.0, encode(&property)?.as_slice())
                .map_err(io_err)?;
            property
        };
        write_txn.commit().map_err(io_err)?;
        Ok(property)
    }

    fn get_property(&self, id: PropertyId) -> Result<Option<Property>, RentwiseError> {
        self.read_row(PROPERTIES, id.0)
    }

    fn list_properties(&self) -> Result<Vec<Property>, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PROPERTIES).map_err(io_err)?;

        let mut properties = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            properties.push(decode(value.value())?);
        }
        Ok(properties)
    }

    fn update_property(
        &mut self,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Option<Property>, RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let updated = {
            let mut table = write_txn.open_table(PROPERTIES).map_err(io_err)?;
            let existing: Option<Property> = match table.get(id.0).map_err(io_err)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            match existing {
                Some(mut property) => {
                    property.apply_draft(draft);
                    table
                        .insert(id.0, encode(&property)?.as_slice())
                        .map_err(io_err)?;
                    Some(property)
                }
                None => None,
            }
        };
        write_txn.commit().map_err(io_err)?;
        Ok(updated)
    }

    fn delete_property(&mut self, id: PropertyId) -> Result<bool, RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut table = write_txn.open_table(PROPERTIES).map_err(io_err)?;
            let existed = table.remove(id.0).map_err(io_err)?.is_some();

            if existed {
                let mut payments = write_txn.open_table(PAYMENTS).map_err(io_err)?;
                let keys: Vec<(u64, u64)> = {
                    let mut keys = Vec::new();
                    for entry in payments
                        .range((id.0, 0u64)..=(id.0, u64::MAX))
                        .map_err(io_err)?
                    {
                        let (key, _) = entry.map_err(io_err)?;
                        keys.push(key.value());
                    }
                    keys
                };
                for key in keys {
                    payments.remove(key).map_err(io_err)?;
                }

                let mut reminders = write_txn.open_table(REMINDERS).map_err(io_err)?;
                reminders.remove(id.0).map_err(io_err)?;
            }
            existed
        };
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }

    fn record_payment(
        &mut self,
        id: PropertyId,
        months: u32,
        recorded_on: NaiveDate,
    ) -> Result<Option<(Property, Payment)>, RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let result = {
            let mut properties = write_txn.open_table(PROPERTIES).map_err(io_err)?;
            let existing: Option<Property> = match properties.get(id.0).map_err(io_err)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };
            let Some(mut property) = existing else {
                // Nothing written; dropping the transaction aborts it.
                return Ok(None);
            };

            property.months_paid = add_months(property.months_paid, months)?;
            properties
                .insert(id.0, encode(&property)?.as_slice())
                .map_err(io_err)?;

            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let payment = Payment {
                id: PaymentId(bump(&mut meta, NEXT_PAYMENT_ID)?),
                property_id: id,
                months,
                amount: payment_amount(property.monthly_rent, months),
                recorded_on,
            };
            let mut payments = write_txn.open_table(PAYMENTS).map_err(io_err)?;
            payments
                .insert((id.0, payment.id.0), encode(&payment)?.as_slice())
                .map_err(io_err)?;

            (property, payment)
        };
        write_txn.commit().map_err(io_err)?;
        Ok(Some(result))
    }

    fn payments_for(&self, id: PropertyId) -> Result<Vec<Payment>, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PAYMENTS).map_err(io_err)?;

        let mut payments = Vec::new();
        for entry in table
            .range((id.0, 0u64)..=(id.0, u64::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            payments.push(decode(value.value())?);
        }
        Ok(payments)
    }

    fn settings(&self) -> Result<ReminderConfig, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(SETTINGS).map_err(io_err)?;
        match table.get(REMINDER_SETTINGS_KEY).map_err(io_err)? {
            Some(data) => decode(data.value()),
            None => Ok(ReminderConfig::default()),
        }
    }

    fn put_settings(&mut self, config: ReminderConfig) -> Result<(), RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SETTINGS).map_err(io_err)?;
            table
                .insert(REMINDER_SETTINGS_KEY, encode(&config)?.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, RentwiseError> {
        let email = normalize_email(&user.email);
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let stored = {
            let mut index = write_txn.open_table(EMAIL_INDEX).map_err(io_err)?;
            if index.get(email.as_str()).map_err(io_err)?.is_some() {
                return Err(RentwiseError::DuplicateEmail(email));
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let stored = User {
                id: UserId(bump(&mut meta, NEXT_USER_ID)?),
                email: email.clone(),
                password_hash: user.password_hash,
                role: user.role,
            };
            let mut users = write_txn.open_table(USERS).map_err(io_err)?;
            users
                .insert(stored.id.0, encode(&stored)?.as_slice())
                .map_err(io_err)?;
            index.insert(email.as_str(), stored.id.0).map_err(io_err)?;
            stored
        };
        write_txn.commit().map_err(io_err)?;
        Ok(stored)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RentwiseError> {
        let email = normalize_email(email);
        let id = {
            let read_txn = self.db.begin_read().map_err(io_err)?;
            let index = read_txn.open_table(EMAIL_INDEX).map_err(io_err)?;
            index.get(email.as_str()).map_err(io_err)?.map(|v| v.value())
        };
        match id {
            Some(id) => self.get_user(UserId(id)),
            None => Ok(None),
        }
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, RentwiseError> {
        self.read_row(USERS, id.0)
    }

    fn user_count(&self) -> Result<usize, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(USERS).map_err(io_err)?;
        let count = table.len().map_err(io_err)?;
        Ok(count as usize)
    }

    fn append_activity(&mut self, entry: NewActivity) -> Result<ActivityEntry, RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let stored = {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let stored = ActivityEntry {
                id: ActivityId(bump(&mut meta, NEXT_ACTIVITY_ID)?),
                at: entry.at,
                user_id: entry.user_id,
                property_id: entry.property_id,
                kind: entry.kind,
                detail: entry.detail,
            };
            let mut table = write_txn.open_table(ACTIVITY).map_err(io_err)?;
            table
                .insert(stored.id.0, encode(&stored)?.as_slice())
                .map_err(io_err)?;
            stored
        };
        write_txn.commit().map_err(io_err)?;
        Ok(stored)
    }

    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ACTIVITY).map_err(io_err)?;

        let mut entries = Vec::new();
        for entry in table.iter().map_err(io_err)?.rev().take(limit) {
            let (_, value) = entry.map_err(io_err)?;
            entries.push(decode(value.value())?);
        }
        Ok(entries)
    }

    fn last_reminder(&self, id: PropertyId) -> Result<Option<NaiveDate>, RentwiseError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(REMINDERS).map_err(io_err)?;
        match table.get(id.0).map_err(io_err)? {
            Some(days) => {
                let days = days.value();
                NaiveDate::from_num_days_from_ce_opt(days)
                    .map(Some)
                    .ok_or_else(|| RentwiseError::InvalidDate(format!("day number {}", days)))
            }
            None => Ok(None),
        }
    }

    fn mark_reminded(&mut self, id: PropertyId, on: NaiveDate) -> Result<(), RentwiseError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(REMINDERS).map_err(io_err)?;
            table.insert(id.0, on.num_days_from_ce()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}
