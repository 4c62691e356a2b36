//! # Core Type Definitions
//!
//! This module contains the ledger's domain types:
//! - Identifiers (`PropertyId`, `UserId`, `PaymentId`, `ActivityId`)
//! - Lease records (`Property`, `PropertyDraft`)
//! - Payment history (`Payment`)
//! - Accounts (`User`, `NewUser`, `Role`)
//! - Audit trail (`ActivityEntry`, `NewActivity`, `ActivityKind`)
//! - Error types (`RentwiseError`)
//!
//! ## Derived State
//!
//! A `Property` stores `start_date` and `months_paid` only. The coverage end
//! date, days remaining and status are always recomputed by
//! [`crate::status`] so stored and derived state can never drift.

use crate::primitives::{MAX_NOTES_LENGTH, MAX_START_YEAR, MAX_TEXT_LENGTH, MIN_START_YEAR};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a tracked property (one lease per property).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Identifier of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub u64);

/// Identifier of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// PROPERTY (LEASE)
// =============================================================================

/// The caller-editable fields of a property.
///
/// Used for both creation and metadata updates. It deliberately has no
/// `months_paid`: that counter only moves through a recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub name: String,
    pub address: String,
    pub tenant_name: String,
    #[serde(default)]
    pub tenant_email: Option<String>,
    pub monthly_rent: u64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PropertyDraft {
    /// Validate field presence and bounds.
    pub fn validate(&self) -> Result<(), RentwiseError> {
        validate_text("name", &self.name)?;
        validate_text("address", &self.address)?;
        validate_text("tenant_name", &self.tenant_name)?;

        if let Some(email) = &self.tenant_email {
            validate_email(email)?;
        }

        if let Some(notes) = &self.notes
            && notes.len() > MAX_NOTES_LENGTH
        {
            return Err(RentwiseError::InvalidField {
                field: "notes",
                reason: format!("exceeds maximum {} bytes", MAX_NOTES_LENGTH),
            });
        }

        if self.monthly_rent == 0 {
            return Err(RentwiseError::InvalidRent);
        }

        if !(MIN_START_YEAR..=MAX_START_YEAR).contains(&self.start_date.year()) {
            return Err(RentwiseError::InvalidDate(format!(
                "start date {} is outside years {}..={}",
                self.start_date, MIN_START_YEAR, MAX_START_YEAR
            )));
        }

        Ok(())
    }
}

/// A tracked property together with its lease terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub name: String,
    pub address: String,
    pub tenant_name: String,
    pub tenant_email: Option<String>,
    pub monthly_rent: u64,
    pub start_date: NaiveDate,
    /// Fully paid months. Only ever increased by a recorded payment.
    pub months_paid: u32,
    pub notes: Option<String>,
}

impl Property {
    /// Build a fresh lease from a draft. New leases start with nothing paid.
    #[must_use]
    pub fn from_draft(id: PropertyId, owner_id: UserId, draft: PropertyDraft) -> Self {
        Self {
            id,
            owner_id,
            name: draft.name,
            address: draft.address,
            tenant_name: draft.tenant_name,
            tenant_email: draft.tenant_email,
            monthly_rent: draft.monthly_rent,
            start_date: draft.start_date,
            months_paid: 0,
            notes: draft.notes,
        }
    }

    /// Overwrite the editable fields, keeping id, owner and `months_paid`.
    pub fn apply_draft(&mut self, draft: PropertyDraft) {
        self.name = draft.name;
        self.address = draft.address;
        self.tenant_name = draft.tenant_name;
        self.tenant_email = draft.tenant_email;
        self.monthly_rent = draft.monthly_rent;
        self.start_date = draft.start_date;
        self.notes = draft.notes;
    }
}

// =============================================================================
// PAYMENT
// =============================================================================

/// One recorded rent payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub property_id: PropertyId,
    /// Number of months covered. Always positive.
    pub months: u32,
    /// `months * monthly_rent` at the time of recording (saturating).
    pub amount: u64,
    pub recorded_on: NaiveDate,
}

// =============================================================================
// USERS & ROLES
// =============================================================================

/// Account role.
///
/// Admins see and manage every property and the reminder settings.
/// Owners only see the properties they created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RentwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(RentwiseError::InvalidField {
                field: "role",
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}

/// A user account as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Lowercased email, unique across accounts.
    pub email: String,
    /// PHC-formatted password hash. Never the plain password.
    pub password_hash: String,
    pub role: Role,
}

impl User {
    /// Whether this user may see and mutate the given property.
    #[must_use]
    pub fn can_access(&self, property: &Property) -> bool {
        self.role == Role::Admin || property.owner_id == self.id
    }
}

/// Input for creating a user. The hash is produced by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Normalize an email for storage and lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

// =============================================================================
// ACTIVITY LOG
// =============================================================================

/// What an activity entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    PropertyCreated,
    PropertyUpdated,
    PropertyDeleted,
    PaymentRecorded,
    SettingsUpdated,
    UserCreated,
    ReminderSent,
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub at: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub property_id: Option<PropertyId>,
    pub kind: ActivityKind,
    pub detail: String,
}

/// An activity entry before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub at: DateTime<Utc>,
    pub user_id: Option<UserId>,
    pub property_id: Option<PropertyId>,
    pub kind: ActivityKind,
    pub detail: String,
}

impl NewActivity {
    #[must_use]
    pub fn new(at: DateTime<Utc>, kind: ActivityKind, detail: impl Into<String>) -> Self {
        Self {
            at,
            user_id: None,
            property_id: None,
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn by(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    #[must_use]
    pub fn on(mut self, property: PropertyId) -> Self {
        self.property_id = Some(property);
        self
    }
}

// =============================================================================
// FIELD VALIDATION
// =============================================================================

fn validate_text(field: &'static str, value: &str) -> Result<(), RentwiseError> {
    if value.trim().is_empty() {
        return Err(RentwiseError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.len() > MAX_TEXT_LENGTH {
        return Err(RentwiseError::InvalidField {
            field,
            reason: format!("exceeds maximum {} bytes", MAX_TEXT_LENGTH),
        });
    }
    Ok(())
}

/// Minimal shape check for an email address.
pub fn validate_email(email: &str) -> Result<(), RentwiseError> {
    validate_text("email", email)?;
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(RentwiseError::InvalidField {
            field: "email",
            reason: format!("'{}' is not an email address", trimmed),
        }),
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Rentwise core.
///
/// Validation failures are returned to the caller and never silently
/// defaulted: a wrong status would mislead both the dashboard and the
/// reminder sweep.
#[derive(Debug, Error)]
pub enum RentwiseError {
    /// A calendar date is malformed or out of the representable range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A month count is negative, zero where a positive count is required,
    /// or too large.
    #[error("Invalid month count: {0}")]
    InvalidCount(i64),

    /// Monthly rent must be a positive amount.
    #[error("Monthly rent must be positive")]
    InvalidRent,

    /// A field failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The requested property does not exist.
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    /// The requested user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// An account with this email already exists.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl RentwiseError {
    /// True for errors caused by caller input rather than storage.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate(_)
                | Self::InvalidCount(_)
                | Self::InvalidRent
                | Self::InvalidField { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PropertyDraft {
        PropertyDraft {
            name: "Rue des Lilas".to_string(),
            address: "12 rue des Lilas".to_string(),
            tenant_name: "Camille".to_string(),
            tenant_email: Some("camille@example.com".to_string()),
            monthly_rent: 850,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
            notes: None,
        }
    }

    #[test]
    fn valid_draft_accepted() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn zero_rent_rejected() {
        let mut d = draft();
        d.monthly_rent = 0;
        assert!(matches!(d.validate(), Err(RentwiseError::InvalidRent)));
    }

    #[test]
    fn start_date_outside_year_window_rejected() {
        for (y, m, day) in [(1899, 12, 31), (10_000, 1, 1), (262_142, 12, 15)] {
            let mut d = draft();
            d.start_date = NaiveDate::from_ymd_opt(y, m, day).expect("date");
            assert!(matches!(d.validate(), Err(RentwiseError::InvalidDate(_))));
        }

        let mut edge = draft();
        edge.start_date = NaiveDate::from_ymd_opt(9999, 12, 31).expect("date");
        assert!(edge.validate().is_ok());
        edge.start_date = NaiveDate::from_ymd_opt(1900, 1, 1).expect("date");
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(matches!(
            d.validate(),
            Err(RentwiseError::InvalidField { field: "name", .. })
        ));
    }

    #[test]
    fn malformed_tenant_email_rejected() {
        let mut d = draft();
        d.tenant_email = Some("no-at-sign".to_string());
        assert!(matches!(
            d.validate(),
            Err(RentwiseError::InvalidField { field: "email", .. })
        ));
    }

    #[test]
    fn new_property_starts_unpaid() {
        let p = Property::from_draft(PropertyId(1), UserId(1), draft());
        assert_eq!(p.months_paid, 0);
    }

    #[test]
    fn apply_draft_keeps_months_paid() {
        let mut p = Property::from_draft(PropertyId(1), UserId(1), draft());
        p.months_paid = 4;
        let mut d = draft();
        d.monthly_rent = 900;
        p.apply_draft(d);
        assert_eq!(p.months_paid, 4);
        assert_eq!(p.monthly_rent, 900);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>().expect("role"), Role::Admin);
        assert_eq!(" owner ".parse::<Role>().expect("role"), Role::Owner);
        assert!("tenant".parse::<Role>().is_err());
    }

    #[test]
    fn owner_cannot_access_foreign_property() {
        let owner = User {
            id: UserId(2),
            email: "o@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Owner,
        };
        let admin = User {
            role: Role::Admin,
            ..owner.clone()
        };
        let foreign = Property::from_draft(PropertyId(1), UserId(9), draft());
        assert!(!owner.can_access(&foreign));
        assert!(admin.can_access(&foreign));
    }

    #[test]
    fn email_normalized() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
