//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::scheduler::SweepReport;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rentwise_core::{
    ActivityEntry, DashboardStats, LeaseView, Payment, PropertyDraft, PropertyId,
    ReminderConfig, RentwiseError, Role, User, parse_date,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ERRORS
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// An HTTP error with a status and a message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<RentwiseError> for ApiError {
    fn from(e: RentwiseError) -> Self {
        let status = match &e {
            _ if e.is_validation() => StatusCode::BAD_REQUEST,
            RentwiseError::PropertyNotFound(_) | RentwiseError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RentwiseError::DuplicateEmail(_) => StatusCode::CONFLICT,
            _ => {
                tracing::error!(error = %e, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Acknowledgement with no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// =============================================================================
// AUTH & USERS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account (no password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserJson {
    pub id: u64,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserJson {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserJson,
}

/// Account creation request. Role defaults to `owner`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Create/update body for a property.
///
/// `months_paid` is not accepted here; only payments advance it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub name: String,
    pub address: String,
    pub tenant_name: String,
    #[serde(default)]
    pub tenant_email: Option<String>,
    pub monthly_rent: i64,
    /// `YYYY-MM-DD`
    pub start_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PropertyRequest {
    /// Convert to a validated draft.
    pub fn to_draft(&self) -> Result<PropertyDraft, RentwiseError> {
        let monthly_rent =
            u64::try_from(self.monthly_rent).map_err(|_| RentwiseError::InvalidRent)?;
        let draft = PropertyDraft {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            tenant_name: self.tenant_name.trim().to_string(),
            tenant_email: self
                .tenant_email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            monthly_rent,
            start_date: parse_date(&self.start_date)?,
            notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
        };
        draft.validate()?;
        Ok(draft)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyResponse {
    pub success: bool,
    pub property: LeaseView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesResponse {
    pub success: bool,
    pub as_of: NaiveDate,
    pub properties: Vec<LeaseView>,
    /// Visible properties whose status could not be computed.
    #[serde(default)]
    pub unresolved: Vec<PropertyId>,
}

// =============================================================================
// PAYMENTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub months: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub success: bool,
    pub property: LeaseView,
    pub payment: Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsResponse {
    pub success: bool,
    pub payments: Vec<Payment>,
}

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub as_of: NaiveDate,
    pub threshold_days: u32,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Reminder settings on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsJson {
    pub reminder_days: u32,
    pub reminders_enabled: bool,
}

impl From<ReminderConfig> for SettingsJson {
    fn from(config: ReminderConfig) -> Self {
        Self {
            reminder_days: config.threshold_days,
            reminders_enabled: config.enabled,
        }
    }
}

impl From<SettingsJson> for ReminderConfig {
    fn from(json: SettingsJson) -> Self {
        Self {
            threshold_days: json.reminder_days,
            enabled: json.reminders_enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub settings: SettingsJson,
}

// =============================================================================
// ACTIVITY & REMINDERS
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub entries: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SweepReport,
}
