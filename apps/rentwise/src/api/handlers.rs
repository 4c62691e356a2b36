//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Each handler reads the clock once and uses that date for every status it
//! reports, so a list and its dashboard always agree.

use super::{
    AppState,
    auth::{CurrentUser, hash_password, verify_password},
    types::{
        AckResponse, ActivityQuery, ActivityResponse, ApiError, CreateUserRequest,
        DashboardResponse, HealthResponse, LoginRequest, LoginResponse, PaymentRequest,
        PaymentResponse, PaymentsResponse, PropertiesResponse, PropertyRequest, PropertyResponse,
        SettingsJson, SettingsResponse, SweepResponse, UserJson, UserResponse,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rentwise_core::{ActivityKind, NewActivity, Portfolio, PropertyId, Role};

/// Page size of `GET /api/activity` when no limit is given.
const DEFAULT_ACTIVITY_LIMIT: usize = 50;

/// Append to the activity log. A failed append is logged, not surfaced.
fn log_activity(portfolio: &mut Portfolio, entry: NewActivity) {
    if let Err(e) = portfolio.record_activity(entry) {
        tracing::warn!(error = %e, "Failed to record activity");
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// AUTH HANDLERS
// =============================================================================

/// Exchange email and password for a bearer token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let found = state.portfolio.read().await.user_by_email(&request.email)?;

    let user = found
        .filter(|u| verify_password(&request.password, &u.password_hash))
        .ok_or_else(|| {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_credentials",
                "Login rejected"
            );
            ApiError::unauthorized("invalid credentials")
        })?;

    let token = state.auth.issue(&user).map_err(|e| {
        tracing::error!(error = %e, "Token signing failed");
        ApiError::internal("could not issue token")
    })?;

    log_activity(
        &mut *state.portfolio.write().await,
        NewActivity::new(state.clock.now(), ActivityKind::Login, user.email.clone()).by(user.id),
    );

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserJson::from(&user),
    }))
}

/// The authenticated caller.
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> impl IntoResponse {
    Json(UserResponse {
        success: true,
        user: UserJson::from(&user),
    })
}

/// Create an account (admin only).
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    caller.require_admin()?;
    if request.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let password_hash = hash_password(&request.password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal("could not hash password")
    })?;

    let mut portfolio = state.portfolio.write().await;
    let user = portfolio.register_user(
        &request.email,
        password_hash,
        request.role.unwrap_or(Role::Owner),
    )?;
    log_activity(
        &mut portfolio,
        NewActivity::new(
            state.clock.now(),
            ActivityKind::UserCreated,
            format!("{} ({})", user.email, user.role),
        )
        .by(caller.0.id),
    );

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user: UserJson::from(&user),
        }),
    ))
}

// =============================================================================
// DASHBOARD HANDLER
// =============================================================================

/// Portfolio counters over the caller's visible properties.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let as_of = state.clock.today();
    let portfolio = state.portfolio.read().await;
    let threshold_days = portfolio.settings()?.threshold_days;
    let stats = portfolio.dashboard(&user, as_of)?;
    if stats.unresolved > 0 {
        tracing::warn!(
            unresolved = stats.unresolved,
            "Dashboard skipped leases with no computable status"
        );
    }

    Ok(Json(DashboardResponse {
        success: true,
        as_of,
        threshold_days,
        stats,
    }))
}

// =============================================================================
// PROPERTY HANDLERS
// =============================================================================

/// List visible properties with their status.
pub async fn list_properties_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<PropertiesResponse>, ApiError> {
    let as_of = state.clock.today();
    let book = state.portfolio.read().await.lease_views(&user, as_of)?;

    let mut unresolved = Vec::with_capacity(book.failures.len());
    for (id, e) in &book.failures {
        tracing::warn!(property_id = id.0, error = %e, "Lease status unavailable");
        unresolved.push(*id);
    }

    Ok(Json(PropertiesResponse {
        success: true,
        as_of,
        properties: book.views,
        unresolved,
    }))
}

/// Create a property owned by the caller.
pub async fn create_property_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<PropertyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = request.to_draft()?;
    let as_of = state.clock.today();

    let mut portfolio = state.portfolio.write().await;
    let property = portfolio.create_property(&user, draft)?;
    log_activity(
        &mut portfolio,
        NewActivity::new(
            state.clock.now(),
            ActivityKind::PropertyCreated,
            property.name.clone(),
        )
        .by(user.id)
        .on(property.id),
    );
    let view = portfolio.lease_view(&user, property.id, as_of)?;

    Ok((
        StatusCode::CREATED,
        Json(PropertyResponse {
            success: true,
            property: view,
        }),
    ))
}

/// One property with its status.
pub async fn get_property_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let as_of = state.clock.today();
    let view = state
        .portfolio
        .read()
        .await
        .lease_view(&user, PropertyId(id), as_of)?;

    Ok(Json(PropertyResponse {
        success: true,
        property: view,
    }))
}

/// Replace a property's editable fields.
pub async fn update_property_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(request): Json<PropertyRequest>,
) -> Result<Json<PropertyResponse>, ApiError> {
    let draft = request.to_draft()?;
    let id = PropertyId(id);
    let as_of = state.clock.today();

    let mut portfolio = state.portfolio.write().await;
    let property = portfolio.update_property(&user, id, draft)?;
    log_activity(
        &mut portfolio,
        NewActivity::new(
            state.clock.now(),
            ActivityKind::PropertyUpdated,
            property.name.clone(),
        )
        .by(user.id)
        .on(id),
    );
    let view = portfolio.lease_view(&user, id, as_of)?;

    Ok(Json(PropertyResponse {
        success: true,
        property: view,
    }))
}

/// Delete a property and its history.
pub async fn delete_property_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Result<Json<AckResponse>, ApiError> {
    let id = PropertyId(id);
    let mut portfolio = state.portfolio.write().await;
    portfolio.delete_property(&user, id)?;
    log_activity(
        &mut portfolio,
        NewActivity::new(
            state.clock.now(),
            ActivityKind::PropertyDeleted,
            format!("property {}", id),
        )
        .by(user.id)
        .on(id),
    );

    Ok(Json(AckResponse::ok()))
}

// =============================================================================
// PAYMENT HANDLERS
// =============================================================================

/// Record a payment of `months` months, then run a reminder sweep.
pub async fn record_payment_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let id = PropertyId(id);
    let as_of = state.clock.today();

    let response = {
        let mut portfolio = state.portfolio.write().await;
        let (_, payment) = portfolio.record_payment(&user, id, request.months, as_of)?;
        log_activity(
            &mut portfolio,
            NewActivity::new(
                state.clock.now(),
                ActivityKind::PaymentRecorded,
                format!("{} month(s), {}", payment.months, payment.amount),
            )
            .by(user.id)
            .on(id),
        );
        PaymentResponse {
            success: true,
            property: portfolio.lease_view(&user, id, as_of)?,
            payment,
        }
    };

    if let Err(e) = state.sweeper.run().await {
        tracing::error!(error = %e, "Reminder sweep after payment failed");
    }

    Ok(Json(response))
}

/// Payment history of a property, oldest first.
pub async fn list_payments_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Result<Json<PaymentsResponse>, ApiError> {
    let payments = state
        .portfolio
        .read()
        .await
        .payments(&user, PropertyId(id))?;

    Ok(Json(PaymentsResponse {
        success: true,
        payments,
    }))
}

// =============================================================================
// SETTINGS HANDLERS
// =============================================================================

/// Current reminder settings.
pub async fn get_settings_handler(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let config = state.portfolio.read().await.settings()?;
    Ok(Json(SettingsResponse {
        success: true,
        settings: SettingsJson::from(config),
    }))
}

/// Replace the reminder settings (admin only).
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(request): Json<SettingsJson>,
) -> Result<Json<SettingsResponse>, ApiError> {
    caller.require_admin()?;

    let mut portfolio = state.portfolio.write().await;
    portfolio.update_settings(request.into())?;
    log_activity(
        &mut portfolio,
        NewActivity::new(
            state.clock.now(),
            ActivityKind::SettingsUpdated,
            format!(
                "reminder_days={} reminders_enabled={}",
                request.reminder_days, request.reminders_enabled
            ),
        )
        .by(caller.0.id),
    );

    Ok(Json(SettingsResponse {
        success: true,
        settings: request,
    }))
}

// =============================================================================
// ACTIVITY & REMINDER HANDLERS
// =============================================================================

/// Most recent activity entries (admin only).
pub async fn activity_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    caller.require_admin()?;
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    let entries = state.portfolio.read().await.recent_activity(limit)?;

    Ok(Json(ActivityResponse {
        success: true,
        entries,
    }))
}

/// Run a reminder sweep now (admin only).
pub async fn run_reminders_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
) -> Result<Json<SweepResponse>, ApiError> {
    caller.require_admin()?;
    let report = state.sweeper.run().await?;

    Ok(Json(SweepResponse {
        success: true,
        report,
    }))
}
