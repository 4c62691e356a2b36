//! # Rentwise HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! Public:
//! - `GET /health` - Health check
//! - `POST /api/login` - Exchange credentials for a bearer token
//!
//! Authenticated (`Authorization: Bearer <token>`):
//! - `GET /api/me` - Current user
//! - `GET /api/dashboard/stats` - Portfolio counters
//! - `GET|POST /api/properties` - List / create properties
//! - `GET|PUT|DELETE /api/properties/{id}` - One property
//! - `POST /api/properties/{id}/payment` - Record a payment
//! - `GET /api/properties/{id}/payments` - Payment history
//! - `GET /api/settings` - Reminder settings
//!
//! Admin only:
//! - `PUT /api/settings` - Update reminder settings
//! - `GET /api/activity` - Activity log
//! - `POST /api/users` - Create an account
//! - `POST /api/reminders/run` - Run a reminder sweep now

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{AuthError, AuthKeys, Claims, CurrentUser, hash_password, verify_password};
pub use middleware::create_rate_limiter;
pub use types::{
    AckResponse, ActivityResponse, ApiError, CreateUserRequest, DashboardResponse, ErrorResponse,
    HealthResponse, LoginRequest, LoginResponse, PaymentRequest, PaymentResponse,
    PaymentsResponse, PropertiesResponse, PropertyRequest, PropertyResponse, SettingsJson,
    SettingsResponse, SweepResponse, UserJson, UserResponse,
};

use crate::config::AppConfig;
use crate::notify::{LogNotifier, Notifier};
use crate::scheduler::ReminderSweeper;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use rentwise_core::{Clock, Portfolio, RentwiseError, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The rental ledger.
    pub portfolio: Arc<RwLock<Portfolio>>,
    /// Token signing keys.
    pub auth: Arc<AuthKeys>,
    /// Source of "today" for status computation.
    pub clock: Arc<dyn Clock>,
    /// Reminder sweeps over the same portfolio.
    pub sweeper: ReminderSweeper,
}

impl AppState {
    /// State with the system clock and the logging notifier.
    pub fn new(portfolio: Portfolio, auth: AuthKeys) -> Self {
        Self::with_parts(portfolio, auth, Arc::new(LogNotifier), Arc::new(SystemClock))
    }

    /// State with an explicit notifier and clock.
    pub fn with_parts(
        portfolio: Portfolio,
        auth: AuthKeys,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let portfolio = Arc::new(RwLock::new(portfolio));
        let sweeper = ReminderSweeper::new(portfolio.clone(), notifier, clock.clone());
        Self {
            portfolio,
            auth: Arc::new(auth),
            clock,
            sweeper,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `Some("*")`: allows all origins (development only)
/// - `None`: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (RENTWISE_CORS_ORIGINS=*). Insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - protects against floods (if enabled)
/// 5. Authentication - bearer token, on `/api/*` except login
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let cors = build_cors_layer(config.cors_origins.as_deref());

    let protected = Router::new()
        .route("/api/me", get(handlers::me_handler))
        .route("/api/dashboard/stats", get(handlers::dashboard_handler))
        .route(
            "/api/properties",
            get(handlers::list_properties_handler).post(handlers::create_property_handler),
        )
        .route(
            "/api/properties/{id}",
            get(handlers::get_property_handler)
                .put(handlers::update_property_handler)
                .delete(handlers::delete_property_handler),
        )
        .route(
            "/api/properties/{id}/payment",
            post(handlers::record_payment_handler),
        )
        .route(
            "/api/properties/{id}/payments",
            get(handlers::list_payments_handler),
        )
        .route(
            "/api/settings",
            get(handlers::get_settings_handler).put(handlers::update_settings_handler),
        )
        .route("/api/activity", get(handlers::activity_handler))
        .route("/api/users", post(handlers::create_user_handler))
        .route("/api/reminders/run", post(handlers::run_reminders_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/login", post(handlers::login_handler))
        .merge(protected);

    if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(config.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and the periodic reminder sweep.
pub async fn run_server(
    addr: &str,
    state: AppState,
    config: &AppConfig,
) -> Result<(), RentwiseError> {
    let sweep_task = if config.sweep_interval_secs > 0 {
        tracing::info!(
            "Reminder sweep every {} seconds",
            config.sweep_interval_secs
        );
        Some(
            state
                .sweeper
                .clone()
                .spawn_periodic(Duration::from_secs(config.sweep_interval_secs)),
        )
    } else {
        tracing::info!("Periodic reminder sweep disabled");
        None
    };

    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RentwiseError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Rentwise HTTP server listening on {}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RentwiseError::IoError(format!("Server error: {}", e)));

    if let Some(task) = sweep_task {
        task.abort();
    }
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
