//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Commands other than `server` act on the local database with admin
//! rights; there is no login on the command line.

use super::{Backend, CliError};
use crate::api::{self, AppState, AuthKeys, PropertyRequest, SettingsJson, UserJson, hash_password};
use crate::config::AppConfig;
use crate::notify::LogNotifier;
use crate::scheduler::ReminderSweeper;
use rentwise_core::{
    ActivityKind, Clock, LeaseView, NewActivity, Portfolio, PropertyId, ReminderConfig, Role,
    SystemClock, User, UserId,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: Backend,
    config: &AppConfig,
    host: &str,
    port: u16,
) -> Result<(), CliError> {
    let secret = config.require_jwt_secret()?;
    let portfolio = open_portfolio(db_path, backend, config)?;

    println!("Rentwise Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {:?}", backend);
    println!("  Database: {:?}", db_path);
    println!("  Sweep:    every {} s", config.sweep_interval_secs);
    println!();
    println!("Endpoints:");
    println!("  POST /api/login                - Obtain a token");
    println!("  GET  /api/dashboard/stats      - Dashboard counters");
    println!("  GET  /api/properties           - List properties");
    println!("  POST /api/properties/{{id}}/payment - Record a payment");
    println!("  GET  /health                   - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(portfolio, AuthKeys::new(secret, config.token_ttl_hours));
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state, config).await?;
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database and seed the admin account.
pub fn cmd_init(
    db_path: &Path,
    backend: Backend,
    config: &AppConfig,
    force: bool,
) -> Result<(), CliError> {
    if backend == Backend::Memory {
        println!("In-memory backend needs no initialization");
        return Ok(());
    }

    if db_path.exists() {
        if !force {
            return Err(CliError::Usage(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path).map_err(|e| {
            rentwise_core::RentwiseError::IoError(format!("Remove {:?}: {}", db_path, e))
        })?;
    }

    let _portfolio = open_portfolio(db_path, backend, config)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// STATUS & LIST COMMANDS
// =============================================================================

/// Show dashboard counters over every property.
pub fn cmd_status(portfolio: &Portfolio, json_mode: bool) -> Result<(), CliError> {
    let as_of = SystemClock.today();
    let settings = portfolio.settings()?;
    let stats = portfolio.dashboard(&operator(), as_of)?;

    if json_mode {
        let output = serde_json::json!({
            "as_of": as_of,
            "threshold_days": settings.threshold_days,
            "reminders_enabled": settings.enabled,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        return Ok(());
    }

    println!("Rentwise Status ({})", as_of);
    println!("========================");
    println!("Properties:      {}", stats.total_properties);
    println!("Monthly rent:    {}", stats.total_monthly_rent);
    println!("Up to date:      {}", stats.up_to_date);
    println!("Soon due:        {}", stats.soon_due);
    println!("Late:            {}", stats.late);
    if stats.unresolved > 0 {
        println!("Unresolved:      {}", stats.unresolved);
    }
    println!();
    println!(
        "Reminders:       {} ({} day window)",
        if settings.enabled { "enabled" } else { "disabled" },
        settings.threshold_days
    );

    Ok(())
}

/// List every property with its status.
pub fn cmd_list(portfolio: &Portfolio, json_mode: bool) -> Result<(), CliError> {
    let as_of = SystemClock.today();
    let book = portfolio.lease_views(&operator(), as_of)?;
    for (id, e) in &book.failures {
        tracing::warn!(property_id = id.0, error = %e, "Lease status unavailable");
    }

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&book.views).unwrap_or_default());
        return Ok(());
    }

    if book.views.is_empty() {
        println!("No properties");
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:<20} {:>8} {:>6}  {:<10} {:>5}  {}",
        "ID", "NAME", "TENANT", "RENT", "PAID", "END", "DAYS", "STATUS"
    );
    for view in &book.views {
        print_lease(view);
    }
    Ok(())
}

fn print_lease(view: &LeaseView) {
    let p = &view.property;
    let s = &view.snapshot;
    println!(
        "{:>4}  {:<24} {:<20} {:>8} {:>6}  {:<10} {:>5}  {}",
        p.id.0, p.name, p.tenant_name, p.monthly_rent, p.months_paid, s.coverage_end_date,
        s.days_remaining, s.status
    );
}

// =============================================================================
// PROPERTY & PAYMENT COMMANDS
// =============================================================================

/// Register a property owned by the account `owner_email`.
pub fn cmd_add_property(
    portfolio: &mut Portfolio,
    request: &PropertyRequest,
    owner_email: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let owner = portfolio
        .user_by_email(owner_email)?
        .ok_or_else(|| CliError::Usage(format!("No account with email '{}'", owner_email)))?;

    let draft = request.to_draft()?;
    let property = portfolio.create_property(&owner, draft)?;
    portfolio.record_activity(
        NewActivity::new(
            SystemClock.now(),
            ActivityKind::PropertyCreated,
            property.name.clone(),
        )
        .by(owner.id)
        .on(property.id),
    )?;

    let view = portfolio.lease_view(&owner, property.id, SystemClock.today())?;
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&view).unwrap_or_default());
    } else {
        println!("Created property {} ({})", property.id, property.name);
        print_lease(&view);
    }
    Ok(())
}

/// Record a payment of `months` months.
pub fn cmd_pay(
    portfolio: &mut Portfolio,
    id: u64,
    months: i64,
    json_mode: bool,
) -> Result<(), CliError> {
    let as_of = SystemClock.today();
    let actor = operator();
    let id = PropertyId(id);

    let (_, payment) = portfolio.record_payment(&actor, id, months, as_of)?;
    portfolio.record_activity(
        NewActivity::new(
            SystemClock.now(),
            ActivityKind::PaymentRecorded,
            format!("{} month(s), {} (cli)", payment.months, payment.amount),
        )
        .on(id),
    )?;
    let view = portfolio.lease_view(&actor, id, as_of)?;

    if json_mode {
        let output = serde_json::json!({ "payment": payment, "property": view });
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        println!(
            "Recorded {} month(s) ({}) for property {}",
            payment.months, payment.amount, id
        );
        print_lease(&view);
    }
    Ok(())
}

/// Show payment history.
pub fn cmd_payments(portfolio: &Portfolio, id: u64, json_mode: bool) -> Result<(), CliError> {
    let payments = portfolio.payments(&operator(), PropertyId(id))?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&payments).unwrap_or_default());
        return Ok(());
    }

    if payments.is_empty() {
        println!("No payments recorded for property {}", id);
    }
    for payment in &payments {
        println!(
            "{}  {:>3} month(s)  {:>10}",
            payment.recorded_on, payment.months, payment.amount
        );
    }
    Ok(())
}

// =============================================================================
// SETTINGS COMMAND
// =============================================================================

/// Show reminder settings, updating them first if any value is given.
pub fn cmd_settings(
    portfolio: &mut Portfolio,
    threshold: Option<u32>,
    enabled: Option<bool>,
    json_mode: bool,
) -> Result<(), CliError> {
    let mut config = portfolio.settings()?;

    if threshold.is_some() || enabled.is_some() {
        config = ReminderConfig {
            threshold_days: threshold.unwrap_or(config.threshold_days),
            enabled: enabled.unwrap_or(config.enabled),
        };
        portfolio.update_settings(config)?;
        portfolio.record_activity(NewActivity::new(
            SystemClock.now(),
            ActivityKind::SettingsUpdated,
            format!(
                "reminder_days={} reminders_enabled={} (cli)",
                config.threshold_days, config.enabled
            ),
        ))?;
    }

    if json_mode {
        let output = SettingsJson::from(config);
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        println!("Reminder window: {} days", config.threshold_days);
        println!(
            "Reminders:       {}",
            if config.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

// =============================================================================
// SWEEP COMMAND
// =============================================================================

/// Run one reminder sweep with the logging notifier.
pub async fn cmd_sweep(portfolio: Portfolio, json_mode: bool) -> Result<(), CliError> {
    let sweeper = ReminderSweeper::new(
        Arc::new(RwLock::new(portfolio)),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    );
    let report = sweeper.run().await?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        println!("Evaluated:          {}", report.evaluated);
        println!("Reminders sent:     {}", report.sent);
        println!("Already sent today: {}", report.already_sent);
        println!("Evaluation errors:  {}", report.failed_evaluations);
        println!("Delivery errors:    {}", report.failed_deliveries);
        println!("No tenant email:    {}", report.no_recipient);
    }
    Ok(())
}

// =============================================================================
// USER & ACTIVITY COMMANDS
// =============================================================================

/// Create an account.
pub fn cmd_add_user(
    portfolio: &mut Portfolio,
    email: &str,
    password: &str,
    role: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let role: Role = role.parse()?;
    if password.is_empty() {
        return Err(CliError::Usage("Password must not be empty".to_string()));
    }

    let user = portfolio.register_user(email, hash_password(password)?, role)?;
    portfolio.record_activity(NewActivity::new(
        SystemClock.now(),
        ActivityKind::UserCreated,
        format!("{} ({}) (cli)", user.email, user.role),
    ))?;

    if json_mode {
        let output = UserJson::from(&user);
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        println!("Created {} account {} ({})", user.role, user.email, user.id);
    }
    Ok(())
}

/// Show the most recent activity entries.
pub fn cmd_activity(portfolio: &Portfolio, limit: usize, json_mode: bool) -> Result<(), CliError> {
    let entries = portfolio.recent_activity(limit)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&entries).unwrap_or_default());
        return Ok(());
    }

    for entry in &entries {
        let kind = serde_json::to_value(entry.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        println!(
            "{}  {:<18} {}",
            entry.at.format("%Y-%m-%d %H:%M:%S"),
            kind,
            entry.detail
        );
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// The identity CLI commands act as: an admin that owns nothing.
fn operator() -> User {
    User {
        id: UserId(0),
        email: "cli".to_string(),
        password_hash: String::new(),
        role: Role::Admin,
    }
}

/// Open the ledger with the chosen backend and seed the admin account.
pub fn open_portfolio(
    db_path: &Path,
    backend: Backend,
    config: &AppConfig,
) -> Result<Portfolio, CliError> {
    let mut portfolio = match backend {
        Backend::Redb => Portfolio::with_redb(db_path)?,
        Backend::Memory => Portfolio::new(),
    };
    seed_admin(&mut portfolio, config)?;
    Ok(portfolio)
}

/// Create the configured admin account if the ledger has no users.
pub fn seed_admin(portfolio: &mut Portfolio, config: &AppConfig) -> Result<Option<User>, CliError> {
    if portfolio.user_count()? > 0 {
        return Ok(None);
    }

    let hash = hash_password(&config.admin_password)?;
    let admin = portfolio.register_user(&config.admin_email, hash, Role::Admin)?;
    tracing::warn!(
        email = %admin.email,
        "Seeded default admin account; change its password before exposing the server"
    );
    Ok(Some(admin))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::verify_password;

    fn request(start: &str, rent: i64) -> PropertyRequest {
        PropertyRequest {
            name: "Loft".to_string(),
            address: "8 Canal St".to_string(),
            tenant_name: "Ines".to_string(),
            tenant_email: None,
            monthly_rent: rent,
            start_date: start.to_string(),
            notes: None,
        }
    }

    #[test]
    fn seed_admin_only_once() {
        let mut portfolio = Portfolio::new();
        let config = AppConfig::default();

        let admin = seed_admin(&mut portfolio, &config)
            .expect("seed")
            .expect("created");
        assert_eq!(admin.role, Role::Admin);
        assert!(verify_password("admin123", &admin.password_hash));

        assert!(seed_admin(&mut portfolio, &config).expect("seed").is_none());
        assert_eq!(portfolio.user_count().expect("count"), 1);
    }

    #[test]
    fn add_property_and_pay() {
        let config = AppConfig::default();
        let mut portfolio = open_portfolio(Path::new("unused"), Backend::Memory, &config)
            .expect("open");

        cmd_add_property(&mut portfolio, &request("2025-01-01", 900), "admin@example.com", true)
            .expect("add");
        cmd_pay(&mut portfolio, 1, 2, true).expect("pay");

        let payments = portfolio
            .payments(&operator(), PropertyId(1))
            .expect("payments");
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 1800);
    }

    #[test]
    fn add_property_requires_known_owner() {
        let config = AppConfig::default();
        let mut portfolio = open_portfolio(Path::new("unused"), Backend::Memory, &config)
            .expect("open");
        let result = cmd_add_property(
            &mut portfolio,
            &request("2025-01-01", 900),
            "ghost@example.com",
            true,
        );
        assert!(matches!(result, Err(CliError::Usage(_))));
    }

    #[test]
    fn invalid_inputs_surface_as_core_errors() {
        let config = AppConfig::default();
        let mut portfolio = open_portfolio(Path::new("unused"), Backend::Memory, &config)
            .expect("open");

        let bad_date = cmd_add_property(
            &mut portfolio,
            &request("2025-02-30", 900),
            "admin@example.com",
            true,
        );
        assert!(matches!(bad_date, Err(CliError::Core(_))));

        let bad_rent =
            cmd_add_property(&mut portfolio, &request("2025-01-01", -5), "admin@example.com", true);
        assert!(matches!(bad_rent, Err(CliError::Core(_))));

        assert!(matches!(
            cmd_pay(&mut portfolio, 99, 1, true),
            Err(CliError::Core(_))
        ));
    }

    #[test]
    fn settings_update_keeps_unspecified_values() {
        let config = AppConfig::default();
        let mut portfolio = open_portfolio(Path::new("unused"), Backend::Memory, &config)
            .expect("open");

        cmd_settings(&mut portfolio, Some(14), None, true).expect("settings");
        let settings = portfolio.settings().expect("settings");
        assert_eq!(settings.threshold_days, 14);
        assert!(settings.enabled);
    }

    #[test]
    fn init_refuses_existing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ledger.redb");
        let config = AppConfig::default();

        cmd_init(&path, Backend::Redb, &config, false).expect("init");
        assert!(matches!(
            cmd_init(&path, Backend::Redb, &config, false),
            Err(CliError::Usage(_))
        ));
        cmd_init(&path, Backend::Redb, &config, true).expect("force");
    }
}
