//! # Rentwise CLI Module
//!
//! This module implements the CLI interface for Rentwise.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server and the reminder scheduler
//! - `init` - Initialize a new database and seed the admin account
//! - `status` - Show dashboard counters (default)
//! - `list` - List properties with their status
//! - `add-property` - Register a property
//! - `pay` - Record a payment
//! - `payments` - Show payment history of a property
//! - `settings` - Show or change reminder settings
//! - `sweep` - Run one reminder sweep
//! - `add-user` - Create an account
//! - `activity` - Show recent activity

mod commands;

use crate::api::AuthError;
use crate::config::{AppConfig, ConfigError};
use clap::{Parser, Subcommand, ValueEnum};
use rentwise_core::RentwiseError;
use std::path::PathBuf;
use thiserror::Error;

pub use commands::*;

// =============================================================================
// ERRORS
// =============================================================================

/// Anything that can end a CLI invocation with a non-zero exit.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] RentwiseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Usage(String),
}

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Rentwise - Rental Ledger
///
/// Tracks properties, tenants, rent payments and due dates, and reminds
/// tenants before their paid-up period runs out.
#[derive(Parser, Debug)]
#[command(name = "rentwise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the ledger database
    #[arg(short = 'D', long, global = true, default_value = "rentwise.db")]
    pub database: PathBuf,

    /// Storage backend
    #[arg(short = 'B', long, global = true, value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Storage backend choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Disk-backed redb database
    Redb,
    /// In-memory ledger, lost on exit
    Memory,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Initialize a new database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Show dashboard counters
    Status,

    /// List properties with their status
    List,

    /// Register a property
    AddProperty {
        #[arg(long)]
        name: String,

        #[arg(long)]
        address: String,

        /// Tenant name
        #[arg(long)]
        tenant: String,

        /// Tenant email (reminder recipient)
        #[arg(long)]
        tenant_email: Option<String>,

        /// Monthly rent in whole currency units
        #[arg(long, allow_hyphen_values = true)]
        rent: i64,

        /// Lease start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        #[arg(long)]
        notes: Option<String>,

        /// Email of the owning account (default: the configured admin)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Record a payment
    Pay {
        /// Property id
        #[arg(long)]
        id: u64,

        /// Number of months paid
        #[arg(short, long, allow_hyphen_values = true)]
        months: i64,
    },

    /// Show payment history of a property
    Payments {
        /// Property id
        #[arg(long)]
        id: u64,
    },

    /// Show or change reminder settings
    Settings {
        /// Days before the due date that count as "soon due"
        #[arg(long)]
        threshold: Option<u32>,

        /// Enable or disable reminders
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Run one reminder sweep now
    Sweep,

    /// Create an account
    AddUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// admin or owner
        #[arg(long, default_value = "owner")]
        role: String,
    },

    /// Show recent activity
    Activity {
        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let db = cli.database.as_path();
    let backend = cli.backend;
    let json_mode = cli.json_mode;

    // No subcommand - show status by default
    match cli.command.unwrap_or(Commands::Status) {
        Commands::Server { host, port } => cmd_server(db, backend, &config, &host, port).await,
        Commands::Init { force } => cmd_init(db, backend, &config, force),
        Commands::Status => cmd_status(&open_portfolio(db, backend, &config)?, json_mode),
        Commands::List => cmd_list(&open_portfolio(db, backend, &config)?, json_mode),
        Commands::AddProperty {
            name,
            address,
            tenant,
            tenant_email,
            rent,
            start,
            notes,
            owner,
        } => {
            let request = crate::api::PropertyRequest {
                name,
                address,
                tenant_name: tenant,
                tenant_email,
                monthly_rent: rent,
                start_date: start,
                notes,
            };
            let owner = owner.unwrap_or_else(|| config.admin_email.clone());
            cmd_add_property(
                &mut open_portfolio(db, backend, &config)?,
                &request,
                &owner,
                json_mode,
            )
        }
        Commands::Pay { id, months } => {
            cmd_pay(&mut open_portfolio(db, backend, &config)?, id, months, json_mode)
        }
        Commands::Payments { id } => {
            cmd_payments(&open_portfolio(db, backend, &config)?, id, json_mode)
        }
        Commands::Settings { threshold, enabled } => cmd_settings(
            &mut open_portfolio(db, backend, &config)?,
            threshold,
            enabled,
            json_mode,
        ),
        Commands::Sweep => cmd_sweep(open_portfolio(db, backend, &config)?, json_mode).await,
        Commands::AddUser {
            email,
            password,
            role,
        } => cmd_add_user(
            &mut open_portfolio(db, backend, &config)?,
            &email,
            &password,
            &role,
            json_mode,
        ),
        Commands::Activity { limit } => {
            cmd_activity(&open_portfolio(db, backend, &config)?, limit, json_mode)
        }
    }
}
