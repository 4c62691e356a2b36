//! # Rentwise - Rental Ledger Server
//!
//! The main binary for the Rentwise rental property ledger.
//!
//! This application provides:
//! - HTTP REST API server (axum-based, JWT auth)
//! - Periodic rent reminder sweeps
//! - CLI interface for administration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    apps/rentwise (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │    Scheduler     │   │
//! │  │  (clap)     │    │   (axum)    │    │ (reminder sweep) │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │ rentwise-core │                           │
//! │                    │ (THE LEDGER)  │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! RENTWISE_JWT_SECRET=change-me rentwise server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! rentwise status
//! rentwise add-property --name Loft --address "8 Canal St" --tenant Ines \
//!     --rent 1200 --start 2025-01-01
//! rentwise pay --id 1 --months 2
//! ```

use clap::Parser;
use rentwise::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // RENTWISE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RENTWISE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rentwise=info,rentwise_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Rentwise startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ███████╗███╗   ██╗████████╗██╗    ██╗██╗███████╗███████╗
  ██╔══██╗██╔════╝████╗  ██║╚══██╔══╝██║    ██║██║██╔════╝██╔════╝
  ██████╔╝█████╗  ██╔██╗ ██║   ██║   ██║ █╗ ██║██║███████╗█████╗
  ██╔══██╗██╔══╝  ██║╚██╗██║   ██║   ██║███╗██║██║╚════██║██╔══╝
  ██║  ██║███████╗██║ ╚████║   ██║   ╚███╔███╔╝██║███████║███████╗
  ╚═╝  ╚═╝╚══════╝╚═╝  ╚═══╝   ╚═╝    ╚══╝╚══╝ ╚═╝╚══════╝╚══════╝

  Rental Ledger v{}

  Leases • Payments • Reminders
"#,
        env!("CARGO_PKG_VERSION")
    );
}
