//! # rentwise-core
//!
//! The lease ledger for Rentwise - THE LOGIC.
//!
//! This crate holds everything that decides whether rent is paid: the lease
//! status engine, the reminder policy, dashboard aggregation, and the
//! storage layer that keeps properties, payments, users and activity.
//!
//! ## Architectural Constraints
//!
//! - Status is always derived, never stored
//! - "Today" only enters through a [`Clock`], read once per evaluation pass
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod dashboard;
pub mod portfolio;
pub mod primitives;
pub mod reminder;
pub mod status;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ActivityEntry, ActivityId, ActivityKind, NewActivity, NewUser, Payment, PaymentId, Property,
    PropertyDraft, PropertyId, RentwiseError, Role, User, UserId, normalize_email, validate_email,
};

// =============================================================================
// RE-EXPORTS: Lease Status Engine
// =============================================================================

pub use status::{
    LeaseStatus, StatusSnapshot, classify, compute_status, compute_status_str, coverage_end_date,
    parse_date, snapshot_for,
};

// =============================================================================
// RE-EXPORTS: Reminder Policy
// =============================================================================

pub use reminder::{DueReminder, ReminderConfig, SweepPlan, plan_sweep, should_notify};

// =============================================================================
// RE-EXPORTS: Ledger
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use dashboard::DashboardStats;
pub use portfolio::{LeaseBook, LeaseView, Portfolio, StorageBackend, annotate};
pub use storage::RedbStore;
pub use store::{LeaseStore, MemoryStore};
