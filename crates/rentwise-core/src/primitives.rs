//! # Ledger Primitives
//!
//! Fixed defaults and input limits for the Rentwise core.
//!
//! These values are compiled into the binary. Anything an operator is
//! expected to tune (the reminder window, the sweep cadence) lives in
//! configuration instead and only falls back to the defaults below.

/// Default reminder window in days.
///
/// A lease whose coverage ends within this many days is "soon due".
/// Operators override it through the settings endpoint.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 7;

/// Default cadence of the periodic reminder sweep (one hour).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Calendar date format used on the wire and in storage (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for short text fields (name, address, tenant, email).
pub const MAX_TEXT_LENGTH: usize = 256;

/// Maximum length for free-form notes (16KB).
pub const MAX_NOTES_LENGTH: usize = 16 * 1024;

/// Maximum number of months a single payment may cover (ten years).
pub const MAX_MONTHS_PER_PAYMENT: u32 = 120;

/// Maximum reminder window an operator may configure (one year).
pub const MAX_THRESHOLD_DAYS: u32 = 366;

/// Earliest accepted lease start year.
pub const MIN_START_YEAR: i32 = 1900;

/// Latest accepted lease start year.
pub const MAX_START_YEAR: i32 = 9999;

/// Maximum number of activity entries returned in one listing.
pub const MAX_ACTIVITY_PAGE: usize = 500;
