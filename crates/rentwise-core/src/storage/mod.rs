//! # Persistent Storage
//!
//! Disk-backed implementations of [`crate::store::LeaseStore`].

mod redb_store;

pub use redb_store::RedbStore;
