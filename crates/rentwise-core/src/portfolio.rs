//! # Portfolio Module
//!
//! Validated, role-aware operations over a lease store.
//!
//! The Portfolio is what the API and the CLI talk to. It owns the storage
//! backend, validates every input before it reaches storage, and enforces
//! visibility: admins see every property, owners only their own. A property
//! the actor may not see is reported as not found.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore` (fast, volatile)
//! - `Persistent`: `RedbStore` (disk-backed ACID storage)

use crate::dashboard::DashboardStats;
use crate::primitives::{MAX_ACTIVITY_PAGE, MAX_MONTHS_PER_PAYMENT};
use crate::reminder::{ReminderConfig, SweepPlan, plan_sweep};
use crate::status::{StatusSnapshot, coverage_end_date, snapshot_for};
use crate::storage::RedbStore;
use crate::store::{LeaseStore, MemoryStore};
use crate::{
    ActivityEntry, NewActivity, NewUser, Payment, Property, PropertyDraft, PropertyId,
    RentwiseError, Role, User, UserId, validate_email,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Storage backend for a Portfolio.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// A property annotated with its status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseView {
    #[serde(flatten)]
    pub property: Property,
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
}

/// Lease views plus the leases whose status could not be computed.
#[derive(Debug, Default)]
pub struct LeaseBook {
    pub views: Vec<LeaseView>,
    pub failures: Vec<(PropertyId, RentwiseError)>,
}

/// Annotate properties with their status as of one fixed date.
///
/// A lease that fails to evaluate is set aside in `failures`; the rest are
/// still annotated.
#[must_use]
pub fn annotate(properties: Vec<Property>, as_of: NaiveDate, threshold_days: u32) -> LeaseBook {
    let mut book = LeaseBook::default();
    for property in properties {
        match snapshot_for(&property, as_of, threshold_days) {
            Ok(snapshot) => book.views.push(LeaseView { property, snapshot }),
            Err(e) => book.failures.push((property.id, e)),
        }
    }
    book
}

/// The rental ledger: a storage backend plus validation and access rules.
#[derive(Debug, Default)]
pub struct Portfolio {
    backend: StorageBackend,
}

impl Portfolio {
    /// Create an empty in-memory portfolio.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing in-memory store as-is.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
        }
    }

    /// Open or create a persistent portfolio at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, RentwiseError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Check if this portfolio writes to disk.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> &dyn LeaseStore {
        match &self.backend {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn LeaseStore {
        match &mut self.backend {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    /// Create a lease owned by `actor`. It starts with no months paid.
    pub fn create_property(
        &mut self,
        actor: &User,
        draft: PropertyDraft,
    ) -> Result<Property, RentwiseError> {
        draft.validate()?;
        self.store_mut().insert_property(actor.id, draft)
    }

    /// Fetch a property the actor is allowed to see.
    pub fn property(&self, actor: &User, id: PropertyId) -> Result<Property, RentwiseError> {
        match self.store().get_property(id)? {
            Some(p) if actor.can_access(&p) => Ok(p),
            _ => Err(RentwiseError::PropertyNotFound(id)),
        }
    }

    /// Properties visible to `actor`, in id order.
    pub fn visible_properties(&self, actor: &User) -> Result<Vec<Property>, RentwiseError> {
        let mut all = self.store().list_properties()?;
        all.retain(|p| actor.can_access(p));
        Ok(all)
    }

    /// Every property regardless of owner. Used by the reminder sweep.
    pub fn all_properties(&self) -> Result<Vec<Property>, RentwiseError> {
        self.store().list_properties()
    }

    /// Replace a property's editable fields. `months_paid` is untouched.
    ///
    /// Rejected without writing if the new start date and the months
    /// already paid give an unrepresentable coverage end date.
    pub fn update_property(
        &mut self,
        actor: &User,
        id: PropertyId,
        draft: PropertyDraft,
    ) -> Result<Property, RentwiseError> {
        draft.validate()?;
        let current = self.property(actor, id)?;
        coverage_end_date(draft.start_date, i64::from(current.months_paid))?;
        self.store_mut()
            .update_property(id, draft)?
            .ok_or(RentwiseError::PropertyNotFound(id))
    }

    /// Delete a property together with its history.
    pub fn delete_property(&mut self, actor: &User, id: PropertyId) -> Result<(), RentwiseError> {
        self.property(actor, id)?;
        if self.store_mut().delete_property(id)? {
            Ok(())
        } else {
            Err(RentwiseError::PropertyNotFound(id))
        }
    }

    // =========================================================================
    // PAYMENTS
    // =========================================================================

    /// Record a payment covering `months` months.
    ///
    /// `months` must be in `1..=MAX_MONTHS_PER_PAYMENT`; anything else is
    /// `InvalidCount`. The resulting coverage end date is checked before
    /// anything is written, so a rejected payment leaves no trace.
    pub fn record_payment(
        &mut self,
        actor: &User,
        id: PropertyId,
        months: i64,
        recorded_on: NaiveDate,
    ) -> Result<(Property, Payment), RentwiseError> {
        let months_u32 = u32::try_from(months)
            .ok()
            .filter(|m| (1..=MAX_MONTHS_PER_PAYMENT).contains(m))
            .ok_or(RentwiseError::InvalidCount(months))?;

        let current = self.property(actor, id)?;
        coverage_end_date(
            current.start_date,
            i64::from(current.months_paid) + i64::from(months_u32),
        )?;
        self.store_mut()
            .record_payment(id, months_u32, recorded_on)?
            .ok_or(RentwiseError::PropertyNotFound(id))
    }

    /// Payment history of a property, oldest first.
    pub fn payments(&self, actor: &User, id: PropertyId) -> Result<Vec<Payment>, RentwiseError> {
        self.property(actor, id)?;
        self.store().payments_for(id)
    }

    // =========================================================================
    // STATUS VIEWS
    // =========================================================================

    /// Visible properties annotated with status as of `as_of`.
    pub fn lease_views(&self, actor: &User, as_of: NaiveDate) -> Result<LeaseBook, RentwiseError> {
        let threshold = self.settings()?.threshold_days;
        Ok(annotate(self.visible_properties(actor)?, as_of, threshold))
    }

    /// One visible property annotated with status as of `as_of`.
    pub fn lease_view(
        &self,
        actor: &User,
        id: PropertyId,
        as_of: NaiveDate,
    ) -> Result<LeaseView, RentwiseError> {
        let property = self.property(actor, id)?;
        let snapshot = snapshot_for(&property, as_of, self.settings()?.threshold_days)?;
        Ok(LeaseView { property, snapshot })
    }

    /// Dashboard counters over the actor's visible properties.
    pub fn dashboard(
        &self,
        actor: &User,
        as_of: NaiveDate,
    ) -> Result<DashboardStats, RentwiseError> {
        let threshold = self.settings()?.threshold_days;
        Ok(DashboardStats::compute(
            &self.visible_properties(actor)?,
            as_of,
            threshold,
        ))
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    pub fn settings(&self) -> Result<ReminderConfig, RentwiseError> {
        self.store().settings()
    }

    pub fn update_settings(&mut self, config: ReminderConfig) -> Result<(), RentwiseError> {
        config.validate()?;
        self.store_mut().put_settings(config)
    }

    // =========================================================================
    // USERS
    // =========================================================================

    /// Create an account. The password must already be hashed.
    pub fn register_user(
        &mut self,
        email: &str,
        password_hash: String,
        role: Role,
    ) -> Result<User, RentwiseError> {
        validate_email(email)?;
        if password_hash.is_empty() {
            return Err(RentwiseError::InvalidField {
                field: "password",
                reason: "hash must not be empty".to_string(),
            });
        }
        self.store_mut().insert_user(NewUser {
            email: email.to_string(),
            password_hash,
            role,
        })
    }

    pub fn user(&self, id: UserId) -> Result<User, RentwiseError> {
        self.store()
            .get_user(id)?
            .ok_or(RentwiseError::UserNotFound(id))
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, RentwiseError> {
        self.store().find_user_by_email(email)
    }

    pub fn user_count(&self) -> Result<usize, RentwiseError> {
        self.store().user_count()
    }

    // =========================================================================
    // ACTIVITY
    // =========================================================================

    pub fn record_activity(&mut self, entry: NewActivity) -> Result<ActivityEntry, RentwiseError> {
        self.store_mut().append_activity(entry)
    }

    /// Newest entries first, at most `MAX_ACTIVITY_PAGE`.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, RentwiseError> {
        self.store().recent_activity(limit.min(MAX_ACTIVITY_PAGE))
    }

    // =========================================================================
    // REMINDERS
    // =========================================================================

    /// Plan a reminder sweep over every property as of `as_of`.
    ///
    /// Leases already reminded on `as_of` are excluded so a lease gets at
    /// most one reminder per day however often the sweep runs.
    pub fn plan_reminders(&self, as_of: NaiveDate) -> Result<SweepPlan, RentwiseError> {
        let config = self.settings()?;
        let properties = self.all_properties()?;

        let mut reminded = BTreeSet::new();
        for p in &properties {
            if self.store().last_reminder(p.id)? == Some(as_of) {
                reminded.insert(p.id);
            }
        }

        Ok(plan_sweep(&properties, as_of, &config, &reminded))
    }

    /// Record that a reminder was delivered for `id` on `on`.
    pub fn mark_reminded(&mut self, id: PropertyId, on: NaiveDate) -> Result<(), RentwiseError> {
        self.store_mut().mark_reminded(id, on)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::LeaseStatus;
    use crate::{ActivityKind, FixedClock};
    use crate::clock::Clock;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    fn draft(start: NaiveDate) -> PropertyDraft {
        PropertyDraft {
            name: "Loft".to_string(),
            address: "8 Canal St".to_string(),
            tenant_name: "Ines".to_string(),
            tenant_email: Some("ines@example.com".to_string()),
            monthly_rent: 1200,
            start_date: start,
            notes: None,
        }
    }

    fn setup() -> (Portfolio, User, User, User) {
        let mut portfolio = Portfolio::new();
        let admin = portfolio
            .register_user("admin@example.com", "h".to_string(), Role::Admin)
            .expect("admin");
        let alice = portfolio
            .register_user("alice@example.com", "h".to_string(), Role::Owner)
            .expect("alice");
        let bob = portfolio
            .register_user("bob@example.com", "h".to_string(), Role::Owner)
            .expect("bob");
        (portfolio, admin, alice, bob)
    }

    #[test]
    fn create_validates_draft() {
        let (mut portfolio, _, alice, _) = setup();
        let mut bad = draft(d(2025, 1, 1));
        bad.monthly_rent = 0;
        assert!(matches!(
            portfolio.create_property(&alice, bad),
            Err(RentwiseError::InvalidRent)
        ));
    }

    #[test]
    fn owners_only_see_their_own() {
        let (mut portfolio, admin, alice, bob) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");
        portfolio.create_property(&bob, draft(d(2025, 1, 1))).expect("create");

        assert_eq!(portfolio.visible_properties(&alice).expect("list").len(), 1);
        assert_eq!(portfolio.visible_properties(&admin).expect("list").len(), 2);
        assert!(matches!(
            portfolio.property(&bob, p.id),
            Err(RentwiseError::PropertyNotFound(_))
        ));
        assert!(matches!(
            portfolio.record_payment(&bob, p.id, 1, d(2025, 1, 2)),
            Err(RentwiseError::PropertyNotFound(_))
        ));
        assert!(portfolio.property(&admin, p.id).is_ok());
    }

    #[test]
    fn payment_months_must_be_positive_and_bounded() {
        let (mut portfolio, _, alice, _) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");

        for bad in [0, -3, i64::from(MAX_MONTHS_PER_PAYMENT) + 1] {
            assert!(matches!(
                portfolio.record_payment(&alice, p.id, bad, d(2025, 1, 2)),
                Err(RentwiseError::InvalidCount(m)) if m == bad
            ));
        }
        let (updated, payment) = portfolio
            .record_payment(&alice, p.id, 2, d(2025, 1, 2))
            .expect("pay");
        assert_eq!(updated.months_paid, 2);
        assert_eq!(payment.amount, 2400);
    }

    #[test]
    fn payment_moves_status_forward() {
        let (mut portfolio, _, alice, _) = setup();
        let clock = FixedClock::on(d(2025, 1, 28));
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");

        let before = portfolio.lease_view(&alice, p.id, clock.today()).expect("view");
        assert_eq!(before.snapshot.status, LeaseStatus::Late);

        portfolio.record_payment(&alice, p.id, 1, clock.today()).expect("pay");
        let after = portfolio.lease_view(&alice, p.id, clock.today()).expect("view");
        assert_eq!(after.snapshot.coverage_end_date, d(2025, 2, 1));
        assert_eq!(after.snapshot.status, LeaseStatus::SoonDue);
    }

    #[test]
    fn dashboard_uses_configured_threshold() {
        let (mut portfolio, admin, alice, _) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");
        portfolio.record_payment(&alice, p.id, 1, d(2025, 1, 1)).expect("pay");

        let as_of = d(2025, 1, 10); // 22 days left
        assert_eq!(portfolio.dashboard(&admin, as_of).expect("stats").up_to_date, 1);

        portfolio
            .update_settings(ReminderConfig {
                threshold_days: 30,
                enabled: true,
            })
            .expect("settings");
        assert_eq!(portfolio.dashboard(&admin, as_of).expect("stats").soon_due, 1);
    }

    #[test]
    fn reminders_deduplicated_per_day() {
        let (mut portfolio, _, alice, _) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");
        portfolio.record_payment(&alice, p.id, 1, d(2025, 1, 1)).expect("pay");

        let as_of = d(2025, 1, 28);
        assert_eq!(portfolio.plan_reminders(as_of).expect("plan").due.len(), 1);

        portfolio.mark_reminded(p.id, as_of).expect("mark");
        let plan = portfolio.plan_reminders(as_of).expect("plan");
        assert!(plan.due.is_empty());
        assert_eq!(plan.already_sent, 1);

        // A new day makes the lease eligible again.
        assert_eq!(portfolio.plan_reminders(d(2025, 1, 29)).expect("plan").due.len(), 1);
    }

    /// Ledger holding one lease whose coverage end date is not representable.
    fn ledger_with_overflowing_lease() -> (Portfolio, User, PropertyId) {
        let mut store = MemoryStore::new();
        let admin = store
            .insert_user(NewUser {
                email: "admin@example.com".to_string(),
                password_hash: "h".to_string(),
                role: Role::Admin,
            })
            .expect("admin");
        let broken = store
            .insert_property(admin.id, draft(d(2025, 1, 1)))
            .expect("insert");
        store
            .record_payment(broken.id, u32::MAX - 1, d(2025, 1, 1))
            .expect("pay")
            .expect("present");
        (Portfolio::with_store(store), admin, broken.id)
    }

    #[test]
    fn uncomputable_lease_does_not_hide_the_others() {
        let (mut portfolio, admin, broken) = ledger_with_overflowing_lease();
        let good = portfolio.create_property(&admin, draft(d(2025, 1, 1))).expect("create");
        portfolio.record_payment(&admin, good.id, 1, d(2025, 1, 1)).expect("pay");

        let as_of = d(2025, 1, 28);
        let book = portfolio.lease_views(&admin, as_of).expect("views");
        assert_eq!(book.views.len(), 1);
        assert_eq!(book.views[0].property.id, good.id);
        assert_eq!(book.failures.len(), 1);
        assert_eq!(book.failures[0].0, broken);

        let stats = portfolio.dashboard(&admin, as_of).expect("stats");
        assert_eq!(stats.total_properties, 2);
        assert_eq!(stats.soon_due, 1);
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn payment_past_date_range_writes_nothing() {
        let (mut portfolio, admin, broken) = ledger_with_overflowing_lease();

        assert!(matches!(
            portfolio.record_payment(&admin, broken, 1, d(2025, 1, 2)),
            Err(RentwiseError::InvalidDate(_))
        ));
        assert_eq!(portfolio.payments(&admin, broken).expect("payments").len(), 1);
        assert_eq!(
            portfolio.property(&admin, broken).expect("get").months_paid,
            u32::MAX - 1
        );
    }

    #[test]
    fn update_past_date_range_writes_nothing() {
        let (mut portfolio, admin, broken) = ledger_with_overflowing_lease();

        let mut moved = draft(d(2030, 6, 1));
        moved.tenant_name = "Someone else".to_string();
        assert!(matches!(
            portfolio.update_property(&admin, broken, moved),
            Err(RentwiseError::InvalidDate(_))
        ));

        let stored = portfolio.property(&admin, broken).expect("get");
        assert_eq!(stored.start_date, d(2025, 1, 1));
        assert_eq!(stored.tenant_name, "Ines");
    }

    #[test]
    fn update_does_not_touch_months_paid() {
        let (mut portfolio, _, alice, _) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");
        portfolio.record_payment(&alice, p.id, 3, d(2025, 1, 1)).expect("pay");

        let mut changed = draft(d(2025, 1, 1));
        changed.tenant_name = "Ines B.".to_string();
        let updated = portfolio.update_property(&alice, p.id, changed).expect("update");
        assert_eq!(updated.months_paid, 3);
        assert_eq!(updated.tenant_name, "Ines B.");
    }

    #[test]
    fn delete_then_missing() {
        let (mut portfolio, _, alice, _) = setup();
        let p = portfolio.create_property(&alice, draft(d(2025, 1, 1))).expect("create");
        portfolio.delete_property(&alice, p.id).expect("delete");
        assert!(matches!(
            portfolio.delete_property(&alice, p.id),
            Err(RentwiseError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn activity_page_is_bounded() {
        let (mut portfolio, admin, _, _) = setup();
        let clock = FixedClock::on(d(2025, 1, 1));
        portfolio
            .record_activity(
                NewActivity::new(clock.now(), ActivityKind::Login, "login").by(admin.id),
            )
            .expect("activity");
        let recent = portfolio.recent_activity(usize::MAX).expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].user_id, Some(admin.id));
    }

    #[test]
    fn invalid_user_email_rejected() {
        let mut portfolio = Portfolio::new();
        assert!(
            portfolio
                .register_user("nobody", "h".to_string(), Role::Owner)
                .is_err()
        );
        assert!(matches!(
            portfolio.user(UserId(7)),
            Err(RentwiseError::UserNotFound(_))
        ));
    }
}
