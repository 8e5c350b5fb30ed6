// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use notification_cell::NotificationKind;

use crate::models::{
    Appointment, AppointmentChanges, AppointmentFilter, NotificationRecord, ReminderJob, ReminderState,
    Slot, StoreError,
};

/// Persistence for appointments. Every write that moves or creates a slot is
/// insert-or-conflict: a second non-cancelled appointment of the same
/// attorney on the same date and time yields `StoreError::SlotConflict`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;

    /// Owner-scoped fetch; an appointment of another attorney is `None`.
    async fn get(&self, attorney_id: &str, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Fetch by id alone, for the reminder worker.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Sorted by date, then time.
    async fn list_for_attorney(
        &self,
        attorney_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn find_active_in_slot(
        &self,
        attorney_id: &str,
        slot: &Slot,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// `None` when the appointment does not exist.
    async fn apply(&self, id: Uuid, changes: &AppointmentChanges) -> Result<Option<Appointment>, StoreError>;

    async fn record_notification(
        &self,
        id: Uuid,
        kind: NotificationKind,
        record: &NotificationRecord,
    ) -> Result<(), StoreError>;
}

/// Persisted due reminders.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn insert_reminders(&self, jobs: &[ReminderJob]) -> Result<(), StoreError>;

    /// Pending reminders with `due_at <= now`, oldest first.
    async fn due_reminders(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ReminderJob>, StoreError>;

    /// Move a reminder from pending to processing, stamping `claimed_at`.
    /// `false` when another worker got there first.
    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Return processing rows claimed before `claimed_before` to pending.
    /// Their worker died between claim and completion. Returns how many.
    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn complete_reminder(
        &self,
        id: Uuid,
        state: ReminderState,
        failure_reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Mark every pending reminder of the appointment skipped. Returns how many.
    async fn supersede_reminders(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError>;

    async fn reminders_for(&self, appointment_id: Uuid) -> Result<Vec<ReminderJob>, StoreError>;
}
