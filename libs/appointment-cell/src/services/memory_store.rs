// libs/appointment-cell/src/services/memory_store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use notification_cell::NotificationKind;

use crate::models::{
    Appointment, AppointmentChanges, AppointmentFilter, NotificationRecord, ReminderJob, ReminderState,
    Slot, StoreError,
};
use crate::services::store::{AppointmentStore, ReminderStore};

/// Process-local store, used when no database is configured and in tests.
/// The slot check and the write happen under one write lock.
#[derive(Default)]
pub struct InMemoryStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    reminders: RwLock<HashMap<Uuid, ReminderJob>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_taken(
        appointments: &HashMap<Uuid, Appointment>,
        attorney_id: &str,
        date: &str,
        time: &str,
        exclude: Option<Uuid>,
    ) -> bool {
        appointments.values().any(|existing| {
            Some(existing.id) != exclude
                && existing.occupies_slot()
                && existing.attorney_id == attorney_id
                && existing.appointment_date == date
                && existing.appointment_time == time
        })
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.write().await;
        if appointment.occupies_slot()
            && Self::slot_taken(
                &appointments,
                &appointment.attorney_id,
                &appointment.appointment_date,
                &appointment.appointment_time,
                None,
            )
        {
            return Err(StoreError::SlotConflict);
        }
        appointments.insert(appointment.id, appointment.clone());
        debug!("Stored appointment {} in memory", appointment.id);
        Ok(appointment.clone())
    }

    async fn get(&self, attorney_id: &str, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        Ok(appointments.get(&id).filter(|a| a.attorney_id == attorney_id).cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list_for_attorney(
        &self,
        attorney_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        let mut matching: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.attorney_id == attorney_id && filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (a.appointment_date.as_str(), a.appointment_time.as_str())
                .cmp(&(b.appointment_date.as_str(), b.appointment_time.as_str()))
        });
        Ok(matching)
    }

    async fn find_active_in_slot(
        &self,
        attorney_id: &str,
        slot: &Slot,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError> {
        let date = slot.date_string();
        let time = slot.time_string();
        let appointments = self.appointments.read().await;
        Ok(appointments
            .values()
            .find(|a| {
                Some(a.id) != exclude
                    && a.occupies_slot()
                    && a.attorney_id == attorney_id
                    && a.appointment_date == date
                    && a.appointment_time == time
            })
            .cloned())
    }

    async fn apply(&self, id: Uuid, changes: &AppointmentChanges) -> Result<Option<Appointment>, StoreError> {
        let mut appointments = self.appointments.write().await;
        let Some(current) = appointments.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        updated.apply_changes(changes);

        if updated.occupies_slot()
            && (changes.touches_slot() || !current.occupies_slot())
            && Self::slot_taken(
                &appointments,
                &updated.attorney_id,
                &updated.appointment_date,
                &updated.appointment_time,
                Some(id),
            )
        {
            return Err(StoreError::SlotConflict);
        }

        appointments.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn record_notification(
        &self,
        id: Uuid,
        kind: NotificationKind,
        record: &NotificationRecord,
    ) -> Result<(), StoreError> {
        if let Some(appointment) = self.appointments.write().await.get_mut(&id) {
            appointment.notifications.set(kind, record.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn insert_reminders(&self, jobs: &[ReminderJob]) -> Result<(), StoreError> {
        let mut reminders = self.reminders.write().await;
        for job in jobs {
            reminders.insert(job.id, job.clone());
        }
        Ok(())
    }

    async fn due_reminders(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ReminderJob>, StoreError> {
        let reminders = self.reminders.read().await;
        let mut due: Vec<ReminderJob> = reminders
            .values()
            .filter(|job| job.state == ReminderState::Pending && job.due_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|job| job.due_at);
        due.truncate(limit);
        Ok(due)
    }

    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut reminders = self.reminders.write().await;
        match reminders.get_mut(&id) {
            Some(job) if job.state == ReminderState::Pending => {
                job.state = ReminderState::Processing;
                job.claimed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut reminders = self.reminders.write().await;
        let mut count = 0;
        for job in reminders.values_mut() {
            if job.state == ReminderState::Processing && job.claimed_at.is_some_and(|at| at < claimed_before) {
                job.state = ReminderState::Pending;
                job.claimed_at = None;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn complete_reminder(
        &self,
        id: Uuid,
        state: ReminderState,
        failure_reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(job) = self.reminders.write().await.get_mut(&id) {
            job.state = state;
            job.failure_reason = failure_reason;
            job.processed_at = Some(at);
        }
        Ok(())
    }

    async fn supersede_reminders(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut reminders = self.reminders.write().await;
        let mut count = 0;
        for job in reminders.values_mut() {
            if job.appointment_id == appointment_id && job.state == ReminderState::Pending {
                job.state = ReminderState::Skipped;
                job.failure_reason = Some("superseded".to_string());
                job.processed_at = Some(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn reminders_for(&self, appointment_id: Uuid) -> Result<Vec<ReminderJob>, StoreError> {
        let reminders = self.reminders.read().await;
        let mut jobs: Vec<ReminderJob> = reminders
            .values()
            .filter(|job| job.appointment_id == appointment_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|job| (job.created_at, job.due_at));
        Ok(jobs)
    }
}
