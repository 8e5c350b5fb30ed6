// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use meeting_cell::{MeetingLinkGenerator, MeetingRequest};
use notification_cell::{mailer_from_config, Mailer, NotificationKind};
use shared_config::AppConfig;

use crate::clock::PracticeClock;
use crate::models::{
    Appointment, AppointmentChanges, AppointmentError, AppointmentFilter, AppointmentListQuery,
    AppointmentStats, AppointmentStatus, AppointmentType, CreateAppointmentRequest, CreatedAppointment,
    NotificationOutcome, NotificationTracking, RescheduleRequest, ScheduledJobs, Slot,
    UpdateAppointmentRequest, DATE_FORMAT,
};
use crate::services::availability::AvailabilityChecker;
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::lifecycle::{AppointmentLifecycleService, Transition};
use crate::services::memory_store::InMemoryStore;
use crate::services::reminders::{ReminderScheduler, ReminderWorker};
use crate::services::store::{AppointmentStore, ReminderStore};
use crate::services::supabase_store::SupabaseStore;
use crate::validation::{
    is_valid_date, is_valid_time, validate_create, validate_reschedule, validate_update,
};

pub const DEFAULT_UPCOMING_DAYS: i64 = 7;
pub const MAX_UPCOMING_DAYS: i64 = 90;

pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    reminder_store: Arc<dyn ReminderStore>,
    availability: AvailabilityChecker,
    lifecycle: AppointmentLifecycleService,
    meetings: MeetingLinkGenerator,
    dispatcher: Arc<NotificationDispatcher>,
    scheduler: ReminderScheduler,
    clock: PracticeClock,
    poll_interval: Duration,
}

impl AppointmentBookingService {
    /// Supabase store when the database is configured, otherwise an
    /// in-memory store that is lost on restart.
    pub fn from_config(config: &AppConfig) -> Self {
        let mailer = mailer_from_config(config);
        if config.is_database_configured() {
            Self::with_store(config, Arc::new(SupabaseStore::new(config)), mailer)
        } else {
            warn!("Database not configured, appointments are kept in memory only");
            Self::with_store(config, Arc::new(InMemoryStore::new()), mailer)
        }
    }

    pub fn with_store<S>(config: &AppConfig, store: Arc<S>, mailer: Arc<dyn Mailer>) -> Self
    where
        S: AppointmentStore + ReminderStore + 'static,
    {
        let appointments: Arc<dyn AppointmentStore> = store.clone();
        let reminders: Arc<dyn ReminderStore> = store;
        let clock = PracticeClock::new(config);
        let dispatcher = Arc::new(NotificationDispatcher::new(Arc::clone(&appointments), mailer));

        Self {
            availability: AvailabilityChecker::new(Arc::clone(&appointments)),
            lifecycle: AppointmentLifecycleService::new(),
            meetings: MeetingLinkGenerator::new(config),
            scheduler: ReminderScheduler::new(Arc::clone(&reminders), Arc::clone(&appointments), clock),
            dispatcher,
            store: appointments,
            reminder_store: reminders,
            clock,
            poll_interval: Duration::from_secs(config.reminder_poll_interval_seconds.max(1)),
        }
    }

    pub fn clock(&self) -> PracticeClock {
        self.clock
    }

    /// A worker sharing this service's stores and dispatcher.
    pub fn reminder_worker(&self) -> ReminderWorker {
        ReminderWorker::new(
            Arc::clone(&self.reminder_store),
            Arc::clone(&self.store),
            Arc::clone(&self.dispatcher),
            self.clock,
            self.poll_interval,
        )
    }

    pub async fn create(
        &self,
        attorney_id: &str,
        organizer_email: Option<&str>,
        request: CreateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<CreatedAppointment, AppointmentError> {
        let new = validate_create(&request, &self.clock, now)?;
        debug!("Booking {} for attorney {} at {:?}", new.appointment_type, attorney_id, new.slot);

        if !self.availability.is_slot_available(attorney_id, &new.slot, None).await? {
            return Err(AppointmentError::SlotUnavailable);
        }

        let id = Uuid::new_v4();
        let meeting_request = MeetingRequest {
            reference: id.to_string(),
            summary: format!("{} with {}", new.appointment_type, new.client_name),
            description: new
                .case_title
                .clone()
                .or_else(|| new.notes.clone())
                .unwrap_or_else(|| format!("{} appointment", new.appointment_type)),
            organizer_email: organizer_email.map(str::to_string),
            attendee_email: new.client_email.clone(),
            start: self.clock.local_start(&new.slot),
            duration_minutes: i64::from(new.duration),
        };
        let meeting_link = self.meetings.generate(new.meeting_type, &meeting_request).await;

        let mut appointment = Appointment {
            id,
            attorney_id: attorney_id.to_string(),
            client_name: new.client_name,
            client_email: new.client_email,
            client_phone: new.client_phone,
            client_push_token: new.client_push_token,
            case_id: new.case_id,
            case_title: new.case_title,
            appointment_date: new.slot.date_string(),
            appointment_time: new.slot.time_string(),
            duration: new.duration,
            appointment_type: new.appointment_type,
            status: AppointmentStatus::Scheduled,
            notes: new.notes,
            meeting_type: new.meeting_type,
            meeting_join_url: None,
            meeting_start_url: None,
            meeting_id: None,
            meeting_password: None,
            notifications: NotificationTracking::default(),
            scheduled_jobs: ScheduledJobs::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        appointment.apply_meeting_link(&meeting_link);

        let mut appointment = self.store.insert(&appointment).await?;
        info!("Created appointment {} for attorney {}", appointment.id, attorney_id);

        let confirmation = self.dispatcher.dispatch(&appointment, NotificationKind::Confirmation).await;
        let confirmation_sent = confirmation.sent;
        appointment.notifications.confirmation = confirmation;

        let reminders_scheduled = self.schedule_reminders(&mut appointment, now).await;

        Ok(CreatedAppointment {
            appointment,
            meeting_link,
            notifications: NotificationOutcome {
                confirmation_sent,
                reminders_scheduled,
            },
        })
    }

    /// Best-effort; failures are logged and reported as `false`.
    async fn schedule_reminders(&self, appointment: &mut Appointment, now: DateTime<Utc>) -> bool {
        match self.scheduler.schedule(appointment, now).await {
            Ok(scheduled) => {
                appointment.scheduled_jobs = ScheduledJobs {
                    day_before: scheduled.day_before,
                    fifteen_minute: scheduled.fifteen_minute,
                };
                scheduled.count() > 0
            }
            Err(e) => {
                warn!("Reminders for appointment {} not scheduled: {}", appointment.id, e);
                false
            }
        }
    }

    async fn supersede_reminders(&self, appointment_id: Uuid, now: DateTime<Utc>) {
        if let Err(e) = self.scheduler.supersede(appointment_id, now).await {
            warn!("Pending reminders of {} not superseded: {}", appointment_id, e);
        }
    }

    pub async fn get(&self, attorney_id: &str, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(attorney_id, id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list(
        &self,
        attorney_id: &str,
        query: &AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filter = AppointmentFilter::default();

        if let Some(raw) = query.status.as_deref().or(query.priority.as_deref()) {
            if !raw.trim().is_empty() {
                filter.statuses = raw
                    .split(',')
                    .map(|s| s.trim().parse::<AppointmentStatus>())
                    .collect::<Result<_, _>>()?;
            }
        }

        if let Some(date) = query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            if !is_valid_date(date) {
                return Err(AppointmentError::Validation(format!(
                    "Invalid date '{}'. Expected YYYY-MM-DD",
                    date
                )));
            }
            filter.date_from = Some(date.to_string());
            filter.date_to = Some(date.to_string());
        }

        if let Some(kind) = query.appointment_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filter.appointment_type = Some(kind.parse::<AppointmentType>()?);
        }

        Ok(self.store.list_for_attorney(attorney_id, &filter).await?)
    }

    pub async fn today(&self, attorney_id: &str, now: DateTime<Utc>) -> Result<Vec<Appointment>, AppointmentError> {
        let today = self.clock.today(now).format(DATE_FORMAT).to_string();
        Ok(self
            .store
            .list_for_attorney(attorney_id, &AppointmentFilter::on_date(&today))
            .await?)
    }

    pub async fn upcoming(
        &self,
        attorney_id: &str,
        days: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let days = match days.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|d| (1..=MAX_UPCOMING_DAYS).contains(d))
                .ok_or_else(|| {
                    AppointmentError::Validation(format!("days must be between 1 and {}", MAX_UPCOMING_DAYS))
                })?,
            None => DEFAULT_UPCOMING_DAYS,
        };

        let today = self.clock.today(now);
        let filter = AppointmentFilter {
            statuses: vec![AppointmentStatus::Scheduled, AppointmentStatus::Rescheduled],
            date_from: Some(today.format(DATE_FORMAT).to_string()),
            date_to: Some((today + chrono::Duration::days(days)).format(DATE_FORMAT).to_string()),
            appointment_type: None,
        };

        Ok(self.store.list_for_attorney(attorney_id, &filter).await?)
    }

    pub async fn update(
        &self,
        attorney_id: &str,
        id: Uuid,
        request: UpdateAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let patch = validate_update(&request)?;
        let existing = self.get(attorney_id, id).await?;

        if patch.is_empty() {
            debug!("Empty update for appointment {}", id);
            return Ok(existing);
        }

        let mut changes = AppointmentChanges::at(now);
        changes.client_name = patch.client_name;
        changes.client_email = patch.client_email;
        changes.client_phone = patch.client_phone;
        changes.client_push_token = patch.client_push_token;
        changes.case_id = patch.case_id;
        changes.case_title = patch.case_title;
        changes.appointment_type = patch.appointment_type;
        changes.duration = patch.duration;
        changes.notes = patch.notes;

        if let Some(meeting_type) = patch.meeting_type.filter(|t| *t != existing.meeting_type) {
            let request = MeetingRequest {
                reference: format!("{}-{}", existing.id, now.timestamp()),
                summary: format!(
                    "{} with {}",
                    changes.appointment_type.unwrap_or(existing.appointment_type),
                    changes.client_name.as_deref().unwrap_or(&existing.client_name)
                ),
                description: existing
                    .case_title
                    .clone()
                    .unwrap_or_else(|| format!("{} appointment", existing.appointment_type)),
                organizer_email: None,
                attendee_email: changes.client_email.clone().unwrap_or_else(|| existing.client_email.clone()),
                start: self.clock.local_start(&existing.slot()?),
                duration_minutes: i64::from(changes.duration.unwrap_or(existing.duration)),
            };
            let link = self.meetings.generate(meeting_type, &request).await;
            info!("Meeting type of {} changed to {}", id, meeting_type);
            changes = changes.with_meeting_link(&link);
        }

        self.store
            .apply(id, &changes)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn update_status(
        &self,
        attorney_id: &str,
        id: Uuid,
        status: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let raw = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppointmentError::Validation("status is required".to_string()))?;
        let target: AppointmentStatus = raw.parse()?;

        let existing = self.get(attorney_id, id).await?;
        if self.lifecycle.validate_status_transition(existing.status, target)? == Transition::Unchanged {
            debug!("Appointment {} already {}", id, target);
            return Ok(existing);
        }

        let mut changes = AppointmentChanges::at(now);
        changes.status = Some(target);
        if target == AppointmentStatus::Completed && existing.completed_at.is_none() {
            changes.completed_at = Some(now);
        }

        let mut updated = self
            .store
            .apply(id, &changes)
            .await?
            .ok_or(AppointmentError::NotFound)?;
        info!("Appointment {} moved from {} to {}", id, existing.status, target);

        if target.is_terminal() {
            self.supersede_reminders(id, now).await;
        }
        if target == AppointmentStatus::Completed {
            updated.notifications.completion = self.dispatcher.dispatch(&updated, NotificationKind::Completion).await;
        }

        Ok(updated)
    }

    /// Soft delete: the record stays with status Cancelled.
    pub async fn cancel(&self, attorney_id: &str, id: Uuid, now: DateTime<Utc>) -> Result<Appointment, AppointmentError> {
        let existing = self.get(attorney_id, id).await?;
        if existing.status == AppointmentStatus::Cancelled {
            return Ok(existing);
        }
        self.lifecycle.ensure_upcoming(existing.status, AppointmentStatus::Cancelled)?;

        let mut changes = AppointmentChanges::at(now);
        changes.status = Some(AppointmentStatus::Cancelled);

        let updated = self
            .store
            .apply(id, &changes)
            .await?
            .ok_or(AppointmentError::NotFound)?;
        self.supersede_reminders(id, now).await;

        info!("Cancelled appointment {}", id);
        Ok(updated)
    }

    /// Moves the appointment in place; the previous slot is not kept.
    pub async fn reschedule(
        &self,
        attorney_id: &str,
        id: Uuid,
        request: RescheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let slot = validate_reschedule(&request, &self.clock, now)?;
        let existing = self.get(attorney_id, id).await?;
        self.lifecycle.ensure_upcoming(existing.status, AppointmentStatus::Rescheduled)?;

        if !self.availability.is_slot_available(attorney_id, &slot, Some(id)).await? {
            return Err(AppointmentError::SlotUnavailable);
        }

        let mut changes = AppointmentChanges::at(now);
        changes.appointment_date = Some(slot.date_string());
        changes.appointment_time = Some(slot.time_string());
        changes.status = Some(AppointmentStatus::Rescheduled);

        let mut updated = self
            .store
            .apply(id, &changes)
            .await?
            .ok_or(AppointmentError::NotFound)?;
        info!(
            "Rescheduled appointment {} from {} {} to {} {}",
            id, existing.appointment_date, existing.appointment_time, updated.appointment_date, updated.appointment_time
        );

        self.supersede_reminders(id, now).await;
        self.schedule_reminders(&mut updated, now).await;

        Ok(updated)
    }

    pub async fn stats(&self, attorney_id: &str, now: DateTime<Utc>) -> Result<AppointmentStats, AppointmentError> {
        let appointments = self
            .store
            .list_for_attorney(attorney_id, &AppointmentFilter::default())
            .await?;
        let today = self.clock.today(now).format(DATE_FORMAT).to_string();

        let mut stats = AppointmentStats {
            total: appointments.len(),
            ..Default::default()
        };
        for status in AppointmentStatus::ALL {
            stats.by_status.insert(status.as_str().to_string(), 0);
        }
        for kind in AppointmentType::ALL {
            stats.by_type.insert(kind.as_str().to_string(), 0);
        }

        for appointment in &appointments {
            *stats.by_status.entry(appointment.status.as_str().to_string()).or_default() += 1;
            *stats.by_type.entry(appointment.appointment_type.as_str().to_string()).or_default() += 1;

            if appointment.appointment_date == today {
                stats.today += 1;
            }
            match appointment.status {
                AppointmentStatus::Completed => stats.completed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                status if status.is_upcoming() && appointment.appointment_date >= today => stats.upcoming += 1,
                _ => {}
            }
        }

        Ok(stats)
    }

    /// Format-checked, but past slots are allowed: this only reports occupancy.
    pub async fn check_availability(
        &self,
        attorney_id: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<(Slot, bool), AppointmentError> {
        let date = date.map(str::trim).unwrap_or_default();
        let time = time.map(str::trim).unwrap_or_default();

        if !is_valid_date(date) {
            return Err(AppointmentError::Validation(
                "appointmentDate is required in YYYY-MM-DD format".to_string(),
            ));
        }
        if !is_valid_time(time) {
            return Err(AppointmentError::Validation(
                "appointmentTime is required in HH:MM format".to_string(),
            ));
        }

        let slot = Slot::parse(date, time)
            .ok_or_else(|| AppointmentError::Validation(format!("Invalid slot {} {}", date, time)))?;
        let available = self.availability.is_slot_available(attorney_id, &slot, None).await?;
        Ok((slot, available))
    }
}
