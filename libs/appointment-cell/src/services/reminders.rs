// libs/appointment-cell/src/services/reminders.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::clock::PracticeClock;
use crate::models::{
    Appointment, AppointmentChanges, AppointmentError, ReminderJob, ReminderKind, ReminderState,
};
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::store::{AppointmentStore, ReminderStore};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A processing row older than this is assumed orphaned and released.
pub const CLAIM_LEASE_MINUTES: i64 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledReminders {
    pub day_before: Option<Uuid>,
    pub fifteen_minute: Option<Uuid>,
}

impl ScheduledReminders {
    pub fn count(&self) -> usize {
        self.day_before.iter().count() + self.fifteen_minute.iter().count()
    }
}

/// Persists the day-before and fifteen-minute reminders of an appointment.
pub struct ReminderScheduler {
    reminders: Arc<dyn ReminderStore>,
    appointments: Arc<dyn AppointmentStore>,
    clock: PracticeClock,
}

impl ReminderScheduler {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        appointments: Arc<dyn AppointmentStore>,
        clock: PracticeClock,
    ) -> Self {
        Self { reminders, appointments, clock }
    }

    /// Reminders whose instant is already past are skipped, not fired late.
    pub async fn schedule(
        &self,
        appointment: &Appointment,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReminders, AppointmentError> {
        let start = self.clock.slot_instant(&appointment.slot()?);

        let jobs: Vec<ReminderJob> = ReminderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let due_at = start - kind.lead_time();
                if due_at > now {
                    Some(ReminderJob::new(appointment, kind, due_at, now))
                } else {
                    debug!("{:?} reminder for {} already past, skipping", kind, appointment.id);
                    None
                }
            })
            .collect();

        let mut scheduled = ScheduledReminders::default();
        if jobs.is_empty() {
            return Ok(scheduled);
        }

        self.reminders.insert_reminders(&jobs).await?;

        for job in &jobs {
            match job.kind {
                ReminderKind::DayBefore => scheduled.day_before = Some(job.id),
                ReminderKind::FifteenMinute => scheduled.fifteen_minute = Some(job.id),
            }
        }

        let mut changes = AppointmentChanges::at(now);
        changes.day_before_job_id = scheduled.day_before;
        changes.fifteen_minute_job_id = scheduled.fifteen_minute;
        self.appointments.apply(appointment.id, &changes).await?;

        info!("Scheduled {} reminder(s) for appointment {}", scheduled.count(), appointment.id);
        Ok(scheduled)
    }

    /// Pending reminders of the appointment will never fire.
    pub async fn supersede(&self, appointment_id: Uuid, now: DateTime<Utc>) -> Result<usize, AppointmentError> {
        let skipped = self.reminders.supersede_reminders(appointment_id, now).await?;
        if skipped > 0 {
            debug!("Superseded {} reminder(s) for appointment {}", skipped, appointment_id);
        }
        Ok(skipped)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderRunSummary {
    pub claimed: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Polls for due reminders and hands them to the dispatcher. Because the
/// reminders are rows, whatever was pending before a restart is picked up
/// on the first poll, and rows a dead worker left in processing are released
/// once their claim lease runs out.
pub struct ReminderWorker {
    reminders: Arc<dyn ReminderStore>,
    appointments: Arc<dyn AppointmentStore>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: PracticeClock,
    poll_interval: Duration,
    batch_size: usize,
    claim_lease: chrono::Duration,
    shutdown: watch::Sender<bool>,
}

impl ReminderWorker {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        appointments: Arc<dyn AppointmentStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: PracticeClock,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            reminders,
            appointments,
            dispatcher,
            clock,
            poll_interval,
            batch_size: DEFAULT_BATCH_SIZE,
            claim_lease: chrono::Duration::minutes(CLAIM_LEASE_MINUTES),
            shutdown,
        }
    }

    /// Runs until `shutdown` is called. A poll in flight finishes first, so
    /// no claimed reminder is abandoned mid-delivery.
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();
        info!("Reminder worker started, polling every {:?}", self.poll_interval);

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.process_due(Utc::now()).await {
                Ok(summary) if summary.claimed > 0 => {
                    info!(
                        "Reminder run: {} sent, {} skipped, {} failed",
                        summary.sent, summary.skipped, summary.failed
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Reminder poll failed: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        info!("Reminder worker stopped");
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    #[instrument(skip(self))]
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<ReminderRunSummary, AppointmentError> {
        match self.reminders.release_stale_claims(now - self.claim_lease).await {
            Ok(0) => {}
            Ok(released) => warn!("Released {} reminder(s) left in processing", released),
            Err(e) => warn!("Could not release stale reminder claims: {}", e),
        }

        let due = self.reminders.due_reminders(now, self.batch_size).await?;
        let mut summary = ReminderRunSummary::default();

        for job in due {
            match self.reminders.claim_reminder(job.id, now).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("Could not claim reminder {}: {}", job.id, e);
                    continue;
                }
            }
            summary.claimed += 1;

            let (state, reason) = self.deliver(&job, now).await;
            match state {
                ReminderState::Sent => summary.sent += 1,
                ReminderState::Skipped => summary.skipped += 1,
                _ => summary.failed += 1,
            }

            if let Err(e) = self.reminders.complete_reminder(job.id, state, reason, Utc::now()).await {
                error!("Failed to mark reminder {} {}: {}", job.id, state.as_str(), e);
            }
        }

        Ok(summary)
    }

    #[instrument(skip(self, job), fields(reminder_id = %job.id, appointment_id = %job.appointment_id))]
    async fn deliver(&self, job: &ReminderJob, now: DateTime<Utc>) -> (ReminderState, Option<String>) {
        let appointment = match self.appointments.get_by_id(job.appointment_id).await {
            Ok(Some(appointment)) => appointment,
            Ok(None) => return (ReminderState::Skipped, Some("appointment no longer exists".to_string())),
            Err(e) => return (ReminderState::Failed, Some(e.to_string())),
        };

        if !appointment.status.is_upcoming() {
            debug!("Appointment is {}, not sending reminder", appointment.status);
            return (ReminderState::Skipped, Some(format!("appointment is {}", appointment.status)));
        }

        if appointment.appointment_date != job.slot_date || appointment.appointment_time != job.slot_time {
            return (ReminderState::Skipped, Some("appointment moved to another slot".to_string()));
        }

        let start = match appointment.slot() {
            Ok(slot) => self.clock.slot_instant(&slot),
            Err(e) => return (ReminderState::Failed, Some(e.to_string())),
        };

        // A day-before reminder picked up after the fifteen-minute mark would
        // arrive out of order with the "starting soon" one.
        let expires_at = match job.kind {
            ReminderKind::DayBefore => start - ReminderKind::FifteenMinute.lead_time(),
            ReminderKind::FifteenMinute => start,
        };
        if now >= expires_at {
            debug!("Reminder expired at {}, not sending", expires_at);
            return (ReminderState::Skipped, Some("expired".to_string()));
        }

        // A released claim whose worker died after sending but before completing.
        let previous = appointment.notifications.get(job.kind.notification_kind());
        if previous.sent && previous.sent_at.is_some_and(|at| at >= job.created_at) {
            return (ReminderState::Sent, Some("already sent".to_string()));
        }

        let record = self.dispatcher.dispatch(&appointment, job.kind.notification_kind()).await;
        if record.sent {
            (ReminderState::Sent, None)
        } else {
            (ReminderState::Failed, record.failure_reason)
        }
    }
}
