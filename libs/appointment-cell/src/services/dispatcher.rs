// libs/appointment-cell/src/services/dispatcher.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use notification_cell::{render_email, EmailContext, Mailer, NotificationError, NotificationKind};

use crate::models::{Appointment, NotificationRecord};
use crate::services::store::AppointmentStore;
use crate::validation::is_valid_email;

/// Renders, sends and records one notification. Never returns an error:
/// the outcome lands in the appointment's notification tracking.
pub struct NotificationDispatcher {
    store: Arc<dyn AppointmentStore>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn AppointmentStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    fn context(appointment: &Appointment) -> EmailContext {
        EmailContext {
            client_name: appointment.client_name.clone(),
            client_email: appointment.client_email.clone(),
            appointment_date: appointment.appointment_date.clone(),
            appointment_time: appointment.appointment_time.clone(),
            appointment_type: appointment.appointment_type.to_string(),
            duration_minutes: appointment.duration,
            meeting_type: Some(appointment.meeting_type.to_string()),
            meeting_join_url: appointment.meeting_join_url.clone(),
            case_title: appointment.case_title.clone(),
            notes: appointment.notes.clone(),
        }
    }

    async fn send(&self, appointment: &Appointment, kind: NotificationKind) -> Result<(), NotificationError> {
        let recipient = appointment.client_email.trim();
        if recipient.is_empty() {
            return Err(NotificationError::MissingRecipient);
        }
        if !is_valid_email(recipient) {
            return Err(NotificationError::InvalidAddress(recipient.to_string()));
        }

        let email = render_email(kind, &Self::context(appointment));
        self.mailer.send(&email).await
    }

    pub async fn dispatch(&self, appointment: &Appointment, kind: NotificationKind) -> NotificationRecord {
        let record = match self.send(appointment, kind).await {
            Ok(()) => {
                info!("Sent {} notification for appointment {}", kind, appointment.id);
                NotificationRecord::sent_at(Utc::now())
            }
            Err(e) => {
                warn!("{} notification for appointment {} not sent: {}", kind, appointment.id, e);
                NotificationRecord::failed(e.to_string())
            }
        };

        if let Err(e) = self.store.record_notification(appointment.id, kind, &record).await {
            error!("Failed to record {} notification for {}: {}", kind, appointment.id, e);
        }

        record
    }
}
