// libs/appointment-cell/src/services/supabase_store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use meeting_cell::MeetingType;
use notification_cell::NotificationKind;
use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, AppointmentType,
    NotificationRecord, NotificationTracking, ReminderJob, ReminderState, ScheduledJobs, Slot, StoreError,
};
use crate::services::store::{AppointmentStore, ReminderStore};

const APPOINTMENTS_TABLE: &str = "appointments";
const REMINDERS_TABLE: &str = "appointment_reminders";
const ORDER_BY_SLOT: &str = "order=appointment_date.asc,appointment_time.asc";

/// Nested client object written by older versions of the app.
#[derive(Debug, Clone, Default, Deserialize)]
struct LegacyClient {
    email: Option<String>,
}

/// One row of the `appointments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    attorney_id: String,
    client_name: String,
    #[serde(default)]
    client_email: Option<String>,
    /// Pre-canonical e-mail column.
    #[serde(default, skip_serializing)]
    email: Option<String>,
    #[serde(default, skip_serializing)]
    client: Option<LegacyClient>,
    #[serde(default)]
    client_phone: Option<String>,
    #[serde(default)]
    client_push_token: Option<String>,
    #[serde(default)]
    case_id: Option<String>,
    #[serde(default)]
    case_title: Option<String>,
    appointment_date: String,
    appointment_time: String,
    duration: u32,
    #[serde(default)]
    appointment_type: AppointmentType,
    #[serde(default)]
    status: Option<AppointmentStatus>,
    /// Old name of `status`.
    #[serde(default, skip_serializing)]
    priority: Option<AppointmentStatus>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    meeting_type: MeetingType,
    #[serde(default)]
    meeting_join_url: Option<String>,
    #[serde(default)]
    meeting_start_url: Option<String>,
    #[serde(default)]
    meeting_id: Option<String>,
    #[serde(default)]
    meeting_password: Option<String>,
    #[serde(default)]
    notify_confirmation: Option<NotificationRecord>,
    #[serde(default)]
    notify_day_before: Option<NotificationRecord>,
    #[serde(default)]
    notify_fifteen_minute: Option<NotificationRecord>,
    #[serde(default)]
    notify_completion: Option<NotificationRecord>,
    #[serde(default)]
    day_before_job_id: Option<Uuid>,
    #[serde(default)]
    fifteen_minute_job_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

impl AppointmentRow {
    /// Canonical e-mail first, then the legacy flat column, then the nested client.
    fn resolved_email(&self) -> String {
        [
            self.client_email.as_deref(),
            self.email.as_deref(),
            self.client.as_ref().and_then(|c| c.email.as_deref()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|e| !e.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_default()
    }
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        let client_email = row.resolved_email();
        if row.client_email.as_deref().map_or(true, str::is_empty) && !client_email.is_empty() {
            debug!("Appointment {} read its e-mail from a legacy field", row.id);
        }

        Appointment {
            id: row.id,
            attorney_id: row.attorney_id,
            client_name: row.client_name,
            client_email,
            client_phone: row.client_phone,
            client_push_token: row.client_push_token,
            case_id: row.case_id,
            case_title: row.case_title,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            duration: row.duration,
            appointment_type: row.appointment_type,
            status: row.status.or(row.priority).unwrap_or(AppointmentStatus::Scheduled),
            notes: row.notes,
            meeting_type: row.meeting_type,
            meeting_join_url: row.meeting_join_url,
            meeting_start_url: row.meeting_start_url,
            meeting_id: row.meeting_id,
            meeting_password: row.meeting_password,
            notifications: NotificationTracking {
                confirmation: row.notify_confirmation.unwrap_or_default(),
                day_before: row.notify_day_before.unwrap_or_default(),
                fifteen_minute: row.notify_fifteen_minute.unwrap_or_default(),
                completion: row.notify_completion.unwrap_or_default(),
            },
            scheduled_jobs: ScheduledJobs {
                day_before: row.day_before_job_id,
                fifteen_minute: row.fifteen_minute_job_id,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        }
    }
}

impl From<&Appointment> for AppointmentRow {
    fn from(a: &Appointment) -> Self {
        AppointmentRow {
            id: a.id,
            attorney_id: a.attorney_id.clone(),
            client_name: a.client_name.clone(),
            client_email: Some(a.client_email.clone()),
            email: None,
            client: None,
            client_phone: a.client_phone.clone(),
            client_push_token: a.client_push_token.clone(),
            case_id: a.case_id.clone(),
            case_title: a.case_title.clone(),
            appointment_date: a.appointment_date.clone(),
            appointment_time: a.appointment_time.clone(),
            duration: a.duration,
            appointment_type: a.appointment_type,
            status: Some(a.status),
            priority: None,
            notes: a.notes.clone(),
            meeting_type: a.meeting_type,
            meeting_join_url: a.meeting_join_url.clone(),
            meeting_start_url: a.meeting_start_url.clone(),
            meeting_id: a.meeting_id.clone(),
            meeting_password: a.meeting_password.clone(),
            notify_confirmation: Some(a.notifications.confirmation.clone()),
            notify_day_before: Some(a.notifications.day_before.clone()),
            notify_fifteen_minute: Some(a.notifications.fifteen_minute.clone()),
            notify_completion: Some(a.notifications.completion.clone()),
            day_before_job_id: a.scheduled_jobs.day_before,
            fifteen_minute_job_id: a.scheduled_jobs.fifteen_minute,
            created_at: a.created_at,
            updated_at: a.updated_at,
            completed_at: a.completed_at,
        }
    }
}

fn notification_column(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Confirmation => "notify_confirmation",
        NotificationKind::DayBefore => "notify_day_before",
        NotificationKind::FifteenMinute => "notify_fifteen_minute",
        NotificationKind::Completion => "notify_completion",
    }
}

fn eq(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

fn timestamp(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::Millis, true)).into_owned()
}

fn map_database_error(err: DatabaseError) -> StoreError {
    if err.is_conflict() {
        StoreError::SlotConflict
    } else {
        StoreError::Database(err)
    }
}

/// PostgREST-backed store. The `appointments_active_slot_key` partial unique
/// index turns double bookings into 409s, which surface as `SlotConflict`.
pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn list_query(attorney_id: &str, filter: &AppointmentFilter) -> String {
        let mut query_parts = vec![eq("attorney_id", attorney_id)];

        if !filter.statuses.is_empty() {
            let statuses = filter
                .statuses
                .iter()
                .map(|s| format!("\"{}\"", s.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            query_parts.push(format!("status=in.({})", urlencoding::encode(&statuses)));
        }
        if let Some(from) = &filter.date_from {
            query_parts.push(format!("appointment_date=gte.{}", urlencoding::encode(from)));
        }
        if let Some(to) = &filter.date_to {
            query_parts.push(format!("appointment_date=lte.{}", urlencoding::encode(to)));
        }
        if let Some(kind) = filter.appointment_type {
            query_parts.push(eq("appointment_type", kind.as_str()));
        }
        query_parts.push(ORDER_BY_SLOT.to_string());

        query_parts.join("&")
    }

    async fn select_appointments(&self, query: &str) -> Result<Vec<Appointment>, StoreError> {
        let rows: Vec<AppointmentRow> = self
            .supabase
            .select(APPOINTMENTS_TABLE, query)
            .await
            .map_err(map_database_error)?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }
}

#[async_trait]
impl AppointmentStore for SupabaseStore {
    async fn insert(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let row = serde_json::to_value(AppointmentRow::from(appointment))
            .map_err(|e| StoreError::Database(DatabaseError::Decode(e)))?;

        let rows: Vec<AppointmentRow> = self
            .supabase
            .insert(APPOINTMENTS_TABLE, row)
            .await
            .map_err(map_database_error)?;

        match rows.into_iter().next() {
            Some(row) => Ok(row.into()),
            None => {
                warn!("Insert of appointment {} echoed no row", appointment.id);
                Ok(appointment.clone())
            }
        }
    }

    async fn get(&self, attorney_id: &str, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let query = format!("{}&{}&limit=1", eq("id", &id.to_string()), eq("attorney_id", attorney_id));
        Ok(self.select_appointments(&query).await?.into_iter().next())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let query = format!("{}&limit=1", eq("id", &id.to_string()));
        Ok(self.select_appointments(&query).await?.into_iter().next())
    }

    async fn list_for_attorney(
        &self,
        attorney_id: &str,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, StoreError> {
        let query = Self::list_query(attorney_id, filter);
        debug!("Listing appointments: {}", query);
        self.select_appointments(&query).await
    }

    async fn find_active_in_slot(
        &self,
        attorney_id: &str,
        slot: &Slot,
        exclude: Option<Uuid>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut query = vec![
            eq("attorney_id", attorney_id),
            eq("appointment_date", &slot.date_string()),
            eq("appointment_time", &slot.time_string()),
            format!("status=neq.{}", AppointmentStatus::Cancelled.as_str()),
        ];
        if let Some(exclude) = exclude {
            query.push(format!("id=neq.{}", exclude));
        }
        query.push("limit=1".to_string());

        Ok(self.select_appointments(&query.join("&")).await?.into_iter().next())
    }

    async fn apply(&self, id: Uuid, changes: &AppointmentChanges) -> Result<Option<Appointment>, StoreError> {
        let patch = serde_json::to_value(changes).map_err(|e| StoreError::Database(DatabaseError::Decode(e)))?;

        let rows: Vec<AppointmentRow> = self
            .supabase
            .update(APPOINTMENTS_TABLE, &eq("id", &id.to_string()), patch)
            .await
            .map_err(map_database_error)?;

        Ok(rows.into_iter().next().map(Appointment::from))
    }

    async fn record_notification(
        &self,
        id: Uuid,
        kind: NotificationKind,
        record: &NotificationRecord,
    ) -> Result<(), StoreError> {
        let mut patch = serde_json::Map::new();
        patch.insert(
            notification_column(kind).to_string(),
            serde_json::to_value(record).map_err(|e| StoreError::Database(DatabaseError::Decode(e)))?,
        );

        let _: Vec<Value> = self
            .supabase
            .update(APPOINTMENTS_TABLE, &eq("id", &id.to_string()), Value::Object(patch))
            .await
            .map_err(map_database_error)?;
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for SupabaseStore {
    async fn insert_reminders(&self, jobs: &[ReminderJob]) -> Result<(), StoreError> {
        if jobs.is_empty() {
            return Ok(());
        }
        let rows = serde_json::to_value(jobs).map_err(|e| StoreError::Database(DatabaseError::Decode(e)))?;
        let _: Vec<ReminderJob> = self
            .supabase
            .insert(REMINDERS_TABLE, rows)
            .await
            .map_err(map_database_error)?;
        Ok(())
    }

    async fn due_reminders(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<ReminderJob>, StoreError> {
        let query = format!(
            "state=eq.pending&due_at=lte.{}&order=due_at.asc&limit={}",
            timestamp(now),
            limit
        );
        self.supabase
            .select(REMINDERS_TABLE, &query)
            .await
            .map_err(map_database_error)
    }

    async fn claim_reminder(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        // Conditional PATCH: only a still-pending row is returned.
        let filter = format!("{}&state=eq.pending", eq("id", &id.to_string()));
        let claimed: Vec<ReminderJob> = self
            .supabase
            .update(
                REMINDERS_TABLE,
                &filter,
                json!({ "state": ReminderState::Processing, "claimed_at": at }),
            )
            .await
            .map_err(map_database_error)?;
        Ok(!claimed.is_empty())
    }

    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> Result<usize, StoreError> {
        let filter = format!("state=eq.processing&claimed_at=lt.{}", timestamp(claimed_before));
        let released: Vec<ReminderJob> = self
            .supabase
            .update(
                REMINDERS_TABLE,
                &filter,
                json!({ "state": ReminderState::Pending, "claimed_at": null }),
            )
            .await
            .map_err(map_database_error)?;
        Ok(released.len())
    }

    async fn complete_reminder(
        &self,
        id: Uuid,
        state: ReminderState,
        failure_reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _: Vec<ReminderJob> = self
            .supabase
            .update(
                REMINDERS_TABLE,
                &eq("id", &id.to_string()),
                json!({
                    "state": state,
                    "failure_reason": failure_reason,
                    "processed_at": at,
                }),
            )
            .await
            .map_err(map_database_error)?;
        Ok(())
    }

    async fn supersede_reminders(&self, appointment_id: Uuid, at: DateTime<Utc>) -> Result<usize, StoreError> {
        let filter = format!("{}&state=eq.pending", eq("appointment_id", &appointment_id.to_string()));
        let skipped: Vec<ReminderJob> = self
            .supabase
            .update(
                REMINDERS_TABLE,
                &filter,
                json!({
                    "state": ReminderState::Skipped,
                    "failure_reason": "superseded",
                    "processed_at": at,
                }),
            )
            .await
            .map_err(map_database_error)?;
        Ok(skipped.len())
    }

    async fn reminders_for(&self, appointment_id: Uuid) -> Result<Vec<ReminderJob>, StoreError> {
        let query = format!("{}&order=created_at.asc,due_at.asc", eq("appointment_id", &appointment_id.to_string()));
        self.supabase
            .select(REMINDERS_TABLE, &query)
            .await
            .map_err(map_database_error)
    }
}
