// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use meeting_cell::{MeetingLink, MeetingType};
use notification_cell::NotificationKind;
use shared_database::DatabaseError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub attorney_id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_push_token: Option<String>,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    pub duration: u32,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub meeting_type: MeetingType,
    pub meeting_join_url: Option<String>,
    pub meeting_start_url: Option<String>,
    pub meeting_id: Option<String>,
    pub meeting_password: Option<String>,
    pub notifications: NotificationTracking,
    pub scheduled_jobs: ScheduledJobs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn slot(&self) -> Result<Slot, AppointmentError> {
        Slot::parse(&self.appointment_date, &self.appointment_time)
            .ok_or_else(|| AppointmentError::Validation(format!(
                "Stored slot {} {} is malformed", self.appointment_date, self.appointment_time
            )))
    }

    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn apply_meeting_link(&mut self, link: &MeetingLink) {
        self.meeting_type = link.meeting_type;
        self.meeting_join_url = link.meeting_join_url.clone();
        self.meeting_start_url = link.meeting_start_url.clone();
        self.meeting_id = link.meeting_id.clone();
        self.meeting_password = link.meeting_password.clone();
    }

    /// Apply a field patch in place, the way the document store does.
    pub fn apply_changes(&mut self, changes: &AppointmentChanges) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_some<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        set(&mut self.client_name, &changes.client_name);
        set(&mut self.client_email, &changes.client_email);
        set_some(&mut self.client_phone, &changes.client_phone);
        set_some(&mut self.client_push_token, &changes.client_push_token);
        set_some(&mut self.case_id, &changes.case_id);
        set_some(&mut self.case_title, &changes.case_title);
        set(&mut self.appointment_date, &changes.appointment_date);
        set(&mut self.appointment_time, &changes.appointment_time);
        set(&mut self.duration, &changes.duration);
        set(&mut self.appointment_type, &changes.appointment_type);
        set(&mut self.status, &changes.status);
        set_some(&mut self.notes, &changes.notes);
        set(&mut self.meeting_type, &changes.meeting_type);
        set(&mut self.meeting_join_url, &changes.meeting_join_url);
        set(&mut self.meeting_start_url, &changes.meeting_start_url);
        set(&mut self.meeting_id, &changes.meeting_id);
        set(&mut self.meeting_password, &changes.meeting_password);
        set_some(&mut self.completed_at, &changes.completed_at);
        set_some(&mut self.scheduled_jobs.day_before, &changes.day_before_job_id);
        set_some(&mut self.scheduled_jobs.fifteen_minute, &changes.fifteen_minute_job_id);
        self.updated_at = changes.updated_at;
    }
}

/// A calendar slot in the practice time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn parse(date: &str, time: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
        let time = NaiveTime::parse_from_str(time, TIME_FORMAT).ok()?;
        Some(Self { date, time })
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_string(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    #[serde(alias = "scheduled")]
    Scheduled,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled")]
    Cancelled,
    #[serde(rename = "No-show", alias = "no_show", alias = "NoShow")]
    NoShow,
    #[serde(alias = "rescheduled")]
    Rescheduled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rescheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No-show",
            AppointmentStatus::Rescheduled => "Rescheduled",
        }
    }

    /// Scheduled or Rescheduled: the meeting is still going to happen.
    pub fn is_upcoming(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Rescheduled)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_upcoming()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| normalize_label(status.as_str()) == wanted)
            .ok_or_else(|| AppointmentError::InvalidStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AppointmentType {
    #[default]
    #[serde(alias = "consultation")]
    Consultation,
    #[serde(rename = "Strategy Meeting", alias = "strategy_meeting")]
    StrategyMeeting,
    #[serde(rename = "Court Preparation", alias = "court_preparation")]
    CourtPreparation,
    #[serde(rename = "Client Review", alias = "client_review")]
    ClientReview,
    #[serde(rename = "Follow-up", alias = "follow_up", alias = "FollowUp")]
    FollowUp,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 5] = [
        AppointmentType::Consultation,
        AppointmentType::StrategyMeeting,
        AppointmentType::CourtPreparation,
        AppointmentType::ClientReview,
        AppointmentType::FollowUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::StrategyMeeting => "Strategy Meeting",
            AppointmentType::CourtPreparation => "Court Preparation",
            AppointmentType::ClientReview => "Client Review",
            AppointmentType::FollowUp => "Follow-up",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentType {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        AppointmentType::ALL
            .into_iter()
            .find(|kind| normalize_label(kind.as_str()) == wanted)
            .ok_or_else(|| AppointmentError::Validation(format!(
                "Invalid appointment type '{}'. Expected one of: {}",
                s,
                AppointmentType::ALL.map(|t| t.as_str()).join(", ")
            )))
    }
}

/// "No-show", "no_show" and "noshow" all compare equal.
pub(crate) fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ==============================================================================
// NOTIFICATION TRACKING
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

impl NotificationRecord {
    pub fn sent_at(at: DateTime<Utc>) -> Self {
        Self { sent: true, sent_at: Some(at), failure_reason: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { sent: false, sent_at: None, failure_reason: Some(reason.into()) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTracking {
    pub confirmation: NotificationRecord,
    pub day_before: NotificationRecord,
    pub fifteen_minute: NotificationRecord,
    pub completion: NotificationRecord,
}

impl NotificationTracking {
    pub fn get(&self, kind: NotificationKind) -> &NotificationRecord {
        match kind {
            NotificationKind::Confirmation => &self.confirmation,
            NotificationKind::DayBefore => &self.day_before,
            NotificationKind::FifteenMinute => &self.fifteen_minute,
            NotificationKind::Completion => &self.completion,
        }
    }

    pub fn set(&mut self, kind: NotificationKind, record: NotificationRecord) {
        match kind {
            NotificationKind::Confirmation => self.confirmation = record,
            NotificationKind::DayBefore => self.day_before = record,
            NotificationKind::FifteenMinute => self.fifteen_minute = record,
            NotificationKind::Completion => self.completion = record,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJobs {
    pub day_before: Option<Uuid>,
    pub fifteen_minute: Option<Uuid>,
}

// ==============================================================================
// STORE MODELS
// ==============================================================================

/// Field patch for one appointment. `None` leaves the column untouched.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_push_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<AppointmentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<MeetingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_join_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_start_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_password: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_before_job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifteen_minute_job_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentChanges {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            client_name: None,
            client_email: None,
            client_phone: None,
            client_push_token: None,
            case_id: None,
            case_title: None,
            appointment_date: None,
            appointment_time: None,
            duration: None,
            appointment_type: None,
            status: None,
            notes: None,
            meeting_type: None,
            meeting_join_url: None,
            meeting_start_url: None,
            meeting_id: None,
            meeting_password: None,
            completed_at: None,
            day_before_job_id: None,
            fifteen_minute_job_id: None,
            updated_at,
        }
    }

    pub fn with_meeting_link(mut self, link: &MeetingLink) -> Self {
        // Explicit nulls, so a replaced link does not leave stale values behind.
        self.meeting_type = Some(link.meeting_type);
        self.meeting_join_url = Some(link.meeting_join_url.clone());
        self.meeting_start_url = Some(link.meeting_start_url.clone());
        self.meeting_id = Some(link.meeting_id.clone());
        self.meeting_password = Some(link.meeting_password.clone());
        self
    }

    pub fn touches_slot(&self) -> bool {
        self.appointment_date.is_some() || self.appointment_time.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    /// Empty means any status.
    pub statuses: Vec<AppointmentStatus>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub appointment_type: Option<AppointmentType>,
}

impl AppointmentFilter {
    pub fn on_date(date: &str) -> Self {
        Self {
            date_from: Some(date.to_string()),
            date_to: Some(date.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&appointment.status))
            && self.date_from.as_deref().map_or(true, |from| appointment.appointment_date.as_str() >= from)
            && self.date_to.as_deref().map_or(true, |to| appointment.appointment_date.as_str() <= to)
            && self.appointment_type.map_or(true, |t| appointment.appointment_type == t)
    }
}

// ==============================================================================
// REMINDER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    FifteenMinute,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::DayBefore, ReminderKind::FifteenMinute];

    pub fn lead_time(&self) -> chrono::Duration {
        match self {
            ReminderKind::DayBefore => chrono::Duration::hours(24),
            ReminderKind::FifteenMinute => chrono::Duration::minutes(15),
        }
    }

    pub fn notification_kind(&self) -> NotificationKind {
        match self {
            ReminderKind::DayBefore => NotificationKind::DayBefore,
            ReminderKind::FifteenMinute => NotificationKind::FifteenMinute,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    Pending,
    Processing,
    Sent,
    Skipped,
    Failed,
}

impl ReminderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderState::Pending => "pending",
            ReminderState::Processing => "processing",
            ReminderState::Sent => "sent",
            ReminderState::Skipped => "skipped",
            ReminderState::Failed => "failed",
        }
    }
}

/// A persisted due reminder, picked up by the reminder worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderJob {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub attorney_id: String,
    pub kind: ReminderKind,
    pub due_at: DateTime<Utc>,
    /// The slot the reminder was computed for; a moved appointment invalidates it.
    pub slot_date: String,
    pub slot_time: String,
    pub state: ReminderState,
    /// Set when a worker moves the row to processing.
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReminderJob {
    pub fn new(appointment: &Appointment, kind: ReminderKind, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            attorney_id: appointment.attorney_id.clone(),
            kind,
            due_at,
            slot_date: appointment.appointment_date.clone(),
            slot_time: appointment.appointment_time.clone(),
            state: ReminderState::Pending,
            claimed_at: None,
            processed_at: None,
            failure_reason: None,
            created_at: now,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Create body. Everything is optional here so missing or malformed fields
/// come back as validation messages rather than extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_push_token: Option<String>,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub appointment_type: Option<String>,
    /// Number or numeric string; checked in validation.
    pub duration: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub meeting_type: Option<String>,
}

/// Generic patch. Status and slot fields are not part of it and are dropped
/// during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_push_token: Option<String>,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub appointment_type: Option<String>,
    /// Number or numeric string; checked in validation.
    pub duration: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub meeting_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
}

/// `GET /getAll` filters. `priority` is the old name of `status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub date: Option<String>,
    pub appointment_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub confirmation_sent: bool,
    pub reminders_scheduled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAppointment {
    pub appointment: Appointment,
    pub meeting_link: MeetingLink,
    pub notifications: NotificationOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub today: usize,
    pub upcoming: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub appointment_date: String,
    pub appointment_time: String,
    pub available: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Slot already taken by another appointment")]
    SlotConflict,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("The selected time slot is already booked")]
    SlotUnavailable,

    #[error("Invalid status '{0}'. Expected one of: Scheduled, Completed, Cancelled, No-show, Rescheduled")]
    InvalidStatus(String),

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unable to check availability: {0}")]
    AvailabilityCheck(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotConflict => AppointmentError::SlotUnavailable,
            other => AppointmentError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_display_and_legacy_spellings() {
        assert_eq!("No-show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert_eq!("no_show".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::NoShow);
        assert_eq!("scheduled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Scheduled);
        assert!("Archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn status_serializes_to_display_names() {
        assert_eq!(serde_json::to_value(AppointmentStatus::NoShow).unwrap(), "No-show");
        assert_eq!(serde_json::to_value(AppointmentType::CourtPreparation).unwrap(), "Court Preparation");
    }

    #[test]
    fn appointment_type_parsing_is_forgiving() {
        assert_eq!("strategy meeting".parse::<AppointmentType>().unwrap(), AppointmentType::StrategyMeeting);
        assert_eq!("follow_up".parse::<AppointmentType>().unwrap(), AppointmentType::FollowUp);
        assert!("Deposition".parse::<AppointmentType>().is_err());
    }

    #[test]
    fn slot_parsing_rejects_impossible_values() {
        assert!(Slot::parse("2030-02-30", "10:00").is_none());
        assert!(Slot::parse("2030-01-15", "25:61").is_none());
        let slot = Slot::parse("2030-01-15", "14:30").unwrap();
        assert_eq!(slot.date_string(), "2030-01-15");
        assert_eq!(slot.time_string(), "14:30");
    }

    #[test]
    fn changes_skip_untouched_columns() {
        let now = Utc::now();
        let mut changes = AppointmentChanges::at(now);
        changes.status = Some(AppointmentStatus::Cancelled);

        let value = serde_json::to_value(&changes).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(value["status"], "Cancelled");
        assert!(!changes.touches_slot());
    }
}
