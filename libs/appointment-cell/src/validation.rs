// libs/appointment-cell/src/validation.rs
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

use meeting_cell::MeetingType;

use crate::clock::PracticeClock;
use crate::models::{
    normalize_label, AppointmentError, AppointmentType, CreateAppointmentRequest, RescheduleRequest, Slot,
    UpdateAppointmentRequest,
};

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 480;
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time pattern compiles"));

/// A create request after trimming, defaulting and checking.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_push_token: Option<String>,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub slot: Slot,
    pub duration: u32,
    pub appointment_type: AppointmentType,
    pub notes: Option<String>,
    pub meeting_type: MeetingType,
}

/// Validated generic patch. Only fields present in the request are set.
#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_push_token: Option<String>,
    pub case_id: Option<String>,
    pub case_title: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
    pub meeting_type: Option<MeetingType>,
}

impl AppointmentPatch {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none()
            && self.client_email.is_none()
            && self.client_phone.is_none()
            && self.client_push_token.is_none()
            && self.case_id.is_none()
            && self.case_title.is_none()
            && self.appointment_type.is_none()
            && self.duration.is_none()
            && self.notes.is_none()
            && self.meeting_type.is_none()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_date(date: &str) -> bool {
    DATE_PATTERN.is_match(date) && Slot::parse(date, "00:00").is_some()
}

pub fn is_valid_time(time: &str) -> bool {
    TIME_PATTERN.is_match(time)
}

/// Trimmed, `None` when blank.
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, field: &str) -> Result<String, AppointmentError> {
    clean(value).ok_or_else(|| AppointmentError::Validation(format!("{} is required", field)))
}

fn normalize_email(raw: &str) -> Result<String, AppointmentError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppointmentError::Validation(format!("Invalid email address: {}", raw.trim())));
    }
    Ok(email)
}

/// Accepts `60`, `60.0` and `"60"`.
fn parse_duration(raw: &Value) -> Result<i64, AppointmentError> {
    let minutes = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e9).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    minutes.ok_or_else(|| {
        AppointmentError::Validation(format!("Invalid duration {}. Expected a whole number of minutes", raw))
    })
}

/// "Google Meet", "google_meet" and "Microsoft Teams" are all accepted.
pub fn parse_meeting_type(raw: &str) -> Result<MeetingType, AppointmentError> {
    let wanted = normalize_label(raw);
    if wanted == "microsoftteams" {
        return Ok(MeetingType::Teams);
    }
    MeetingType::ALL
        .into_iter()
        .find(|kind| normalize_label(kind.as_str()) == wanted)
        .ok_or_else(|| {
            AppointmentError::Validation(format!(
                "Invalid meeting type '{}'. Expected one of: {}",
                raw.trim(),
                MeetingType::ALL.map(|t| t.as_str()).join(", ")
            ))
        })
}

fn validate_duration(duration: i64) -> Result<u32, AppointmentError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(AppointmentError::Validation(format!(
            "Duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(duration as u32)
}

/// Parse and check a date/time pair, requiring the slot to start after `now`.
pub fn validate_future_slot(
    date: &str,
    time: &str,
    clock: &PracticeClock,
    now: DateTime<Utc>,
) -> Result<Slot, AppointmentError> {
    let date = date.trim();
    let time = time.trim();

    if !is_valid_date(date) {
        return Err(AppointmentError::Validation(format!(
            "Invalid appointment date '{}'. Expected YYYY-MM-DD",
            date
        )));
    }
    if !is_valid_time(time) {
        return Err(AppointmentError::Validation(format!(
            "Invalid appointment time '{}'. Expected HH:MM (24-hour)",
            time
        )));
    }

    let slot = Slot::parse(date, time)
        .ok_or_else(|| AppointmentError::Validation(format!("Invalid appointment slot {} {}", date, time)))?;

    if clock.slot_instant(&slot) <= now {
        return Err(AppointmentError::Validation(
            "Appointment date and time must be in the future".to_string(),
        ));
    }

    Ok(slot)
}

pub fn validate_create(
    request: &CreateAppointmentRequest,
    clock: &PracticeClock,
    now: DateTime<Utc>,
) -> Result<NewAppointment, AppointmentError> {
    let client_name = required(&request.client_name, "clientName")?;
    let client_email = normalize_email(&required(&request.client_email, "clientEmail")?)?;
    let date = required(&request.appointment_date, "appointmentDate")?;
    let time = required(&request.appointment_time, "appointmentTime")?;
    let slot = validate_future_slot(&date, &time, clock, now)?;

    let duration = match &request.duration {
        Some(raw) => validate_duration(parse_duration(raw)?)?,
        None => DEFAULT_DURATION_MINUTES,
    };
    let meeting_type = match clean(&request.meeting_type) {
        Some(raw) => parse_meeting_type(&raw)?,
        None => MeetingType::default(),
    };

    let appointment_type = match clean(&request.appointment_type) {
        Some(raw) => raw.parse()?,
        None => AppointmentType::default(),
    };

    Ok(NewAppointment {
        client_name,
        client_email,
        client_phone: clean(&request.client_phone),
        client_push_token: clean(&request.client_push_token),
        case_id: clean(&request.case_id),
        case_title: clean(&request.case_title),
        slot,
        duration,
        appointment_type,
        notes: clean(&request.notes),
        meeting_type,
    })
}

pub fn validate_update(request: &UpdateAppointmentRequest) -> Result<AppointmentPatch, AppointmentError> {
    let client_name = match &request.client_name {
        Some(_) => Some(required(&request.client_name, "clientName")?),
        None => None,
    };
    let client_email = match &request.client_email {
        Some(raw) => Some(normalize_email(raw)?),
        None => None,
    };
    let appointment_type = match clean(&request.appointment_type) {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };
    let duration = match &request.duration {
        Some(raw) => Some(validate_duration(parse_duration(raw)?)?),
        None => None,
    };
    let meeting_type = match clean(&request.meeting_type) {
        Some(raw) => Some(parse_meeting_type(&raw)?),
        None => None,
    };

    Ok(AppointmentPatch {
        client_name,
        client_email,
        client_phone: clean(&request.client_phone),
        client_push_token: clean(&request.client_push_token),
        case_id: clean(&request.case_id),
        case_title: clean(&request.case_title),
        appointment_type,
        duration,
        notes: clean(&request.notes),
        meeting_type,
    })
}

pub fn validate_reschedule(
    request: &RescheduleRequest,
    clock: &PracticeClock,
    now: DateTime<Utc>,
) -> Result<Slot, AppointmentError> {
    let date = required(&request.appointment_date, "appointmentDate")?;
    let time = required(&request.appointment_time, "appointmentTime")?;
    validate_future_slot(&date, &time, clock, now)
}
