// libs/meeting-cell/src/models.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// MEETING DOMAIN MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MeetingType {
    #[default]
    #[serde(rename = "Google Meet", alias = "google_meet", alias = "GoogleMeet", alias = "google-meet")]
    GoogleMeet,

    #[serde(rename = "Zoom", alias = "zoom")]
    Zoom,

    #[serde(rename = "Teams", alias = "teams", alias = "Microsoft Teams")]
    Teams,

    #[serde(rename = "Jitsi", alias = "jitsi")]
    Jitsi,
}

impl MeetingType {
    pub const ALL: [MeetingType; 4] = [
        MeetingType::GoogleMeet,
        MeetingType::Zoom,
        MeetingType::Teams,
        MeetingType::Jitsi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::GoogleMeet => "Google Meet",
            MeetingType::Zoom => "Zoom",
            MeetingType::Teams => "Teams",
            MeetingType::Jitsi => "Jitsi",
        }
    }

    /// Only Google Meet creates a real meeting with the provider.
    pub fn is_integrated(&self) -> bool {
        matches!(self, MeetingType::GoogleMeet)
    }
}

impl fmt::Display for MeetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the generator needs to know about the appointment.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    /// Stable per-booking value; used as the provider's idempotency key.
    pub reference: String,
    pub summary: String,
    pub description: String,
    pub organizer_email: Option<String>,
    pub attendee_email: String,
    pub start: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

impl MeetingRequest {
    pub fn end(&self) -> DateTime<FixedOffset> {
        self.start + chrono::Duration::minutes(self.duration_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLink {
    pub meeting_type: MeetingType,
    pub meeting_join_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_start_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MeetingLink {
    pub fn failed(meeting_type: MeetingType, error: impl Into<String>) -> Self {
        Self {
            meeting_type,
            meeting_join_url: None,
            meeting_start_url: None,
            meeting_id: None,
            meeting_password: None,
            error: Some(error.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.meeting_join_url.is_some()
    }
}

// ==============================================================================
// GOOGLE CALENDAR API MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<EventAttendee>,
    pub conference_data: ConferenceDataRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceDataRequest {
    pub create_request: CreateConferenceRequest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConferenceRequest {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub solution_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventResponse {
    pub id: Option<String>,
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
    pub conference_data: Option<ConferenceData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    pub conference_id: Option<String>,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub entry_point_type: String,
    pub uri: String,
    pub password: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("Google Calendar integration not configured")]
    NotConfigured,

    #[error("Google Calendar API error: {message}")]
    GoogleApi { message: String },

    #[error("Calendar event created without a conference link")]
    MissingConferenceLink,

    #[error("Calendar request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
