// libs/meeting-cell/src/services/google.rs
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{
    CalendarEventRequest, CalendarEventResponse, ConferenceDataRequest, ConferenceSolutionKey,
    CreateConferenceRequest, EventAttendee, EventDateTime, MeetingError, MeetingLink,
    MeetingRequest, MeetingType,
};

/// Google Calendar API client that books events with a Meet conference.
/// Based on: https://developers.google.com/calendar/api/guides/create-events#conferencing
pub struct GoogleCalendarClient {
    client: Client,
    access_token: String,
    calendar_id: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &AppConfig) -> Result<Self, MeetingError> {
        if !config.is_google_calendar_configured() {
            return Err(MeetingError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.external_http_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            access_token: config.google_calendar_access_token.clone(),
            calendar_id: config.google_calendar_id.clone(),
            base_url: config.google_calendar_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a calendar event with a Meet conference attached
    /// POST /calendars/{calendarId}/events?conferenceDataVersion=1
    pub async fn create_meet_event(&self, request: &MeetingRequest) -> Result<MeetingLink, MeetingError> {
        info!("Creating Google Meet event for {}", request.reference);

        let url = format!(
            "{}/calendars/{}/events?conferenceDataVersion=1&sendUpdates=none",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        );

        let mut attendees = vec![EventAttendee { email: request.attendee_email.clone() }];
        if let Some(organizer) = &request.organizer_email {
            attendees.push(EventAttendee { email: organizer.clone() });
        }

        let body = CalendarEventRequest {
            summary: request.summary.clone(),
            description: request.description.clone(),
            start: EventDateTime { date_time: request.start.to_rfc3339() },
            end: EventDateTime { date_time: request.end().to_rfc3339() },
            attendees,
            conference_data: ConferenceDataRequest {
                create_request: CreateConferenceRequest {
                    request_id: request.reference.clone(),
                    conference_solution_key: ConferenceSolutionKey {
                        solution_type: "hangoutsMeet".to_string(),
                    },
                },
            },
        };

        debug!("Sending calendar event request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            // The body stays in the log; callers only see the status.
            error!("Google Calendar event creation failed: {} - {}", status, response_text);
            return Err(MeetingError::GoogleApi {
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let event: CalendarEventResponse = serde_json::from_str(&response_text)
            .map_err(|e| MeetingError::GoogleApi {
                message: format!("Failed to parse event response: {}", e),
            })?;

        let link = link_from_event(event)?;
        info!("Created Google Meet link for {}", request.reference);
        Ok(link)
    }
}

fn link_from_event(event: CalendarEventResponse) -> Result<MeetingLink, MeetingError> {
    let video_entry = event
        .conference_data
        .as_ref()
        .and_then(|data| data.entry_points.iter().find(|e| e.entry_point_type == "video"));

    let join_url = event
        .hangout_link
        .clone()
        .or_else(|| video_entry.map(|e| e.uri.clone()))
        .ok_or(MeetingError::MissingConferenceLink)?;

    let meeting_id = event
        .conference_data
        .as_ref()
        .and_then(|data| data.conference_id.clone())
        .or(event.id.clone());

    Ok(MeetingLink {
        meeting_type: MeetingType::GoogleMeet,
        meeting_join_url: Some(join_url),
        meeting_start_url: event.html_link,
        meeting_id,
        meeting_password: video_entry.and_then(|e| e.password.clone()),
        error: None,
    })
}
