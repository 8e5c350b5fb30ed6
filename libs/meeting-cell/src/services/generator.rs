// libs/meeting-cell/src/services/generator.rs
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{MeetingError, MeetingLink, MeetingRequest, MeetingType};
use crate::services::google::GoogleCalendarClient;
use crate::services::synthesized::synthesize_link;

pub struct MeetingLinkGenerator {
    google: Result<GoogleCalendarClient, MeetingError>,
}

impl MeetingLinkGenerator {
    pub fn new(config: &AppConfig) -> Self {
        let google = GoogleCalendarClient::new(config);
        if let Err(e) = &google {
            warn!("Google Meet links unavailable: {}", e);
        }
        Self { google }
    }

    /// Never fails: integration errors come back as a link without a join URL.
    pub async fn generate(&self, meeting_type: MeetingType, request: &MeetingRequest) -> MeetingLink {
        if !meeting_type.is_integrated() {
            debug!("Synthesizing {} link for {}", meeting_type, request.reference);
            return synthesize_link(meeting_type);
        }

        let client = match &self.google {
            Ok(client) => client,
            Err(e) => return MeetingLink::failed(meeting_type, e.to_string()),
        };

        match client.create_meet_event(request).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Meeting link generation failed for {}: {}", request.reference, e);
                MeetingLink::failed(meeting_type, e.to_string())
            }
        }
    }
}
