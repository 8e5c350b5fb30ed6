// libs/meeting-cell/src/services/synthesized.rs
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::models::{MeetingLink, MeetingType};

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Placeholder link for a provider without an integration. No meeting is
/// created on the provider side.
pub fn synthesize_link(meeting_type: MeetingType) -> MeetingLink {
    match meeting_type {
        MeetingType::Zoom => {
            let meeting_id: u64 = rand::thread_rng().gen_range(10_000_000_000..99_999_999_999);
            let password = random_token(6);
            MeetingLink {
                meeting_type,
                meeting_join_url: Some(format!("https://zoom.us/j/{}?pwd={}", meeting_id, password)),
                meeting_start_url: Some(format!("https://zoom.us/s/{}", meeting_id)),
                meeting_id: Some(meeting_id.to_string()),
                meeting_password: Some(password),
                error: None,
            }
        }
        MeetingType::Teams => {
            let thread = random_token(32);
            MeetingLink {
                meeting_type,
                meeting_join_url: Some(format!(
                    "https://teams.microsoft.com/l/meetup-join/19%3ameeting_{}%40thread.v2/0",
                    thread
                )),
                meeting_start_url: None,
                meeting_id: Some(thread),
                meeting_password: None,
                error: None,
            }
        }
        MeetingType::Jitsi | MeetingType::GoogleMeet => {
            let room = format!("CaseMate-{}", random_token(12));
            MeetingLink {
                meeting_type,
                meeting_join_url: Some(format!("https://meet.jit.si/{}", room)),
                meeting_start_url: None,
                meeting_id: Some(room),
                meeting_password: None,
                error: None,
            }
        }
    }
}
