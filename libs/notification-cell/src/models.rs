// libs/notification-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    DayBefore,
    FifteenMinute,
    Completion,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Confirmation => "confirmation",
            NotificationKind::DayBefore => "day_before",
            NotificationKind::FifteenMinute => "fifteen_minute",
            NotificationKind::Completion => "completion",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a template may interpolate. Values are raw; templates escape them.
#[derive(Debug, Clone)]
pub struct EmailContext {
    pub client_name: String,
    pub client_email: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub appointment_type: String,
    pub duration_minutes: u32,
    pub meeting_type: Option<String>,
    pub meeting_join_url: Option<String>,
    pub case_title: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Mail transport not configured")]
    NotConfigured,

    #[error("No usable client email address")]
    MissingRecipient,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}
