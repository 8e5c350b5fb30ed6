use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{NotificationError, OutgoingEmail};
use crate::services::mailer::Mailer;

/// Mailer double that keeps every message and can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_with: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        if let Some(reason) = &self.fail_with {
            return Err(NotificationError::Transport(reason.clone()));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}
