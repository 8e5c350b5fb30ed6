// libs/notification-cell/src/services/mailer.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use shared_config::{AppConfig, SmtpTls};

use crate::models::{NotificationError, OutgoingEmail};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        if !config.is_mail_configured() {
            return Err(NotificationError::NotConfigured);
        }

        let from: Mailbox = config
            .mail_from
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(config.mail_from.clone()))?;

        let mut builder = match config.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
                .map_err(|e| NotificationError::Transport(e.to_string()))?,
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| NotificationError::Transport(e.to_string()))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host),
        };

        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }

        builder = builder.timeout(Some(Duration::from_secs(config.external_http_timeout_seconds)));

        if !config.smtp_username.is_empty() {
            let credentials = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
            builder = builder.credentials(credentials);
        }

        info!("SMTP mailer configured for host {}", config.smtp_host);

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(email.to.clone()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(email.text.clone(), email.html.clone()))
            .map_err(|e| NotificationError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        debug!("Sent '{}' to {}", email.subject, email.to);
        Ok(())
    }
}

/// Used when SMTP is not configured; every send fails with `NotConfigured`.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        debug!("Mail disabled, dropping '{}' to {}", email.subject, email.to);
        Err(NotificationError::NotConfigured)
    }
}

pub fn mailer_from_config(config: &AppConfig) -> Arc<dyn Mailer> {
    match SmtpMailer::new(config) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            warn!("E-mail notifications disabled: {}", e);
            Arc::new(DisabledMailer)
        }
    }
}
