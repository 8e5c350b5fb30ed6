use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    Tls,
    StartTls,
    None,
}

impl FromStr for SmtpTls {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" => Ok(SmtpTls::Tls),
            "starttls" => Ok(SmtpTls::StartTls),
            "none" => Ok(SmtpTls::None),
            other => Err(format!("unknown SMTP_TLS mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_tls: SmtpTls,
    pub mail_from: String,
    pub google_calendar_access_token: String,
    pub google_calendar_id: String,
    pub google_calendar_base_url: String,
    pub practice_utc_offset_minutes: i32,
    pub reminder_poll_interval_seconds: u64,
    pub external_http_timeout_seconds: u64,
    pub port: u16,
}

fn var_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: var_or_empty("SUPABASE_URL"),
            supabase_service_key: var_or_empty("SUPABASE_SERVICE_KEY"),
            jwt_secret: var_or_empty("JWT_SECRET"),
            smtp_host: var_or_empty("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|p| p.trim().parse().ok()),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            smtp_tls: parsed_or("SMTP_TLS", SmtpTls::StartTls),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| {
                    warn!("MAIL_FROM not set, using default");
                    "CaseMate <no-reply@casemate.app>".to_string()
                }),
            google_calendar_access_token: var_or_empty("GOOGLE_CALENDAR_ACCESS_TOKEN"),
            google_calendar_id: env::var("GOOGLE_CALENDAR_ID")
                .unwrap_or_else(|_| "primary".to_string()),
            google_calendar_base_url: env::var("GOOGLE_CALENDAR_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            practice_utc_offset_minutes: parsed_or("PRACTICE_UTC_OFFSET_MINUTES", 0),
            reminder_poll_interval_seconds: parsed_or("REMINDER_POLL_INTERVAL_SECONDS", 30),
            external_http_timeout_seconds: parsed_or("EXTERNAL_HTTP_TIMEOUT_SECONDS", 10),
            port: parsed_or("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// JWT secret plus a reachable document store.
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && self.is_database_configured()
    }

    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.smtp_host.is_empty() && !self.mail_from.is_empty()
    }

    pub fn is_google_calendar_configured(&self) -> bool {
        !self.google_calendar_access_token.is_empty()
            && !self.google_calendar_id.is_empty()
            && !self.google_calendar_base_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smtp_tls_parses_known_modes() {
        assert_eq!("TLS".parse::<SmtpTls>().unwrap(), SmtpTls::Tls);
        assert_eq!(" starttls ".parse::<SmtpTls>().unwrap(), SmtpTls::StartTls);
        assert_eq!("none".parse::<SmtpTls>().unwrap(), SmtpTls::None);
        assert!("ssl".parse::<SmtpTls>().is_err());
    }
}
