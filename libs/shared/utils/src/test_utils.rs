use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, SmtpTls};
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub google_calendar_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            google_calendar_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Mail and calendar integrations are left unconfigured.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            smtp_host: String::new(),
            smtp_port: None,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_tls: SmtpTls::None,
            mail_from: "CaseMate <no-reply@casemate.test>".to_string(),
            google_calendar_access_token: String::new(),
            google_calendar_id: "primary".to_string(),
            google_calendar_base_url: self.google_calendar_base_url.clone(),
            practice_utc_offset_minutes: 0,
            reminder_poll_interval_seconds: 30,
            external_http_timeout_seconds: 5,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::attorney("attorney@example.com")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            name: "Test Attorney".to_string(),
        }
    }

    pub fn attorney(email: &str) -> Self {
        Self::new(email, "attorney")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            name: Some(self.name.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "name": user.name,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// PostgREST rows as the `appointments` / `appointment_reminders` tables return them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn appointment_row(attorney_id: &str, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "attorney_id": attorney_id,
            "client_name": "Jordan Client",
            "client_email": "jordan@example.com",
            "client_phone": null,
            "client_push_token": null,
            "case_id": null,
            "case_title": "Estate of Client",
            "appointment_date": date,
            "appointment_time": time,
            "duration": 60,
            "appointment_type": "Consultation",
            "status": "Scheduled",
            "notes": null,
            "meeting_type": "Jitsi",
            "meeting_join_url": "https://meet.jit.si/CaseMate-test",
            "meeting_start_url": null,
            "meeting_id": "CaseMate-test",
            "meeting_password": null,
            "notify_confirmation": null,
            "notify_day_before": null,
            "notify_fifteen_minute": null,
            "notify_completion": null,
            "day_before_job_id": null,
            "fifteen_minute_job_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "completed_at": null
        })
    }

    /// Row written before the canonical `client_email` column existed.
    pub fn legacy_appointment_row(attorney_id: &str, nested_email: &str) -> serde_json::Value {
        let mut row = Self::appointment_row(attorney_id, "2030-01-15", "10:00");
        row["client_email"] = serde_json::Value::Null;
        row["client"] = json!({ "name": "Jordan Client", "email": nested_email });
        row
    }

    pub fn reminder_row(appointment_id: &str, attorney_id: &str, kind: &str, due_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "attorney_id": attorney_id,
            "kind": kind,
            "due_at": due_at,
            "slot_date": "2030-01-15",
            "slot_time": "10:00",
            "state": "pending",
            "claimed_at": null,
            "processed_at": null,
            "failure_reason": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn unique_violation() -> serde_json::Value {
        json!({
            "code": "23505",
            "details": "Key (attorney_id, appointment_date, appointment_time) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"appointments_active_slot_key\""
        })
    }
}
