use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::error::DatabaseError;

/// PostgREST client for the Supabase document store.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.external_http_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Could not build HTTP client with a timeout, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| DatabaseError::Auth("Service key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| DatabaseError::Auth("Service key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Writes echo the stored rows back.
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        if self.base_url.is_empty() {
            return Err(DatabaseError::NotConfigured);
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers()?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(classify_error(status.as_u16(), text));
        }

        // PostgREST answers 204 with an empty body when nothing is echoed.
        let text = if text.trim().is_empty() { "null".to_string() } else { text };
        Ok(serde_json::from_str::<T>(&text)?)
    }

    pub async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.request(Method::GET, &path, None).await
    }

    pub async fn insert<T>(&self, table: &str, rows: Value) -> Result<Vec<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}", table);
        self.request(Method::POST, &path, Some(rows)).await
    }

    /// PATCH every row matching `filter` (PostgREST query syntax).
    pub async fn update<T>(&self, table: &str, filter: &str, patch: Value) -> Result<Vec<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, filter);
        self.request(Method::PATCH, &path, Some(patch)).await
    }
}

fn classify_error(status: u16, text: String) -> DatabaseError {
    // Postgres unique_violation surfaces as 409 with code 23505.
    let is_unique_violation = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("code").and_then(|c| c.as_str()).map(|c| c == "23505"))
        .unwrap_or(false);

    match status {
        409 => DatabaseError::Conflict(text),
        _ if is_unique_violation => DatabaseError::Conflict(text),
        401 | 403 => DatabaseError::Auth(text),
        404 => DatabaseError::NotFound(text),
        _ => DatabaseError::Api { status, message: text },
    }
}
