use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ClientError, Result};

// ─── HttpClient ──────────────────────────────────────────────────────────────

/// Thin reqwest wrapper: bounded timeout, status mapping, JSON decoding.
///
/// Requests are never retried; a failure goes straight back to the caller.
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client, timeout })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        self.read_json(&url, resp).await
    }

    /// Form-encoded POST, for the legacy similarity lookup.
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &[(&str, &str)],
    ) -> Result<T> {
        debug!(%url, "POST form");
        let resp = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        self.read_json(&url, resp).await
    }

    fn map_send_error(&self, url: &Url, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            let secs = self.timeout.as_secs_f64().ceil() as u64;
            ClientError::Timeout(url.to_string(), secs)
        } else {
            ClientError::Http(e)
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, url: &Url, resp: Response) -> Result<T> {
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_send_error(url, e))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(&text, status),
            });
        }

        serde_json::from_str(&text).map_err(|e| ClientError::Parse(format!("{url}: {e}")))
    }
}

/// Prefer the backend's own message (`{"detail": ...}` / `{"error": ...}`),
/// then the raw body, then the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["detail", "error", "message"]
            .iter()
            .find_map(|k| v.get(*k).and_then(Value::as_str).map(ToOwned::to_owned))
    });
    if let Some(msg) = from_json {
        return msg;
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.chars().take(200).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

// ─── ResponseCache ───────────────────────────────────────────────────────────

/// In-memory TTL cache for idempotent GET responses, keyed by request key.
pub struct ResponseCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() <= self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, dropping every entry that has outlived the TTL.
    pub async fn set(&self, key: &str, value: V) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() <= self.ttl);
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}
