//! Shared plumbing for the HTTP adapters of the remote collaborators

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::warn;

use crate::error::{TransportError, TransportResult};

const MAX_MESSAGE_LEN: usize = 200;

/// Build the HTTP client used by every adapter
pub fn build_client(timeout: Duration) -> TransportResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))
}

/// Parse a base address so that relative endpoints are appended to it
pub fn parse_base_url(base: &str) -> TransportResult<Url> {
    let mut normalized = base.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base, e)))
}

/// Join a relative endpoint such as `auth/login/` onto a base address
pub fn endpoint(base: &Url, path: &str) -> TransportResult<Url> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
}

/// Turn a non-success response into the matching transport error
pub async fn check_status(response: Response) -> TransportResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(TransportError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });
    warn!("Request rejected with status {}: {}", status.as_u16(), message);

    Err(TransportError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Extract a human-readable message from an error body
///
/// Understands `{"detail": "..."}`, `{"error": "..."}` and field error maps
/// such as `{"username": ["already taken"]}`.
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            if let Some(Value::String(detail)) = map.get("detail").or_else(|| map.get("error")) {
                detail.clone()
            } else {
                map.iter()
                    .map(|(field, errors)| format!("{}: {}", field, flatten(errors)))
                    .collect::<Vec<_>>()
                    .join("; ")
            }
        }
        Ok(other) => flatten(&other),
        Err(_) => body.to_string(),
    };

    Some(truncate(message))
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TransportError::InvalidResponse(error.to_string())
        } else if error.status() == Some(StatusCode::UNAUTHORIZED) {
            TransportError::Unauthorized
        } else {
            TransportError::Network(error.to_string())
        }
    }
}
