//! Shared error types including RFC7807 Problem Details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RFC7807 Problem Details (application/problem+json)
///
/// Backends may answer failed `/api/*` calls with this envelope; the client
/// uses it to surface a meaningful message instead of a raw status code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type", default)]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    #[serde(default)]
    pub title: String,
    /// HTTP status code.
    #[serde(default)]
    pub status: u16,
    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Attempt to parse an RFC7807 (or RFC7807-ish) JSON body into a user-facing message.
/// Prefers `detail`, falls back to `title`, then to a plain `{"error": ...}` / `{"message": ...}` body.
pub fn try_problem_detail(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ProblemDetails>(body) {
        if let Some(detail) = parsed.detail {
            if !detail.trim().is_empty() {
                return Some(detail);
            }
        }
        if !parsed.title.trim().is_empty() {
            return Some(parsed.title);
        }
    }

    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Failure of a one-shot REST call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No credential was available for a call that requires one.
    #[error("not authenticated")]
    Unauthenticated,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    /// Whether this failure means the credential is missing, invalid or expired.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ApiError::Unauthenticated => true,
            ApiError::Http { status, .. } => *status == 401 || *status == 403,
            ApiError::Network(_) | ApiError::Deserialize(_) => false,
        }
    }

    /// A short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthenticated => "Please sign in again.".to_string(),
            ApiError::Http { status, body } => try_problem_detail(body)
                .unwrap_or_else(|| match status {
                    401 | 403 => "Your session has expired. Please sign in again.".to_string(),
                    _ => format!("Request failed with status {status}."),
                }),
            ApiError::Network(_) => "Could not reach the server.".to_string(),
            ApiError::Deserialize(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}
