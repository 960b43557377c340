//! Notification and account models exchanged with the backend over REST.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Category consumers should fall back to when a record carries none.
pub const DEFAULT_CATEGORY: &str = "general";

/// Accepts ids sent either as JSON strings or numbers. Empty strings count as absent.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(text)) if !text.trim().is_empty() => Some(text),
        Some(RawId::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_id(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("missing or empty id"))
}

// --- Notifications ---

/// A notification as delivered by the backend, either in a list response or
/// nested inside a push frame.
///
/// Field names are matched leniently since different backend revisions used
/// different spellings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteNotification {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "message")]
    pub body: String,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, alias = "data")]
    pub payload: serde_json::Value,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "is_read", alias = "isRead")]
    pub read: bool,
}

/// Response body of the list-notifications endpoint.
///
/// Some deployments return a bare array, others wrap it in an object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NotificationList {
    Bare(Vec<RemoteNotification>),
    Wrapped { notifications: Vec<RemoteNotification> },
}

impl NotificationList {
    pub fn into_vec(self) -> Vec<RemoteNotification> {
        match self {
            NotificationList::Bare(list) => list,
            NotificationList::Wrapped { notifications } => notifications,
        }
    }
}

// --- Accounts ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    #[serde(alias = "profile")]
    pub user: UserProfile,
}
