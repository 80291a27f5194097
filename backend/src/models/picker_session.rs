use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Session resource as returned by the Photos Picker API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    pub id: String,
    #[serde(default)]
    pub picker_uri: Option<String>,
    #[serde(default)]
    pub media_items_set: bool,
    #[serde(default)]
    pub expire_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub polling_config: Option<PollingConfig>,
}

/// Polling hints reported by the provider, e.g. `{"pollInterval": "5s"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_in: Option<String>,
}

/// A picker session owned by one authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PickerSession {
    pub id: String,
    pub picker_uri: Option<String>,
    pub media_items_set: bool,
    pub owner_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_config: Option<PollingConfig>,
}

impl PickerSession {
    pub fn from_remote(owner_key: &str, remote: RemoteSession, created_at: DateTime<Utc>) -> Self {
        Self {
            id: remote.id,
            picker_uri: remote.picker_uri,
            media_items_set: remote.media_items_set,
            owner_key: owner_key.to_string(),
            created_at,
            expires_at: remote.expire_time,
            polling_config: remote.polling_config,
        }
    }

    /// A session without a provider expiry never expires locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.media_items_set {
            SessionPhase::Complete
        } else {
            SessionPhase::Pending
        }
    }

    /// The URI the user still has to open, if picking is possible at `now`.
    pub fn handoff_uri(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.media_items_set || self.is_expired_at(now) {
            return None;
        }
        self.picker_uri.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    None,
    Creating,
    Pending,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionStateResponse {
    pub state: SessionPhase,
}
