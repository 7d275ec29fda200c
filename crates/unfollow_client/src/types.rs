use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a request did not produce the expected payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a failure status or `success: false`.
    #[error("rejected with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transport-level failures, as opposed to answers from the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidUrl(_) | ApiError::Timeout(_) | ApiError::Network(_) | ApiError::Decode(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ApiError),
}

/// Common `{ success, message, error }` wrapper around every answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WireEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WireEnvelope {
    /// The server's explanation: `error` first, then `message`.
    pub fn reason(&self) -> Option<String> {
        self.error
            .iter()
            .chain(self.message.iter())
            .find(|text| !text.trim().is_empty())
            .cloned()
    }
}

/// A quota count, or a marker such as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireQuota {
    Count(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireRateLimitWindow {
    #[serde(default)]
    pub remaining: Option<WireQuota>,
    #[serde(default)]
    pub limit: Option<WireQuota>,
    #[serde(default)]
    pub reset: Option<f64>,
    #[serde(default)]
    pub reset_time: Option<f64>,
}

impl WireRateLimitWindow {
    /// Reset timestamp in Unix seconds under either field name.
    pub fn reset_at(&self) -> Option<i64> {
        self.reset.or(self.reset_time).map(|secs| secs as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireRateLimits {
    #[serde(default)]
    pub unfollow: Option<WireRateLimitWindow>,
    #[serde(default)]
    pub unfollow_hourly: Option<WireRateLimitWindow>,
    #[serde(default)]
    pub unfollow_daily: Option<WireRateLimitWindow>,
    #[serde(default)]
    pub user_lookup: Option<WireRateLimitWindow>,
}

/// `GET /status`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub rate_limits: Option<WireRateLimits>,
}

impl WireStatus {
    /// The account id as text; the server sends it as a string or a number.
    pub fn user_id_text(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireOperation {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub completed_count: u32,
    #[serde(default)]
    pub success_count: u32,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub interval_minutes: Option<u32>,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub lookup_wait_minutes: Option<f64>,
    #[serde(default)]
    pub estimated_completion: Option<String>,
    #[serde(default)]
    pub rate_limits: Option<WireRateLimits>,
}

impl WireOperation {
    /// Older servers only send `id`.
    pub fn key(&self) -> Option<&str> {
        self.operation_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WireCompletion {
    #[serde(default)]
    pub operation_id: String,
    #[serde(default)]
    pub completed_count: u32,
    #[serde(default)]
    pub total_count: u32,
}

/// `GET /unfollow/slow-batch/list`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireOperationList {
    #[serde(default)]
    pub operations: Vec<WireOperation>,
    #[serde(default)]
    pub successful_unfollows: Vec<String>,
    #[serde(default)]
    pub completion_notifications: Vec<WireCompletion>,
}

/// `POST /unfollow/slow-batch` acknowledgement.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireBatchAccepted {
    #[serde(default)]
    pub queued: bool,
    #[serde(default)]
    pub queue_position: Option<u32>,
    #[serde(default)]
    pub estimated_duration_hours: Option<f64>,
    #[serde(default)]
    pub operation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireProgress {
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub successful: u32,
    #[serde(default)]
    pub failed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WireCurrent {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireTiming {
    #[serde(default)]
    pub elapsed_minutes: Option<f64>,
    #[serde(default)]
    pub next_unfollow_in_minutes: Option<f64>,
    #[serde(default)]
    pub estimated_completion: Option<String>,
}

/// `GET /unfollow/slow-batch/{id}/status`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WireOperationDetails {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: WireProgress,
    #[serde(default)]
    pub current: WireCurrent,
    #[serde(default)]
    pub timing: WireTiming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequest {
    pub usernames: Vec<String>,
    pub interval_minutes: u32,
    pub batch_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusLoaded(Result<WireStatus, ApiError>),
    RateLimitsLoaded(Result<WireRateLimits, ApiError>),
    OperationsPolled {
        seq: u64,
        result: Result<WireOperationList, ApiError>,
    },
    BatchSubmitted(Result<WireBatchAccepted, ApiError>),
    DetailsLoaded {
        operation_id: String,
        result: Result<WireOperationDetails, ApiError>,
    },
    OperationCancelled(Result<Option<String>, ApiError>),
    BatchesCleared(Result<u32, ApiError>),
    TokenRefreshed(Result<(), ApiError>),
    UserInfoRetried(Result<(), ApiError>),
    /// The armed poll timer fired.
    PollDue,
    /// A delayed refresh came due.
    RefreshDue,
    ElapsedTick { operation_id: String },
}
