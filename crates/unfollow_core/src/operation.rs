use std::fmt;

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

pub type OperationId = String;

/// Sequence number attached to every operations poll.
pub type PollSeq = u64;

/// Server-side lifecycle of a batch operation.
///
/// Wire strings the client does not know decode to `Unknown` so that no
/// caller silently treats them as one of the known states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    Queued,
    Starting,
    Running,
    WaitingForLookupReset,
    Completed,
    Cancelled,
    Error,
    Unknown,
}

impl OperationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "queued" => OperationStatus::Queued,
            "starting" => OperationStatus::Starting,
            "running" => OperationStatus::Running,
            "waiting_for_lookup_reset" => OperationStatus::WaitingForLookupReset,
            "completed" => OperationStatus::Completed,
            "cancelled" => OperationStatus::Cancelled,
            "error" => OperationStatus::Error,
            _ => OperationStatus::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationStatus::Queued => "Queued",
            OperationStatus::Starting => "Starting",
            OperationStatus::Running => "Running",
            OperationStatus::WaitingForLookupReset => "Waiting for lookup reset",
            OperationStatus::Completed => "Completed",
            OperationStatus::Cancelled => "Cancelled",
            OperationStatus::Error => "Error",
            OperationStatus::Unknown => "Unknown",
        }
    }

    /// Whether the server still accepts a cancel request for this state.
    pub fn is_cancellable(self) -> bool {
        match self {
            OperationStatus::Queued
            | OperationStatus::Starting
            | OperationStatus::Running
            | OperationStatus::WaitingForLookupReset => true,
            OperationStatus::Completed
            | OperationStatus::Cancelled
            | OperationStatus::Error
            | OperationStatus::Unknown => false,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of one server-tracked batch job.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOperation {
    pub id: OperationId,
    pub status: OperationStatus,
    pub total_count: u32,
    pub completed_count: u32,
    pub success_count: u32,
    /// Parsed start time, when the server reported one we could read.
    pub start_ms: Option<EpochMillis>,
    /// Start time exactly as the server formatted it.
    pub start_label: Option<String>,
    pub interval_minutes: u32,
    pub queue_position: Option<u32>,
    pub lookup_wait_minutes: Option<f64>,
    pub estimated_completion: Option<String>,
    pub rate_limits: Option<RateLimits>,
}

impl RemoteOperation {
    /// Clamps counters so that `success <= completed <= total` holds.
    pub fn normalized(mut self) -> Self {
        self.completed_count = self.completed_count.min(self.total_count);
        self.success_count = self.success_count.min(self.completed_count);
        self
    }

    pub fn progress_percent(&self) -> u32 {
        if self.total_count == 0 {
            return 0;
        }
        let completed = u64::from(self.completed_count.min(self.total_count));
        ((completed * 100) / u64::from(self.total_count)) as u32
    }

    pub fn is_running(&self) -> bool {
        self.status == OperationStatus::Running
    }
}

/// Completion signal for an operation that advanced since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotification {
    pub operation_id: OperationId,
    pub completed_count: u32,
    pub total_count: u32,
}

/// One job-list poll result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationsSnapshot {
    pub operations: Vec<RemoteOperation>,
    pub successful_unfollows: Vec<String>,
    pub completion_notifications: Vec<CompletionNotification>,
}

/// Detailed status of a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDetails {
    pub operation_id: OperationId,
    pub status: OperationStatus,
    pub completed: u32,
    pub total: u32,
    pub percentage: f64,
    pub successful: u32,
    pub failed: u32,
    pub current_username: Option<String>,
    pub elapsed_minutes: Option<f64>,
    pub next_unfollow_in_minutes: Option<f64>,
    pub estimated_completion: Option<String>,
}

/// A count reported by the server, or the literal `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Known(u32),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub remaining: Quota,
    pub limit: Quota,
    /// Unix timestamp (seconds) at which the window resets.
    pub reset: Option<i64>,
}

impl RateLimitWindow {
    pub fn unknown() -> Self {
        Self {
            remaining: Quota::Unknown,
            limit: Quota::Unknown,
            reset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RateWindow {
    Unfollow,
    UnfollowHourly,
    UnfollowDaily,
    UserLookup,
}

impl RateWindow {
    pub const ALL: [RateWindow; 4] = [
        RateWindow::Unfollow,
        RateWindow::UnfollowHourly,
        RateWindow::UnfollowDaily,
        RateWindow::UserLookup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RateWindow::Unfollow => "Unfollows / 15m",
            RateWindow::UnfollowHourly => "Unfollows / hour",
            RateWindow::UnfollowDaily => "Unfollows / day",
            RateWindow::UserLookup => "Lookups / 15m",
        }
    }
}

/// The rate-limit windows the server tracks for this account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateLimits {
    pub unfollow: Option<RateLimitWindow>,
    pub unfollow_hourly: Option<RateLimitWindow>,
    pub unfollow_daily: Option<RateLimitWindow>,
    pub user_lookup: Option<RateLimitWindow>,
}

impl RateLimits {
    pub fn window(&self, which: RateWindow) -> Option<&RateLimitWindow> {
        match which {
            RateWindow::Unfollow => self.unfollow.as_ref(),
            RateWindow::UnfollowHourly => self.unfollow_hourly.as_ref(),
            RateWindow::UnfollowDaily => self.unfollow_daily.as_ref(),
            RateWindow::UserLookup => self.user_lookup.as_ref(),
        }
    }

    pub fn windows(&self) -> impl Iterator<Item = (RateWindow, &RateLimitWindow)> + '_ {
        RateWindow::ALL
            .into_iter()
            .filter_map(|which| self.window(which).map(|window| (which, window)))
    }

    /// Replaces every window present in `newer`; absent windows are kept.
    pub fn merge(&mut self, newer: RateLimits) {
        if newer.unfollow.is_some() {
            self.unfollow = newer.unfollow;
        }
        if newer.unfollow_hourly.is_some() {
            self.unfollow_hourly = newer.unfollow_hourly;
        }
        if newer.unfollow_daily.is_some() {
            self.unfollow_daily = newer.unfollow_daily;
        }
        if newer.user_lookup.is_some() {
            self.user_lookup = newer.user_lookup;
        }
    }

    /// Latest reset timestamp that is already in the past at `now_secs`.
    pub fn latest_expired_reset(&self, now_secs: i64) -> Option<i64> {
        self.windows()
            .filter_map(|(_, window)| window.reset)
            .filter(|reset| *reset > 0 && *reset <= now_secs)
            .max()
    }

    pub fn is_empty(&self) -> bool {
        self.windows().next().is_none()
    }
}

/// Result of the account status probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub user_id: Option<String>,
    pub rate_limits: Option<RateLimits>,
}

/// Why a request to the server did not produce the expected payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFailure {
    /// Transport failure, timeout or undecodable body.
    Network(String),
    /// The server answered and refused, optionally with its own message.
    Rejected(Option<String>),
}

impl RequestFailure {
    /// Message to surface to the user: the server's own text when present.
    pub fn user_message(&self, rejected_fallback: &str) -> String {
        match self {
            RequestFailure::Network(_) => "Network error occurred".to_string(),
            RequestFailure::Rejected(Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            RequestFailure::Rejected(_) => rejected_fallback.to_string(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestFailure::Network(detail) => write!(f, "network failure: {detail}"),
            RequestFailure::Rejected(Some(message)) => write!(f, "rejected: {message}"),
            RequestFailure::Rejected(None) => write!(f, "rejected"),
        }
    }
}
