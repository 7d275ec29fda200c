use std::time::Duration;

use crate::alerts::{AlertEntry, AlertKind};
use crate::batch::BatchPlan;
use crate::{
    AppState, CandidateSource, EpochMillis, OperationDetails, OperationId, OperationStatus, Quota,
    RateLimitWindow, RemoteOperation,
};

/// Share of the limit above which a rate-limit window counts as healthy.
pub const HEALTHY_REMAINING_PERCENT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub address: Option<String>,
    pub account: Option<AccountView>,
    pub login_error: Option<LoginErrorView>,
    pub banner: BannerView,
    pub alert_log_visible: bool,
    pub alert_log: Vec<AlertEntry>,
    pub candidates: Vec<CandidateRow>,
    pub candidate_count: usize,
    pub selected_count: usize,
    pub last_upload: Option<String>,
    pub operations: Vec<OperationRow>,
    pub rate_limits: Vec<RateLimitBadge>,
    pub pending_batch: Option<BatchPlan>,
    pub batch_in_flight: bool,
    pub next_poll_in: Option<Duration>,
    pub details: Option<OperationDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub display_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginErrorView {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerView {
    pub kind: AlertKind,
    pub message: String,
}

impl Default for BannerView {
    fn default() -> Self {
        Self {
            kind: AlertKind::Info,
            message: "Ready".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub username: String,
    pub source: CandidateSource,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRow {
    pub id: OperationId,
    pub status: OperationStatus,
    pub total: u32,
    pub completed: u32,
    pub succeeded: u32,
    pub percent: u32,
    pub detail: String,
    pub estimated_completion: Option<String>,
    pub cancellable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Healthy,
    Low,
    Exhausted,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitBadge {
    pub label: &'static str,
    pub text: String,
    pub tone: BadgeTone,
    pub resets: String,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let now = self.clock;
        AppViewModel {
            address: self.address.clone(),
            account: self.account.as_ref().map(|account| AccountView {
                display_name: account
                    .display_name
                    .clone()
                    .or_else(|| account.username.clone())
                    .unwrap_or_else(|| "User".to_string()),
                username: account.own_username().map(ToOwned::to_owned),
            }),
            login_error: self.login_error.as_ref().map(|error| LoginErrorView {
                title: error.title(),
                detail: error.detail().to_string(),
            }),
            banner: self
                .banner
                .as_ref()
                .map(|banner| BannerView {
                    kind: banner.kind,
                    message: banner.message.clone(),
                })
                .unwrap_or_default(),
            alert_log_visible: self.alert_log_visible,
            alert_log: self.alerts.iter().cloned().collect(),
            candidates: self
                .candidates
                .candidates()
                .iter()
                .map(|candidate| CandidateRow {
                    username: candidate.username.clone(),
                    source: candidate.source,
                    selected: self.candidates.is_selected(&candidate.username),
                })
                .collect(),
            candidate_count: self.candidates.len(),
            selected_count: self.candidates.selected_count(),
            last_upload: self.last_upload.clone(),
            operations: self
                .operations
                .iter()
                .map(|operation| operation_row(operation, now))
                .collect(),
            rate_limits: self
                .rate_limits
                .windows()
                .map(|(which, window)| RateLimitBadge {
                    label: which.label(),
                    text: badge_text(window),
                    tone: badge_tone(window),
                    resets: format_reset(window.reset, now / 1000),
                })
                .collect(),
            pending_batch: self.pending_batch.clone(),
            batch_in_flight: self.in_flight.is_some(),
            next_poll_in: self
                .next_poll_at
                .map(|at| Duration::from_millis((at - now).max(0) as u64)),
            details: self.details.clone(),
        }
    }
}

fn operation_row(operation: &RemoteOperation, now: EpochMillis) -> OperationRow {
    let detail = match operation.status {
        OperationStatus::Queued => format!(
            "Queue position: {}",
            operation
                .queue_position
                .map_or_else(|| "Unknown".to_string(), |pos| pos.to_string())
        ),
        OperationStatus::WaitingForLookupReset => match operation.lookup_wait_minutes {
            Some(minutes) => format!(
                "Waiting for rate limit reset: {}m remaining",
                minutes.ceil().max(0.0) as u64
            ),
            None => "Waiting for rate limit reset: Processing...".to_string(),
        },
        OperationStatus::Running => match operation.start_ms {
            Some(start) => format!(
                "Running: {} elapsed",
                format_elapsed(((now - start).max(0) / 1000) as u64)
            ),
            None => started_line(operation),
        },
        OperationStatus::Starting
        | OperationStatus::Completed
        | OperationStatus::Cancelled
        | OperationStatus::Error
        | OperationStatus::Unknown => started_line(operation),
    };

    OperationRow {
        id: operation.id.clone(),
        status: operation.status,
        total: operation.total_count,
        completed: operation.completed_count,
        succeeded: operation.success_count,
        percent: operation.progress_percent(),
        detail,
        estimated_completion: operation.estimated_completion.clone(),
        cancellable: operation.status.is_cancellable(),
    }
}

fn started_line(operation: &RemoteOperation) -> String {
    format!(
        "Started: {}",
        operation.start_label.as_deref().unwrap_or("Not started")
    )
}

fn badge_text(window: &RateLimitWindow) -> String {
    match (window.remaining, window.limit) {
        (Quota::Known(remaining), Quota::Known(limit)) => format!("{remaining}/{limit}"),
        _ => "No data".to_string(),
    }
}

/// `unknown` on either side is never treated as zero.
pub fn badge_tone(window: &RateLimitWindow) -> BadgeTone {
    match (window.remaining, window.limit) {
        (Quota::Known(0), Quota::Known(_)) => BadgeTone::Exhausted,
        (Quota::Known(remaining), Quota::Known(limit)) => {
            if u64::from(remaining) * 100 > u64::from(limit) * u64::from(HEALTHY_REMAINING_PERCENT) {
                BadgeTone::Healthy
            } else {
                BadgeTone::Low
            }
        }
        _ => BadgeTone::NoData,
    }
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_elapsed(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Relative reset time: `in 1h 5m`, `in 4m`, `now` or `unknown`.
pub fn format_reset(reset: Option<i64>, now_secs: i64) -> String {
    let Some(reset) = reset.filter(|reset| *reset > 0) else {
        return "unknown".to_string();
    };
    let remaining = reset - now_secs;
    if remaining <= 0 {
        return "now".to_string();
    }
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else {
        format!("in {minutes}m")
    }
}
