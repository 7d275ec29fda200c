use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use unfollow_client::{
    ApiError, BatchRequest, EngineEvent, EngineHandle, WireBatchAccepted, WireOperation,
    WireOperationDetails, WireOperationList, WireQuota, WireRateLimitWindow, WireRateLimits,
    WireStatus,
};
use unfollow_core::{
    AuthStatus, BatchAccepted, CompletionNotification, Effect, EpochMillis, Msg, OperationDetails,
    OperationStatus, OperationsSnapshot, Quota, RateLimitWindow, RateLimits, RemoteOperation,
    RequestFailure, REGULAR_INTERVAL_MINUTES,
};
use unfollow_logging::{unfollow_debug, unfollow_info, unfollow_warn};

use super::persistence::CandidateStorage;

/// Executes core effects against the engine and local storage.
pub(crate) struct EffectRunner {
    engine: EngineHandle,
    storage: CandidateStorage,
}

impl EffectRunner {
    pub(crate) fn new(engine: EngineHandle, storage: CandidateStorage) -> Self {
        Self { engine, storage }
    }

    pub(crate) fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchAuthStatus => self.engine.fetch_status(),
                Effect::FetchRateLimits => self.engine.fetch_rate_limits(),
                Effect::RetryUserInfo { after } => self.engine.retry_user_info_after(after),
                Effect::PollOperations { seq } => {
                    unfollow_debug!("Polling operations (#{})", seq);
                    self.engine.poll_operations(seq);
                }
                Effect::SchedulePoll { after } => self.engine.arm_poll(after),
                Effect::CancelScheduledPoll => self.engine.cancel_poll(),
                Effect::ScheduleRefresh { after } => self.engine.refresh_after(after),
                Effect::SubmitBatch {
                    usernames,
                    interval_minutes,
                    batch_type,
                } => {
                    unfollow_info!(
                        "Submitting {} batch of {} accounts at {}-minute intervals",
                        batch_type,
                        usernames.len(),
                        interval_minutes
                    );
                    self.engine.submit_batch(BatchRequest {
                        usernames,
                        interval_minutes,
                        batch_type,
                    });
                }
                Effect::FetchOperationDetails { operation_id } => {
                    self.engine.fetch_details(operation_id)
                }
                Effect::CancelOperation { operation_id } => {
                    unfollow_info!("Cancelling operation {}", operation_id);
                    self.engine.cancel_operation(operation_id);
                }
                Effect::ClearAllBatches => self.engine.clear_batches(),
                Effect::RefreshToken => self.engine.refresh_token(),
                Effect::PersistCandidates(candidates) => self.storage.save(&candidates),
                Effect::StartTicker { operation_id } => self.engine.start_ticker(operation_id),
                Effect::StopTicker { operation_id } => self.engine.stop_ticker(operation_id),
            }
        }
    }

    pub(crate) fn try_recv(&self, now_ms: EpochMillis) -> Option<Msg> {
        self.engine.try_recv().map(|event| map_event(event, now_ms))
    }
}

pub(crate) fn map_event(event: EngineEvent, now_ms: EpochMillis) -> Msg {
    match event {
        EngineEvent::StatusLoaded(result) => {
            Msg::AuthStatusLoaded(result.map(map_status).map_err(map_failure))
        }
        EngineEvent::RateLimitsLoaded(result) => {
            Msg::RateLimitsLoaded(result.map(map_rate_limits).map_err(map_failure))
        }
        EngineEvent::OperationsPolled { seq, result } => Msg::OperationsPolled {
            seq,
            received_at: now_ms,
            result: result.map(map_snapshot).map_err(map_failure),
        },
        EngineEvent::BatchSubmitted(result) => {
            Msg::BatchSubmitted(result.map(map_accepted).map_err(map_failure))
        }
        EngineEvent::DetailsLoaded {
            operation_id,
            result,
        } => Msg::DetailsLoaded(
            result
                .map(|details| map_details(operation_id, details))
                .map_err(map_failure),
        ),
        EngineEvent::OperationCancelled(result) => {
            Msg::OperationCancelled(result.map_err(map_failure))
        }
        EngineEvent::BatchesCleared(result) => Msg::BatchesCleared(result.map_err(map_failure)),
        EngineEvent::TokenRefreshed(result) => Msg::TokenRefreshed(result.map_err(map_failure)),
        EngineEvent::UserInfoRetried(result) => Msg::UserInfoRetried(result.map_err(map_failure)),
        EngineEvent::PollDue => Msg::PollDue,
        EngineEvent::RefreshDue => Msg::RefreshDue,
        EngineEvent::ElapsedTick { operation_id } => Msg::ElapsedTick {
            operation_id,
            now_ms,
        },
    }
}

fn map_failure(err: ApiError) -> RequestFailure {
    match err {
        ApiError::Rejected { status, message } => {
            unfollow_warn!("Request rejected with status {}", status);
            RequestFailure::Rejected(message)
        }
        other => RequestFailure::Network(other.to_string()),
    }
}

fn map_status(status: WireStatus) -> AuthStatus {
    let user_id = status.user_id_text();
    AuthStatus {
        authenticated: status.authenticated,
        username: status.username,
        display_name: status.display_name,
        user_id,
        rate_limits: status.rate_limits.map(map_rate_limits),
    }
}

fn map_quota(quota: Option<WireQuota>) -> Quota {
    match quota {
        Some(WireQuota::Count(count)) => Quota::Known(u32::try_from(count).unwrap_or(u32::MAX)),
        Some(WireQuota::Text(_)) | None => Quota::Unknown,
    }
}

fn map_window(window: WireRateLimitWindow) -> RateLimitWindow {
    let reset = window.reset_at();
    RateLimitWindow {
        remaining: map_quota(window.remaining),
        limit: map_quota(window.limit),
        reset,
    }
}

fn map_rate_limits(limits: WireRateLimits) -> RateLimits {
    RateLimits {
        unfollow: limits.unfollow.map(map_window),
        unfollow_hourly: limits.unfollow_hourly.map(map_window),
        unfollow_daily: limits.unfollow_daily.map(map_window),
        user_lookup: limits.user_lookup.map(map_window),
    }
}

fn map_operation(operation: WireOperation) -> Option<RemoteOperation> {
    let Some(id) = operation.key().map(ToOwned::to_owned) else {
        unfollow_warn!("Dropping operation without an id: {:?}", operation.status);
        return None;
    };
    let status = OperationStatus::parse(&operation.status);
    if status == OperationStatus::Unknown {
        unfollow_warn!("Operation {} has unrecognised status {:?}", id, operation.status);
    }
    let start_ms = operation.start_time.as_deref().and_then(parse_start_time);

    Some(
        RemoteOperation {
            id,
            status,
            total_count: operation.total_count,
            completed_count: operation.completed_count,
            success_count: operation.success_count,
            start_ms,
            start_label: operation.start_time,
            interval_minutes: operation
                .interval_minutes
                .unwrap_or(REGULAR_INTERVAL_MINUTES),
            queue_position: operation.queue_position,
            lookup_wait_minutes: operation.lookup_wait_minutes,
            estimated_completion: operation.estimated_completion,
            rate_limits: operation.rate_limits.map(map_rate_limits),
        }
        .normalized(),
    )
}

fn map_snapshot(list: WireOperationList) -> OperationsSnapshot {
    OperationsSnapshot {
        operations: list.operations.into_iter().filter_map(map_operation).collect(),
        successful_unfollows: list.successful_unfollows,
        completion_notifications: list
            .completion_notifications
            .into_iter()
            .map(|notification| CompletionNotification {
                operation_id: notification.operation_id,
                completed_count: notification.completed_count,
                total_count: notification.total_count,
            })
            .collect(),
    }
}

fn map_accepted(accepted: WireBatchAccepted) -> BatchAccepted {
    if let Some(operation_id) = &accepted.operation_id {
        unfollow_info!("Server accepted batch as {}", operation_id);
    }
    BatchAccepted {
        queued: accepted.queued,
        queue_position: accepted.queue_position,
        estimated_duration_hours: accepted.estimated_duration_hours,
    }
}

fn map_details(requested: String, details: WireOperationDetails) -> OperationDetails {
    OperationDetails {
        operation_id: details.operation_id.unwrap_or(requested),
        status: OperationStatus::parse(&details.status),
        completed: details.progress.completed,
        total: details.progress.total,
        percentage: details.progress.percentage,
        successful: details.progress.successful,
        failed: details.progress.failed,
        current_username: details.current.username,
        elapsed_minutes: details.timing.elapsed_minutes,
        next_unfollow_in_minutes: details.timing.next_unfollow_in_minutes,
        estimated_completion: details.timing.estimated_completion,
    }
}

/// Start times carry an offset (RFC 3339) or are local wall-clock times.
pub(crate) fn parse_start_time(raw: &str) -> Option<EpochMillis> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).timestamp_millis());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.timestamp_millis())
}
