use std::time::Duration;

use crate::{Candidate, OperationId, PollSeq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `GET /status`.
    FetchAuthStatus,
    /// `GET /api/rate-limits`.
    FetchRateLimits,
    /// `POST /api/retry-user-info` once `after` has elapsed.
    RetryUserInfo { after: Duration },
    /// `GET /unfollow/slow-batch/list`, tagged for stale-response detection.
    PollOperations { seq: PollSeq },
    /// Arm the single poll timer; replaces any armed timer.
    SchedulePoll { after: Duration },
    /// Disarm the poll timer if armed.
    CancelScheduledPoll,
    /// Deliver `Msg::RefreshDue` once `after` has elapsed.
    ScheduleRefresh { after: Duration },
    SubmitBatch {
        usernames: Vec<String>,
        interval_minutes: u32,
        batch_type: String,
    },
    FetchOperationDetails { operation_id: OperationId },
    CancelOperation { operation_id: OperationId },
    ClearAllBatches,
    RefreshToken,
    /// Overwrite the durable candidate list with this full list.
    PersistCandidates(Vec<Candidate>),
    StartTicker { operation_id: OperationId },
    StopTicker { operation_id: OperationId },
}
