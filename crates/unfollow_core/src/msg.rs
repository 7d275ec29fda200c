use crate::{
    AuthStatus, BatchAccepted, BatchKind, Candidate, EpochMillis, OperationDetails, OperationId,
    OperationsSnapshot, PollSeq, RateLimits, RequestFailure,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Startup finished: check the account and load operations.
    Started { now_ms: EpochMillis },
    /// Clock tick from the UI loop; expires banners and detects rate-limit resets.
    Tick { now_ms: EpochMillis },
    /// The landing address the console was opened with.
    LoginRedirect(String),
    /// Candidate list read back from durable storage.
    CandidatesRestored(Vec<Candidate>),
    /// Contents of an uploaded delimited-text file.
    FileLoaded { name: String, contents: String },
    /// The uploaded file could not be read.
    FileUnreadable { name: String, reason: String },
    /// Free text pasted by the user.
    TextPasted(String),
    /// A single username typed by the user.
    UsernameEntered(String),
    CandidateToggled { username: String, selected: bool },
    SelectAllClicked,
    SelectNoneClicked,
    ClearCandidatesClicked,
    /// User asked to start a batch from the current selection.
    BatchRequested(BatchKind),
    BatchConfirmed,
    BatchDismissed,
    BatchSubmitted(Result<BatchAccepted, RequestFailure>),
    /// User-triggered refresh; bypasses the poll schedule.
    RefreshClicked,
    /// Delayed refresh after a completion notification.
    RefreshDue,
    /// The scheduled poll timer fired.
    PollDue,
    OperationsPolled {
        seq: PollSeq,
        received_at: EpochMillis,
        result: Result<OperationsSnapshot, RequestFailure>,
    },
    AuthStatusLoaded(Result<AuthStatus, RequestFailure>),
    RateLimitsLoaded(Result<RateLimits, RequestFailure>),
    UserInfoRetried(Result<(), RequestFailure>),
    /// Per-second tick for a running operation's elapsed-time display.
    ElapsedTick {
        operation_id: OperationId,
        now_ms: EpochMillis,
    },
    DetailsRequested { operation_id: OperationId },
    DetailsLoaded(Result<OperationDetails, RequestFailure>),
    DetailsDismissed,
    CancelOperationClicked { operation_id: OperationId },
    OperationCancelled(Result<Option<String>, RequestFailure>),
    ClearBatchesClicked,
    BatchesCleared(Result<u32, RequestFailure>),
    RefreshTokenClicked,
    TokenRefreshed(Result<(), RequestFailure>),
    AlertLogToggled,
    /// Fallback for unrecognised input.
    NoOp,
}
