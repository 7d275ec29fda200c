//! Unfollow console core: pure state machine, reconciliation and poll scheduling.
mod alerts;
mod batch;
mod candidate;
mod effect;
mod ingest;
mod login;
mod msg;
mod operation;
mod schedule;
mod state;
mod tickers;
mod update;
mod view_model;

pub use alerts::{
    AlertEntry, AlertKind, AlertLog, StatusBanner, ALERT_LOG_CAPACITY, DEFAULT_BANNER_LIFETIME_MS,
};
pub use batch::{
    estimate_hours, plan_batch, BatchAccepted, BatchKind, BatchPlan, BatchRejection,
    REGULAR_BATCH_MAX, REGULAR_INTERVAL_MINUTES, SLOW_BATCH_MAX,
};
pub use candidate::{username_key, Candidate, CandidateSource, CandidateStore};
pub use effect::Effect;
pub use ingest::{is_valid_username, parse_delimited, parse_pasted, IngestReport, MAX_USERNAME_LEN};
pub use login::{parse_login_redirect, LoginError, LoginRedirect};
pub use msg::Msg;
pub use operation::{
    AuthStatus, CompletionNotification, EpochMillis, OperationDetails, OperationId,
    OperationStatus, OperationsSnapshot, PollSeq, Quota, RateLimitWindow, RateLimits, RateWindow,
    RemoteOperation, RequestFailure,
};
pub use schedule::{
    next_check_delay, COMPLETION_SETTLE_DELAY, MIN_LEAD_MS, SAFETY_BUFFER_MS,
    USER_INFO_RETRY_DELAY,
};
pub use state::{Account, AppState, InFlightBatch};
pub use tickers::{TickerDiff, TickerSet};
pub use update::update;
pub use view_model::{
    badge_tone, format_elapsed, format_reset, AccountView, AppViewModel, BadgeTone, BannerView,
    CandidateRow, LoginErrorView, OperationRow, RateLimitBadge, HEALTHY_REMAINING_PERCENT,
};
