use unfollow_logging::{unfollow_debug, unfollow_error, unfollow_info, unfollow_warn};

use crate::alerts::{AlertEntry, AlertKind, AlertLog, StatusBanner, DEFAULT_BANNER_LIFETIME_MS};
use crate::batch::{BatchKind, BatchPlan};
use crate::candidate::{Candidate, CandidateStore};
use crate::login::LoginError;
use crate::tickers::{TickerDiff, TickerSet};
use crate::{EpochMillis, OperationDetails, PollSeq, RateLimits, RemoteOperation};

/// Display names the server returns while it has not resolved the account yet.
const PLACEHOLDER_NAMES: [&str; 3] = ["User", "Loading...", "Rate Limited"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: Option<String>,
    pub display_name: Option<String>,
}

impl Account {
    /// The account's own handle, unless the server sent a placeholder.
    pub fn own_username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .filter(|name| !PLACEHOLDER_NAMES.contains(name))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.username.as_deref(), Some("Loading...") | Some("Rate Limited"))
    }
}

/// A batch submission awaiting the server's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightBatch {
    pub kind: BatchKind,
    pub accounts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) clock: EpochMillis,
    pub(crate) candidates: CandidateStore,
    pub(crate) last_upload: Option<String>,
    pub(crate) account: Option<Account>,
    pub(crate) address: Option<String>,
    pub(crate) login_error: Option<LoginError>,
    pub(crate) operations: Vec<RemoteOperation>,
    pub(crate) rate_limits: RateLimits,
    pub(crate) handled_rate_limit_reset: Option<i64>,
    pub(crate) alerts: AlertLog,
    pub(crate) alert_log_visible: bool,
    pub(crate) banner: Option<StatusBanner>,
    pub(crate) banner_lifetime_ms: EpochMillis,
    pub(crate) pending_batch: Option<BatchPlan>,
    pub(crate) in_flight: Option<InFlightBatch>,
    pub(crate) last_poll_seq: PollSeq,
    pub(crate) applied_poll_seq: PollSeq,
    pub(crate) next_poll_at: Option<EpochMillis>,
    pub(crate) tickers: TickerSet,
    pub(crate) details: Option<OperationDetails>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            clock: 0,
            candidates: CandidateStore::new(),
            last_upload: None,
            account: None,
            address: None,
            login_error: None,
            operations: Vec::new(),
            rate_limits: RateLimits::default(),
            handled_rate_limit_reset: None,
            alerts: AlertLog::default(),
            alert_log_visible: false,
            banner: None,
            banner_lifetime_ms: DEFAULT_BANNER_LIFETIME_MS,
            pending_batch: None,
            in_flight: None,
            last_poll_seq: 0,
            applied_poll_seq: 0,
            next_poll_at: None,
            tickers: TickerSet::default(),
            details: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banner_lifetime(mut self, lifetime_ms: EpochMillis) -> Self {
        self.banner_lifetime_ms = lifetime_ms.max(0);
        self
    }

    pub fn clock(&self) -> EpochMillis {
        self.clock
    }

    pub fn candidates(&self) -> &CandidateStore {
        &self.candidates
    }

    /// Full candidate list in the order it is persisted.
    pub fn candidates_snapshot(&self) -> Vec<Candidate> {
        self.candidates.candidates().to_vec()
    }

    pub fn operations(&self) -> &[RemoteOperation] {
        &self.operations
    }

    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn is_batch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn tickers(&self) -> &TickerSet {
        &self.tickers
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Advances the local clock; never moves it backwards.
    pub(crate) fn observe_clock(&mut self, now: EpochMillis) {
        if now > self.clock {
            self.clock = now;
        }
    }

    pub(crate) fn next_poll_seq(&mut self) -> PollSeq {
        self.last_poll_seq += 1;
        self.last_poll_seq
    }

    /// Publishes a status message: sets the banner and appends to the alert log.
    pub(crate) fn notify(&mut self, kind: AlertKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            AlertKind::Error => unfollow_error!("status: {}", message),
            AlertKind::Warning => unfollow_warn!("status: {}", message),
            AlertKind::Success | AlertKind::Info => unfollow_info!("status: {}", message),
        }
        self.alerts.push(AlertEntry {
            kind,
            message: message.clone(),
            at: self.clock,
        });
        self.banner = Some(StatusBanner {
            kind,
            message,
            expires_at: self.clock + self.banner_lifetime_ms,
        });
        self.mark_dirty();
    }

    pub(crate) fn expire_banner(&mut self) {
        let expired = self
            .banner
            .as_ref()
            .is_some_and(|banner| banner.expires_at <= self.clock);
        if expired {
            self.banner = None;
            self.mark_dirty();
        }
    }

    pub(crate) fn own_username(&self) -> Option<String> {
        self.account
            .as_ref()
            .and_then(Account::own_username)
            .map(ToOwned::to_owned)
    }

    pub(crate) fn replace_operations(&mut self, operations: Vec<RemoteOperation>) -> TickerDiff {
        self.operations = operations
            .into_iter()
            .map(RemoteOperation::normalized)
            .collect();
        self.mark_dirty();
        self.tickers.sync(&self.operations)
    }

    /// The first running operation that carries rate limits replaces every
    /// displayed window, including ones it does not report.
    pub(crate) fn adopt_operation_rate_limits(&mut self) {
        let latest = self
            .operations
            .iter()
            .find(|operation| operation.is_running() && operation.rate_limits.is_some())
            .and_then(|operation| operation.rate_limits.clone());
        if let Some(limits) = latest {
            unfollow_debug!("Adopting rate limits from running operation");
            self.rate_limits = limits;
            self.mark_dirty();
        }
    }

    pub(crate) fn merge_rate_limits(&mut self, limits: RateLimits) {
        self.rate_limits.merge(limits);
        self.mark_dirty();
    }

    /// Returns the newly expired reset timestamp, at most once per timestamp.
    pub(crate) fn take_expired_rate_limit_reset(&mut self) -> Option<i64> {
        let expired = self.rate_limits.latest_expired_reset(self.clock / 1000)?;
        if self
            .handled_rate_limit_reset
            .is_some_and(|handled| handled >= expired)
        {
            return None;
        }
        self.handled_rate_limit_reset = Some(expired);
        Some(expired)
    }
}
