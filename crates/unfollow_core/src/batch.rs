pub const REGULAR_BATCH_MAX: usize = 1000;
pub const REGULAR_INTERVAL_MINUTES: u32 = 15;
pub const SLOW_BATCH_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Up to 1000 accounts at the standard 15-minute pace.
    Regular,
    /// Up to 100 accounts at a caller-chosen pace.
    Slow { interval_minutes: u32 },
}

impl BatchKind {
    pub fn max_accounts(self) -> usize {
        match self {
            BatchKind::Regular => REGULAR_BATCH_MAX,
            BatchKind::Slow { .. } => SLOW_BATCH_MAX,
        }
    }

    pub fn interval_minutes(self) -> u32 {
        match self {
            BatchKind::Regular => REGULAR_INTERVAL_MINUTES,
            BatchKind::Slow { interval_minutes } => interval_minutes,
        }
    }

    pub fn batch_type(self) -> &'static str {
        match self {
            BatchKind::Regular => "regular",
            BatchKind::Slow { .. } => "slow",
        }
    }
}

/// A validated batch waiting for the user's go-ahead.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub kind: BatchKind,
    pub usernames: Vec<String>,
    pub estimated_hours: f64,
}

impl BatchPlan {
    pub fn prompt(&self) -> String {
        format!(
            "Start {} unfollow for {} accounts? Estimated duration: {} hours, {}-minute intervals between unfollows.",
            match self.kind {
                BatchKind::Regular => "batch",
                BatchKind::Slow { .. } => "slow batch",
            },
            self.usernames.len(),
            self.estimated_hours,
            self.kind.interval_minutes()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchRejection {
    EmptySelection,
    TooMany { kind: BatchKind },
    ZeroInterval,
}

impl BatchRejection {
    pub fn message(self) -> String {
        match self {
            BatchRejection::EmptySelection => {
                "Please select at least one account to unfollow".to_string()
            }
            BatchRejection::TooMany { kind } => match kind {
                BatchKind::Regular => {
                    format!("Maximum {REGULAR_BATCH_MAX} accounts allowed per batch")
                }
                BatchKind::Slow { .. } => {
                    format!("Maximum {SLOW_BATCH_MAX} accounts allowed for slow batch")
                }
            },
            BatchRejection::ZeroInterval => "Interval must be at least one minute".to_string(),
        }
    }
}

/// Server acknowledgement of a submitted batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchAccepted {
    pub queued: bool,
    pub queue_position: Option<u32>,
    pub estimated_duration_hours: Option<f64>,
}

pub fn plan_batch(kind: BatchKind, usernames: Vec<String>) -> Result<BatchPlan, BatchRejection> {
    if usernames.is_empty() {
        return Err(BatchRejection::EmptySelection);
    }
    if usernames.len() > kind.max_accounts() {
        return Err(BatchRejection::TooMany { kind });
    }
    if kind.interval_minutes() == 0 {
        return Err(BatchRejection::ZeroInterval);
    }
    let estimated_hours = estimate_hours(usernames.len(), kind.interval_minutes());
    Ok(BatchPlan {
        kind,
        usernames,
        estimated_hours,
    })
}

/// The first unfollow runs immediately, so `n` accounts take `n - 1` intervals.
pub fn estimate_hours(accounts: usize, interval_minutes: u32) -> f64 {
    let steps = accounts.saturating_sub(1) as f64;
    let hours = steps * f64::from(interval_minutes) / 60.0;
    (hours * 10.0).round() / 10.0
}
