use std::collections::VecDeque;

use crate::EpochMillis;

pub const ALERT_LOG_CAPACITY: usize = 50;
pub const DEFAULT_BANNER_LIFETIME_MS: EpochMillis = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
    Warning,
    Info,
}

impl AlertKind {
    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Error => "error",
            AlertKind::Warning => "warning",
            AlertKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEntry {
    pub kind: AlertKind,
    pub message: String,
    pub at: EpochMillis,
}

/// Bounded history of status messages, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertLog {
    entries: VecDeque<AlertEntry>,
}

impl AlertLog {
    pub fn push(&mut self, entry: AlertEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(ALERT_LOG_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }
}

/// The transient status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub kind: AlertKind,
    pub message: String,
    pub expires_at: EpochMillis,
}
