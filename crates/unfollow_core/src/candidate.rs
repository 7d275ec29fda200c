use std::collections::BTreeSet;

use crate::EpochMillis;

/// How a candidate entered the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    Csv,
    Pasted,
    Manual,
}

impl CandidateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateSource::Csv => "csv",
            CandidateSource::Pasted => "pasted",
            CandidateSource::Manual => "manual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "csv" => Some(CandidateSource::Csv),
            "pasted" => Some(CandidateSource::Pasted),
            "manual" => Some(CandidateSource::Manual),
            _ => None,
        }
    }
}

/// A username queued for a future unfollow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub username: String,
    pub source: CandidateSource,
}

/// Usernames are unique ignoring ASCII case; the first casing seen is kept.
pub fn username_key(username: &str) -> String {
    username.to_ascii_lowercase()
}

fn id_serial(id: &str) -> Option<u64> {
    id.rsplit_once('_')?.1.parse().ok()
}

/// Working set of candidates plus the user's current selection.
///
/// The selection only ever holds keys of candidates that are present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
    selected: BTreeSet<String>,
    /// Suffix for the next generated id; never reused within a store.
    next_serial: u64,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn contains(&self, username: &str) -> bool {
        let key = username_key(username);
        self.candidates
            .iter()
            .any(|candidate| username_key(&candidate.username) == key)
    }

    /// Appends usernames that are not yet present and returns how many were added.
    ///
    /// A non-zero result rebuilds the list, which clears the selection.
    pub fn add(&mut self, usernames: &[String], source: CandidateSource, stamp: EpochMillis) -> usize {
        let mut known: BTreeSet<String> = self
            .candidates
            .iter()
            .map(|candidate| username_key(&candidate.username))
            .collect();

        let mut added = 0;
        for username in usernames {
            if !known.insert(username_key(username)) {
                continue;
            }
            let serial = self.next_serial;
            self.next_serial += 1;
            self.candidates.push(Candidate {
                id: format!("{}_{}_{}", source.as_str(), stamp, serial),
                username: username.clone(),
                source,
            });
            added += 1;
        }

        if added > 0 {
            self.selected.clear();
        }
        added
    }

    /// Removes `username`; returns whether an entry was removed.
    pub fn remove(&mut self, username: &str) -> bool {
        let key = username_key(username);
        let before = self.candidates.len();
        self.candidates
            .retain(|candidate| username_key(&candidate.username) != key);
        if self.candidates.len() == before {
            return false;
        }
        self.selected.remove(&key);
        true
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.selected.clear();
    }

    /// Replaces the list with a previously persisted one, dropping duplicates.
    pub fn restore(&mut self, candidates: Vec<Candidate>) -> usize {
        self.clear();
        let mut known = BTreeSet::new();
        for candidate in candidates {
            if known.insert(username_key(&candidate.username)) {
                if let Some(serial) = id_serial(&candidate.id) {
                    self.next_serial = self.next_serial.max(serial.saturating_add(1));
                }
                self.candidates.push(candidate);
            }
        }
        self.candidates.len()
    }

    /// Marks or unmarks a candidate; returns whether the selection changed.
    pub fn set_selected(&mut self, username: &str, selected: bool) -> bool {
        if !self.contains(username) {
            return false;
        }
        let key = username_key(username);
        if selected {
            self.selected.insert(key)
        } else {
            self.selected.remove(&key)
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self
            .candidates
            .iter()
            .map(|candidate| username_key(&candidate.username))
            .collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, username: &str) -> bool {
        self.selected.contains(&username_key(username))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected usernames in list order, with their stored casing.
    pub fn selected_usernames(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|candidate| self.selected.contains(&username_key(&candidate.username)))
            .map(|candidate| candidate.username.clone())
            .collect()
    }
}
