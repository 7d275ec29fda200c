use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use unfollow_client::AtomicFileWriter;
use unfollow_core::{is_valid_username, Candidate, CandidateSource};
use unfollow_logging::{unfollow_error, unfollow_info, unfollow_warn};

const CANDIDATES_FILENAME: &str = "candidates.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedCandidate {
    id: String,
    username: String,
    source: String,
}

/// The candidate list on disk, rewritten whole on every change.
#[derive(Debug, Clone)]
pub(crate) struct CandidateStorage {
    writer: AtomicFileWriter,
}

impl CandidateStorage {
    pub(crate) fn new(state_dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(state_dir),
        }
    }

    /// Never fails: unreadable or malformed data starts an empty list.
    pub(crate) fn load(&self) -> Vec<Candidate> {
        let stored: Vec<PersistedCandidate> = match self.writer.read_json(CANDIDATES_FILENAME) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(err) => {
                unfollow_error!(
                    "Failed to load candidates from {:?}: {}",
                    self.writer.dir(),
                    err
                );
                return Vec::new();
            }
        };

        let candidates: Vec<Candidate> = stored
            .into_iter()
            .filter_map(|entry| {
                let Some(source) = CandidateSource::parse(&entry.source) else {
                    unfollow_warn!(
                        "Skipping stored candidate {} with unknown source {:?}",
                        entry.username,
                        entry.source
                    );
                    return None;
                };
                if !is_valid_username(&entry.username) {
                    unfollow_warn!("Skipping invalid stored username {:?}", entry.username);
                    return None;
                }
                Some(Candidate {
                    id: entry.id,
                    username: entry.username,
                    source,
                })
            })
            .collect();

        unfollow_info!("Loaded {} stored candidates", candidates.len());
        candidates
    }

    /// Failures are logged; the in-memory list stays authoritative.
    pub(crate) fn save(&self, candidates: &[Candidate]) {
        let stored: Vec<PersistedCandidate> = candidates
            .iter()
            .map(|candidate| PersistedCandidate {
                id: candidate.id.clone(),
                username: candidate.username.clone(),
                source: candidate.source.as_str().to_string(),
            })
            .collect();

        if let Err(err) = self.writer.write_json(CANDIDATES_FILENAME, &stored) {
            unfollow_error!(
                "Failed to save {} candidates to {:?}: {}",
                stored.len(),
                self.writer.dir(),
                err
            );
        }
    }
}
