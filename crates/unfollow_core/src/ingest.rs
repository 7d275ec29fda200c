//! Username extraction from uploaded delimited text and free-text paste.
use std::collections::BTreeSet;

use crate::candidate::username_key;

pub const MAX_USERNAME_LEN: usize = 15;

/// Counts reported back to the user after an ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Valid, de-duplicated usernames found in the input.
    pub parsed: usize,
    /// How many of those were new to the store.
    pub added: usize,
    /// Store size after the merge.
    pub total: usize,
}

pub fn is_valid_username(candidate: &str) -> bool {
    (1..=MAX_USERNAME_LEN).contains(&candidate.len())
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Parses an uploaded list: one username per line, or comma separated.
pub fn parse_delimited(text: &str) -> Vec<String> {
    let tokens = non_blank_lines(text).flat_map(|line| line.split(','));
    dedupe(
        tokens
            .map(strip_decorations)
            .filter(|token| is_valid_username(token))
            .map(ToOwned::to_owned),
    )
}

/// Parses pasted text, one username per line, skipping the caller's own account.
pub fn parse_pasted(text: &str, own_username: Option<&str>) -> Vec<String> {
    let usernames = non_blank_lines(text)
        .map(|line| line.strip_prefix('@').unwrap_or(line))
        .filter(|token| is_valid_username(token))
        .filter(|token| own_username.map_or(true, |own| !token.eq_ignore_ascii_case(own)))
        .map(ToOwned::to_owned);
    dedupe(usernames)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

fn strip_decorations(token: &str) -> &str {
    token.trim_matches(|ch: char| ch.is_whitespace() || matches!(ch, '@' | '"' | '\''))
}

fn dedupe(usernames: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    usernames
        .filter(|username| seen.insert(username_key(username)))
        .collect()
}

