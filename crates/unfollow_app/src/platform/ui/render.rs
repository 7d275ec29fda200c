use std::fmt::Write;

use unfollow_core::{AlertKind, AppViewModel, BadgeTone, OperationDetails, OperationRow};

use super::constants::*;

/// Renders the whole dashboard as one block of text.
///
/// `confirmation` is a yes/no question owned by the terminal front end
/// (cancel, clear-batches); batch confirmation comes from the view itself.
pub fn render(view: &AppViewModel, confirmation: Option<&str>) -> String {
    let mut out = String::new();

    let header = match &view.account {
        Some(account) => match &account.username {
            Some(username) => format!("Signed in as {} (@{})", account.display_name, username),
            None => format!("Signed in as {}", account.display_name),
        },
        None => "Not signed in".to_string(),
    };
    push_line(&mut out, &header);
    if let Some(address) = &view.address {
        push_line(&mut out, &format!("Opened from {address}"));
    }
    if let Some(error) = &view.login_error {
        push_line(&mut out, &format!("!! {}: {}", error.title, error.detail));
    }
    push_line(
        &mut out,
        &format!("[{}] {}", kind_marker(view.banner.kind), view.banner.message),
    );
    push_line(&mut out, RULE);

    if view.rate_limits.is_empty() {
        push_line(&mut out, "Rate limits: No data");
    } else {
        for badge in &view.rate_limits {
            push_line(
                &mut out,
                &format!(
                    "{:<18} {:>9} {:<10} resets {}",
                    badge.label,
                    badge.text,
                    tone_label(badge.tone),
                    badge.resets
                ),
            );
        }
    }
    push_line(&mut out, RULE);

    if view.operations.is_empty() {
        push_line(&mut out, "No unfollow operations");
    } else {
        for operation in &view.operations {
            render_operation(&mut out, operation);
        }
    }
    match view.next_poll_in {
        Some(delay) => push_line(
            &mut out,
            &format!("Next check in {}s", delay.as_secs()),
        ),
        None => push_line(&mut out, "No check scheduled"),
    }
    if let Some(details) = &view.details {
        render_details(&mut out, details);
    }
    push_line(&mut out, RULE);

    push_line(
        &mut out,
        &format!(
            "Candidates: {} ({} selected)",
            view.candidate_count, view.selected_count
        ),
    );
    if let Some(upload) = &view.last_upload {
        push_line(&mut out, &format!("Last upload: {upload}"));
    }
    for row in view.candidates.iter().take(MAX_CANDIDATE_ROWS) {
        push_line(
            &mut out,
            &format!(
                "  [{}] @{} ({})",
                if row.selected { 'x' } else { ' ' },
                row.username,
                row.source.as_str()
            ),
        );
    }
    if view.candidates.len() > MAX_CANDIDATE_ROWS {
        push_line(
            &mut out,
            &format!("  ... and {} more", view.candidates.len() - MAX_CANDIDATE_ROWS),
        );
    }

    if view.alert_log_visible {
        push_line(&mut out, RULE);
        push_line(&mut out, &format!("Alerts ({})", view.alert_log.len()));
        for entry in view.alert_log.iter().rev().take(MAX_ALERT_ROWS) {
            push_line(
                &mut out,
                &format!("  {:<8} {}", entry.kind.label(), entry.message),
            );
        }
    }

    push_line(&mut out, RULE);
    if view.batch_in_flight {
        push_line(&mut out, "Submitting batch...");
    }
    if let Some(plan) = &view.pending_batch {
        push_line(&mut out, &format!("{} (yes/no)", plan.prompt()));
    } else if let Some(question) = confirmation {
        push_line(&mut out, &format!("{question} (yes/no)"));
    }
    out.push_str("> ");
    out
}

fn render_operation(out: &mut String, operation: &OperationRow) {
    push_line(
        out,
        &format!(
            "{} [{}] {}/{} ({}%), {} succeeded",
            operation.id,
            operation.status.label(),
            operation.completed,
            operation.total,
            operation.percent,
            operation.succeeded
        ),
    );
    push_line(out, &format!("    {}", operation.detail));
    if let Some(eta) = &operation.estimated_completion {
        push_line(out, &format!("    Estimated completion: {eta}"));
    }
}

fn render_details(out: &mut String, details: &OperationDetails) {
    push_line(out, RULE);
    push_line(
        out,
        &format!(
            "Details for {} [{}]",
            details.operation_id,
            details.status.label()
        ),
    );
    push_line(
        out,
        &format!(
            "  Progress: {}/{} ({:.1}%), {} ok, {} failed",
            details.completed, details.total, details.percentage, details.successful, details.failed
        ),
    );
    if let Some(current) = &details.current_username {
        push_line(out, &format!("  Current: @{current}"));
    }
    if let Some(elapsed) = details.elapsed_minutes {
        push_line(out, &format!("  Elapsed: {elapsed:.1} minutes"));
    }
    if let Some(next) = details.next_unfollow_in_minutes {
        push_line(out, &format!("  Next unfollow in: {next:.1} minutes"));
    }
    if let Some(eta) = &details.estimated_completion {
        push_line(out, &format!("  Estimated completion: {eta}"));
    }
}

fn push_line(out: &mut String, line: &str) {
    let _ = writeln!(out, "{line}");
}

fn kind_marker(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Success => "ok",
        AlertKind::Error => "error",
        AlertKind::Warning => "warn",
        AlertKind::Info => "info",
    }
}

fn tone_label(tone: BadgeTone) -> &'static str {
    match tone {
        BadgeTone::Healthy => "",
        BadgeTone::Low => "(low)",
        BadgeTone::Exhausted => "(exhausted)",
        BadgeTone::NoData => "(no data)",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use unfollow_core::{
        AccountView, BatchKind, BatchPlan, CandidateRow, CandidateSource, OperationStatus,
        RateLimitBadge,
    };

    use super::*;

    fn candidate(username: &str, selected: bool) -> CandidateRow {
        CandidateRow {
            username: username.to_string(),
            source: CandidateSource::Manual,
            selected,
        }
    }

    #[test]
    fn empty_view_shows_defaults() {
        let text = render(&AppViewModel::default(), None);
        assert!(text.contains("Not signed in"));
        assert!(text.contains("[info] Ready"));
        assert!(text.contains("Rate limits: No data"));
        assert!(text.contains("No unfollow operations"));
        assert!(text.contains("Candidates: 0 (0 selected)"));
        assert!(text.ends_with("> "));
    }

    #[test]
    fn populated_view_lists_everything() {
        let view = AppViewModel {
            account: Some(AccountView {
                display_name: "Alice A".to_string(),
                username: Some("alice".to_string()),
            }),
            rate_limits: vec![RateLimitBadge {
                label: "Unfollows / 15m",
                text: "3/50".to_string(),
                tone: BadgeTone::Low,
                resets: "in 4m".to_string(),
            }],
            operations: vec![OperationRow {
                id: "op1".to_string(),
                status: OperationStatus::Running,
                total: 10,
                completed: 4,
                succeeded: 4,
                percent: 40,
                detail: "Running: 1m 5s elapsed".to_string(),
                estimated_completion: Some("18:30".to_string()),
                cancellable: true,
            }],
            next_poll_in: Some(Duration::from_secs(90)),
            candidates: vec![candidate("bob", true), candidate("carol", false)],
            candidate_count: 2,
            selected_count: 1,
            ..AppViewModel::default()
        };

        let text = render(&view, None);
        assert!(text.contains("Signed in as Alice A (@alice)"));
        assert!(text.contains("3/50"));
        assert!(text.contains("(low)"));
        assert!(text.contains("resets in 4m"));
        assert!(text.contains("op1 [Running] 4/10 (40%), 4 succeeded"));
        assert!(text.contains("Running: 1m 5s elapsed"));
        assert!(text.contains("Estimated completion: 18:30"));
        assert!(text.contains("Next check in 90s"));
        assert!(text.contains("[x] @bob (manual)"));
        assert!(text.contains("[ ] @carol (manual)"));
    }

    #[test]
    fn long_candidate_lists_are_summarised() {
        let candidates: Vec<CandidateRow> = (0..MAX_CANDIDATE_ROWS + 3)
            .map(|index| candidate(&format!("user{index}"), false))
            .collect();
        let view = AppViewModel {
            candidate_count: candidates.len(),
            candidates,
            ..AppViewModel::default()
        };
        let text = render(&view, None);
        assert!(text.contains("... and 3 more"));
        assert!(!text.contains(&format!("@user{}", MAX_CANDIDATE_ROWS)));
    }

    #[test]
    fn batch_prompt_takes_precedence_over_terminal_question() {
        let plan = BatchPlan {
            kind: BatchKind::Regular,
            usernames: vec!["bob".to_string()],
            estimated_hours: 0.3,
        };
        let view = AppViewModel {
            pending_batch: Some(plan.clone()),
            ..AppViewModel::default()
        };
        let text = render(&view, Some("Cancel operation op1?"));
        assert!(text.contains(&format!("{} (yes/no)", plan.prompt())));
        assert!(!text.contains("Cancel operation op1?"));

        let text = render(&AppViewModel::default(), Some("Cancel operation op1?"));
        assert!(text.contains("Cancel operation op1? (yes/no)"));
    }
}
