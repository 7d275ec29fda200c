use unfollow_logging::{unfollow_debug, unfollow_info, unfollow_warn};

use crate::alerts::AlertKind;
use crate::batch::{plan_batch, BatchAccepted, BatchKind};
use crate::candidate::CandidateSource;
use crate::ingest::{is_valid_username, parse_delimited, parse_pasted, IngestReport};
use crate::login::parse_login_redirect;
use crate::schedule::{next_check_delay, COMPLETION_SETTLE_DELAY, USER_INFO_RETRY_DELAY};
use crate::state::{Account, InFlightBatch};
use crate::{
    AppState, AuthStatus, Effect, EpochMillis, Msg, OperationsSnapshot, PollSeq, RequestFailure,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started { now_ms } => {
            state.observe_clock(now_ms);
            refresh_now(&mut state)
        }
        Msg::Tick { now_ms } => on_tick(&mut state, now_ms),
        Msg::LoginRedirect(address) => {
            match parse_login_redirect(&address) {
                Ok(redirect) => {
                    state.login_error = redirect.error;
                    state.address = Some(redirect.address);
                    state.mark_dirty();
                }
                Err(err) => unfollow_warn!("Ignoring unparsable landing address: {}", err),
            }
            Vec::new()
        }
        Msg::CandidatesRestored(candidates) => {
            let restored = state.candidates.restore(candidates);
            unfollow_info!("Restored {} candidates from storage", restored);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FileLoaded { name, contents } => {
            let usernames = parse_delimited(&contents);
            if usernames.is_empty() {
                state.notify(AlertKind::Warning, "No valid usernames found in CSV file");
                return (state, Vec::new());
            }
            let report = merge_candidates(&mut state, &usernames, CandidateSource::Csv);
            state.last_upload = Some(name);
            state.notify(
                AlertKind::Success,
                format!(
                    "Loaded {} new usernames from CSV ({} total)",
                    report.added, report.total
                ),
            );
            persist(&state)
        }
        Msg::FileUnreadable { name, reason } => {
            unfollow_warn!("Could not read {}: {}", name, reason);
            state.notify(AlertKind::Error, "Failed to read CSV file");
            Vec::new()
        }
        Msg::TextPasted(text) => {
            let own = state.own_username();
            let usernames = parse_pasted(&text, own.as_deref());
            if usernames.is_empty() {
                state.notify(AlertKind::Warning, "No valid usernames found in pasted text");
                return (state, Vec::new());
            }
            let report = merge_candidates(&mut state, &usernames, CandidateSource::Pasted);
            state.notify(
                AlertKind::Success,
                format!(
                    "Added {} new usernames from pasted text ({} total)",
                    report.added, report.total
                ),
            );
            persist(&state)
        }
        Msg::UsernameEntered(raw) => {
            let username = raw.trim().trim_start_matches('@').to_string();
            if !is_valid_username(&username) {
                state.notify(AlertKind::Warning, format!("Invalid username: {}", raw.trim()));
                return (state, Vec::new());
            }
            let report = merge_candidates(&mut state, &[username.clone()], CandidateSource::Manual);
            if report.added == 0 {
                state.notify(AlertKind::Info, format!("@{username} is already in the list"));
                return (state, Vec::new());
            }
            state.notify(AlertKind::Success, format!("Added @{username}"));
            persist(&state)
        }
        Msg::CandidateToggled { username, selected } => {
            if state.candidates.set_selected(&username, selected) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectAllClicked => {
            state.candidates.select_all();
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectNoneClicked => {
            state.candidates.select_none();
            state.mark_dirty();
            Vec::new()
        }
        Msg::ClearCandidatesClicked => {
            state.candidates.clear();
            state.last_upload = None;
            state.notify(AlertKind::Info, "CSV list cleared");
            persist(&state)
        }
        Msg::BatchRequested(kind) => request_batch(&mut state, kind),
        Msg::BatchConfirmed => confirm_batch(&mut state),
        Msg::BatchDismissed => {
            if state.pending_batch.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BatchSubmitted(result) => batch_submitted(&mut state, result),
        Msg::RefreshClicked | Msg::RefreshDue => refresh_now(&mut state),
        Msg::PollDue => {
            unfollow_info!("Scheduled check: looking for unfollow completions");
            state.next_poll_at = None;
            vec![Effect::PollOperations {
                seq: state.next_poll_seq(),
            }]
        }
        Msg::OperationsPolled {
            seq,
            received_at,
            result,
        } => apply_poll(&mut state, seq, received_at, result),
        Msg::AuthStatusLoaded(result) => auth_status_loaded(&mut state, result),
        Msg::RateLimitsLoaded(result) => {
            match result {
                Ok(limits) => state.merge_rate_limits(limits),
                Err(failure) => unfollow_warn!("Rate limit refresh failed: {}", failure),
            }
            Vec::new()
        }
        Msg::UserInfoRetried(result) => match result {
            Ok(()) => vec![Effect::FetchAuthStatus],
            Err(failure) => {
                unfollow_warn!("User info retry failed: {}", failure);
                Vec::new()
            }
        },
        Msg::ElapsedTick {
            operation_id,
            now_ms,
        } => {
            state.observe_clock(now_ms);
            if state.tickers.is_ticking(&operation_id) {
                state.mark_dirty();
                Vec::new()
            } else {
                unfollow_debug!("Tick for untracked operation {}; stopping it", operation_id);
                vec![Effect::StopTicker { operation_id }]
            }
        }
        Msg::DetailsRequested { operation_id } => {
            vec![Effect::FetchOperationDetails { operation_id }]
        }
        Msg::DetailsLoaded(result) => {
            match result {
                Ok(details) => {
                    state.details = Some(details);
                    state.mark_dirty();
                }
                Err(failure) => state.notify(
                    AlertKind::Error,
                    failure.user_message("Failed to get operation details"),
                ),
            }
            Vec::new()
        }
        Msg::DetailsDismissed => {
            if state.details.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CancelOperationClicked { operation_id } => {
            vec![Effect::CancelOperation { operation_id }]
        }
        Msg::OperationCancelled(result) => match result {
            Ok(message) => {
                state.notify(
                    AlertKind::Success,
                    message.unwrap_or_else(|| "Operation cancelled".to_string()),
                );
                poll_now(&mut state)
            }
            Err(failure) => {
                state.notify(
                    AlertKind::Error,
                    failure.user_message("Failed to cancel operation"),
                );
                Vec::new()
            }
        },
        Msg::ClearBatchesClicked => vec![Effect::ClearAllBatches],
        Msg::BatchesCleared(result) => match result {
            Ok(cleared) => {
                state.notify(
                    AlertKind::Success,
                    format!("Cleared {cleared} batch operations"),
                );
                poll_now(&mut state)
            }
            Err(failure) => {
                state.notify(AlertKind::Error, failure.user_message("Failed to clear batches"));
                Vec::new()
            }
        },
        Msg::RefreshTokenClicked => vec![Effect::RefreshToken],
        Msg::TokenRefreshed(result) => match result {
            Ok(()) => {
                state.notify(
                    AlertKind::Success,
                    "Authentication token refreshed successfully",
                );
                vec![Effect::FetchAuthStatus]
            }
            Err(RequestFailure::Network(detail)) => {
                unfollow_warn!("Token refresh transport failure: {}", detail);
                state.notify(AlertKind::Error, "Failed to refresh token");
                Vec::new()
            }
            Err(failure) => {
                state.notify(AlertKind::Error, failure.user_message("Token refresh failed"));
                Vec::new()
            }
        },
        Msg::AlertLogToggled => {
            state.alert_log_visible = !state.alert_log_visible;
            state.mark_dirty();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn on_tick(state: &mut AppState, now_ms: EpochMillis) -> Vec<Effect> {
    state.observe_clock(now_ms);
    state.expire_banner();
    match state.take_expired_rate_limit_reset() {
        Some(reset) => {
            unfollow_info!("Rate limit window reset at {}; refreshing", reset);
            vec![Effect::FetchRateLimits]
        }
        None => Vec::new(),
    }
}

/// Manual or delayed refresh: account status and operations, immediately.
fn refresh_now(state: &mut AppState) -> Vec<Effect> {
    let mut effects = vec![Effect::FetchAuthStatus];
    effects.extend(poll_now(state));
    effects
}

fn poll_now(state: &mut AppState) -> Vec<Effect> {
    vec![Effect::PollOperations {
        seq: state.next_poll_seq(),
    }]
}

fn persist(state: &AppState) -> Vec<Effect> {
    vec![Effect::PersistCandidates(state.candidates_snapshot())]
}

fn merge_candidates(
    state: &mut AppState,
    usernames: &[String],
    source: CandidateSource,
) -> IngestReport {
    let added = state.candidates.add(usernames, source, state.clock);
    state.mark_dirty();
    IngestReport {
        parsed: usernames.len(),
        added,
        total: state.candidates.len(),
    }
}

fn request_batch(state: &mut AppState, kind: BatchKind) -> Vec<Effect> {
    if state.in_flight.is_some() {
        unfollow_debug!("Batch request ignored while a submission is in flight");
        return Vec::new();
    }
    match plan_batch(kind, state.candidates.selected_usernames()) {
        Ok(plan) => {
            state.pending_batch = Some(plan);
            state.mark_dirty();
        }
        Err(rejection) => state.notify(AlertKind::Warning, rejection.message()),
    }
    Vec::new()
}

fn confirm_batch(state: &mut AppState) -> Vec<Effect> {
    if state.in_flight.is_some() {
        return Vec::new();
    }
    let Some(plan) = state.pending_batch.take() else {
        return Vec::new();
    };
    state.in_flight = Some(InFlightBatch {
        kind: plan.kind,
        accounts: plan.usernames.len(),
    });
    state.mark_dirty();
    vec![Effect::SubmitBatch {
        interval_minutes: plan.kind.interval_minutes(),
        batch_type: plan.kind.batch_type().to_string(),
        usernames: plan.usernames,
    }]
}

fn batch_submitted(
    state: &mut AppState,
    result: Result<BatchAccepted, RequestFailure>,
) -> Vec<Effect> {
    // Cleared on every outcome.
    let submitted = state.in_flight.take();
    state.mark_dirty();

    match result {
        Ok(accepted) => {
            let accounts = submitted.map_or(0, |batch| batch.accounts);
            let message = if accepted.queued {
                format!(
                    "Batch queued at position {}",
                    accepted
                        .queue_position
                        .map_or_else(|| "unknown".to_string(), |pos| pos.to_string())
                )
            } else {
                match (submitted.map(|batch| batch.kind), accepted.estimated_duration_hours) {
                    (Some(BatchKind::Slow { interval_minutes }), Some(hours)) => format!(
                        "Started {interval_minutes}-minute slow batch operation for {accounts} users ({hours} hours)"
                    ),
                    _ => format!("Batch started for {accounts} users"),
                }
            };
            let kind = if accepted.queued {
                AlertKind::Info
            } else {
                AlertKind::Success
            };
            state.notify(kind, message);
            state.candidates.select_none();
            poll_now(state)
        }
        Err(RequestFailure::Network(detail)) => {
            unfollow_warn!("Batch submission failed: {}", detail);
            state.notify(AlertKind::Error, "Network error occurred");
            Vec::new()
        }
        Err(failure) => {
            state.notify(AlertKind::Error, failure.user_message("Failed to start batch"));
            Vec::new()
        }
    }
}

fn apply_poll(
    state: &mut AppState,
    seq: PollSeq,
    received_at: EpochMillis,
    result: Result<OperationsSnapshot, RequestFailure>,
) -> Vec<Effect> {
    state.observe_clock(received_at);
    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(failure) => {
            unfollow_warn!("Operations poll #{} failed: {}", seq, failure);
            return Vec::new();
        }
    };

    // Unfollows and completions are reported once, so they apply even when
    // a newer snapshot already replaced the operation list.
    let mut effects = Vec::new();

    let removed = snapshot
        .successful_unfollows
        .iter()
        .filter(|username| state.candidates.remove(username))
        .count();
    if removed > 0 {
        unfollow_info!(
            "Auto-removed {} successfully unfollowed users from the list",
            removed
        );
        state.mark_dirty();
        effects.push(Effect::PersistCandidates(state.candidates_snapshot()));
    }

    if !snapshot.completion_notifications.is_empty() {
        for notification in &snapshot.completion_notifications {
            unfollow_info!(
                "Unfollow completion: {}/{} for {}",
                notification.completed_count,
                notification.total_count,
                notification.operation_id
            );
        }
        effects.push(Effect::ScheduleRefresh {
            after: COMPLETION_SETTLE_DELAY,
        });
    }

    if seq <= state.applied_poll_seq {
        unfollow_debug!(
            "Ignoring operations from stale poll #{} (already applied #{})",
            seq,
            state.applied_poll_seq
        );
        return effects;
    }
    state.applied_poll_seq = seq;

    let tickers = state.replace_operations(snapshot.operations);
    state.adopt_operation_rate_limits();
    effects.extend(
        tickers
            .stop
            .into_iter()
            .map(|operation_id| Effect::StopTicker { operation_id }),
    );
    effects.extend(
        tickers
            .start
            .into_iter()
            .map(|operation_id| Effect::StartTicker { operation_id }),
    );

    effects.extend(schedule_next_poll(state));
    effects
}

/// Always disarms the pending poll first; arms at most one replacement.
fn schedule_next_poll(state: &mut AppState) -> Vec<Effect> {
    let mut effects = vec![Effect::CancelScheduledPoll];
    state.next_poll_at = None;

    if !state.operations.iter().any(|operation| operation.is_running()) {
        unfollow_info!("No active operations - scheduled checking disabled");
        return effects;
    }

    if let Some(after) = next_check_delay(&state.operations, state.clock) {
        unfollow_info!(
            "Next check scheduled in {:.1} minutes (next expected unfollow + buffer)",
            after.as_secs_f64() / 60.0
        );
        state.next_poll_at = Some(state.clock + after.as_millis() as EpochMillis);
        effects.push(Effect::SchedulePoll { after });
    }
    effects
}

fn auth_status_loaded(
    state: &mut AppState,
    result: Result<AuthStatus, RequestFailure>,
) -> Vec<Effect> {
    let status = match result {
        Ok(status) => status,
        Err(failure) => {
            unfollow_warn!("Auth status check failed: {}", failure);
            return Vec::new();
        }
    };
    state.mark_dirty();
    if !status.authenticated {
        state.account = None;
        return Vec::new();
    }

    let account = Account {
        username: status.username,
        display_name: status.display_name,
    };
    let retry = account.is_loading();
    state.account = Some(account);
    if let Some(limits) = status.rate_limits {
        state.merge_rate_limits(limits);
    }

    if retry {
        unfollow_info!("Account details still loading; retrying shortly");
        vec![Effect::RetryUserInfo {
            after: USER_INFO_RETRY_DELAY,
        }]
    } else {
        Vec::new()
    }
}
