use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use unfollow_core::{
    badge_tone, estimate_hours, format_elapsed, format_reset, plan_batch, update, AlertKind,
    AppState, AuthStatus, BadgeTone, BatchAccepted, BatchKind, BatchRejection, Effect, Msg,
    Quota, RateLimitWindow, RateLimits, RequestFailure, ALERT_LOG_CAPACITY,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(unfollow_logging::initialize_for_tests);
}

fn selected(names: &[&str]) -> AppState {
    let (state, _) = update(AppState::new(), Msg::TextPasted(names.join("\n")));
    let (state, _) = update(state, Msg::SelectAllClicked);
    state
}

fn confirmed(kind: BatchKind) -> (AppState, Vec<Effect>) {
    let state = selected(&["alice", "bob", "carol"]);
    let (state, _) = update(state, Msg::BatchRequested(kind));
    update(state, Msg::BatchConfirmed)
}

#[test]
fn batch_with_empty_selection_is_refused() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::BatchRequested(BatchKind::Regular));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.pending_batch, None);
    assert_eq!(view.banner.kind, AlertKind::Warning);
    assert_eq!(
        view.banner.message,
        "Please select at least one account to unfollow"
    );
}

#[test]
fn slow_batch_over_one_hundred_is_refused() {
    init_logging();
    let names: Vec<String> = (0..101).map(|index| format!("user{index}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let state = selected(&refs);
    assert_eq!(state.view().selected_count, 101);

    let (state, effects) = update(
        state,
        Msg::BatchRequested(BatchKind::Slow {
            interval_minutes: 30,
        }),
    );
    assert!(effects.is_empty());
    assert_eq!(
        state.view().banner.message,
        "Maximum 100 accounts allowed for slow batch"
    );

    // The same selection fits a regular batch.
    let (state, _) = update(state, Msg::BatchRequested(BatchKind::Regular));
    assert!(state.view().pending_batch.is_some());
}

#[test]
fn oversized_regular_batch_names_the_regular_limit() {
    let names: Vec<String> = (0..1001).map(|index| format!("user{index}")).collect();
    let rejection = plan_batch(BatchKind::Regular, names).unwrap_err();
    assert_eq!(
        rejection,
        BatchRejection::TooMany {
            kind: BatchKind::Regular
        }
    );
    assert_eq!(rejection.message(), "Maximum 1000 accounts allowed per batch");
}

#[test]
fn confirmed_batch_is_submitted_once() {
    init_logging();
    let state = selected(&["alice", "bob", "carol"]);
    let (state, effects) = update(state, Msg::BatchRequested(BatchKind::Regular));
    assert!(effects.is_empty());
    let plan = state.view().pending_batch.expect("plan awaiting confirmation");
    assert_eq!(plan.estimated_hours, 0.5);
    assert_eq!(
        plan.prompt(),
        "Start batch unfollow for 3 accounts? Estimated duration: 0.5 hours, 15-minute intervals between unfollows."
    );

    let (state, effects) = update(state, Msg::BatchConfirmed);
    assert_eq!(
        effects,
        vec![Effect::SubmitBatch {
            usernames: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            interval_minutes: 15,
            batch_type: "regular".to_string(),
        }]
    );
    assert!(state.is_batch_in_flight());

    let (state, effects) = update(state, Msg::BatchRequested(BatchKind::Regular));
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::BatchConfirmed);
    assert!(effects.is_empty());
    assert!(state.view().pending_batch.is_none());
}

#[test]
fn dismissed_batch_sends_nothing() {
    init_logging();
    let state = selected(&["alice"]);
    let (state, _) = update(state, Msg::BatchRequested(BatchKind::Regular));
    let (state, _) = update(state, Msg::BatchDismissed);
    let (state, effects) = update(state, Msg::BatchConfirmed);
    assert!(effects.is_empty());
    assert!(!state.is_batch_in_flight());
}

#[test]
fn started_batch_clears_selection_and_polls() {
    init_logging();
    let (state, _) = confirmed(BatchKind::Regular);
    let (state, effects) = update(
        state,
        Msg::BatchSubmitted(Ok(BatchAccepted {
            queued: false,
            queue_position: None,
            estimated_duration_hours: Some(0.5),
        })),
    );
    let view = state.view();
    assert!(!view.batch_in_flight);
    assert_eq!(view.selected_count, 0);
    assert_eq!(view.banner.kind, AlertKind::Success);
    assert_eq!(view.banner.message, "Batch started for 3 users");
    assert_eq!(effects, vec![Effect::PollOperations { seq: 1 }]);
}

#[test]
fn slow_batch_start_reports_pace_and_duration() {
    init_logging();
    let (state, effects) = confirmed(BatchKind::Slow {
        interval_minutes: 60,
    });
    assert_eq!(
        effects,
        vec![Effect::SubmitBatch {
            usernames: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            interval_minutes: 60,
            batch_type: "slow".to_string(),
        }]
    );
    let (state, _) = update(
        state,
        Msg::BatchSubmitted(Ok(BatchAccepted {
            queued: false,
            queue_position: None,
            estimated_duration_hours: Some(2.0),
        })),
    );
    assert_eq!(
        state.view().banner.message,
        "Started 60-minute slow batch operation for 3 users (2 hours)"
    );
}

#[test]
fn queued_batch_reports_its_position() {
    init_logging();
    let (state, _) = confirmed(BatchKind::Regular);
    let (state, _) = update(
        state,
        Msg::BatchSubmitted(Ok(BatchAccepted {
            queued: true,
            queue_position: Some(2),
            estimated_duration_hours: None,
        })),
    );
    let view = state.view();
    assert_eq!(view.banner.kind, AlertKind::Info);
    assert_eq!(view.banner.message, "Batch queued at position 2");
}

#[test]
fn rejected_batch_reenables_submission() {
    init_logging();
    let (state, _) = confirmed(BatchKind::Regular);
    let (state, effects) = update(
        state,
        Msg::BatchSubmitted(Err(RequestFailure::Rejected(Some(
            "Rate limit exceeded".to_string(),
        )))),
    );
    assert!(effects.is_empty());
    assert!(!state.is_batch_in_flight());
    assert_eq!(state.view().banner.message, "Rate limit exceeded");
    assert_eq!(state.view().selected_count, 3);

    let (state, _) = update(state, Msg::BatchRequested(BatchKind::Regular));
    let (_, effects) = update(state, Msg::BatchConfirmed);
    assert_eq!(effects.len(), 1);
}

#[test]
fn rejected_batch_without_message_uses_fallback() {
    init_logging();
    let (state, _) = confirmed(BatchKind::Regular);
    let (state, _) = update(
        state,
        Msg::BatchSubmitted(Err(RequestFailure::Rejected(None))),
    );
    assert_eq!(state.view().banner.message, "Failed to start batch");
}

#[test]
fn network_failure_reenables_submission() {
    init_logging();
    let (state, _) = confirmed(BatchKind::Regular);
    let (state, _) = update(
        state,
        Msg::BatchSubmitted(Err(RequestFailure::Network("timed out".to_string()))),
    );
    assert!(!state.is_batch_in_flight());
    assert_eq!(state.view().banner.message, "Network error occurred");
    assert_eq!(state.view().banner.kind, AlertKind::Error);
}

#[test]
fn alert_log_keeps_the_newest_fifty() {
    init_logging();
    let mut state = AppState::new();
    for index in 0..=ALERT_LOG_CAPACITY {
        let (next, _) = update(state, Msg::UsernameEntered(format!("bad name {index}")));
        state = next;
    }
    let log = state.view().alert_log;
    assert_eq!(log.len(), ALERT_LOG_CAPACITY);
    assert_eq!(log[0].message, "Invalid username: bad name 50");
    assert_eq!(log[ALERT_LOG_CAPACITY - 1].message, "Invalid username: bad name 1");
}

#[test]
fn alert_log_toggle_flips_visibility() {
    let (state, _) = update(AppState::new(), Msg::AlertLogToggled);
    assert!(state.view().alert_log_visible);
    let (state, _) = update(state, Msg::AlertLogToggled);
    assert!(!state.view().alert_log_visible);
}

#[test]
fn banner_expires_after_its_lifetime() {
    init_logging();
    let state = AppState::new().with_banner_lifetime(5_000);
    let (state, _) = update(state, Msg::Tick { now_ms: 1_000 });
    let (state, _) = update(state, Msg::ClearCandidatesClicked);
    assert_eq!(state.view().banner.message, "CSV list cleared");

    let (state, _) = update(state, Msg::Tick { now_ms: 5_999 });
    assert_eq!(state.view().banner.message, "CSV list cleared");

    let (mut state, _) = update(state, Msg::Tick { now_ms: 6_000 });
    assert!(state.consume_dirty());
    assert_eq!(state.view().banner.message, "Ready");
    assert_eq!(state.view().alert_log.len(), 1);
}

#[test]
fn login_error_is_parsed_and_query_stripped() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::LoginRedirect(
            "https://console.example/?error=access_denied&error_description=".to_string(),
        ),
    );
    let view = state.view();
    let error = view.login_error.expect("login error");
    assert_eq!(error.title, "User denied access");
    assert_eq!(error.detail, "Check your X Developer Portal configuration");
    assert_eq!(view.address.as_deref(), Some("https://console.example/"));
}

#[test]
fn unknown_login_error_code_is_shown_verbatim() {
    let (state, _) = update(
        AppState::new(),
        Msg::LoginRedirect(
            "https://console.example/home?error=server_error&error_description=Try%20later"
                .to_string(),
        ),
    );
    let error = state.view().login_error.expect("login error");
    assert_eq!(error.title, "server_error");
    assert_eq!(error.detail, "Try later");
}

#[test]
fn clean_landing_address_is_kept() {
    let (state, _) = update(
        AppState::new(),
        Msg::LoginRedirect("https://console.example/?tab=ops".to_string()),
    );
    let view = state.view();
    assert_eq!(view.login_error, None);
    assert_eq!(view.address.as_deref(), Some("https://console.example/?tab=ops"));
}

#[test]
fn startup_checks_account_and_operations() {
    let (state, effects) = update(AppState::new(), Msg::Started { now_ms: 42 });
    assert_eq!(
        effects,
        vec![Effect::FetchAuthStatus, Effect::PollOperations { seq: 1 }]
    );
    assert_eq!(state.clock(), 42);
}

#[test]
fn expired_rate_limit_window_refreshes_once() {
    init_logging();
    let reset_secs = 1_750_000_000;
    let (state, _) = update(
        AppState::new(),
        Msg::RateLimitsLoaded(Ok(RateLimits {
            unfollow: Some(RateLimitWindow {
                remaining: Quota::Known(0),
                limit: Quota::Known(50),
                reset: Some(reset_secs),
            }),
            ..RateLimits::default()
        })),
    );

    let (state, effects) = update(
        state,
        Msg::Tick {
            now_ms: reset_secs * 1000 - 1,
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::Tick {
            now_ms: reset_secs * 1000,
        },
    );
    assert_eq!(effects, vec![Effect::FetchRateLimits]);

    let (_, effects) = update(
        state,
        Msg::Tick {
            now_ms: reset_secs * 1000 + 1_000,
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn placeholder_account_retries_user_info() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::AuthStatusLoaded(Ok(AuthStatus {
            authenticated: true,
            username: Some("Loading...".to_string()),
            ..AuthStatus::default()
        })),
    );
    assert_eq!(
        effects,
        vec![Effect::RetryUserInfo {
            after: Duration::from_secs(10)
        }]
    );
    assert_eq!(state.view().account.and_then(|account| account.username), None);

    let (_, effects) = update(state, Msg::UserInfoRetried(Ok(())));
    assert_eq!(effects, vec![Effect::FetchAuthStatus]);
}

#[test]
fn signed_out_status_clears_the_account() {
    let (state, _) = update(
        AppState::new(),
        Msg::AuthStatusLoaded(Ok(AuthStatus {
            authenticated: true,
            username: Some("owner".to_string()),
            ..AuthStatus::default()
        })),
    );
    assert!(state.view().account.is_some());
    let (state, effects) = update(state, Msg::AuthStatusLoaded(Ok(AuthStatus::default())));
    assert!(effects.is_empty());
    assert!(state.view().account.is_none());
}

#[test]
fn cancel_and_clear_report_and_repoll() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::CancelOperationClicked {
            operation_id: "op-7".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::CancelOperation {
            operation_id: "op-7".to_string()
        }]
    );
    let (state, effects) = update(state, Msg::OperationCancelled(Ok(None)));
    assert_eq!(state.view().banner.message, "Operation cancelled");
    assert_eq!(effects, vec![Effect::PollOperations { seq: 1 }]);

    let (state, effects) = update(state, Msg::ClearBatchesClicked);
    assert_eq!(effects, vec![Effect::ClearAllBatches]);
    let (state, effects) = update(state, Msg::BatchesCleared(Ok(3)));
    assert_eq!(state.view().banner.message, "Cleared 3 batch operations");
    assert_eq!(effects, vec![Effect::PollOperations { seq: 2 }]);

    let (state, effects) = update(
        state,
        Msg::OperationCancelled(Err(RequestFailure::Rejected(Some(
            "Operation already finished".to_string(),
        )))),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().banner.message, "Operation already finished");
}

#[test]
fn token_refresh_outcomes() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::RefreshTokenClicked);
    assert_eq!(effects, vec![Effect::RefreshToken]);

    let (state, effects) = update(state, Msg::TokenRefreshed(Ok(())));
    assert_eq!(
        state.view().banner.message,
        "Authentication token refreshed successfully"
    );
    assert_eq!(effects, vec![Effect::FetchAuthStatus]);

    let (state, _) = update(state, Msg::TokenRefreshed(Err(RequestFailure::Rejected(None))));
    assert_eq!(state.view().banner.message, "Token refresh failed");

    let (state, _) = update(
        state,
        Msg::TokenRefreshed(Err(RequestFailure::Network("refused".to_string()))),
    );
    assert_eq!(state.view().banner.message, "Failed to refresh token");
}

#[test]
fn details_round_trip_through_state() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::DetailsRequested {
            operation_id: "op".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::FetchOperationDetails {
            operation_id: "op".to_string()
        }]
    );
    let (state, _) = update(
        state,
        Msg::DetailsLoaded(Err(RequestFailure::Rejected(Some(
            "Operation not found".to_string(),
        )))),
    );
    assert_eq!(state.view().banner.message, "Operation not found");
    assert!(state.view().details.is_none());
}

#[test]
fn badge_tones_follow_remaining_share() {
    let window = |remaining, limit| RateLimitWindow {
        remaining,
        limit,
        reset: None,
    };
    assert_eq!(badge_tone(&window(Quota::Known(11), Quota::Known(50))), BadgeTone::Healthy);
    assert_eq!(badge_tone(&window(Quota::Known(10), Quota::Known(50))), BadgeTone::Low);
    assert_eq!(badge_tone(&window(Quota::Known(0), Quota::Known(50))), BadgeTone::Exhausted);
    assert_eq!(badge_tone(&window(Quota::Unknown, Quota::Known(50))), BadgeTone::NoData);
    assert_eq!(badge_tone(&window(Quota::Known(0), Quota::Unknown)), BadgeTone::NoData);
}

#[test]
fn duration_formatting() {
    assert_eq!(estimate_hours(1, 15), 0.0);
    assert_eq!(estimate_hours(1000, 15), 249.8);
    assert_eq!(estimate_hours(100, 60), 99.0);

    assert_eq!(format_elapsed(5), "5s");
    assert_eq!(format_elapsed(65), "1m 5s");
    assert_eq!(format_elapsed(3_725), "1h 2m 5s");

    assert_eq!(format_reset(None, 0), "unknown");
    assert_eq!(format_reset(Some(100), 200), "now");
    assert_eq!(format_reset(Some(1_000 + 3_900), 1_000), "in 1h 5m");
    assert_eq!(format_reset(Some(1_000 + 240), 1_000), "in 4m");
}
