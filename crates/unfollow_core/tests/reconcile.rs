use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use unfollow_core::{
    update, AppState, CompletionNotification, Effect, EpochMillis, Msg, OperationStatus,
    OperationsSnapshot, Quota, RateLimitWindow, RateLimits, RemoteOperation, RequestFailure,
    COMPLETION_SETTLE_DELAY,
};

const T: EpochMillis = 1_750_000_000_000;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(unfollow_logging::initialize_for_tests);
}

fn running(id: &str) -> RemoteOperation {
    RemoteOperation {
        id: id.to_string(),
        status: OperationStatus::Running,
        total_count: 3,
        completed_count: 1,
        success_count: 1,
        start_ms: Some(T),
        start_label: Some("2025-06-15 15:06:40".to_string()),
        interval_minutes: 15,
        queue_position: None,
        lookup_wait_minutes: None,
        estimated_completion: None,
        rate_limits: None,
    }
}

fn with_candidates(names: &str) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::FileLoaded {
            name: "list.csv".to_string(),
            contents: names.to_string(),
        },
    );
    state
}

fn polled(state: AppState, seq: u64, snapshot: OperationsSnapshot) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::OperationsPolled {
            seq,
            received_at: T,
            result: Ok(snapshot),
        },
    )
}

fn usernames(state: &AppState) -> Vec<String> {
    state
        .candidates()
        .candidates()
        .iter()
        .map(|candidate| candidate.username.clone())
        .collect()
}

#[test]
fn unfollowed_users_leave_the_list_and_the_selection() {
    init_logging();
    let state = with_candidates("alice\nbob\ncarol");
    let (state, _) = update(state, Msg::SelectAllClicked);

    let (state, effects) = polled(
        state,
        1,
        OperationsSnapshot {
            successful_unfollows: vec!["alice".to_string()],
            ..OperationsSnapshot::default()
        },
    );

    assert_eq!(usernames(&state), vec!["bob", "carol"]);
    let view = state.view();
    assert_eq!(view.candidate_count, 2);
    assert_eq!(view.selected_count, 2);
    assert!(!view.candidates.iter().any(|row| row.username == "alice"));
    assert_eq!(
        effects.first(),
        Some(&Effect::PersistCandidates(state.candidates_snapshot()))
    );
}

#[test]
fn unknown_unfollowed_users_are_ignored() {
    init_logging();
    let state = with_candidates("alice");
    let (state, effects) = polled(
        state,
        1,
        OperationsSnapshot {
            successful_unfollows: vec!["stranger".to_string()],
            ..OperationsSnapshot::default()
        },
    );
    assert_eq!(usernames(&state), vec!["alice"]);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::PersistCandidates(_))));
}

#[test]
fn stale_poll_still_removes_unfollowed_users() {
    init_logging();
    let state = with_candidates("alice\nbob");
    let (state, _) = polled(
        state,
        2,
        OperationsSnapshot {
            operations: vec![running("newer")],
            ..OperationsSnapshot::default()
        },
    );

    let (state, effects) = polled(
        state,
        1,
        OperationsSnapshot {
            operations: vec![running("older")],
            successful_unfollows: vec!["alice".to_string()],
            ..OperationsSnapshot::default()
        },
    );

    assert_eq!(state.operations()[0].id, "newer");
    assert_eq!(usernames(&state), vec!["bob"]);
    assert!(!state.candidates().contains("alice"));
    assert!(matches!(
        effects.as_slice(),
        [Effect::PersistCandidates(saved)] if saved.len() == 1 && saved[0].username == "bob"
    ));

    let (state, _) = polled(state, 3, OperationsSnapshot::default());
    assert_eq!(usernames(&state), vec!["bob"]);
}

#[test]
fn stale_poll_without_unfollows_changes_nothing() {
    init_logging();
    let state = with_candidates("alice");
    let (state, _) = polled(
        state,
        2,
        OperationsSnapshot {
            operations: vec![running("newer")],
            ..OperationsSnapshot::default()
        },
    );
    let (state, effects) = polled(
        state,
        1,
        OperationsSnapshot {
            operations: vec![running("older")],
            ..OperationsSnapshot::default()
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.operations()[0].id, "newer");
    assert_eq!(usernames(&state), vec!["alice"]);
}

#[test]
fn stale_completion_notification_still_refreshes() {
    init_logging();
    let (state, _) = polled(AppState::new(), 2, OperationsSnapshot::default());
    let (_, effects) = polled(
        state,
        1,
        OperationsSnapshot {
            completion_notifications: vec![CompletionNotification {
                operation_id: "op1".to_string(),
                completed_count: 3,
                total_count: 3,
            }],
            ..OperationsSnapshot::default()
        },
    );
    assert_eq!(
        effects,
        vec![Effect::ScheduleRefresh {
            after: COMPLETION_SETTLE_DELAY
        }]
    );
}

#[test]
fn completion_notification_schedules_a_delayed_refresh() {
    init_logging();
    let (state, effects) = polled(
        AppState::new(),
        1,
        OperationsSnapshot {
            operations: vec![running("op")],
            completion_notifications: vec![CompletionNotification {
                operation_id: "op".to_string(),
                completed_count: 1,
                total_count: 3,
            }],
            ..OperationsSnapshot::default()
        },
    );
    assert!(effects.contains(&Effect::ScheduleRefresh {
        after: Duration::from_secs(1)
    }));

    let (_, effects) = update(state, Msg::RefreshDue);
    assert_eq!(
        effects,
        vec![Effect::FetchAuthStatus, Effect::PollOperations { seq: 1 }]
    );
}

#[test]
fn tickers_follow_running_operations() {
    init_logging();
    let (state, effects) = polled(
        AppState::new(),
        1,
        OperationsSnapshot {
            operations: vec![running("a"), running("b")],
            ..OperationsSnapshot::default()
        },
    );
    assert!(effects.contains(&Effect::StartTicker {
        operation_id: "a".to_string()
    }));
    assert!(effects.contains(&Effect::StartTicker {
        operation_id: "b".to_string()
    }));
    assert_eq!(state.tickers().len(), 2);

    let mut finished = running("a");
    finished.status = OperationStatus::Completed;
    finished.completed_count = 3;
    let (state, effects) = polled(
        state,
        2,
        OperationsSnapshot {
            operations: vec![finished, running("b")],
            ..OperationsSnapshot::default()
        },
    );
    let ticker_effects: Vec<_> = effects
        .into_iter()
        .filter(|effect| {
            matches!(
                effect,
                Effect::StartTicker { .. } | Effect::StopTicker { .. }
            )
        })
        .collect();
    assert_eq!(
        ticker_effects,
        vec![Effect::StopTicker {
            operation_id: "a".to_string()
        }]
    );
    assert!(state.tickers().is_ticking("b"));
    assert!(!state.tickers().is_ticking("a"));
}

#[test]
fn elapsed_tick_for_a_retired_operation_stops_it() {
    init_logging();
    let (mut state, _) = polled(
        AppState::new(),
        1,
        OperationsSnapshot {
            operations: vec![running("op")],
            ..OperationsSnapshot::default()
        },
    );
    state.consume_dirty();

    let (mut state, effects) = update(
        state,
        Msg::ElapsedTick {
            operation_id: "op".to_string(),
            now_ms: T + 65_000,
        },
    );
    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    assert_eq!(state.view().operations[0].detail, "Running: 1m 5s elapsed");

    let (_, effects) = update(
        state,
        Msg::ElapsedTick {
            operation_id: "gone".to_string(),
            now_ms: T + 66_000,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::StopTicker {
            operation_id: "gone".to_string()
        }]
    );
}

#[test]
fn running_operation_rate_limits_replace_the_display() {
    init_logging();
    let window = RateLimitWindow {
        remaining: Quota::Known(40),
        limit: Quota::Known(50),
        reset: Some(1_750_000_900),
    };
    let mut op = running("op");
    op.rate_limits = Some(RateLimits {
        unfollow: Some(window),
        ..RateLimits::default()
    });

    let (state, _) = update(
        AppState::new(),
        Msg::RateLimitsLoaded(Ok(RateLimits {
            unfollow: Some(RateLimitWindow {
                remaining: Quota::Known(50),
                limit: Quota::Known(50),
                reset: None,
            }),
            user_lookup: Some(RateLimitWindow::unknown()),
            ..RateLimits::default()
        })),
    );
    let (state, _) = polled(
        state,
        1,
        OperationsSnapshot {
            operations: vec![op],
            ..OperationsSnapshot::default()
        },
    );

    assert_eq!(state.rate_limits().unfollow, Some(window));
    assert_eq!(state.rate_limits().user_lookup, None);
    let badges = state.view().rate_limits;
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].text, "40/50");
}

#[test]
fn fetched_rate_limits_merge_into_the_display() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::RateLimitsLoaded(Ok(RateLimits {
            user_lookup: Some(RateLimitWindow::unknown()),
            ..RateLimits::default()
        })),
    );
    let (state, _) = update(
        state,
        Msg::RateLimitsLoaded(Ok(RateLimits {
            unfollow: Some(RateLimitWindow {
                remaining: Quota::Known(40),
                limit: Quota::Known(50),
                reset: None,
            }),
            ..RateLimits::default()
        })),
    );
    let badges = state.view().rate_limits;
    assert_eq!(badges[0].text, "40/50");
    assert_eq!(badges[1].text, "No data");
}

#[test]
fn counters_are_clamped_on_display() {
    init_logging();
    let mut op = running("op");
    op.completed_count = 9;
    op.success_count = 12;
    let (state, _) = polled(
        AppState::new(),
        1,
        OperationsSnapshot {
            operations: vec![op],
            ..OperationsSnapshot::default()
        },
    );
    let row = &state.view().operations[0];
    assert_eq!((row.completed, row.succeeded, row.total), (3, 3, 3));
    assert_eq!(row.percent, 100);
}

#[test]
fn failed_poll_leaves_state_untouched() {
    init_logging();
    let (state, _) = polled(
        with_candidates("alice"),
        1,
        OperationsSnapshot {
            operations: vec![running("op")],
            ..OperationsSnapshot::default()
        },
    );
    let before = state.operations().to_vec();

    let (state, effects) = update(
        state,
        Msg::OperationsPolled {
            seq: 2,
            received_at: T,
            result: Err(RequestFailure::Network("connection reset".to_string())),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.operations(), before.as_slice());
    assert_eq!(state.view().banner.message, "Loaded 1 new usernames from CSV (1 total)");
}
