//! Integration tests for the headless NDJSON request loop
//!
//! These tests drive `run_headless` with in-memory input and verify:
//! - One response line per request line
//! - Session gating when a password is configured
//! - Lockout responses after repeated failures
//! - Malformed lines produce failed responses without stopping the loop

use keyrelay::headless::run_headless;
use keyrelay::models::ResponseStatus;
use keyrelay::services::{AuthGuard, DryRunInjector, InjectedAction, QuickOptionsStore, RuleStore};
use keyrelay::{RelayResponse, RelayService};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

fn protected_service(injector: Arc<DryRunInjector>) -> Arc<RelayService> {
    Arc::new(RelayService::new(
        RuleStore::parse("teh = the"),
        QuickOptionsStore::new("commands.txt", "phrases.txt"),
        AuthGuard::new(Some("hunter2".into()), 2, Duration::from_secs(300)),
        injector,
    ))
}

async fn drive(service: Arc<RelayService>, lines: &[&str]) -> Vec<RelayResponse> {
    let input = lines.join("\n");
    let mut output = Vec::new();

    let answered = assert_ok!(run_headless(service, input.as_bytes(), &mut output).await);

    let responses: Vec<RelayResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), answered);
    responses
}

#[tokio::test]
async fn test_session_must_authenticate() {
    let injector = Arc::new(DryRunInjector::new());
    let responses = drive(
        protected_service(injector.clone()),
        &[
            r#"{"client":"10.0.0.7","session":"a","action":"send","text":"teh cat"}"#,
            r#"{"client":"10.0.0.7","session":"a","action":"auth","password":"hunter2"}"#,
            r#"{"client":"10.0.0.7","session":"a","action":"send","text":"teh cat"}"#,
            r#"{"client":"10.0.0.7","session":"b","action":"send_enter"}"#,
        ],
    )
    .await;

    assert_eq!(responses[0].status, ResponseStatus::Unauthorized);
    assert_eq!(responses[1].authenticated, Some(true));
    assert_eq!(responses[2].status, ResponseStatus::Success);
    // Session "b" never authenticated
    assert_eq!(responses[3].status, ResponseStatus::Unauthorized);

    assert_eq!(injector.actions(), vec![InjectedAction::Text("the cat".into())]);
}

#[tokio::test]
async fn test_lockout_is_reported() {
    let responses = drive(
        protected_service(Arc::new(DryRunInjector::new())),
        &[
            r#"{"client":"10.0.0.9","action":"auth","password":"a"}"#,
            r#"{"client":"10.0.0.9","action":"auth","password":"b"}"#,
            r#"{"client":"10.0.0.9","action":"auth","password":"hunter2"}"#,
            r#"{"client":"10.0.0.9","action":"health"}"#,
        ],
    )
    .await;

    assert_eq!(responses[0].status, ResponseStatus::Failed);
    assert_eq!(responses[1].status, ResponseStatus::Locked);
    assert_eq!(responses[2].status, ResponseStatus::Locked);
    assert!(responses[2].msg.as_deref().unwrap().contains("300"));
    assert_eq!(responses[3].status, ResponseStatus::Ok);
    assert_eq!(responses[3].authenticated, Some(false));
}

#[tokio::test]
async fn test_undo_round_trip_over_protocol() {
    let responses = drive(
        protected_service(Arc::new(DryRunInjector::new())),
        &[
            r#"{"action":"auth","password":"hunter2"}"#,
            r#"{"action":"send","text":"teh end"}"#,
            r#"{"action":"undo"}"#,
            r#"{"action":"undo"}"#,
        ],
    )
    .await;

    assert_eq!(responses[2].content.as_deref(), Some("teh end"));
    assert_eq!(responses[3].status, ResponseStatus::Failed);
    assert!(responses[3].content.is_none());
}

#[tokio::test]
async fn test_malformed_lines_do_not_stop_loop() {
    let responses = drive(
        protected_service(Arc::new(DryRunInjector::new())),
        &[
            "not json",
            "",
            r#"{"action":"teleport"}"#,
            r#"{"action":"health"}"#,
        ],
    )
    .await;

    // The blank line is skipped, not answered
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].status, ResponseStatus::Failed);
    assert_eq!(responses[1].status, ResponseStatus::Failed);
    assert_eq!(responses[2].status, ResponseStatus::Ok);
}

#[tokio::test]
async fn test_open_relay_without_password() {
    let injector = Arc::new(DryRunInjector::new());
    let service = Arc::new(RelayService::new(
        RuleStore::empty(),
        QuickOptionsStore::new("commands.txt", "phrases.txt"),
        AuthGuard::disabled(),
        injector.clone(),
    ));

    let responses = drive(
        service,
        &[
            r#"{"action":"send_hotkey","hotkey":"Ctrl+Shift+P"}"#,
            r#"{"action":"move_cursor","direction":"diagonal"}"#,
            r#"{"action":"mouse_click","button":"right","clicks":2}"#,
        ],
    )
    .await;

    assert!(responses.iter().all(|r| r.is_success()));
    assert_eq!(injector.actions().len(), 2);
}
