/// API client tests against a scripted backend: auth headers, error
/// classification and the activity log.
mod common;

use common::{ALERTS_JSON, STATS_JSON, StubBackend};
use lms_console::activity::ActivityLog;
use lms_console::api::{ApiError, ProcessAction};
use lms_console::session::Session;

fn scratch_log(name: &str) -> ActivityLog {
    let path = std::env::temp_dir().join(format!(
        "lms-console-api-{}-{}.jsonl",
        std::process::id(),
        name
    ));
    let _ = std::fs::remove_file(&path);
    ActivityLog::at(path)
}

#[test]
fn no_token_means_no_authorization_header() {
    let backend = StubBackend::start();
    backend.route("GET", "/api/alerts", 200, "[]");

    let client = backend.client(Session::in_memory(), ActivityLog::disabled());
    assert!(client.fetch_alerts().unwrap().is_empty());
    assert_eq!(backend.requests()[0].authorization, None);
}

#[test]
fn login_is_sent_without_bearer_even_when_a_token_exists() {
    let backend = StubBackend::start();
    backend.route("POST", "/login", 200, r#"{"token":"fresh"}"#);

    let session = Session::in_memory();
    session.set_token("stale").unwrap();
    let client = backend.client(session.clone(), ActivityLog::disabled());

    let response = client.login("admin", "pw").unwrap();
    assert_eq!(response.token, "fresh");
    assert_eq!(session.token().as_deref(), Some("fresh"));
    assert_eq!(backend.requests()[0].authorization, None);
}

#[test]
fn login_with_empty_token_is_rejected() {
    let backend = StubBackend::start();
    backend.route("POST", "/login", 200, r#"{"token":""}"#);

    let session = Session::in_memory();
    let client = backend.client(session.clone(), ActivityLog::disabled());
    let err = client.login("admin", "pw").unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    assert_eq!(session.token(), None);
}

#[test]
fn rejected_login_is_not_a_session_expiry() {
    let backend = StubBackend::start();
    backend.route("POST", "/login", 401, r#"{"error":"Invalid credentials"}"#);

    let client = backend.client(Session::in_memory(), ActivityLog::disabled());
    let err = client.login("admin", "bad").unwrap_err();
    assert_eq!(
        err,
        ApiError::Server {
            status: 401,
            message: Some("Invalid credentials".to_string())
        }
    );
}

#[test]
fn unauthorized_clears_token() {
    let backend = StubBackend::start();
    backend.route("GET", "/api/stats", 401, r#"{"error":"Invalid token"}"#);

    let session = Session::in_memory();
    session.set_token("old").unwrap();
    let client = backend.client(session.clone(), ActivityLog::disabled());

    assert_eq!(client.fetch_stats().unwrap_err(), ApiError::Unauthorized);
    assert_eq!(session.token(), None);
    assert_eq!(
        backend.requests()[0].authorization.as_deref(),
        Some("Bearer old")
    );
}

#[test]
fn malformed_body_is_a_decode_error() {
    let backend = StubBackend::start();
    backend.route("GET", "/api/logs", 200, "{not json");

    let client = backend.client(Session::in_memory(), ActivityLog::disabled());
    let err = client.fetch_logs(10).unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
    assert_eq!(err.user_message("Failed to load logs"), "Failed to load logs");
    assert_eq!(backend.requests()[0].url, "/api/logs?limit=10");
}

#[test]
fn reads_parse_backend_payloads() {
    let backend = StubBackend::start();
    backend
        .route("GET", "/api/stats", 200, STATS_JSON)
        .route("GET", "/api/alerts", 200, ALERTS_JSON)
        .route(
            "GET",
            "/api/moodle/status",
            200,
            r#"{"running":false,"version":"4.3.2","uptime":0,"last_check":"2025-01-09T10:00:00Z","error":"process not found"}"#,
        );

    let client = backend.client(Session::in_memory(), ActivityLog::disabled());
    let stats = client.fetch_stats().unwrap();
    assert_eq!(stats.disk_usage, Some(81.2));
    assert_eq!(stats.moodle_status.unwrap().process_id, Some(4242));

    let alerts = client.fetch_alerts().unwrap();
    assert_eq!(alerts[0].kind, "cpu");
    assert_eq!(alerts[1].severity, "medium");

    let status = client.fetch_moodle_status().unwrap();
    assert!(!status.running);
    assert_eq!(status.error.as_deref(), Some("process not found"));
}

#[test]
fn process_actions_post_to_their_endpoints() {
    let backend = StubBackend::start();
    for action in [ProcessAction::Start, ProcessAction::Stop, ProcessAction::Restart] {
        backend.route("POST", action.path(), 200, r#"{"message":"ok","status":"done"}"#);
    }

    let client = backend.client(Session::in_memory(), ActivityLog::disabled());
    for action in [ProcessAction::Start, ProcessAction::Stop, ProcessAction::Restart] {
        let response = client.process_action(action).unwrap();
        assert_eq!(response.status.as_deref(), Some("done"));
    }
    let paths: Vec<_> = backend
        .requests()
        .iter()
        .map(|r| r.path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec!["/api/moodle/start", "/api/moodle/stop", "/api/moodle/restart"]
    );
}

#[test]
fn health_is_unauthenticated() {
    let backend = StubBackend::start();
    backend.route("GET", "/health", 200, r#"{"status":"healthy"}"#);

    let session = Session::in_memory();
    session.set_token("t").unwrap();
    let client = backend.client(session, ActivityLog::disabled());
    assert!(client.health().is_ok());
    assert_eq!(backend.requests()[0].authorization, None);
}

#[test]
fn every_call_lands_in_the_activity_log() {
    let backend = StubBackend::start();
    backend
        .route("GET", "/api/stats", 200, STATS_JSON)
        .route("POST", "/api/moodle/stop", 500, r#"{"error":"Failed to stop Moodle"}"#);

    let log = scratch_log("calls");
    let client = backend.client(Session::in_memory(), log.clone());
    client.fetch_stats().unwrap();
    client.process_action(ProcessAction::Stop).unwrap_err();

    let entries = log.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "/api/stats");
    assert_eq!(entries[0].status, Some(200));
    assert_eq!(entries[0].outcome, "ok");
    assert_eq!(entries[1].method, "POST");
    assert_eq!(entries[1].status, Some(500));
    assert_eq!(entries[1].outcome, "error");
    assert!(
        entries[1]
            .message
            .as_deref()
            .unwrap()
            .contains("Failed to stop Moodle")
    );
}
