//! Integration tests for the API adapter.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;

use noticeboard::api::*;
use noticeboard::checks::CheckRegistry;
use noticeboard::clock::ManualClock;
use noticeboard::model::*;
use noticeboard::store::{NoticeStore, StoreConfig};

fn t0() -> DateTime<Utc> {
    "2024-06-01T00:00:00Z".parse().unwrap()
}

fn check(name: &str, level: CheckLevel, healthy: bool) -> CheckInfo {
    CheckInfo {
        name: name.to_string(),
        level,
        healthy,
        failures: if healthy { 0 } else { 2 },
        last_error: if healthy {
            String::new()
        } else {
            "connection refused".to_string()
        },
        error_details: String::new(),
    }
}

fn test_api() -> (Api, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = Arc::new(NoticeStore::with_clock(StoreConfig::default(), clock.clone()));
    let checks = Arc::new(CheckRegistry::from_checks(vec![
        check("db", CheckLevel::Alive, false),
        check("cache", CheckLevel::Ready, true),
        check("disk", CheckLevel::Unset, true),
    ]));
    (Api::new(store, checks), clock)
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[test]
fn checks_unfiltered_returns_all() {
    let (api, _) = test_api();
    let rsp = api.get_checks(&ChecksParams::default()).unwrap();
    assert_eq!(rsp.status_code, 200);
    assert_eq!(rsp.result.len(), 3);
}

#[test]
fn checks_filtered_by_level_and_names() {
    let (api, _) = test_api();

    let rsp = api
        .get_checks(&ChecksParams {
            level: Some("alive".into()),
            names: vec![],
        })
        .unwrap();
    let names: Vec<_> = rsp.result.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["db"]);

    let rsp = api
        .get_checks(&ChecksParams {
            level: None,
            names: vec!["disk,cache".into()],
        })
        .unwrap();
    let names: Vec<_> = rsp.result.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["cache", "disk"]);
}

#[test]
fn checks_with_no_match_is_empty_not_error() {
    let (api, _) = test_api();
    let rsp = api
        .get_checks(&ChecksParams {
            level: Some("ready".into()),
            names: vec!["web".into()],
        })
        .unwrap();
    assert!(rsp.result.is_empty());
}

#[test]
fn checks_bogus_level_is_bad_request() {
    let (api, _) = test_api();
    let err = api
        .get_checks(&ChecksParams {
            level: Some("bogus".into()),
            names: vec![],
        })
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.message().contains("bogus"));
    assert!(err.message().contains("\"alive\""));
    assert!(err.message().contains("\"ready\""));
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[test]
fn warnings_default_to_pending() {
    let (api, clock) = test_api();
    api.store().warn("disk full").unwrap();
    clock.advance(TimeDelta::hours(1));
    api.store().warn("disk full").unwrap();
    api.store().warn("cpu hot").unwrap();

    let pending = api.get_warnings(&WarningsParams::default()).unwrap();
    let messages: Vec<_> = pending.result.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(messages, ["cpu hot"]);

    let all = api
        .get_warnings(&WarningsParams {
            select: Some("all".into()),
        })
        .unwrap();
    assert_eq!(all.result.len(), 2);
}

#[test]
fn warnings_bogus_select_is_bad_request() {
    let (api, _) = test_api();
    let err = api
        .get_warnings(&WarningsParams {
            select: Some("some".into()),
        })
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.message().contains("\"some\""));
}

#[test]
fn ack_returns_zero_and_changes_nothing() {
    let (api, _) = test_api();
    api.store().warn("disk full").unwrap();
    let before = api.store().snapshot().unwrap();

    let rsp = api
        .ack_warnings(&AckRequest {
            action: Some("okay".into()),
            timestamp: Some(t0()),
        })
        .unwrap();
    assert_eq!(rsp.result, 0);
    assert_eq!(api.store().snapshot().unwrap(), before);
}

#[test]
fn ack_body_parses_legacy_payload() {
    let body: AckRequest =
        serde_json::from_value(json!({"action": "okay", "timestamp": "2006-01-02T15:04:05Z"}))
            .unwrap();
    assert_eq!(body.action.as_deref(), Some("okay"));
    assert!(body.timestamp.is_some());
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[test]
fn notices_filtered_by_type() {
    let (api, _) = test_api();
    api.store().warn("disk full").unwrap();
    api.store()
        .record(NoticeType::ChangeUpdate, "7", NoticeOptions::new())
        .unwrap();

    let rsp = api
        .get_notices(&NoticesParams {
            types: vec!["change-update".into()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(rsp.result.len(), 1);
    assert_eq!(rsp.result[0].key, "7");
}

#[test]
fn notices_bad_type_is_bad_request() {
    let (api, _) = test_api();
    let err = api
        .get_notices(&NoticesParams {
            types: vec!["Not A Type".into()],
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[test]
fn sync_response_shape() {
    let (api, _) = test_api();
    api.store().warn("disk full").unwrap();

    let rsp = api.get_warnings(&WarningsParams::default()).unwrap();
    let value = serde_json::to_value(&rsp).unwrap();
    assert_eq!(value["type"], "sync");
    assert_eq!(value["status-code"], 200);
    assert_eq!(value["status"], "OK");
    assert_eq!(value["result"][0]["message"], "disk full");
    assert_eq!(value["result"][0]["first-added"], "2024-06-01T00:00:00Z");
    // Warning summary is disabled, so the envelope carries no count.
    assert!(value.get("warning-count").is_none());
    assert!(value.get("warning-timestamp").is_none());
}
