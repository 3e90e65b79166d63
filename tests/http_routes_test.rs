// ==========================================
// HTTP 路由集成测试
// ==========================================
// 覆盖: 状态码映射、错误响应结构、请求字段命名
// ==========================================

mod helpers;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use crew_dispatch::app::{create_router, AppState};
use crew_dispatch::clock::FixedClock;
use crew_dispatch::domain::{Crew, CrewStatus, OutageEvent};
use crew_dispatch::repository::{CrewRepository, CrewStore, OutageEventRepository};

use helpers::test_data_builder::{monday_at, sunday_at, CrewBuilder, EventBuilder};
use test_helpers::{create_test_db, open_test_connection};

fn seed(db_path: &str, crews: &[Crew], events: &[OutageEvent]) {
    let conn = Arc::new(Mutex::new(open_test_connection(db_path).unwrap()));
    let crew_repo = CrewRepository::new(conn.clone());
    let event_repo = OutageEventRepository::new(conn);
    for crew in crews {
        crew_repo.insert_crew(crew).unwrap();
    }
    for event in events {
        event_repo.upsert_event(event).unwrap();
    }
}

fn build_app(now: chrono::NaiveDateTime) -> (NamedTempFile, Router) {
    let (temp_file, db_path) = create_test_db().unwrap();
    seed(
        &db_path,
        &[
            CrewBuilder::new("C1").build(),
            CrewBuilder::new("C2")
                .status(CrewStatus::OnSite)
                .assigned("E1", 0, monday_at(9, 0))
                .build(),
        ],
        &[
            EventBuilder::new("E1").build(),
            EventBuilder::new("E-NOGEO").no_center().build(),
        ],
    );

    let state = AppState::with_clock(db_path, Arc::new(FixedClock::new(now))).unwrap();
    (temp_file, create_router(Arc::new(state)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .header("x-actor", "http-test")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder
            .header("x-actor", "http-test")
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_db, app) = build_app(monday_at(10, 0));
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_and_get_crews() {
    let (_db, app) = build_app(monday_at(10, 0));

    let (status, body) = send(&app, "GET", "/crews", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", "/crews?status=on_site", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["crew_id"], "C2");

    let (status, body) = send(&app, "GET", "/crews?status=parked", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, body) = send(&app, "GET", "/crews/C404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_availability_view_is_flattened() {
    let (_db, app) = build_app(monday_at(12, 10));
    let (status, body) = send(&app, "GET", "/crews/availability", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["crew_id"], "C1");
    assert_eq!(body[0]["availability"]["duty_status"], "on_break");
}

#[tokio::test]
async fn test_dispatch_then_illegal_redispatch() {
    let (_db, app) = build_app(monday_at(10, 0));

    let (status, body) = send(
        &app,
        "POST",
        "/crews/C1/dispatch",
        Some(json!({ "eventId": "E1", "dispatchedBy": "dispatcher.li" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "dispatched");
    assert_eq!(body["assigned_event_id"], "E1");

    let (status, body) = send(
        &app,
        "POST",
        "/crews/C1/dispatch",
        Some(json!({ "eventId": "E1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ILLEGAL_TRANSITION");
    assert_eq!(body["details"]["from"], "dispatched");
    assert_eq!(body["details"]["action"], "dispatch");

    let (status, body) = send(&app, "GET", "/crews/C1/actions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["actor"], "dispatcher.li");
}

#[tokio::test]
async fn test_dispatch_to_event_without_center_is_unprocessable() {
    let (_db, app) = build_app(monday_at(10, 0));
    let (status, body) = send(
        &app,
        "POST",
        "/crews/C1/dispatch",
        Some(json!({ "eventId": "E-NOGEO" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_GEOMETRY");
    assert_eq!(body["details"]["event_id"], "E-NOGEO");
}

#[tokio::test]
async fn test_emergency_dispatch_returns_overtime_log() {
    let (_db, app) = build_app(sunday_at(21, 0));

    let (status, body) = send(
        &app,
        "POST",
        "/crews/C1/emergency-dispatch",
        Some(json!({
            "eventId": "E1",
            "authorizedBy": "supervisor.wang",
            "reason": "Major storm"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crew"]["status"], "dispatched");
    assert_eq!(body["overtime_log"]["authorized_by"], "supervisor.wang");
    assert_eq!(body["overtime_log"]["reason"], "Major storm");

    let (status, body) = send(&app, "GET", "/overtime-logs?crew_id=C1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_movement_and_return_flow() {
    let (_db, app) = build_app(monday_at(10, 0));
    send(
        &app,
        "POST",
        "/crews/C1/dispatch",
        Some(json!({ "eventId": "E1" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/crews/C1/movement-step",
        Some(json!({ "targetLat": 40.1, "targetLng": -75.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "en_route");

    let (status, body) = send(&app, "POST", "/crews/C1/advance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "en_route");

    let (status, body) = send(&app, "GET", "/crews/C1/actions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["actor"], "http-test");

    // C2 已到场
    let (status, body) = send(&app, "POST", "/crews/C2/return", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returning");

    let (status, body) = send(&app, "POST", "/crews/C2/mark-available", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert_eq!(body["assigned_event_id"], Value::Null);
}

#[tokio::test]
async fn test_recommendations_route() {
    let (_db, app) = build_app(monday_at(10, 0));

    let (status, body) = send(&app, "GET", "/events/E1/recommendations?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["crew_id"], "C1");

    let (status, _) = send(&app, "GET", "/events/E404/recommendations", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/events/E1/recommendations?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_config_roundtrip() {
    let (_db, app) = build_app(monday_at(10, 0));

    let (status, _) = send(
        &app,
        "PUT",
        "/config",
        Some(json!({ "key": "dispatch.average_speed_kmh", "value": "60" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", "/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dispatch.average_speed_kmh"], "60");

    let (status, body) = send(
        &app,
        "PUT",
        "/config",
        Some(json!({ "key": " ", "value": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}
