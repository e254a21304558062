//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, DurationRound, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

use api::config::Config;
use api::routes::ACTOR_HEADER;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> Router {
    let state = api::create_default_state(&Config::default()).await.unwrap();
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        request = request.header(ACTOR_HEADER, actor.to_string());
    }
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/users",
        None,
        Some(json!({ "username": username, "email": format!("{username}@example.com") })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Admin, manager and member of one team.
struct Workspace {
    app: Router,
    admin: i64,
    manager: i64,
    alice: i64,
    team: i64,
}

async fn workspace() -> Workspace {
    let app = setup().await;
    let admin = register(&app, "admin").await;
    let manager = register(&app, "manager").await;
    let alice = register(&app, "alice").await;

    let (status, body) = send(&app, "POST", "/teams", Some(admin), Some(json!({ "name": "core" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let team = body["id"].as_i64().unwrap();

    for (user_id, role) in [(manager, "manager"), (alice, "member")] {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/teams/{team}/members"),
            Some(admin),
            Some(json!({ "user_id": user_id, "role": role })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{body}");
    }

    Workspace {
        app,
        admin,
        manager,
        alice,
        team,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_user_lifecycle() {
    let app = setup().await;
    let id = register(&app, "carol").await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/users/{id}"),
        None,
        Some(json!({ "username": "caroline" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "caroline");
    assert_eq!(body["email"], "carol@example.com");

    let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/users/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup().await;
    register(&app, "dave").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        None,
        Some(json!({ "username": "other", "email": "DAVE@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("DAVE@example.com"));
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = setup().await;
    let (status, body) = send(&app, "GET", "/users/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_actor_is_unauthorized() {
    let app = setup().await;
    let (status, _) = send(&app, "POST", "/teams", None, Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/teams")
        .header(ACTOR_HEADER, "abc")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "x" }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_admins_manage_members() {
    let ws = workspace().await;

    let (status, _) = send(
        &ws.app,
        "POST",
        &format!("/teams/{}/members", ws.team),
        Some(ws.manager),
        Some(json!({ "user_id": ws.alice, "role": "manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&ws.app, "GET", &format!("/teams/{}", ws.team), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["creator_id"], ws.admin);
    assert_eq!(body["members"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_role_change_and_removal() {
    let ws = workspace().await;
    let member_uri = format!("/teams/{}/members/{}", ws.team, ws.alice);

    let (status, _) = send(
        &ws.app,
        "PATCH",
        &member_uri,
        Some(ws.admin),
        Some(json!({ "old_role": "member", "new_role": "manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &ws.app,
        "DELETE",
        &format!("{member_uri}?role=member"),
        Some(ws.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ws.app,
        "DELETE",
        &format!("{member_uri}?role=manager"),
        Some(ws.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &ws.app,
        "DELETE",
        &format!("/teams/{}/members/{}?role=admin", ws.team, ws.admin),
        Some(ws.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_task_evaluation_flow() {
    let ws = workspace().await;
    let deadline = Utc::now() + Duration::days(2);

    let (status, body) = send(
        &ws.app,
        "POST",
        "/tasks",
        Some(ws.manager),
        Some(json!({
            "team_id": ws.team,
            "executor_id": ws.alice,
            "title": "write report",
            "deadline": deadline,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let task = body["id"].as_i64().unwrap();

    let evaluation_uri = format!("/tasks/{task}/evaluation");
    let (status, _) = send(
        &ws.app,
        "POST",
        &evaluation_uri,
        Some(ws.manager),
        Some(json!({ "grade": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &ws.app,
        "PATCH",
        &format!("/tasks/{task}"),
        Some(ws.manager),
        Some(json!({ "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");

    let (status, _) = send(
        &ws.app,
        "POST",
        &evaluation_uri,
        Some(ws.alice),
        Some(json!({ "grade": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &ws.app,
        "POST",
        &evaluation_uri,
        Some(ws.manager),
        Some(json!({ "grade": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &ws.app,
        "POST",
        &evaluation_uri,
        Some(ws.manager),
        Some(json!({ "grade": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &ws.app,
        "POST",
        &evaluation_uri,
        Some(ws.manager),
        Some(json!({ "grade": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&ws.app, "GET", &evaluation_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], 4);
    assert_eq!(body["executor_id"], ws.alice);

    let (status, body) = send(
        &ws.app,
        "GET",
        &format!("/users/{}/average-grade?team_id={}", ws.alice, ws.team),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average"], 4.0);

    let (status, body) = send(
        &ws.app,
        "GET",
        &format!("/evaluations/me?team_id={}", ws.team),
        Some(ws.alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["task_id"], task);

    let (_, body) = send(
        &ws.app,
        "GET",
        &format!("/users/{}/average-grade", ws.manager),
        None,
        None,
    )
    .await;
    assert_eq!(body["average"], Value::Null);
}

#[tokio::test]
async fn test_members_cannot_create_tasks() {
    let ws = workspace().await;
    let (status, _) = send(
        &ws.app,
        "POST",
        "/tasks",
        Some(ws.alice),
        Some(json!({
            "team_id": ws.team,
            "title": "sneaky",
            "deadline": Utc::now() + Duration::days(1),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_appears_in_calendars() {
    let ws = workspace().await;
    let deadline = (Utc::now() + Duration::days(3))
        .duration_trunc(Duration::hours(1))
        .unwrap();

    let (status, body) = send(
        &ws.app,
        "POST",
        "/tasks",
        Some(ws.manager),
        Some(json!({
            "team_id": ws.team,
            "executor_id": ws.alice,
            "title": "ship it",
            "deadline": deadline,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let task = body["id"].as_i64().unwrap();

    for user in [ws.manager, ws.alice] {
        let (status, body) = send(&ws.app, "GET", &format!("/users/{user}/calendar"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["kind"], "task");
        assert_eq!(entries[0]["reference_id"], task);
        assert_eq!(entries[0]["title"], "ship it");
    }

    let day = deadline.date_naive();
    let (_, body) = send(
        &ws.app,
        "GET",
        &format!("/users/{}/calendar/day/{day}", ws.alice),
        None,
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(
        &ws.app,
        "GET",
        &format!("/users/{}/calendar/day/{}", ws.alice, day + Duration::days(1)),
        None,
        None,
    )
    .await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(
        &ws.app,
        "PATCH",
        &format!("/tasks/{task}"),
        Some(ws.manager),
        Some(json!({ "deleted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&ws.app, "GET", &format!("/users/{}/calendar", ws.alice), None, None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_month_is_bad_request() {
    let app = setup().await;
    let (status, _) = send(&app, "GET", "/users/1/calendar/month/2026/13", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_meeting_lifecycle() {
    let ws = workspace().await;
    let start = Utc::now() + Duration::days(1);
    let end = start + Duration::hours(1);

    let (status, body) = send(
        &ws.app,
        "POST",
        "/meetings",
        Some(ws.manager),
        Some(json!({
            "team_id": ws.team,
            "participant_ids": [ws.alice],
            "start": start,
            "end": end,
            "description": "planning",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let meeting = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &ws.app,
        "POST",
        "/meetings",
        Some(ws.manager),
        Some(json!({
            "team_id": ws.team,
            "participant_ids": [ws.alice],
            "start": start + Duration::minutes(30),
            "end": end + Duration::minutes(30),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &ws.app,
        "GET",
        &format!("/users/{}/meetings", ws.alice),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["organizer_id"], ws.manager);

    let (_, body) = send(&ws.app, "GET", &format!("/users/{}/calendar", ws.alice), None, None).await;
    assert_eq!(body[0]["kind"], "meeting");

    let (status, _) = send(
        &ws.app,
        "DELETE",
        &format!("/meetings/{meeting}/participants/{}", ws.alice),
        Some(ws.alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &ws.app,
        "DELETE",
        &format!("/meetings/{meeting}/participants/{}", ws.alice),
        Some(ws.manager),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&ws.app, "GET", &format!("/users/{}/calendar", ws.alice), None, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(
        &ws.app,
        "POST",
        &format!("/meetings/{meeting}/participants"),
        Some(ws.manager),
        Some(json!({ "user_id": ws.alice })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &ws.app,
        "POST",
        &format!("/meetings/{meeting}/cancel"),
        Some(ws.manager),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &ws.app,
        "GET",
        &format!("/meetings/{meeting}"),
        Some(ws.alice),
        None,
    )
    .await;
    assert_eq!(body["is_cancelled"], true);

    let (_, body) = send(&ws.app, "GET", &format!("/users/{}/calendar", ws.manager), None, None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_task_access_comments_and_listing() {
    let ws = workspace().await;
    let outsider = register(&ws.app, "carol").await;
    let deadline = Utc::now() + Duration::days(2);

    let (status, body) = send(
        &ws.app,
        "POST",
        "/tasks",
        Some(ws.manager),
        Some(json!({
            "team_id": ws.team,
            "executor_id": ws.alice,
            "title": "write report",
            "deadline": deadline,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let task = body["id"].as_i64().unwrap();
    let task_uri = format!("/tasks/{task}");
    let comments_uri = format!("/tasks/{task}/comments");

    let (status, _) = send(&ws.app, "GET", &task_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&ws.app, "GET", &task_uri, Some(outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&ws.app, "GET", &task_uri, Some(ws.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["executor_id"], ws.alice);

    let (status, body) = send(
        &ws.app,
        "POST",
        &comments_uri,
        Some(ws.alice),
        Some(json!({ "text": "on it" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["author_id"], ws.alice);

    let (status, _) = send(
        &ws.app,
        "POST",
        &comments_uri,
        Some(ws.alice),
        Some(json!({ "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &ws.app,
        "POST",
        &comments_uri,
        Some(outsider),
        Some(json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&ws.app, "GET", &comments_uri, Some(ws.manager), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["text"], "on it");

    let (status, body) = send(&ws.app, "GET", "/tasks?assigned_only=true", Some(ws.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], task);
    assert_eq!(body["limit"], 20);

    let team_uri = format!("/tasks?team_id={}", ws.team);
    let (status, _) = send(&ws.app, "GET", &team_uri, Some(outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&ws.app, "GET", "/tasks?limit=0", Some(ws.alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_team_meetings_are_paged() {
    let ws = workspace().await;
    let outsider = register(&ws.app, "carol").await;
    let start = (Utc::now() + Duration::days(1))
        .duration_trunc(Duration::hours(1))
        .unwrap();

    for hours in [0, 2] {
        let (status, body) = send(
            &ws.app,
            "POST",
            "/meetings",
            Some(ws.manager),
            Some(json!({
                "team_id": ws.team,
                "participant_ids": [ws.alice],
                "start": start + Duration::hours(hours),
                "end": start + Duration::hours(hours + 1),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let uri = format!("/meetings?team_id={}&limit=1&offset=1", ws.team);
    let (status, body) = send(&ws.app, "GET", &uri, Some(ws.alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["offset"], 1);

    let (status, _) = send(&ws.app, "GET", &uri, Some(outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&ws.app, "GET", "/meetings?team_id=999", Some(ws.alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    register(&app, "metered").await;
    send(&app, "GET", "/users/404", None, None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("users_registered_total"));
    assert!(text.contains("api_errors_total"));
}
