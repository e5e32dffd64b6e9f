use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use models::{Post, Topic, User, SYSTEM_USER_ID};
use server::routes;
use server::startup::{assemble_state, Backends};
use server::state::AppState;
use service::api_keys::ApiKeysStore;
use service::directory::{InMemoryContentDirectory, InMemoryUserDirectory};
use service::i18n::Catalog;
use service::settings::NotesSettings;
use service::storage::MemoryKvStore;

const ADMIN_KEY: &str = "admin-key";
const MOD_KEY: &str = "mod-key";
const USER_KEY: &str = "user-key";
const TARGET: i64 = 10;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    app: Router,
    state: AppState,
}

async fn build_app(settings: NotesSettings) -> anyhow::Result<TestApp> {
    let users = InMemoryUserDirectory::new();
    users.upsert(User::new(1, "admin1").admin()).await;
    users.upsert(User::new(2, "mod1").moderator()).await;
    users.upsert(User::new(3, "joe")).await;
    users.upsert(User::new(TARGET, "troll")).await;

    let content = InMemoryContentDirectory::new();
    let topic = Topic { id: 70, title: "Heated thread".into(), slug: "heated-thread".into() };
    content.upsert_topic(topic.clone()).await;
    content.upsert_post(Post { id: 700, topic_id: 70, post_number: 5, topic: Some(topic), deleted_at: None }).await;

    let keys_path = std::env::temp_dir().join(format!("notes_api_keys_{}.json", Uuid::new_v4()));
    let api_keys = ApiKeysStore::new(&keys_path).await?;
    api_keys.set(ADMIN_KEY.into(), 1).await?;
    api_keys.set(MOD_KEY.into(), 2).await?;
    api_keys.set(USER_KEY.into(), 3).await?;

    let backends = Backends {
        kv: MemoryKvStore::new(),
        users,
        content,
        api_keys,
        i18n: Arc::new(Catalog::builtin()?),
    };
    let state = assemble_state(backends, settings, "/user_notes");
    let app = routes::build_router(state.clone(), cors());
    Ok(TestApp { app, state })
}

fn request(method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(k) = key {
        builder = builder.header("X-Api-Key", k);
    }
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(req)
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

async fn create_note(app: &Router, key: &str, raw: &str) -> anyhow::Result<Value> {
    let body = json!({ "user_note": { "user_id": TARGET, "raw": raw } });
    let (status, value) = send(app, request("POST", "/user_notes", Some(key), Some(body))?).await?;
    assert_eq!(status, StatusCode::OK, "create failed: {value}");
    Ok(value["user_note"].clone())
}

#[tokio::test]
async fn notes_require_a_staff_caller() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;
    let uri = format!("/user_notes?user_id={TARGET}");

    let (status, _) = send(&t.app, request("GET", &uri, None, None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, request("GET", &uri, Some("bogus"), None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, request("GET", &uri, Some(USER_KEY), None)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let query_key = format!("{uri}&api_key={MOD_KEY}");
    let (status, body) = send(&t.app, request("GET", &query_key, None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extras"]["username"], "troll");
    assert_eq!(body["user_notes"], json!([]));
    Ok(())
}

#[tokio::test]
async fn create_then_list_newest_first() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;

    let first = create_note(&t.app, ADMIN_KEY, "first").await?;
    assert_eq!(first["raw"], "first");
    assert_eq!(first["user_id"], TARGET);
    assert_eq!(first["created_by"]["username"], "admin1");
    assert_eq!(first["can_delete"], true);
    assert_eq!(first["id"].as_str().map(str::len), Some(32));

    let body = json!({ "user_note": { "user_id": TARGET, "raw": "about a post", "post_id": 700 } });
    let (status, second) = send(&t.app, request("POST", "/user_notes", Some(MOD_KEY), Some(body))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["user_note"]["post_url"], "/t/heated-thread/70/5");
    assert_eq!(second["user_note"]["post_title"], "Heated thread");

    let uri = format!("/user_notes?user_id={TARGET}");
    let (status, list) = send(&t.app, request("GET", &uri, Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    let notes = list["user_notes"].as_array().cloned().unwrap_or_default();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0]["raw"], "about a post");
    assert_eq!(notes[1]["raw"], "first");

    // storage keeps creation order
    let stored = t.state.store.list(TARGET).await?;
    assert_eq!(stored[0].raw, "first");

    let count_uri = format!("/user_notes/count?user_id={TARGET}");
    let (_, count) = send(&t.app, request("GET", &count_uri, Some(ADMIN_KEY), None)?).await?;
    assert_eq!(count["user_notes_count"], 2);
    Ok(())
}

#[tokio::test]
async fn invalid_requests_are_rejected() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;

    let (status, _) = send(&t.app, request("GET", "/user_notes?user_id=9999", Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, request("GET", "/user_notes", Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&t.app, request("POST", "/user_notes", Some(ADMIN_KEY), Some(json!({})))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let blank = json!({ "user_note": { "user_id": TARGET, "raw": "   " } });
    let (status, _) = send(&t.app, request("POST", "/user_notes", Some(ADMIN_KEY), Some(blank))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mistyped = json!({ "user_note": { "user_id": "10", "raw": "hi" } });
    let (status, body) = send(&t.app, request("POST", "/user_notes", Some(ADMIN_KEY), Some(mistyped))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let plain_text = Request::builder()
        .method("POST")
        .uri("/user_notes")
        .header("X-Api-Key", ADMIN_KEY)
        .header("content-type", "text/plain")
        .body(Body::from("user_id=10&raw=hi"))?;
    let (status, _) = send(&t.app, plain_text).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let broken_event = Request::builder()
        .method("POST")
        .uri("/user_notes/events")
        .header("X-Api-Key", ADMIN_KEY)
        .header("content-type", "application/json")
        .body(Body::from("{\"event\":"))?;
    let (status, _) = send(&t.app, broken_event).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = json!({ "user_note": { "user_id": 9999, "raw": "hi" } });
    let (status, _) = send(&t.app, request("POST", "/user_notes", Some(ADMIN_KEY), Some(unknown))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_follows_permission_rule_and_cleans_up() -> anyhow::Result<()> {
    let settings = NotesSettings { moderators_delete: false, ..NotesSettings::default() };
    let t = build_app(settings).await?;

    let note = create_note(&t.app, MOD_KEY, "to delete").await?;
    assert_eq!(note["can_delete"], false);
    let id = note["id"].as_str().unwrap_or_default().to_string();
    let uri = format!("/user_notes/{id}?user_id={TARGET}");

    let (status, _) = send(&t.app, request("DELETE", &uri, Some(MOD_KEY), None)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(t.state.store.list(TARGET).await?.len(), 1);

    let (status, body) = send(&t.app, request("DELETE", &uri, Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "OK");
    assert!(t.state.store.list(TARGET).await?.is_empty());
    let target = t.state.users.find(TARGET).await?.expect("target");
    assert_eq!(target.user_notes_count, 0);

    // unknown ids are a no-op
    let (status, _) = send(&t.app, request("DELETE", &uri, Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn moderators_may_delete_when_allowed() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;
    let note = create_note(&t.app, ADMIN_KEY, "mod can remove").await?;
    let id = note["id"].as_str().unwrap_or_default().to_string();

    let uri = format!("/user_notes/{id}?user_id={TARGET}");
    let (status, _) = send(&t.app, request("DELETE", &uri, Some(MOD_KEY), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(t.state.store.list(TARGET).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn moderation_events_create_system_notes() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;
    let event = json!({
        "request_locale": "fr",
        "event": {
            "type": "user_silenced",
            "user_id": TARGET,
            "silenced_by": 2,
            "reason": "flame war",
            "post_id": 700
        }
    });

    let (status, _) = send(&t.app, request("POST", "/user_notes/events", Some(MOD_KEY), Some(event.clone()))?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = send(&t.app, request("POST", "/user_notes/events", Some(ADMIN_KEY), Some(event))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["delivered"], 1);
    assert_eq!(report["failed"], 0);

    let uri = format!("/user_notes?user_id={TARGET}");
    let (_, list) = send(&t.app, request("GET", &uri, Some(ADMIN_KEY), None)?).await?;
    let note = &list["user_notes"][0];
    assert_eq!(note["raw"], "@mod1 silenced this account till . Reason: flame war");
    assert_eq!(note["created_by"]["id"], SYSTEM_USER_ID);
    assert_eq!(note["created_by"]["username"], "system");
    assert_eq!(note["post_id"], 700);
    assert_eq!(note["topic_id"], 70);

    let (_, report) = send(&t.app, request("GET", "/admin/reports/user_notes", Some(ADMIN_KEY), None)?).await?;
    assert_eq!(report["data"][0]["moderator_username"], "system");
    assert_eq!(report["data"][0]["moderator_id"], SYSTEM_USER_ID);
    Ok(())
}

#[tokio::test]
async fn report_lists_recent_notes() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;
    create_note(&t.app, ADMIN_KEY, "reported").await?;

    let (status, report) = send(&t.app, request("GET", "/admin/reports/user_notes", Some(MOD_KEY), None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"][0]["note"], "reported");
    assert_eq!(report["data"][0]["moderator_username"], "admin1");
    assert_eq!(report["labels"][2]["title"], "Note");

    let (status, _) = send(&t.app, request("GET", "/admin/reports/user_notes?start_date=nope", Some(MOD_KEY), None)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn disabled_feature_mounts_nothing() -> anyhow::Result<()> {
    let settings = NotesSettings { enabled: false, ..NotesSettings::default() };
    let t = build_app(settings).await?;
    assert_eq!(t.state.bus.handler_count(), 0);

    let uri = format!("/user_notes?user_id={TARGET}");
    let (status, _) = send(&t.app, request("GET", &uri, Some(ADMIN_KEY), None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&t.app, request("GET", "/health", None, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn metrics_are_exposed() -> anyhow::Result<()> {
    let t = build_app(NotesSettings::default()).await?;
    create_note(&t.app, ADMIN_KEY, "counted").await?;
    let resp = t.app.clone().oneshot(request("GET", "/metrics", None, None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&bytes).contains("user_notes_added_total"));
    Ok(())
}
