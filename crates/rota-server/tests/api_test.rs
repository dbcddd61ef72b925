//! HTTP API tests over an in-memory rotation and fake collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use rota_clients::Collaborators;
use rota_core::{
    Classification, Classifier, DirectoryUser, FixedClock, IntentKind, MessageSender, RotaConfig,
    RotaResult, RotationEngine, SqliteRotationStore, UserDirectory,
};
use rota_server::{create_server, create_server_with_auth, create_state_with, AppState};

struct GetClassifier;

#[async_trait]
impl Classifier for GetClassifier {
    async fn classify(&self, _text: &str) -> RotaResult<Classification> {
        Ok(Classification::new(IntentKind::Get))
    }
}

struct EmptyDirectory;

#[async_trait]
impl UserDirectory for EmptyDirectory {
    async fn list_users(&self) -> RotaResult<Vec<DirectoryUser>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, channel: &str, text: &str) -> RotaResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Three pairs from Monday Jun 3rd 2024, with "today" on that Monday.
async fn state() -> (AppState, Arc<RecordingSender>) {
    let mut config = RotaConfig::default();
    config.bot.bot_user_id = "UBOT".to_string();
    config.bot.reminder_channel = "C-dinners".to_string();
    config.rotation.pairs = vec![
        ["<@U1>".to_string(), "<@U2>".to_string()],
        ["<@U3>".to_string(), "<@U4>".to_string()],
        ["<@U5>".to_string(), "<@U6>".to_string()],
    ];
    config.rotation.first_due = Some(d(2024, 6, 3));

    let store = Arc::new(SqliteRotationStore::in_memory().unwrap());
    let engine = Arc::new(RotationEngine::with_clock(
        store,
        Arc::new(FixedClock(d(2024, 6, 3))),
    ));
    let sender = Arc::new(RecordingSender::default());
    let collaborators = Collaborators {
        classifier: Arc::new(GetClassifier),
        directory: Arc::new(EmptyDirectory),
        sender: sender.clone(),
    };

    let state = create_state_with(&config, engine, collaborators).await.unwrap();
    (state, sender)
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_assignment_count() {
    let (state, _) = state().await;
    let (status, body) = call(create_server(state), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["assignments"], 3);
    assert_eq!(body["jobs_running"], false);
}

#[tokio::test]
async fn test_schedule_lists_discussion_followers() {
    let (state, _) = state().await;
    let (status, body) = call(create_server(state), get("/schedule")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_week"], "2024-06-03");

    let schedule = body["schedule"].as_array().unwrap();
    assert_eq!(schedule.len(), 3);
    assert_eq!(schedule[0]["due_date"], "2024-06-03");
    assert_eq!(schedule[0]["discussion"]["first"], "<@U3>");
    assert_eq!(schedule[2]["discussion"], Value::Null);
}

#[tokio::test]
async fn test_event_replies_through_sender() {
    let (state, sender) = state().await;
    let app = create_server(state);

    let event = json!({"text": "<@UBOT> who's on?", "user": "U9", "channel": "C1"});
    let (status, body) = call(app.clone(), post_json("/events", event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "<@U1> and <@U2> are on next.");

    let event = json!({"text": "who's on?", "user": "U9", "channel": "C1"});
    let (_, body) = call(app.clone(), post_json("/events", event)).await;
    assert_eq!(body["reply"], Value::Null);

    let event = json!({"text": "<@UBOT> who's on?", "user": "U9", "channel": "C1", "subtype": "message_changed"});
    let (_, body) = call(app, post_json("/events", event)).await;
    assert_eq!(body["reply"], Value::Null);

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "C1");
}

#[tokio::test]
async fn test_manual_advance_then_noop() {
    let (state, _) = state().await;
    let app = create_server(state);

    let (status, body) = call(app.clone(), post_json("/schedule/advance", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let advanced = body["advanced"].as_array().unwrap();
    assert_eq!(advanced.len(), 1);
    assert_eq!(advanced[0]["due_date"], "2024-06-24");

    let (_, body) = call(app, post_json("/schedule/advance", json!({}))).await;
    assert!(body["advanced"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_reminder_posts_to_channel() {
    let (state, sender) = state().await;
    let (status, body) = call(create_server(state), post_json("/schedule/reminder", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posted"], true);

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent[0].0, "C-dinners");
    assert_eq!(
        sent[0].1,
        "<@U1> and <@U2>, you two are on dinners next week!\n\
         <@U3> and <@U4>, you guys are doing the discussion!"
    );
}

#[tokio::test]
async fn test_auth_rejects_missing_or_wrong_key() {
    let (state, _) = state().await;
    let app = create_server_with_auth(state, "secret");

    let (status, _) = call(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/health")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app.clone(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/health")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(app, request).await;
    assert_eq!(status, StatusCode::OK);
}
