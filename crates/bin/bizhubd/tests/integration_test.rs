//! End-to-end tests for the full bizhubd stack.
//!
//! Each test wires the complete application (in-memory `SQLite` for the
//! key-value blobs and activity journal, the in-memory entity store, the real
//! engine and the real axum router) and drives it through
//! `tower::ServiceExt::oneshot`. No TCP port is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bizhub_adapter_http_axum::router;
use bizhub_adapter_http_axum::state::AppState;
use bizhub_adapter_memory::{InMemoryEntityStore, RecordingNotificationSink};
use bizhub_adapter_storage_sqlite_sqlx::{
    Config, Database, SqliteActivityLog, SqliteKeyValueStore,
};
use bizhub_app::actions::{ActionRegistry, BuiltinPorts};
use bizhub_app::automation_engine::AutomationEngine;
use bizhub_app::config::EngineConfig;

type Engine = AutomationEngine<Arc<InMemoryEntityStore>, SqliteKeyValueStore>;

struct Harness {
    app: axum::Router,
    engine: Arc<Engine>,
    db: Database,
    notifications: Arc<RecordingNotificationSink>,
}

async fn database() -> Database {
    Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise")
}

fn engine(db: &Database, notifications: Arc<RecordingNotificationSink>) -> Arc<Engine> {
    let store = Arc::new(InMemoryEntityStore::new());
    let registry = ActionRegistry::builtin(BuiltinPorts {
        store: Arc::clone(&store),
        notifications,
        activity: SqliteActivityLog::new(db.pool().clone()),
        webhook: bizhub_adapter_webhook_reqwest::Config::default()
            .build()
            .expect("webhook client should build"),
    });
    Arc::new(AutomationEngine::new(
        store,
        SqliteKeyValueStore::new(db.pool().clone()),
        registry,
        EngineConfig::default(),
    ))
}

async fn harness() -> Harness {
    let db = database().await;
    let notifications = Arc::new(RecordingNotificationSink::new());
    let engine = engine(&db, Arc::clone(&notifications));
    engine.load().await.unwrap();
    engine.install_hooks();
    let app = router::build(AppState::new(Arc::clone(&engine)));
    Harness {
        app,
        engine,
        db,
        notifications,
    }
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let h = harness().await;

    let resp = h
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Mutation-driven automations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_journal_paid_invoice_when_rule_matches() {
    let h = harness().await;
    let (status, _) = call(
        &h.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Celebrate payments",
            "triggerId": "onInvoicePaid",
            "actions": [
                {"actionId": "add-log-entry", "config": {"message": "Invoice {{number}} paid", "category": "billing"}},
                {"actionId": "send-notification", "config": {"message": "Paid: {{number}}", "level": "success"}}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, invoice) = call(
        &h.app,
        "POST",
        "/api/entities/invoices",
        Some(json!({"number": "INV-7", "status": "sent"})),
    )
    .await;
    let id = invoice["id"].as_str().unwrap().to_string();
    call(
        &h.app,
        "PATCH",
        &format!("/api/entities/invoices/{id}"),
        Some(json!({"status": "paid"})),
    )
    .await;

    let journal = SqliteActivityLog::new(h.db.pool().clone())
        .recent(10)
        .await
        .unwrap();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].message, "Invoice INV-7 paid");
    assert_eq!(journal[0].category, "billing");

    let sent = h.notifications.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "Paid: INV-7");

    let (_, logs) = call(&h.app, "GET", "/api/automation-logs", None).await;
    assert_eq!(logs[0]["event"], "invoice.paid");
    assert_eq!(logs[0]["status"], "success");
}

#[tokio::test]
async fn should_create_follow_up_task_when_lead_is_created() {
    let h = harness().await;
    call(
        &h.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Follow up new leads",
            "triggerId": "onLeadCreated",
            "actions": [
                {"actionId": "create-task", "config": {"title": "Call {{name}}", "priority": "high", "dueInDays": 2}}
            ]
        })),
    )
    .await;

    call(
        &h.app,
        "POST",
        "/api/entities/leads",
        Some(json!({"name": "ACME Corp", "status": "new"})),
    )
    .await;

    let (_, tasks) = call(&h.app, "GET", "/api/entities/tasks", None).await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Call ACME Corp");
    assert_eq!(tasks[0]["priority"], "high");
    assert_eq!(tasks[0]["source"], "automation");
}

// ---------------------------------------------------------------------------
// Periodic scan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_fire_invoice_due_rule_only_for_matching_day() {
    let h = harness().await;
    call(
        &h.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Three-day reminder",
            "triggerId": "onInvoiceDue",
            "triggerConfig": {"daysBeforeDue": "3"},
            "actions": [
                {"actionId": "send-notification", "config": {"message": "{{number}} due in {{daysUntilDue}} days"}}
            ]
        })),
    )
    .await;

    let now = bizhub_domain::time::now();
    let in_days = |days: i64| (now + chrono::Duration::days(days)).format("%Y-%m-%d").to_string();
    for (number, days) in [("INV-3", 3), ("INV-7", 7)] {
        call(
            &h.app,
            "POST",
            "/api/entities/invoices",
            Some(json!({"number": number, "status": "sent", "dueDate": in_days(days)})),
        )
        .await;
    }

    h.engine.scan_now(now).await;

    let messages: Vec<String> = h.notifications.sent().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["INV-3 due in 3 days".to_string()]);

    let (_, stats) = call(&h.app, "GET", "/api/automation-stats", None).await;
    assert_eq!(stats["successes"], 1);
    assert_eq!(stats["skipped"], 1);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reload_rules_and_log_from_sqlite() {
    let h = harness().await;
    let (_, created) = call(
        &h.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Log clients",
            "triggerId": "onClientCreated",
            "actions": [{"actionId": "add-log-entry", "config": {"message": "Client {{name}}"}}]
        })),
    )
    .await;
    call(
        &h.app,
        "POST",
        "/api/entities/clients",
        Some(json!({"name": "Globex"})),
    )
    .await;

    let reloaded = engine(&h.db, Arc::new(RecordingNotificationSink::new()));
    reloaded.load().await.unwrap();

    let rules = reloaded.list_rules().await;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id.to_string(), created["id"].as_str().unwrap());
    assert_eq!(rules[0].trigger_count, 1);
    assert!(rules[0].last_triggered_at.is_some());
    assert_eq!(reloaded.stats().await.log_entries, 1);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reject_rule_missing_required_action_field() {
    let h = harness().await;

    let (status, body) = call(
        &h.app,
        "POST",
        "/api/automations",
        Some(json!({
            "name": "Broken webhook",
            "triggerId": "onTaskCompleted",
            "actions": [{"actionId": "webhook", "config": {}}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("url"));
}
