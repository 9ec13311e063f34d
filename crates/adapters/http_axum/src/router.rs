//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use bizhub_app::ports::{EntityStore, KeyValueStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API routes under `/api` and includes a [`TraceLayer`] that
/// logs each HTTP request/response using the `tracing` ecosystem.
pub fn build<S, K>(state: AppState<S, K>) -> Router
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use bizhub_adapter_memory::{
        InMemoryActivityLog, InMemoryEntityStore, InMemoryKeyValueStore, TracingNotificationSink,
    };
    use bizhub_app::actions::{ActionRegistry, BuiltinPorts};
    use bizhub_app::automation_engine::AutomationEngine;
    use bizhub_app::config::EngineConfig;
    use bizhub_app::ports::{WebhookClient, WebhookRequest, WebhookResponse};
    use bizhub_domain::error::BizHubError;

    use super::*;

    struct StubWebhook;

    impl WebhookClient for StubWebhook {
        async fn send(&self, _request: WebhookRequest) -> Result<WebhookResponse, BizHubError> {
            Ok(WebhookResponse { status: 200 })
        }
    }

    type TestState = AppState<Arc<InMemoryEntityStore>, InMemoryKeyValueStore>;

    fn test_state() -> TestState {
        let store = Arc::new(InMemoryEntityStore::new());
        let registry = ActionRegistry::builtin(BuiltinPorts {
            store: Arc::clone(&store),
            notifications: TracingNotificationSink,
            activity: InMemoryActivityLog::new(),
            webhook: StubWebhook,
        });
        let engine = Arc::new(AutomationEngine::new(
            store,
            InMemoryKeyValueStore::new(),
            registry,
            EngineConfig::default(),
        ));
        engine.install_hooks();
        AppState::new(engine)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn task_rule() -> Value {
        json!({
            "name": "Log new tasks",
            "triggerId": "onTaskCreated",
            "actions": [
                {"actionId": "add-log-entry", "config": {"message": "New task {{title}}"}}
            ]
        })
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_trigger_and_action_catalogs() {
        let app = build(test_state());

        let (status, triggers) = send(&app, "GET", "/api/triggers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(
            triggers
                .as_array()
                .unwrap()
                .iter()
                .any(|t| t["id"] == "onInvoiceDue")
        );

        let (_, actions) = send(&app, "GET", "/api/actions", None).await;
        assert_eq!(actions.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn should_create_then_fetch_automation() {
        let app = build(test_state());

        let (status, created) = send(&app, "POST", "/api/automations", Some(task_rule())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&app, "GET", &format!("/api/automations/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Log new tasks");
        assert_eq!(fetched["enabled"], true);
    }

    #[tokio::test]
    async fn should_return_400_when_rule_uses_unknown_action() {
        let app = build(test_state());
        let body = json!({
            "name": "Fax",
            "triggerId": "onTaskCreated",
            "actions": [{"actionId": "send-fax", "config": {}}]
        });

        let (status, json) = send(&app, "POST", "/api/automations", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("send-fax"));
    }

    #[tokio::test]
    async fn should_return_404_when_automation_is_missing() {
        let app = build(test_state());
        let id = bizhub_domain::id::AutomationId::new();

        let (status, _) = send(&app, "GET", &format!("/api/automations/{id}"), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_400_when_id_is_malformed() {
        let app = build(test_state());

        let (status, _) = send(&app, "DELETE", "/api/automations/not-a-uuid", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_run_automation_when_task_is_created_over_http() {
        let app = build(test_state());
        send(&app, "POST", "/api/automations", Some(task_rule())).await;

        let (status, task) = send(
            &app,
            "POST",
            "/api/entities/tasks",
            Some(json!({"title": "Call ACME"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(task["id"].is_string());

        let (_, logs) = send(&app, "GET", "/api/automation-logs", None).await;
        let logs = logs.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["status"], "success");
        assert_eq!(logs[0]["event"], "task.created");

        let (_, stats) = send(&app, "GET", "/api/automation-stats", None).await;
        assert_eq!(stats["totalRuns"], 1);
        assert_eq!(stats["successes"], 1);
    }

    #[tokio::test]
    async fn should_skip_disabled_rule_after_toggle() {
        let app = build(test_state());
        let (_, created) = send(&app, "POST", "/api/automations", Some(task_rule())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, toggled) = send(
            &app,
            "PUT",
            &format!("/api/automations/{id}/enabled"),
            Some(json!({"enabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["enabled"], false);

        send(&app, "POST", "/api/entities/task", Some(json!({"title": "x"}))).await;

        let (_, logs) = send(&app, "GET", "/api/automation-logs", None).await;
        assert!(logs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_run_rule_by_hand_with_given_payload() {
        let app = build(test_state());
        let (_, created) = send(&app, "POST", "/api/automations", Some(task_rule())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, entry) = send(
            &app,
            "POST",
            &format!("/api/automations/{id}/run"),
            Some(json!({"title": "Manual"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["status"], "success");
        assert_eq!(entry["eventData"]["title"], "Manual");
    }

    #[tokio::test]
    async fn should_filter_logs_by_automation_and_clear_them() {
        let app = build(test_state());
        let (_, created) = send(&app, "POST", "/api/automations", Some(task_rule())).await;
        let id = created["id"].as_str().unwrap().to_string();
        send(&app, "POST", &format!("/api/automations/{id}/run"), None).await;
        send(&app, "POST", &format!("/api/automations/{id}/run"), None).await;

        let other = bizhub_domain::id::AutomationId::new();
        let (_, logs) = send(
            &app,
            "GET",
            &format!("/api/automation-logs?automationId={other}"),
            None,
        )
        .await;
        assert!(logs.as_array().unwrap().is_empty());

        let (_, logs) = send(
            &app,
            "GET",
            &format!("/api/automation-logs?automationId={id}&limit=1"),
            None,
        )
        .await;
        assert_eq!(logs.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "DELETE", "/api/automation-logs", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, logs) = send(&app, "GET", "/api/automation-logs", None).await;
        assert!(logs.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_patch_record_and_return_404_for_unknown_id() {
        let app = build(test_state());
        let (_, invoice) = send(
            &app,
            "POST",
            "/api/entities/invoices",
            Some(json!({"number": "INV-1", "status": "sent"})),
        )
        .await;
        let id = invoice["id"].as_str().unwrap().to_string();

        let (status, patched) = send(
            &app,
            "PATCH",
            &format!("/api/entities/invoices/{id}"),
            Some(json!({"status": "paid"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["status"], "paid");
        assert_eq!(patched["number"], "INV-1");

        let (status, _) = send(&app, "GET", "/api/entities/invoices/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_return_400_for_unknown_collection() {
        let app = build(test_state());

        let (status, _) = send(&app, "GET", "/api/entities/spaceships", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
