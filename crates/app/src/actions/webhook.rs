use std::collections::BTreeMap;

use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use bizhub_domain::path;

use super::{ActionContext, ActionError, ActionHandler, required_text, text};
use crate::ports::{WebhookClient, WebhookMethod, WebhookRequest};

/// `webhook`: send the event (or a templated payload) to an HTTP endpoint.
pub struct WebhookHandler<W> {
    client: W,
}

impl<W> WebhookHandler<W> {
    pub fn new(client: W) -> Self {
        Self { client }
    }
}

impl<W: WebhookClient> ActionHandler for WebhookHandler<W> {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let url = required_text(config, "url")?;
            let method = match text(config, "method") {
                Some(raw) => raw
                    .parse::<WebhookMethod>()
                    .map_err(|reason| ActionError::InvalidConfig {
                        field: "method",
                        reason,
                    })?,
                None => WebhookMethod::default(),
            };
            let request = WebhookRequest {
                method,
                url,
                headers: headers(config.get("headers"))?,
                body: body(config.get("payload"), &ctx.event.payload),
            };
            let response = self.client.send(request).await?;
            Ok(json!({ "status": response.status, "ok": response.is_success() }))
        })
    }
}

/// Configured headers merged over `Content-Type: application/json`.
///
/// Accepts an object or a JSON string encoding one.
fn headers(config: Option<&Value>) -> Result<BTreeMap<String, String>, ActionError> {
    let mut headers = BTreeMap::from([(
        "Content-Type".to_string(),
        "application/json".to_string(),
    )]);
    let custom = match config {
        None | Some(Value::Null) => return Ok(headers),
        Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(headers),
        Some(Value::String(raw)) => {
            serde_json::from_str::<Map<String, Value>>(raw).map_err(|err| {
                ActionError::InvalidConfig {
                    field: "headers",
                    reason: err.to_string(),
                }
            })?
        }
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(ActionError::InvalidConfig {
                field: "headers",
                reason: "expected an object".to_string(),
            });
        }
    };
    for (name, value) in custom {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, path::render(&value));
    }
    Ok(headers)
}

fn body(payload: Option<&Value>, event_payload: &Value) -> String {
    match payload {
        Some(Value::String(raw)) if !raw.trim().is_empty() => raw.clone(),
        Some(value @ (Value::Object(_) | Value::Array(_))) => value.to_string(),
        _ => event_payload.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{FakeWebhook, config, context};

    #[tokio::test]
    async fn should_post_event_payload_by_default() {
        let client = Arc::new(FakeWebhook::replying(202));
        let handler = WebhookHandler::new(Arc::clone(&client));
        let ctx = context("invoice.paid", json!({"number": "INV-1"}));

        let result = handler
            .execute(&config(json!({"url": "https://hooks.example.com/a"})), &ctx)
            .await
            .unwrap();

        assert_eq!(result, json!({"status": 202, "ok": true}));
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].method, WebhookMethod::Post);
        assert_eq!(requests[0].headers["Content-Type"], "application/json");
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, json!({"number": "INV-1"}));
    }

    #[tokio::test]
    async fn should_merge_headers_and_use_templated_payload() {
        let client = Arc::new(FakeWebhook::replying(200));
        let handler = WebhookHandler::new(Arc::clone(&client));
        let ctx = context("task.created", json!({}));

        handler
            .execute(
                &config(json!({
                    "url": "https://hooks.example.com/b",
                    "method": "put",
                    "headers": {"content-type": "text/plain", "X-Token": "abc"},
                    "payload": "task created",
                })),
                &ctx,
            )
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, WebhookMethod::Put);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.headers["content-type"], "text/plain");
        assert_eq!(request.headers["X-Token"], "abc");
        assert_eq!(request.body, "task created");
    }

    #[tokio::test]
    async fn should_report_non_2xx_status_as_not_ok() {
        let handler = WebhookHandler::new(FakeWebhook::replying(503));
        let ctx = context("task.created", json!({}));
        let result = handler
            .execute(&config(json!({"url": "https://hooks.example.com/c"})), &ctx)
            .await
            .unwrap();
        assert_eq!(result, json!({"status": 503, "ok": false}));
    }

    #[tokio::test]
    async fn should_fail_on_transport_error() {
        let handler = WebhookHandler::new(FakeWebhook::unreachable("connection refused"));
        let ctx = context("task.created", json!({}));
        let err = handler
            .execute(&config(json!({"url": "https://hooks.example.com/d"})), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn should_reject_unsupported_method() {
        let handler = WebhookHandler::new(FakeWebhook::default());
        let ctx = context("task.created", json!({}));
        let err = handler
            .execute(
                &config(json!({"url": "https://hooks.example.com/e", "method": "DELETE"})),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidConfig { field: "method", .. }));
    }
}
