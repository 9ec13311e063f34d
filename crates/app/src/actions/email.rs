use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::{ActionContext, ActionError, ActionHandler, required_text, text};

/// `send-email`: there is no mail transport, so the message is only traced.
pub struct SendEmailHandler;

impl ActionHandler for SendEmailHandler {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let to = required_text(config, "to")?;
            let subject = required_text(config, "subject")?;
            let body = text(config, "body").unwrap_or_default();
            tracing::info!(
                automation_id = %ctx.automation_id,
                to = %to,
                subject = %subject,
                body_len = body.len(),
                "email not sent, no mail transport configured"
            );
            Ok(json!({ "sent": false, "to": to, "subject": subject }))
        })
    }
}
