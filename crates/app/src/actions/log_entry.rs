use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use super::{ActionContext, ActionError, ActionHandler, required_text, text};
use crate::ports::{ActivityEntry, ActivityLog};

/// `add-log-entry`: write a line to the activity journal.
pub struct AddLogEntryHandler<A> {
    log: A,
}

impl<A> AddLogEntryHandler<A> {
    pub fn new(log: A) -> Self {
        Self { log }
    }
}

impl<A: ActivityLog> ActionHandler for AddLogEntryHandler<A> {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let message = required_text(config, "message")?;
            let category = text(config, "category").unwrap_or_else(|| "automation".to_string());
            self.log
                .append(ActivityEntry {
                    message: message.clone(),
                    category: category.clone(),
                    source: "automation".to_string(),
                    data: json!({
                        "automationId": ctx.automation_id,
                        "automationName": ctx.automation_name,
                        "event": ctx.event.name,
                    }),
                    timestamp: ctx.event.occurred_at,
                })
                .await?;
            Ok(json!({ "logged": true, "message": message, "category": category }))
        })
    }
}
