use chrono::TimeDelta;
use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use bizhub_domain::record::{EntityKind, record_id};

use super::{ActionContext, ActionError, ActionHandler, integer, required_text, text};
use crate::ports::EntityStore;

const DEFAULT_PRIORITY: &str = "medium";

/// `create-task`: insert a follow-up task through the entity store.
///
/// The write goes through the store like any other, so it emits
/// `task.created` in turn.
pub struct CreateTaskHandler<S> {
    store: S,
}

impl<S> CreateTaskHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: EntityStore> ActionHandler for CreateTaskHandler<S> {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let title = required_text(config, "title")?;
            let now = ctx.event.occurred_at;

            let mut task = Map::new();
            task.insert(
                "id".into(),
                Value::String(format!("auto_{}", uuid::Uuid::new_v4().simple())),
            );
            task.insert("title".into(), Value::String(title.clone()));
            task.insert(
                "description".into(),
                Value::String(text(config, "description").unwrap_or_default()),
            );
            task.insert(
                "priority".into(),
                Value::String(
                    text(config, "priority").unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
                ),
            );
            task.insert("status".into(), Value::String("todo".into()));
            if let Some(days) = integer(config, "dueInDays")? {
                let due = TimeDelta::try_days(days)
                    .and_then(|delta| now.date_naive().checked_add_signed(delta))
                    .ok_or_else(|| ActionError::InvalidConfig {
                        field: "dueInDays",
                        reason: format!("{days} days is out of range"),
                    })?;
                task.insert(
                    "dueDate".into(),
                    Value::String(due.format("%Y-%m-%d").to_string()),
                );
            }
            if let Some(assignee) = text(config, "assignee") {
                task.insert("assignee".into(), Value::String(assignee));
            }
            task.insert("source".into(), Value::String("automation".into()));
            task.insert(
                "automationId".into(),
                Value::String(ctx.automation_id.to_string()),
            );
            task.insert("createdAt".into(), Value::String(now.to_rfc3339()));

            let created = self.store.create(EntityKind::Task, task).await?;
            Ok(json!({ "taskId": record_id(&created), "title": title }))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{FakeStore, config, context};

    #[tokio::test]
    async fn should_create_task_marked_as_automation_output() {
        let store = Arc::new(FakeStore::default());
        let handler = CreateTaskHandler::new(Arc::clone(&store));
        let ctx = context("invoice.paid", json!({"number": "INV-7"}));

        let result = handler
            .execute(
                &config(json!({"title": "Thank client for INV-7", "dueInDays": "2"})),
                &ctx,
            )
            .await
            .unwrap();

        let tasks = store.all(EntityKind::Task);
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        let id = task["id"].as_str().unwrap();
        assert!(id.starts_with("auto_"));
        assert_eq!(result["taskId"], json!(id));
        assert_eq!(task["source"], json!("automation"));
        assert_eq!(task["automationId"], json!(ctx.automation_id.to_string()));
        assert_eq!(task["priority"], json!("medium"));
        assert_eq!(task["status"], json!("todo"));
        let due = (ctx.event.occurred_at.date_naive() + TimeDelta::days(2))
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(task["dueDate"], json!(due));
    }

    #[tokio::test]
    async fn should_reject_non_numeric_due_in_days() {
        let store = Arc::new(FakeStore::default());
        let handler = CreateTaskHandler::new(Arc::clone(&store));
        let ctx = context("task.created", json!({}));

        let err = handler
            .execute(&config(json!({"title": "x", "dueInDays": "soon"})), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActionError::InvalidConfig {
                field: "dueInDays",
                ..
            }
        ));
        assert!(store.all(EntityKind::Task).is_empty());
    }

    #[tokio::test]
    async fn should_reject_out_of_range_due_in_days() {
        let store = Arc::new(FakeStore::default());
        let handler = CreateTaskHandler::new(Arc::clone(&store));
        let ctx = context("task.created", json!({}));

        let err = handler
            .execute(
                &config(json!({"title": "x", "dueInDays": 100_000_000})),
                &ctx,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActionError::InvalidConfig {
                field: "dueInDays",
                ..
            }
        ));
        assert!(store.all(EntityKind::Task).is_empty());
    }
}
