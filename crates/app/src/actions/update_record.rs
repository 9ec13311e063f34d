use futures::future::BoxFuture;
use serde_json::{Map, Value, json};

use bizhub_domain::record::{EntityKind, record_id};

use super::{ActionContext, ActionError, ActionHandler, required_text, text};
use crate::ports::EntityStore;

/// `update-record`: resolve the target record but do not write to it.
///
/// Without a `recordId` the event's own record is targeted when its
/// `entityType` matches.
pub struct UpdateRecordHandler<S> {
    store: S,
}

impl<S> UpdateRecordHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: EntityStore> ActionHandler for UpdateRecordHandler<S> {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>> {
        Box::pin(async move {
            let entity_type = required_text(config, "entityType")?;
            let kind: EntityKind =
                entity_type
                    .parse()
                    .map_err(|err: bizhub_domain::error::ValidationError| {
                        ActionError::InvalidConfig {
                            field: "entityType",
                            reason: err.to_string(),
                        }
                    })?;
            let field = required_text(config, "field")?;
            let value = config.get("value").cloned().unwrap_or(Value::Null);

            let target_id = text(config, "recordId").or_else(|| {
                let payload = ctx.event.payload.as_object()?;
                let same_kind = payload.get("entityType").and_then(Value::as_str)
                    == Some(kind.as_str());
                same_kind.then(|| record_id(payload)).flatten()
            });
            let found = match &target_id {
                Some(id) => self.store.get_by_id(kind, id).await?.is_some(),
                None => false,
            };

            tracing::info!(
                entity_type = %kind,
                record_id = target_id.as_deref().unwrap_or("-"),
                field = %field,
                "record updates from automations are not applied"
            );
            Ok(json!({
                "applied": false,
                "entityType": kind,
                "recordId": target_id,
                "found": found,
                "field": field,
                "value": value,
            }))
        })
    }
}
