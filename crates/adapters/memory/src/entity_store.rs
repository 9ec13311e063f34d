//! Entity store holding every collection in memory.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use bizhub_app::ports::{EntityStore, Mutation, MutationListener};
use bizhub_domain::error::{BizHubError, NotFoundError};
use bizhub_domain::record::{EntityKind, Record, record_id};

/// Observer/publisher entity store.
///
/// Listeners run after the write lock is released and are awaited before
/// the write returns, so they may read from or write to the store.
#[derive(Default)]
pub struct InMemoryEntityStore {
    collections: RwLock<HashMap<EntityKind, Vec<Record>>>,
    listeners: std::sync::RwLock<HashMap<EntityKind, Vec<Arc<dyn MutationListener>>>>,
}

impl InMemoryEntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners_for(&self, kind: EntityKind) -> Vec<Arc<dyn MutationListener>> {
        match self.listeners.read() {
            Ok(listeners) => listeners.get(&kind).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(&kind).cloned().unwrap_or_default(),
        }
    }

    async fn publish(&self, mutation: Mutation) {
        for listener in self.listeners_for(mutation.kind()) {
            listener.on_mutation(&mutation).await;
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    async fn create(&self, kind: EntityKind, mut record: Record) -> Result<Record, BizHubError> {
        if record_id(&record).is_none() {
            record.insert(
                "id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        self.collections
            .write()
            .await
            .entry(kind)
            .or_default()
            .push(record.clone());
        tracing::debug!(kind = %kind, id = ?record_id(&record), "record created");
        self.publish(Mutation::Created {
            kind,
            record: record.clone(),
        })
        .await;
        Ok(record)
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Record) -> Result<Record, BizHubError> {
        let (before, after) = {
            let mut collections = self.collections.write().await;
            let row = collections
                .get_mut(&kind)
                .and_then(|rows| rows.iter_mut().find(|r| record_id(r).as_deref() == Some(id)))
                .ok_or_else(|| NotFoundError {
                    entity: "Record",
                    id: id.to_string(),
                })?;
            let before = row.clone();
            for (key, value) in patch {
                if key != "id" {
                    row.insert(key, value);
                }
            }
            (before, row.clone())
        };
        self.publish(Mutation::Updated {
            kind,
            before,
            after: after.clone(),
        })
        .await;
        Ok(after)
    }

    async fn get_all(&self, kind: EntityKind) -> Result<Vec<Record>, BizHubError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_by_id(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, BizHubError> {
        Ok(self.collections.read().await.get(&kind).and_then(|rows| {
            rows.iter()
                .find(|r| record_id(r).as_deref() == Some(id))
                .cloned()
        }))
    }

    fn on_mutation(&self, kind: EntityKind, listener: Arc<dyn MutationListener>) {
        let mut listeners = match self.listeners.write() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.entry(kind).or_default().push(listener);
    }
}
