//! In-memory fakes of the port traits shared by the app crate's tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};

use bizhub_domain::error::{BizHubError, NotFoundError};
use bizhub_domain::event::Event;
use bizhub_domain::id::AutomationId;
use bizhub_domain::record::{EntityKind, Record, record_id};

use crate::actions::ActionContext;
use crate::ports::{
    ActivityEntry, ActivityLog, EntityStore, KeyValueStore, Mutation, MutationListener,
    NotificationLevel, NotificationOptions, NotificationSink, WebhookClient, WebhookRequest,
    WebhookResponse,
};

// ── Entity store ───────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
    collections: Mutex<HashMap<EntityKind, Vec<Record>>>,
    listeners: Mutex<Vec<(EntityKind, Arc<dyn MutationListener>)>>,
}

impl FakeStore {
    pub fn seed(&self, kind: EntityKind, record: Value) {
        let record = record.as_object().unwrap().clone();
        self.collections
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(record);
    }

    pub fn all(&self, kind: EntityKind) -> Vec<Record> {
        self.collections
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    fn listeners_for(&self, kind: EntityKind) -> Vec<Arc<dyn MutationListener>> {
        self.listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    async fn publish(&self, mutation: Mutation) {
        for listener in self.listeners_for(mutation.kind()) {
            listener.on_mutation(&mutation).await;
        }
    }
}

impl EntityStore for FakeStore {
    fn create(
        &self,
        kind: EntityKind,
        mut record: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send {
        async move {
            if record_id(&record).is_none() {
                record.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
            }
            self.collections
                .lock()
                .unwrap()
                .entry(kind)
                .or_default()
                .push(record.clone());
            self.publish(Mutation::Created {
                kind,
                record: record.clone(),
            })
            .await;
            Ok(record)
        }
    }

    fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> impl Future<Output = Result<Record, BizHubError>> + Send {
        async move {
            let (before, after) = {
                let mut collections = self.collections.lock().unwrap();
                let row = collections
                    .entry(kind)
                    .or_default()
                    .iter_mut()
                    .find(|r| record_id(r).as_deref() == Some(id))
                    .ok_or_else(|| NotFoundError {
                        entity: "Record",
                        id: id.to_string(),
                    })?;
                let before = row.clone();
                row.extend(patch);
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
    }

    fn get_all(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Vec<Record>, BizHubError>> + Send {
        let all = self.all(kind);
        async move { Ok(all) }
    }

    fn get_by_id(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> impl Future<Output = Result<Option<Record>, BizHubError>> + Send {
        let found = self
            .all(kind)
            .into_iter()
            .find(|r| record_id(r).as_deref() == Some(id));
        async move { Ok(found) }
    }

    fn on_mutation(&self, kind: EntityKind, listener: Arc<dyn MutationListener>) {
        self.listeners.lock().unwrap().push((kind, listener));
    }
}

// ── Key-value store ────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryKv {
    data: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryKv {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// The next `set` sleeps for `delay` before it lands.
    pub fn delay_next_write(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, BizHubError>> + Send {
        let value = self.raw(key);
        async move { Ok(value) }
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), BizHubError>> + Send {
        let failing = self.fail_writes.load(Ordering::SeqCst);
        let delay = self.write_delay.lock().unwrap().take();
        let key = key.to_string();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(BizHubError::Storage("disk full".into()));
            }
            self.data.lock().unwrap().insert(key, value);
            Ok(())
        }
    }
}

// ── Notification sink ──────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, NotificationLevel, NotificationOptions)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _, _)| m.clone())
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, level: NotificationLevel, options: NotificationOptions) {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), level, options));
    }
}

// ── Activity log ───────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryActivity {
    pub entries: Mutex<Vec<ActivityEntry>>,
}

impl MemoryActivity {
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }
}

impl ActivityLog for MemoryActivity {
    fn append(&self, entry: ActivityEntry) -> impl Future<Output = Result<(), BizHubError>> + Send {
        self.entries.lock().unwrap().push(entry);
        async { Ok(()) }
    }
}

// ── Webhook client ─────────────────────────────────────────────

pub struct FakeWebhook {
    pub requests: Mutex<Vec<WebhookRequest>>,
    reply: Result<u16, String>,
}

impl FakeWebhook {
    pub fn replying(status: u16) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Ok(status),
        }
    }

    pub fn unreachable(reason: &str) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Err(reason.to_string()),
        }
    }
}

impl Default for FakeWebhook {
    fn default() -> Self {
        Self::replying(200)
    }
}

impl WebhookClient for FakeWebhook {
    fn send(
        &self,
        request: WebhookRequest,
    ) -> impl Future<Output = Result<WebhookResponse, BizHubError>> + Send {
        self.requests.lock().unwrap().push(request);
        let reply = self.reply.clone();
        async move {
            reply
                .map(|status| WebhookResponse { status })
                .map_err(|reason| BizHubError::External(reason.into()))
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────

pub fn config(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

pub fn context(event_name: &str, payload: Value) -> ActionContext {
    ActionContext {
        automation_id: AutomationId::new(),
        automation_name: "Test rule".to_string(),
        event: Event::new(event_name, payload),
    }
}
