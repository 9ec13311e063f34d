//! Event dispatcher — turns store mutations into semantic events.

use std::sync::Weak;

use futures::future::BoxFuture;
use serde_json::Value;

use bizhub_domain::event::{Event, names};
use bizhub_domain::record::{EntityKind, Record};
use bizhub_domain::time::Timestamp;

use crate::automation_engine::AutomationEngine;
use crate::ports::{EntityStore, KeyValueStore, Mutation, MutationListener};

/// Events produced by one mutation, in emission order.
///
/// A create yields `<kind>.created`. An update yields one
/// `<kind>.<field>_changed` per changed tracked field (followed by its
/// derived event, if any) and always ends with `<kind>.updated`.
#[must_use]
pub fn events_for_mutation(mutation: &Mutation, now: Timestamp) -> Vec<Event> {
    match mutation {
        Mutation::Created { kind, record } => {
            vec![Event::for_record(*kind, "created", record.clone(), now)]
        }
        Mutation::Updated {
            kind,
            before,
            after,
        } => {
            let mut events = Vec::new();
            for field in kind.tracked_fields() {
                let old = before.get(*field).cloned().unwrap_or(Value::Null);
                let new = after.get(*field).cloned().unwrap_or(Value::Null);
                if old == new {
                    continue;
                }
                let mut payload = after.clone();
                let suffix = capitalize(field);
                payload.insert(format!("old{suffix}"), old);
                payload.insert(format!("new{suffix}"), new.clone());
                let changed = Event::for_record(*kind, &format!("{field}_changed"), payload, now);
                let derived = derived_event(*kind, field, &new)
                    .map(|name| Event::at(name, changed.payload.clone(), now));
                events.push(changed);
                events.extend(derived);
            }
            let mut payload = after.clone();
            payload.insert(
                "changedFields".to_string(),
                Value::Array(changed_fields(before, after).map(Value::String).collect()),
            );
            events.push(Event::for_record(*kind, "updated", payload, now));
            events
        }
    }
}

fn derived_event(kind: EntityKind, field: &str, new: &Value) -> Option<&'static str> {
    match (kind, field, new.as_str()?) {
        (EntityKind::Task, "status", "done") => Some(names::TASK_COMPLETED),
        (EntityKind::Invoice, "status", "paid") => Some(names::INVOICE_PAID),
        (EntityKind::Lead, "stage", "won") => Some(names::LEAD_CONVERTED),
        _ => None,
    }
}

/// Keys whose value differs between two versions of a record.
fn changed_fields<'a>(before: &'a Record, after: &'a Record) -> impl Iterator<Item = String> + 'a {
    let added_or_changed = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, _)| key.clone());
    let removed = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .cloned();
    added_or_changed.chain(removed)
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Store listener feeding mutations into an engine.
///
/// Holds a weak reference so the store does not keep the engine alive.
pub(crate) struct MutationHook<S, K> {
    pub(crate) engine: Weak<AutomationEngine<S, K>>,
}

impl<S, K> MutationListener for MutationHook<S, K>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    fn on_mutation<'a>(&'a self, mutation: &'a Mutation) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(engine) = self.engine.upgrade() else {
                return;
            };
            for event in events_for_mutation(mutation, bizhub_domain::time::now()) {
                engine.emit(event).await;
            }
        })
    }
}
