//! Records — the business rows the automations watch.
//!
//! The engine does not own the shape of tasks, invoices, leads, projects or
//! clients; it sees each row as an opaque JSON object carrying at least an
//! `id` string. [`EntityKind`] names the collection a record belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A single business record as stored by the entity store.
pub type Record = Map<String, Value>;

/// The entity collections the engine can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Invoice,
    Lead,
    Project,
    Client,
}

impl EntityKind {
    /// Every observable collection, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Task,
        Self::Invoice,
        Self::Lead,
        Self::Project,
        Self::Client,
    ];

    /// Singular name used as the event prefix (`task.created`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Invoice => "invoice",
            Self::Lead => "lead",
            Self::Project => "project",
            Self::Client => "client",
        }
    }

    /// Plural collection name (`tasks`).
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Invoice => "invoices",
            Self::Lead => "leads",
            Self::Project => "projects",
            Self::Client => "clients",
        }
    }

    /// Fields whose changes produce a dedicated `<kind>.<field>_changed` event.
    #[must_use]
    pub fn tracked_fields(self) -> &'static [&'static str] {
        match self {
            Self::Task | Self::Invoice | Self::Client => &["status"],
            Self::Lead | Self::Project => &["stage", "status"],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    /// Accepts both the singular (`task`) and the collection (`tasks`) form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.collection() == s)
            .ok_or_else(|| ValidationError::UnknownEntityType(s.to_string()))
    }
}

/// Read the `id` of a record, accepting string or numeric ids.
#[must_use]
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a string field of a record.
#[must_use]
pub fn str_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
