//! Event — a semantic occurrence the automations react to.
//!
//! Events are synthesized from record mutations (`task.created`,
//! `invoice.status_changed`) or from the periodic deadline scan
//! (`invoice.overdue`, `deadline.approaching`). They are never persisted;
//! only a snapshot of their payload lands in the execution log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{EntityKind, Record};
use crate::time::Timestamp;

/// Well-known event names.
pub mod names {
    pub const INVOICE_DUE: &str = "invoice.due";
    pub const INVOICE_OVERDUE: &str = "invoice.overdue";
    pub const INVOICE_PAID: &str = "invoice.paid";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_OVERDUE: &str = "task.overdue";
    pub const LEAD_CONVERTED: &str = "lead.converted";
    pub const DEADLINE_APPROACHING: &str = "deadline.approaching";
}

/// A named occurrence with the entity state it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub name: String,
    pub payload: Value,
    pub occurred_at: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::at(name, payload, crate::time::now())
    }

    /// Create an event stamped with an explicit time.
    #[must_use]
    pub fn at(name: impl Into<String>, payload: Value, occurred_at: Timestamp) -> Self {
        Self {
            name: name.into(),
            payload,
            occurred_at,
        }
    }

    /// Build `<kind>.<suffix>` from a record, tagging the payload with
    /// its `entityType`.
    #[must_use]
    pub fn for_record(
        kind: EntityKind,
        suffix: &str,
        mut record: Record,
        occurred_at: Timestamp,
    ) -> Self {
        record.insert(
            "entityType".to_string(),
            Value::String(kind.as_str().to_string()),
        );
        Self::at(
            format!("{}.{suffix}", kind.as_str()),
            Value::Object(record),
            occurred_at,
        )
    }
}
