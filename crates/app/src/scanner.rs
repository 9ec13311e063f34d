//! Deadline scanner — synthesizes time-based events from record dates.

use serde_json::Value;

use bizhub_domain::event::{Event, names};
use bizhub_domain::record::{EntityKind, Record, record_id, str_field};
use bizhub_domain::time::{self, Timestamp};

use crate::config::EngineConfig;

const CLOSED_INVOICE: &[&str] = &["paid", "cancelled"];
const CLOSED_TASK: &[&str] = &["done", "cancelled"];
const CLOSED_PROJECT: &[&str] = &["completed", "cancelled", "closed"];

/// Records inspected by one scan.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub tasks: Vec<Record>,
    pub invoices: Vec<Record>,
    pub projects: Vec<Record>,
}

/// One event found by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub event: Event,
    /// `(event, kind, id, days)` identity used for deduplication; `None`
    /// when the record has no id.
    pub key: Option<String>,
}

/// Inspect a snapshot and return every due, overdue and approaching
/// deadline as of `now`.
#[must_use]
pub fn scan(snapshot: &Snapshot, now: Timestamp, config: &EngineConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for invoice in open(&snapshot.invoices, CLOSED_INVOICE) {
        let Some(days) = days_left(invoice, &["dueDate"], now) else {
            continue;
        };
        if days < 0 {
            findings.push(finding(
                names::INVOICE_OVERDUE,
                EntityKind::Invoice,
                invoice,
                days,
                &[("daysUntilDue", days), ("daysOverdue", -days)],
                now,
            ));
        } else if config.reminder_days.contains(&days) {
            findings.push(finding(
                names::INVOICE_DUE,
                EntityKind::Invoice,
                invoice,
                days,
                &[("daysUntilDue", days)],
                now,
            ));
        }
    }

    for task in open(&snapshot.tasks, CLOSED_TASK) {
        let Some(days) = days_left(task, &["dueDate"], now) else {
            continue;
        };
        if days < 0 {
            findings.push(finding(
                names::TASK_OVERDUE,
                EntityKind::Task,
                task,
                days,
                &[("daysOverdue", -days)],
                now,
            ));
        } else if days <= config.deadline_window_days {
            findings.push(finding(
                names::DEADLINE_APPROACHING,
                EntityKind::Task,
                task,
                days,
                &[("daysUntilDeadline", days)],
                now,
            ));
        }
    }

    for project in open(&snapshot.projects, CLOSED_PROJECT) {
        let Some(days) = days_left(project, &["deadline", "dueDate"], now) else {
            continue;
        };
        if (0..=config.deadline_window_days).contains(&days) {
            findings.push(finding(
                names::DEADLINE_APPROACHING,
                EntityKind::Project,
                project,
                days,
                &[("daysUntilDeadline", days)],
                now,
            ));
        }
    }

    findings
}

fn open<'a>(records: &'a [Record], closed: &'a [&str]) -> impl Iterator<Item = &'a Record> {
    records
        .iter()
        .filter(move |r| str_field(r, "status").is_none_or(|status| !closed.contains(&status)))
}

/// Days until the first parseable date among `fields`.
fn days_left(record: &Record, fields: &[&str], now: Timestamp) -> Option<i64> {
    fields
        .iter()
        .find_map(|field| str_field(record, field).and_then(time::parse_date))
        .map(|date| time::days_until(date, now))
}

fn finding(
    name: &str,
    kind: EntityKind,
    record: &Record,
    days: i64,
    extra: &[(&str, i64)],
    now: Timestamp,
) -> Finding {
    let mut payload = record.clone();
    payload.insert(
        "entityType".to_string(),
        Value::String(kind.as_str().to_string()),
    );
    for (key, value) in extra {
        payload.insert((*key).to_string(), Value::from(*value));
    }
    let key = record_id(record).map(|id| format!("{name}:{kind}:{id}:{days}"));
    Finding {
        event: Event::at(name, Value::Object(payload), now),
        key,
    }
}
