//! Trigger catalog — which events a rule can subscribe to and how it may
//! narrow them.

use serde::Serialize;

use crate::event::names;

/// How a single condition key may be narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionRule {
    /// The payload value must be one of these (compared in rendered form).
    OneOf { values: &'static [&'static str] },
    /// The payload value must parse as a number inside `min..=max`.
    Range { min: f64, max: f64 },
}

/// One entry of a trigger's condition schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionSpec {
    /// Key used in a rule's `triggerConfig`.
    pub key: &'static str,
    /// Dot path read from the event payload.
    pub field: &'static str,
    pub rule: ConditionRule,
}

/// A named category of events with its condition schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TriggerDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub events: &'static [&'static str],
    pub conditions: &'static [ConditionSpec],
}

impl TriggerDefinition {
    /// Whether this trigger subscribes to `event_name`.
    #[must_use]
    pub fn listens_to(&self, event_name: &str) -> bool {
        self.events.contains(&event_name)
    }

    /// Look up the schema entry for a `triggerConfig` key.
    #[must_use]
    pub fn condition(&self, key: &str) -> Option<&ConditionSpec> {
        self.conditions.iter().find(|spec| spec.key == key)
    }
}

const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];
const TASK_STATUSES: &[&str] = &["todo", "in-progress", "review", "done"];
const INVOICE_STATUSES: &[&str] = &["draft", "sent", "paid", "overdue", "cancelled"];
const LEAD_SOURCES: &[&str] = &["website", "referral", "social", "email", "phone", "other"];
const LEAD_STAGES: &[&str] = &[
    "new",
    "contacted",
    "qualified",
    "proposal",
    "negotiation",
    "won",
    "lost",
];
const PROJECT_STAGES: &[&str] = &[
    "planning",
    "design",
    "development",
    "testing",
    "delivery",
    "closed",
];
const PROJECT_STATUSES: &[&str] = &["planning", "active", "on-hold", "completed", "cancelled"];
const AMOUNT: ConditionRule = ConditionRule::Range {
    min: 0.0,
    max: 1e12,
};

const fn one_of(
    key: &'static str,
    field: &'static str,
    values: &'static [&'static str],
) -> ConditionSpec {
    ConditionSpec {
        key,
        field,
        rule: ConditionRule::OneOf { values },
    }
}

const fn range(key: &'static str, field: &'static str, min: f64, max: f64) -> ConditionSpec {
    ConditionSpec {
        key,
        field,
        rule: ConditionRule::Range { min, max },
    }
}

/// Every trigger a rule may reference.
pub static TRIGGERS: &[TriggerDefinition] = &[
    TriggerDefinition {
        id: "onTaskCreated",
        name: "Task created",
        description: "A new task was added",
        events: &["task.created"],
        conditions: &[one_of("priority", "priority", PRIORITIES)],
    },
    TriggerDefinition {
        id: "onTaskStatusChanged",
        name: "Task status changed",
        description: "A task moved between statuses",
        events: &["task.status_changed"],
        conditions: &[
            one_of("fromStatus", "oldStatus", TASK_STATUSES),
            one_of("toStatus", "newStatus", TASK_STATUSES),
        ],
    },
    TriggerDefinition {
        id: "onTaskCompleted",
        name: "Task completed",
        description: "A task was marked as done",
        events: &[names::TASK_COMPLETED],
        conditions: &[one_of("priority", "priority", PRIORITIES)],
    },
    TriggerDefinition {
        id: "onTaskOverdue",
        name: "Task overdue",
        description: "An open task is past its due date",
        events: &[names::TASK_OVERDUE],
        conditions: &[range("daysOverdue", "daysOverdue", 1.0, 365.0)],
    },
    TriggerDefinition {
        id: "onInvoiceCreated",
        name: "Invoice created",
        description: "A new invoice was issued",
        events: &["invoice.created"],
        conditions: &[ConditionSpec {
            key: "amount",
            field: "amount",
            rule: AMOUNT,
        }],
    },
    TriggerDefinition {
        id: "onInvoiceStatusChanged",
        name: "Invoice status changed",
        description: "An invoice moved between statuses",
        events: &["invoice.status_changed"],
        conditions: &[one_of("toStatus", "newStatus", INVOICE_STATUSES)],
    },
    TriggerDefinition {
        id: "onInvoicePaid",
        name: "Invoice paid",
        description: "An invoice was marked as paid",
        events: &[names::INVOICE_PAID],
        conditions: &[ConditionSpec {
            key: "amount",
            field: "amount",
            rule: AMOUNT,
        }],
    },
    TriggerDefinition {
        id: "onInvoiceDue",
        name: "Invoice due",
        description: "An unpaid invoice is approaching its due date (narrow with \
                      daysBeforeDue) or past it (narrow with daysOverdue)",
        events: &[names::INVOICE_DUE, names::INVOICE_OVERDUE],
        conditions: &[
            one_of("daysBeforeDue", "daysUntilDue", &["1", "3", "7", "14", "30"]),
            range("daysOverdue", "daysOverdue", 1.0, 365.0),
        ],
    },
    TriggerDefinition {
        id: "onLeadCreated",
        name: "Lead created",
        description: "A new lead entered the pipeline",
        events: &["lead.created"],
        conditions: &[one_of("source", "source", LEAD_SOURCES)],
    },
    TriggerDefinition {
        id: "onLeadStageChanged",
        name: "Lead stage changed",
        description: "A lead moved through the pipeline",
        events: &["lead.stage_changed"],
        conditions: &[one_of("toStage", "newStage", LEAD_STAGES)],
    },
    TriggerDefinition {
        id: "onProjectStageChanged",
        name: "Project stage changed",
        description: "A project entered a new stage",
        events: &["project.stage_changed"],
        conditions: &[one_of("toStage", "newStage", PROJECT_STAGES)],
    },
    TriggerDefinition {
        id: "onProjectStatusChanged",
        name: "Project status changed",
        description: "A project changed status",
        events: &["project.status_changed"],
        conditions: &[one_of("toStatus", "newStatus", PROJECT_STATUSES)],
    },
    TriggerDefinition {
        id: "onDeadlineApproaching",
        name: "Deadline approaching",
        description: "A task or project deadline is coming up",
        events: &[names::DEADLINE_APPROACHING],
        conditions: &[
            range("daysBefore", "daysUntilDeadline", 0.0, 30.0),
            one_of("entityType", "entityType", &["task", "project"]),
        ],
    },
    TriggerDefinition {
        id: "onClientCreated",
        name: "Client created",
        description: "A new client was added",
        events: &["client.created"],
        conditions: &[],
    },
];

/// Look up a trigger by id.
#[must_use]
pub fn trigger(id: &str) -> Option<&'static TriggerDefinition> {
    TRIGGERS.iter().find(|t| t.id == id)
}
