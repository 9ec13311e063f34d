//! Action catalog — the side effects a rule can perform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::template;

/// Informational field type, used by rule editors to pick a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Select,
    Url,
    Email,
    Json,
}

/// One configuration field of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Schema of an action's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ActionDefinition {
    /// Return the first required field that is absent or blank in `config`.
    #[must_use]
    pub fn missing_required(&self, config: &Map<String, Value>) -> Option<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .find(|field| is_blank(config.get(field.name)))
            .map(|field| field.name)
    }

    /// Fill the placeholders of `config` from an event payload.
    ///
    /// String values of [`FieldType::Json`] fields are substituted as JSON
    /// documents so substituted text cannot break their syntax.
    #[must_use]
    pub fn substitute(&self, config: &Map<String, Value>, payload: &Value) -> Map<String, Value> {
        let mut out = template::substitute_config(config, payload);
        for field in self.fields.iter().filter(|f| f.field_type == FieldType::Json) {
            if let Some(Value::String(raw)) = config.get(field.name) {
                let document = template::substitute_json(raw, payload).into_owned();
                out.insert(field.name.to_string(), Value::String(document));
            }
        }
        out
    }

    /// Check a config against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for the first missing
    /// required field.
    pub fn validate(&self, config: &Map<String, Value>) -> Result<(), ValidationError> {
        match self.missing_required(config) {
            Some(field) => Err(ValidationError::MissingField {
                action: self.id.to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// The closed set of built-in action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    SendNotification,
    CreateTask,
    AddLogEntry,
    UpdateRecord,
    SendEmail,
    Webhook,
}

impl ActionKind {
    pub const ALL: [Self; 6] = [
        Self::SendNotification,
        Self::CreateTask,
        Self::AddLogEntry,
        Self::UpdateRecord,
        Self::SendEmail,
        Self::Webhook,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.definition().id
    }

    /// The configuration schema of this kind.
    #[must_use]
    pub fn definition(self) -> &'static ActionDefinition {
        match self {
            Self::SendNotification => &SEND_NOTIFICATION,
            Self::CreateTask => &CREATE_TASK,
            Self::AddLogEntry => &ADD_LOG_ENTRY,
            Self::UpdateRecord => &UPDATE_RECORD,
            Self::SendEmail => &SEND_EMAIL,
            Self::Webhook => &WEBHOOK,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownAction(s.to_string()))
    }
}

static SEND_NOTIFICATION: ActionDefinition = ActionDefinition {
    id: "send-notification",
    name: "Send notification",
    fields: &[
        FieldSpec::required("message", FieldType::Textarea),
        FieldSpec::optional("level", FieldType::Select),
        FieldSpec::optional("title", FieldType::Text),
    ],
};

static CREATE_TASK: ActionDefinition = ActionDefinition {
    id: "create-task",
    name: "Create task",
    fields: &[
        FieldSpec::required("title", FieldType::Text),
        FieldSpec::optional("description", FieldType::Textarea),
        FieldSpec::optional("priority", FieldType::Select),
        FieldSpec::optional("dueInDays", FieldType::Number),
        FieldSpec::optional("assignee", FieldType::Text),
    ],
};

static ADD_LOG_ENTRY: ActionDefinition = ActionDefinition {
    id: "add-log-entry",
    name: "Add activity log entry",
    fields: &[
        FieldSpec::required("message", FieldType::Textarea),
        FieldSpec::optional("category", FieldType::Text),
    ],
};

static UPDATE_RECORD: ActionDefinition = ActionDefinition {
    id: "update-record",
    name: "Update record",
    fields: &[
        FieldSpec::required("entityType", FieldType::Select),
        FieldSpec::required("field", FieldType::Text),
        FieldSpec::required("value", FieldType::Text),
        FieldSpec::optional("recordId", FieldType::Text),
    ],
};

static SEND_EMAIL: ActionDefinition = ActionDefinition {
    id: "send-email",
    name: "Send email",
    fields: &[
        FieldSpec::required("to", FieldType::Email),
        FieldSpec::required("subject", FieldType::Text),
        FieldSpec::optional("body", FieldType::Textarea),
    ],
};

static WEBHOOK: ActionDefinition = ActionDefinition {
    id: "webhook",
    name: "Call webhook",
    fields: &[
        FieldSpec::required("url", FieldType::Url),
        FieldSpec::optional("method", FieldType::Select),
        FieldSpec::optional("headers", FieldType::Json),
        FieldSpec::optional("payload", FieldType::Json),
    ],
};
