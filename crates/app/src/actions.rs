//! Action handlers and the registry that maps action ids onto them.
//!
//! The built-in kinds come from [`ActionKind`]; hosts may register extra
//! handlers under their own [`ActionDefinition`]. Rules are validated
//! against the registry, so an id is either known here or rejected when
//! the rule is saved.

mod create_task;
mod email;
mod log_entry;
mod notification;
mod update_record;
mod webhook;

pub use create_task::CreateTaskHandler;
pub use email::SendEmailHandler;
pub use log_entry::AddLogEntryHandler;
pub use notification::SendNotificationHandler;
pub use update_record::UpdateRecordHandler;
pub use webhook::WebhookHandler;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use bizhub_domain::automation::{ActionDefinition, ActionKind};
use bizhub_domain::error::BizHubError;
use bizhub_domain::event::Event;
use bizhub_domain::id::AutomationId;
use bizhub_domain::path;

use crate::ports::{ActivityLog, EntityStore, NotificationSink, WebhookClient};

/// Why a single action failed. The display text ends up in the
/// per-action `error` field of the execution log.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("{}", describe(.0))]
    Port(#[from] BizHubError),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Render an error with its whole source chain on one line.
fn describe(err: &BizHubError) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// What a handler knows about the run it belongs to.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub automation_id: AutomationId,
    pub automation_name: String,
    pub event: Event,
}

/// Performs one action kind.
///
/// `config` has already been through variable substitution and carries
/// every required field of the handler's definition.
pub trait ActionHandler: Send + Sync {
    fn execute<'a>(
        &'a self,
        config: &'a Map<String, Value>,
        ctx: &'a ActionContext,
    ) -> BoxFuture<'a, Result<Value, ActionError>>;
}

#[derive(Clone)]
struct Registration {
    definition: &'static ActionDefinition,
    handler: Arc<dyn ActionHandler>,
}

/// Ports the built-in handlers talk to.
pub struct BuiltinPorts<S, N, A, W> {
    pub store: S,
    pub notifications: N,
    pub activity: A,
    pub webhook: W,
}

/// Lookup table from action id to definition and handler.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    entries: Vec<Registration>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.definition.id))
            .finish()
    }
}

impl ActionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a handler for every [`ActionKind`].
    #[must_use]
    pub fn builtin<S, N, A, W>(ports: BuiltinPorts<S, N, A, W>) -> Self
    where
        S: EntityStore + Clone + 'static,
        N: NotificationSink + 'static,
        A: ActivityLog + 'static,
        W: WebhookClient + 'static,
    {
        let BuiltinPorts {
            store,
            notifications,
            activity,
            webhook,
        } = ports;
        let mut registry = Self::new();
        registry.register(
            ActionKind::SendNotification.definition(),
            Arc::new(SendNotificationHandler::new(notifications)),
        );
        registry.register(
            ActionKind::CreateTask.definition(),
            Arc::new(CreateTaskHandler::new(store.clone())),
        );
        registry.register(
            ActionKind::AddLogEntry.definition(),
            Arc::new(AddLogEntryHandler::new(activity)),
        );
        registry.register(
            ActionKind::UpdateRecord.definition(),
            Arc::new(UpdateRecordHandler::new(store)),
        );
        registry.register(ActionKind::SendEmail.definition(), Arc::new(SendEmailHandler));
        registry.register(
            ActionKind::Webhook.definition(),
            Arc::new(WebhookHandler::new(webhook)),
        );
        registry
    }

    /// Register (or replace) the handler for `definition.id`.
    pub fn register(&mut self, definition: &'static ActionDefinition, handler: Arc<dyn ActionHandler>) {
        let registration = Registration {
            definition,
            handler,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.definition.id == definition.id)
        {
            Some(existing) => *existing = registration,
            None => self.entries.push(registration),
        }
    }

    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&'static ActionDefinition> {
        self.find(id).map(|e| e.definition)
    }

    #[must_use]
    pub fn handler(&self, id: &str) -> Option<Arc<dyn ActionHandler>> {
        self.find(id).map(|e| Arc::clone(&e.handler))
    }

    /// Every registered definition, in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &'static ActionDefinition> + '_ {
        self.entries.iter().map(|e| e.definition)
    }

    fn find(&self, id: &str) -> Option<&Registration> {
        self.entries.iter().find(|e| e.definition.id == id)
    }
}

/// Read a config field as display text; absent, `null` and blank count as missing.
pub(crate) fn text(config: &Map<String, Value>, field: &str) -> Option<String> {
    let rendered = path::render(config.get(field)?);
    let trimmed = rendered.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn required_text(
    config: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ActionError> {
    text(config, field).ok_or(ActionError::MissingField(field))
}

/// Read a config field as an integer, accepting numeric strings.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn integer(
    config: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, ActionError> {
    let Some(raw) = text(config, field) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && n.fract().abs() < f64::EPSILON && n.abs() < 1e15)
        .map(|n| Some(n as i64))
        .ok_or_else(|| ActionError::InvalidConfig {
            field,
            reason: format!("`{raw}` is not a whole number"),
        })
}
