//! Automation — trigger → condition → ordered action rules.
//!
//! An [`Automation`] subscribes to one trigger from the catalog, narrows
//! the trigger's events with an optional `triggerConfig`, and runs its
//! [`ActionInstance`]s in order when an event gets through.

mod action;
mod condition;
mod trigger;

pub use action::{ActionDefinition, ActionKind, FieldSpec, FieldType};
pub use condition::conditions_satisfied;
pub use trigger::{ConditionRule, ConditionSpec, TRIGGERS, TriggerDefinition, trigger};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BizHubError, ValidationError};
use crate::id::AutomationId;
use crate::time::Timestamp;

/// One configured step of an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInstance {
    pub action_id: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl ActionInstance {
    #[must_use]
    pub fn new(action_id: impl Into<String>, config: Value) -> Self {
        Self {
            action_id: action_id.into(),
            config: match config {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

impl std::fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.action_id)
    }
}

/// A user-authored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: AutomationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger_id: String,
    #[serde(default)]
    pub trigger_config: Map<String, Value>,
    pub actions: Vec<ActionInstance>,
    pub enabled: bool,
    #[serde(default)]
    pub last_triggered_at: Option<Timestamp>,
    #[serde(default)]
    pub trigger_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Automation {
    /// Create a builder for constructing an [`Automation`].
    #[must_use]
    pub fn builder() -> AutomationBuilder {
        AutomationBuilder::default()
    }

    /// The catalog entry this rule subscribes to, if it still exists.
    #[must_use]
    pub fn trigger(&self) -> Option<&'static TriggerDefinition> {
        trigger(&self.trigger_id)
    }

    /// Check domain invariants against the built-in action catalog.
    ///
    /// # Errors
    ///
    /// See [`Automation::validate_with`].
    pub fn validate(&self) -> Result<(), BizHubError> {
        self.validate_with(|id| id.parse::<ActionKind>().ok().map(ActionKind::definition))
    }

    /// Check domain invariants, resolving action ids through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`BizHubError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - the trigger id is not in the catalog ([`ValidationError::UnknownTrigger`])
    /// - an action id is unknown to `lookup` ([`ValidationError::UnknownAction`])
    /// - an action lacks a required field ([`ValidationError::MissingField`])
    pub fn validate_with<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a ActionDefinition>,
    ) -> Result<(), BizHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        if self.trigger().is_none() {
            return Err(ValidationError::UnknownTrigger(self.trigger_id.clone()).into());
        }
        for action in &self.actions {
            let definition = lookup(&action.action_id)
                .ok_or_else(|| ValidationError::UnknownAction(action.action_id.clone()))?;
            definition.validate(&action.config)?;
        }
        Ok(())
    }

    /// Record one execution attempt.
    pub fn record_run(&mut self, at: Timestamp) {
        self.trigger_count += 1;
        self.last_triggered_at = Some(at);
    }
}

/// Step-by-step builder for [`Automation`].
#[derive(Debug, Default)]
pub struct AutomationBuilder {
    name: Option<String>,
    description: Option<String>,
    trigger_id: Option<String>,
    trigger_config: Map<String, Value>,
    actions: Vec<ActionInstance>,
    enabled: Option<bool>,
}

impl AutomationBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger_id: impl Into<String>) -> Self {
        self.trigger_id = Some(trigger_id.into());
        self
    }

    /// Add one `triggerConfig` filter.
    #[must_use]
    pub fn condition(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.trigger_config.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action_id: impl Into<String>, config: Value) -> Self {
        self.actions.push(ActionInstance::new(action_id, config));
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Assemble the rule without validating it.
    ///
    /// Used when the action ids are checked against a custom registry.
    #[must_use]
    pub fn build_unchecked(self) -> Automation {
        let ts = crate::time::now();
        Automation {
            id: AutomationId::new(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            trigger_id: self.trigger_id.unwrap_or_default(),
            trigger_config: self.trigger_config,
            actions: self.actions,
            enabled: self.enabled.unwrap_or(true),
            last_triggered_at: None,
            trigger_count: 0,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Consume the builder, validate, and return an [`Automation`].
    ///
    /// # Errors
    ///
    /// Returns [`BizHubError::Validation`] if required fields are missing,
    /// or the trigger or an action is unknown.
    pub fn build(self) -> Result<Automation, BizHubError> {
        let automation = self.build_unchecked();
        automation.validate()?;
        Ok(automation)
    }
}
