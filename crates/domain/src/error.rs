//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`BizHubError`] via `#[from]`; there are no stringly-typed variants.

/// Top-level error shared by every port and service.
#[derive(Debug, thiserror::Error)]
pub enum BizHubError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("external service error")]
    External(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("an automation needs at least one action")]
    NoActions,

    #[error("unknown trigger `{0}`")]
    UnknownTrigger(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("action `{action}` is missing required field `{field}`")]
    MissingField { action: String, field: String },

    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),

    #[error("record payload must be a JSON object")]
    NotAnObject,

    #[error("invalid identifier `{0}`")]
    InvalidId(String),
}

/// A lookup by id found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error_via_from() {
        let err: BizHubError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            BizHubError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Automation",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Automation `abc` not found");
    }

    #[test]
    fn should_display_missing_field_error() {
        let err = ValidationError::MissingField {
            action: "webhook".to_string(),
            field: "url".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "action `webhook` is missing required field `url`"
        );
    }
}
