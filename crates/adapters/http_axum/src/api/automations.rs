//! JSON REST handlers for automations.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use bizhub_app::ports::{EntityStore, KeyValueStore};
use bizhub_domain::automation::{ActionInstance, Automation};
use bizhub_domain::error::ValidationError;
use bizhub_domain::execution_log::LogEntry;

use super::parse_automation_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating or replacing an automation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger_id: String,
    #[serde(default)]
    pub trigger_config: Map<String, Value>,
    pub actions: Vec<ActionInstance>,
    pub enabled: Option<bool>,
}

impl AutomationRequest {
    fn into_automation(self) -> Automation {
        let mut builder = Automation::builder()
            .name(self.name)
            .description(self.description)
            .trigger(self.trigger_id)
            .enabled(self.enabled.unwrap_or(true));
        for (key, value) in self.trigger_config {
            builder = builder.condition(key, value);
        }
        let mut automation = builder.build_unchecked();
        automation.actions = self.actions;
        automation
    }
}

/// Request body for toggling a rule.
#[derive(Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Automation>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/automations` — list all automations.
pub async fn list<S, K>(State(state): State<AppState<S, K>>) -> Json<Vec<Automation>>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    Json(state.engine.list_rules().await)
}

/// `GET /api/automations/{id}` — get automation by ID.
pub async fn get<S, K>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<String>,
) -> Result<Json<Automation>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let id = parse_automation_id(&id)?;
    Ok(Json(state.engine.get_rule(id).await?))
}

/// `POST /api/automations` — create a new automation.
pub async fn create<S, K>(
    State(state): State<AppState<S, K>>,
    Json(req): Json<AutomationRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let created = state.engine.create_rule(req.into_automation()).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/automations/{id}` — replace an automation's definition.
pub async fn update<S, K>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<String>,
    Json(req): Json<AutomationRequest>,
) -> Result<Json<Automation>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let id = parse_automation_id(&id)?;
    let mut automation = req.into_automation();
    automation.id = id;
    Ok(Json(state.engine.update_rule(automation).await?))
}

/// `DELETE /api/automations/{id}` — delete an automation.
pub async fn delete<S, K>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let id = parse_automation_id(&id)?;
    state.engine.delete_rule(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `PUT /api/automations/{id}/enabled` — enable or disable a rule.
pub async fn set_enabled<S, K>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<String>,
    Json(req): Json<EnabledRequest>,
) -> Result<Json<Automation>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let id = parse_automation_id(&id)?;
    Ok(Json(state.engine.set_enabled(id, req.enabled).await?))
}

/// `POST /api/automations/{id}/run` — run a rule by hand.
///
/// The optional JSON body is used as the event payload.
pub async fn run<S, K>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<LogEntry>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let id = parse_automation_id(&id)?;
    let payload = if body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice::<Value>(&body).map_err(|_| ValidationError::NotAnObject)?
    };
    if !payload.is_object() {
        return Err(ValidationError::NotAnObject.into());
    }
    Ok(Json(state.engine.run_rule(id, payload).await?))
}
