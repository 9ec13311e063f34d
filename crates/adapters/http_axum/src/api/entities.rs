//! JSON REST handlers for the business collections.
//!
//! Writes go through the [`EntityStore`], so they fire the same
//! automations as any other mutation.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use bizhub_app::ports::{EntityStore, KeyValueStore};
use bizhub_domain::error::{BizHubError, NotFoundError, ValidationError};
use bizhub_domain::record::{EntityKind, Record};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Record>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

fn into_record(body: Value) -> Result<Record, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotAnObject.into()),
    }
}

/// `GET /api/entities/{collection}`
pub async fn list<S, K>(
    State(state): State<AppState<S, K>>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Record>>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    Ok(Json(state.engine.store().get_all(kind).await?))
}

/// `GET /api/entities/{collection}/{id}`
pub async fn get<S, K>(
    State(state): State<AppState<S, K>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    let record = state
        .engine
        .store()
        .get_by_id(kind, &id)
        .await?
        .ok_or_else(|| {
            BizHubError::from(NotFoundError {
                entity: kind.as_str(),
                id,
            })
        })?;
    Ok(Json(record))
}

/// `POST /api/entities/{collection}` — insert a record.
///
/// Automations listening for the `<kind>.created` event run before the
/// response is sent.
pub async fn create<S, K>(
    State(state): State<AppState<S, K>>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<CreateResponse, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    let record = into_record(body)?;
    let created = state.engine.store().create(kind, record).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/entities/{collection}/{id}` — merge fields into a record.
pub async fn update<S, K>(
    State(state): State<AppState<S, K>>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let kind = EntityKind::from_str(&collection)?;
    let patch = into_record(body)?;
    Ok(Json(state.engine.store().update(kind, &id, patch).await?))
}
