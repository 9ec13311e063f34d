//! Execution log and statistics endpoints.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use bizhub_app::automation_engine::{EngineStats, LogQuery};
use bizhub_app::ports::{EntityStore, KeyValueStore};
use bizhub_domain::execution_log::LogEntry;

use super::parse_automation_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogParams {
    pub automation_id: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/automation-logs?automationId=&limit=` — newest first.
///
/// # Errors
///
/// Returns `400` when `automationId` is not a valid identifier.
pub async fn list<S, K>(
    State(state): State<AppState<S, K>>,
    Query(params): Query<LogParams>,
) -> Result<Json<Vec<LogEntry>>, ApiError>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    let automation_id = params
        .automation_id
        .as_deref()
        .map(parse_automation_id)
        .transpose()?;
    let entries = state
        .engine
        .logs(LogQuery {
            automation_id,
            limit: params.limit,
        })
        .await;
    Ok(Json(entries))
}

/// `DELETE /api/automation-logs`
pub async fn clear<S, K>(State(state): State<AppState<S, K>>) -> StatusCode
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    state.engine.clear_logs().await;
    StatusCode::NO_CONTENT
}

/// `GET /api/automation-stats`
pub async fn stats<S, K>(State(state): State<AppState<S, K>>) -> Json<EngineStats>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    Json(state.engine.stats().await)
}
