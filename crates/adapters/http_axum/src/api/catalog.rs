//! Read-only catalog endpoints.

use axum::Json;
use axum::extract::State;

use bizhub_app::ports::{EntityStore, KeyValueStore};
use bizhub_domain::automation::{ActionDefinition, TRIGGERS, TriggerDefinition};

use crate::state::AppState;

/// `GET /api/triggers` — every trigger with its condition schema.
pub async fn triggers() -> Json<&'static [TriggerDefinition]> {
    Json(TRIGGERS)
}

/// `GET /api/actions` — the actions known to the engine's registry,
/// including host-registered ones.
pub async fn actions<S, K>(
    State(state): State<AppState<S, K>>,
) -> Json<Vec<&'static ActionDefinition>>
where
    S: EntityStore + 'static,
    K: KeyValueStore + 'static,
{
    Json(state.engine.registry().definitions().collect())
}
